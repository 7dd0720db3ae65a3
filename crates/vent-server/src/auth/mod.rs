mod jwt;
mod middleware;

#[cfg(test)]
pub use jwt::create_access_token;
pub use middleware::{identity_middleware, AuthUser, MaybeAuthUser};
