mod comments;
mod posts;
mod profiles;

pub use comments::*;
pub use posts::*;
pub use profiles::*;
