mod comment;
mod post;
mod profile;

pub use comment::*;
pub use post::*;
pub use profile::*;
