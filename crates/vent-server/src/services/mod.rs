mod comment_tree;

pub use comment_tree::list_comment_tree;
