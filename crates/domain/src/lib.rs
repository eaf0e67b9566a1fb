mod events;
mod models;
pub mod tree;

pub use events::DiscussionEvent;
pub use models::{Comment, DiscussionId, DiscussionIdError, DiscussionKind, FALLBACK_AUTHOR_NAME};
pub use tree::{
    build_tree, build_tree_ordered, flatten_for_display, CommentNode, CommentOrder,
    REPLY_DEPTH_LIMIT,
};
