use crate::models::{Comment, DiscussionId};
use serde::{Deserialize, Serialize};

/// Fan-out notifications for live discussion views. Subscribers re-fetch and
/// rebuild the tree rather than patching it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiscussionEvent {
    CommentPosted {
        discussion_id: DiscussionId,
        comment: Comment,
    },
    CommentDeleted {
        discussion_id: DiscussionId,
        comment_id: String,
    },
}
