use chrono::NaiveDateTime;
use domain::{Comment, DiscussionId};
use sqlx::FromRow;

/// Comment row plus the display name resolved through the profiles join.
#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub discussion_id: String,
    pub author_id: String,
    pub author_display_name: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub parent_id: Option<String>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        Comment {
            id: sql.id,
            discussion_id: DiscussionId::new_unchecked(sql.discussion_id),
            author_id: sql.author_id,
            author_display_name: sql.author_display_name,
            body: sql.body,
            created_at: sql.created_at,
            parent_id: sql.parent_id,
        }
    }
}
