use crate::{models::SqlComment, Db};
use chrono::Utc;
use domain::{Comment, DiscussionId, DiscussionKind, FALLBACK_AUTHOR_NAME};

impl Db {
    /// Stores a new comment, assigning its id and timestamp here. The owning
    /// discussion row is created on first use.
    pub async fn insert_comment(
        &self,
        discussion_id: &DiscussionId,
        kind: DiscussionKind,
        author_id: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> anyhow::Result<Comment> {
        let id = format!("c{:032x}", rand::random::<u128>());
        let created_at = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO discussions (id, kind)
            VALUES (?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(discussion_id.as_str())
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO comments (id, discussion_id, author_id, body, created_at, parent_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(discussion_id.as_str())
        .bind(author_id)
        .bind(body)
        .bind(created_at)
        .bind(parent_id)
        .execute(&mut *tx)
        .await?;

        let display_name: Option<Option<String>> =
            sqlx::query_scalar("SELECT display_name FROM profiles WHERE user_id = ?")
                .bind(author_id)
                .fetch_optional(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(Comment {
            id,
            discussion_id: discussion_id.clone(),
            author_id: author_id.to_owned(),
            author_display_name: display_name
                .flatten()
                .unwrap_or_else(|| FALLBACK_AUTHOR_NAME.to_owned()),
            body: body.to_owned(),
            created_at,
            parent_id: parent_id.map(str::to_owned),
        })
    }

    pub async fn get_comment(&self, comment_id: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                c.id, c.discussion_id, c.author_id,
                COALESCE(p.display_name, ?) AS author_display_name,
                c.body, c.created_at, c.parent_id
            FROM comments c
            LEFT JOIN profiles p ON p.user_id = c.author_id
            WHERE c.id = ?
            "#,
        )
        .bind(FALLBACK_AUTHOR_NAME)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Every comment of one discussion, display names resolved. The tree
    /// builder needs the complete flat set, so there is no pagination; the
    /// row order is irrelevant to the builder.
    pub async fn list_comments(&self, discussion_id: &str) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                c.id, c.discussion_id, c.author_id,
                COALESCE(p.display_name, ?) AS author_display_name,
                c.body, c.created_at, c.parent_id
            FROM comments c
            LEFT JOIN profiles p ON p.user_id = c.author_id
            WHERE c.discussion_id = ?
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(FALLBACK_AUTHOR_NAME)
        .bind(discussion_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Hard delete. Replies keep their `parent_id` and come back as roots
    /// from the tree builder.
    pub async fn delete_comment(&self, comment_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
