use crate::Db;
use chrono::Utc;

impl Db {
    /// The one place a user id maps to a display name. Readers COALESCE to
    /// the placeholder, so a missing or empty profile never surfaces as an
    /// error downstream.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> anyhow::Result<()> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, display_name, last_updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                display_name = excluded.display_name,
                last_updated_at = excluded.last_updated_at
            "#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
