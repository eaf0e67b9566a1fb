use axum::extract::FromRef;
use domain::DiscussionEvent;
use storage::Db;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub tx_events: broadcast::Sender<DiscussionEvent>,
    pub max_comment_length: usize,
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
