use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use domain::DiscussionEvent;
use futures::stream::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

/// One stream per open discussion view; events only tell the client that its
/// copy of the thread is stale and a re-fetch is due.
pub async fn sse_handler(
    State(state): State<AppState>,
    Path(discussion_id_str): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.tx_events.subscribe();
    tracing::info!("SSE connected: discussion={}", discussion_id_str);

    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(DiscussionEvent::CommentPosted {
            discussion_id,
            comment,
        }) if discussion_id.as_str() == discussion_id_str => Some(
            Event::default()
                .event("comment_posted")
                .json_data(comment)
                .map_err(|e| {
                    tracing::error!("SSE serialization error: {}", e);
                    axum::Error::new(e)
                }),
        ),
        Ok(DiscussionEvent::CommentDeleted {
            discussion_id,
            comment_id,
        }) if discussion_id.as_str() == discussion_id_str => Some(
            Event::default()
                .event("comment_deleted")
                .json_data(serde_json::json!({ "id": comment_id }))
                .map_err(|e| {
                    tracing::error!("SSE serialization error: {}", e);
                    axum::Error::new(e)
                }),
        ),
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}
