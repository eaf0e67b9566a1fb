use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDateTime;
use domain::{
    build_tree_ordered, flatten_for_display, Comment, CommentNode, CommentOrder, DiscussionEvent,
    DiscussionId, DiscussionKind,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

type ApiError = (StatusCode, String);

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub order: CommentOrder,
    #[serde(default)]
    pub flat: bool,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub author_id: String,
    pub author_name: Option<String>,
    pub body: String,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub kind: DiscussionKind,
}

/// A `CommentNode` dressed for the wire: depth kept, plus the `can_reply`
/// flag the client uses to hide the reply affordance past the nesting cap.
#[derive(Serialize)]
pub struct CommentNodeView {
    pub id: String,
    pub author_id: String,
    pub author_display_name: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub parent_id: Option<String>,
    pub depth: usize,
    pub can_reply: bool,
    pub replies: Vec<CommentNodeView>,
}

impl From<CommentNode> for CommentNodeView {
    fn from(node: CommentNode) -> Self {
        let can_reply = node.accepts_replies();
        let CommentNode {
            comment,
            depth,
            replies,
        } = node;
        Self {
            id: comment.id,
            author_id: comment.author_id,
            author_display_name: comment.author_display_name,
            body: comment.body,
            created_at: comment.created_at,
            parent_id: comment.parent_id,
            depth,
            can_reply,
            replies: replies.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct CommentThreadResponse {
    pub discussion_id: String,
    pub total: usize,
    pub comments: Vec<CommentNodeView>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(discussion_id_str): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CommentThreadResponse>, ApiError> {
    if DiscussionId::new(&discussion_id_str).is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Invalid discussion id format".to_string(),
        ));
    }

    // A fetch failure must surface as an error, never as an empty thread.
    let comments = state
        .db
        .list_comments(&discussion_id_str)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let total = comments.len();
    let forest = build_tree_ordered(comments, query.order);
    let forest = if query.flat {
        flatten_for_display(forest)
    } else {
        forest
    };

    Ok(Json(CommentThreadResponse {
        discussion_id: discussion_id_str,
        total,
        comments: forest.into_iter().map(Into::into).collect(),
    }))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Path(discussion_id_str): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let discussion_id = DiscussionId::new(discussion_id_str)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let body = payload.body.trim();
    if body.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Comment body is empty".to_string(),
        ));
    }
    if body.chars().count() > state.max_comment_length {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Comment body exceeds {} characters", state.max_comment_length),
        ));
    }

    // Replying to a comment that is gone (or from another discussion) is
    // rejected here; stale links already in storage are tolerated at read
    // time instead.
    if let Some(ref parent_id) = payload.parent_id {
        let parent = state
            .db
            .get_comment(parent_id)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
            .ok_or((
                StatusCode::NOT_FOUND,
                format!("Parent comment not found: {}", parent_id),
            ))?;
        if parent.discussion_id != discussion_id {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                "Parent comment belongs to another discussion".to_string(),
            ));
        }
    }

    if let Some(ref name) = payload.author_name {
        state
            .db
            .upsert_profile(&payload.author_id, Some(name))
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    }

    let comment = state
        .db
        .insert_comment(
            &discussion_id,
            payload.kind,
            &payload.author_id,
            body,
            payload.parent_id.as_deref(),
        )
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    // Nobody listening is fine.
    let _ = state.tx_events.send(DiscussionEvent::CommentPosted {
        discussion_id,
        comment: comment.clone(),
    });

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((discussion_id_str, comment_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, ApiError> {
    let author_id = headers
        .get("X-Author-Id")
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing X-Author-Id header".to_string(),
        ))?;

    let comment = state
        .db
        .get_comment(&comment_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "Comment not found".to_string()))?;

    if comment.discussion_id.as_str() != discussion_id_str {
        return Err((StatusCode::NOT_FOUND, "Comment not found".to_string()));
    }
    if comment.author_id != author_id {
        return Err((
            StatusCode::FORBIDDEN,
            "Only the author may delete a comment".to_string(),
        ));
    }

    state
        .db
        .delete_comment(&comment_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!(
        "Comment deleted: discussion={} id={}",
        discussion_id_str,
        comment_id
    );

    let _ = state.tx_events.send(DiscussionEvent::CommentDeleted {
        discussion_id: comment.discussion_id,
        comment_id,
    });

    Ok(Json("Deleted"))
}
