use domain::{build_tree, DiscussionId, DiscussionKind, FALLBACK_AUTHOR_NAME};
use storage::Db;

async fn open_db(dir: &tempfile::TempDir) -> Db {
    let url = format!("sqlite://{}/comments.db", dir.path().display());
    Db::new(&url).await.expect("db setup")
}

fn discussion(id: &str) -> DiscussionId {
    DiscussionId::new(id).expect("valid discussion id")
}

#[tokio::test]
async fn display_name_falls_back_to_placeholder_until_profile_exists() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir).await;
    let review = discussion("review-1");

    let posted = db
        .insert_comment(&review, DiscussionKind::Review, "user-1", "nice landlord", None)
        .await
        .unwrap();
    assert_eq!(posted.author_display_name, FALLBACK_AUTHOR_NAME);

    db.upsert_profile("user-1", Some("Ana")).await.unwrap();

    let listed = db.list_comments(review.as_str()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].author_display_name, "Ana");
    assert_eq!(listed[0].body, "nice landlord");
}

#[tokio::test]
async fn get_comment_returns_none_for_unknown_id() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir).await;

    assert!(db.get_comment("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn listing_is_scoped_to_one_discussion() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir).await;
    let review = discussion("review-1");
    let post = discussion("post-1");

    db.insert_comment(&review, DiscussionKind::Review, "user-1", "about the review", None)
        .await
        .unwrap();
    db.insert_comment(&post, DiscussionKind::ForumPost, "user-2", "about the post", None)
        .await
        .unwrap();

    let listed = db.list_comments(review.as_str()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].discussion_id, review);
}

#[tokio::test]
async fn deleting_a_parent_promotes_its_replies_to_roots() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir).await;
    let review = discussion("review-1");

    let root = db
        .insert_comment(&review, DiscussionKind::Review, "user-1", "root", None)
        .await
        .unwrap();
    let reply = db
        .insert_comment(
            &review,
            DiscussionKind::Review,
            "user-2",
            "reply",
            Some(root.id.as_str()),
        )
        .await
        .unwrap();

    assert!(db.delete_comment(&root.id).await.unwrap());
    assert!(!db.delete_comment(&root.id).await.unwrap());

    let remaining = db.list_comments(review.as_str()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    // the stale parent link survives in storage...
    assert_eq!(remaining[0].parent_id.as_deref(), Some(root.id.as_str()));

    // ...and the tree builder renders the orphan as a root instead of
    // dropping it
    let forest = build_tree(remaining);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].comment.id, reply.id);
    assert_eq!(forest[0].depth, 0);
}
