//! Thread rules against the real SQLite store.

use domains::{CreatePost, DomainError, PostRepo, UpdatePost, Visibility};
use integration_tests::TestApp;

#[tokio::test]
async fn replies_join_the_root_thread_and_inherit_visibility() {
    let app = TestApp::new().await;
    let root = app.note("root", Visibility::Featured).await;

    let reply = app
        .posts()
        .create(CreatePost {
            content: Some("first".into()),
            visibility: Some(Visibility::Draft),
            reply_to_id: Some(root.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(reply.thread_id, Some(root.id));
    assert_eq!(reply.visibility, Visibility::Featured);

    // A reply to a reply still points at the root.
    let nested = app.reply(&reply, "second").await;
    assert_eq!(nested.thread_id, Some(root.id));
    assert_eq!(nested.reply_to_id, Some(reply.id));
    assert_eq!(nested.visibility, Visibility::Featured);
}

#[tokio::test]
async fn root_visibility_change_reaches_every_reply() {
    let app = TestApp::new().await;
    let posts = app.posts();

    // featured root -> reply (inherits featured) -> root to draft -> reply is draft
    let a = app.note("A", Visibility::Featured).await;
    let b = app.reply(&a, "B").await;
    assert_eq!(b.visibility, Visibility::Featured);

    posts
        .update(
            a.id,
            UpdatePost {
                visibility: Some(Visibility::Draft),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let b = app.store.get_post(b.id).await.unwrap().unwrap();
    assert_eq!(b.visibility, Visibility::Draft);

    let thread = posts.thread(a.id).await.unwrap();
    assert_eq!(thread.root.visibility, Visibility::Draft);
    assert!(thread.replies.iter().all(|p| p.visibility == Visibility::Draft));
}

#[tokio::test]
async fn reply_visibility_change_stays_local() {
    let app = TestApp::new().await;
    let root = app.note("root", Visibility::Quiet).await;
    let first = app.reply(&root, "first").await;
    let second = app.reply(&root, "second").await;

    app.posts()
        .update(
            first.id,
            UpdatePost {
                visibility: Some(Visibility::Unlisted),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let root = app.store.get_post(root.id).await.unwrap().unwrap();
    let second = app.store.get_post(second.id).await.unwrap().unwrap();
    assert_eq!(root.visibility, Visibility::Quiet);
    assert_eq!(second.visibility, Visibility::Quiet);
}

#[tokio::test]
async fn deleting_a_root_removes_the_whole_thread() {
    let app = TestApp::new().await;
    let root = app.note("root", Visibility::Quiet).await;
    let reply = app.reply(&root, "reply").await;
    let nested = app.reply(&reply, "nested").await;
    let other = app.note("other", Visibility::Quiet).await;

    let deleted = app.posts().delete(root.id).await.unwrap();
    assert_eq!(deleted, 3);

    for id in [root.id, reply.id, nested.id] {
        let post = app.store.get_post(id).await.unwrap().unwrap();
        assert!(post.deleted_at.is_some(), "post {id} should be deleted");
    }
    let other = app.store.get_post(other.id).await.unwrap().unwrap();
    assert!(other.deleted_at.is_none());

    assert!(matches!(
        app.posts().get(root.id).await,
        Err(DomainError::NotFound(..))
    ));
}

#[tokio::test]
async fn deleting_a_reply_leaves_the_thread() {
    let app = TestApp::new().await;
    let root = app.note("root", Visibility::Quiet).await;
    let first = app.reply(&root, "first").await;
    let second = app.reply(&root, "second").await;

    assert_eq!(app.posts().delete(first.id).await.unwrap(), 1);

    let thread = app.posts().thread(root.id).await.unwrap();
    assert_eq!(thread.replies.len(), 1);
    assert_eq!(thread.replies[0].id, second.id);
    assert!(app.store.get_post(root.id).await.unwrap().unwrap().deleted_at.is_none());
}

#[tokio::test]
async fn replying_to_a_deleted_post_still_resolves_its_thread() {
    let app = TestApp::new().await;
    let root = app.note("root", Visibility::Featured).await;
    let reply = app.reply(&root, "reply").await;
    app.posts().delete(reply.id).await.unwrap();

    let late = app.reply(&reply, "late").await;
    assert_eq!(late.thread_id, Some(root.id));
    assert_eq!(late.visibility, Visibility::Featured);
}

#[tokio::test]
async fn replying_to_a_missing_post_is_not_found() {
    let app = TestApp::new().await;
    let err = app
        .posts()
        .create(CreatePost {
            content: Some("orphan".into()),
            reply_to_id: Some(9_999),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(..)));
}
