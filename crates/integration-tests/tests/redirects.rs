//! Path fallback: custom post paths, then redirects, then 404.

use axum::http::{header, StatusCode};
use domains::{CreatePost, PostType, RedirectType, Visibility};
use integration_tests::TestApp;
use services::RedirectInput;

fn redirect(from: &str, to: &str, kind: Option<RedirectType>) -> RedirectInput {
    RedirectInput {
        from_path: from.into(),
        to_path: to.into(),
        redirect_type: kind,
    }
}

#[tokio::test]
async fn custom_post_paths_render_the_post() {
    let app = TestApp::new().await;
    app.posts()
        .create(CreatePost {
            post_type: Some(PostType::Page),
            visibility: Some(Visibility::Unlisted),
            title: Some("About me".into()),
            path: Some("/About/".into()),
            content: Some("Hello from the about page.".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let (status, html) = app.get_text("/about").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("About me"));
    assert!(html.contains("Hello from the about page."));
}

#[tokio::test]
async fn draft_paths_are_not_served() {
    let app = TestApp::new().await;
    app.posts()
        .create(CreatePost {
            visibility: Some(Visibility::Draft),
            path: Some("secret".into()),
            content: Some("not yet".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let (status, html) = app.get_text("/secret").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!html.contains("not yet"));
}

#[tokio::test]
async fn redirects_answer_with_their_status_and_location() {
    let app = TestApp::new().await;
    let redirects = app.redirects();
    redirects
        .create(redirect("/old", "/new", None))
        .await
        .unwrap();
    redirects
        .create(redirect("/promo/", "https://example.org/sale", Some(RedirectType::Temporary)))
        .await
        .unwrap();

    let response = app.get("/old").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()[header::LOCATION], "/new");

    // Trailing slashes are normalized on both sides.
    let response = app.get("/promo/").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "https://example.org/sale");
}

#[tokio::test]
async fn a_post_path_wins_over_a_redirect() {
    let app = TestApp::new().await;
    app.redirects()
        .create(redirect("/now", "/elsewhere", None))
        .await
        .unwrap();
    app.posts()
        .create(CreatePost {
            path: Some("now".into()),
            content: Some("What I'm doing now".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let (status, html) = app.get_text("/now").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("doing now"));
}

#[tokio::test]
async fn saving_the_same_source_replaces_the_target() {
    let app = TestApp::new().await;
    let redirects = app.redirects();
    redirects.create(redirect("/me", "/about", None)).await.unwrap();
    redirects
        .create(redirect("me", "/profile", Some(RedirectType::Temporary)))
        .await
        .unwrap();

    let all = redirects.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].to_path, "/profile");

    let response = app.get("/me").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/profile");
}

#[tokio::test]
async fn self_redirects_are_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .api(
            "POST",
            "/api/redirects",
            Some(serde_json::json!({ "from_path": "/loop", "to_path": "/loop/" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn redirects_api_round_trip() {
    let app = TestApp::new().await;
    let (status, created) = app
        .api(
            "POST",
            "/api/redirects",
            Some(serde_json::json!({ "from_path": "/feed.xml", "to_path": "/feed", "type": 302 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["type"], 302);
    let id = created["id"].as_i64().unwrap();

    let (status, list) = app.api("GET", "/api/redirects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, _) = app.api("DELETE", &format!("/api/redirects/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/feed.xml").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_paths_render_the_not_found_page() {
    let app = TestApp::new().await;
    let (status, html) = app.get_text("/nothing/here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("Not found"));
    assert!(html.contains("<html"));
}
