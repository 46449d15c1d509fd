//! # seed
//!
//! Operator helper.
//!
//! ```text
//! seed --hash-token <token>   print the argon2 hash for auth.api_token_hash
//! seed                        load demo content into the configured database
//! ```

use anyhow::{bail, Context};
use configs::AppConfig;
use domains::{CollectionInput, CreatePost, PostType, UpdatePost, Visibility};
use services::{CollectionService, PostService, RedirectInput, RedirectService};
use std::sync::Arc;
use storage_adapters::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag, token] if flag == "--hash-token" => {
            let hash = auth_adapters::hash_token(token).context("hashing token")?;
            println!("{hash}");
            Ok(())
        }
        [] => seed().await,
        _ => bail!("usage: seed [--hash-token <token>]"),
    }
}

async fn seed() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let store = Arc::new(
        SqliteStore::connect(&config.database.url, config.database.max_connections)
            .await
            .with_context(|| format!("opening database {}", config.database.url))?,
    );

    let posts = PostService::new(store.clone());
    let about = posts
        .create(CreatePost {
            post_type: Some(PostType::Page),
            visibility: Some(Visibility::Unlisted),
            title: Some("About".into()),
            path: Some("about".into()),
            content: Some("This site runs on **Jant**.".into()),
            ..Default::default()
        })
        .await
        .context("creating about page")?;

    let root = posts
        .create(CreatePost {
            visibility: Some(Visibility::Featured),
            content: Some("Hello, world! This is the first note.".into()),
            ..Default::default()
        })
        .await
        .context("creating first note")?;

    posts
        .create(CreatePost {
            content: Some("And a reply, which joins the thread above.".into()),
            reply_to_id: Some(root.id),
            ..Default::default()
        })
        .await
        .context("creating reply")?;

    let link = posts
        .create(CreatePost {
            post_type: Some(PostType::Link),
            title: Some("The Rust Programming Language".into()),
            source_url: Some("https://doc.rust-lang.org/book/".into()),
            content: Some("Still the best place to start.".into()),
            ..Default::default()
        })
        .await
        .context("creating link")?;

    let draft = posts
        .create(CreatePost {
            post_type: Some(PostType::Article),
            visibility: Some(Visibility::Draft),
            title: Some("Work in progress".into()),
            content: Some("Not ready yet.".into()),
            ..Default::default()
        })
        .await
        .context("creating draft")?;
    posts
        .update(
            draft.id,
            UpdatePost {
                content: Some("Still not ready.".into()),
                ..Default::default()
            },
        )
        .await
        .context("editing draft")?;

    let collections = CollectionService::new(store.clone(), store.clone());
    let reading = collections
        .create(CollectionInput {
            title: Some("Reading list".into()),
            description: Some("Links worth keeping.".into()),
            ..Default::default()
        })
        .await
        .context("creating collection")?;
    collections
        .add_post(reading.id, link.id)
        .await
        .context("filling collection")?;

    RedirectService::new(store)
        .create(RedirectInput {
            from_path: "/me".into(),
            to_path: format!("/{}", about.path.as_deref().unwrap_or("about")),
            redirect_type: None,
        })
        .await
        .context("creating redirect")?;

    tracing::info!(root_id = root.id, collection = %reading.slug, "seeded demo content");
    Ok(())
}
