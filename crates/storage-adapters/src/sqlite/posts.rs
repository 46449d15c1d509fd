//! Post persistence and full-text search.

use super::{db, from_ts, to_ts, SqliteStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::models::{
    NewPost, PageQuery, Post, PostFilter, PostId, SearchHit, SearchOptions, Visibility,
};
use domains::traits::PostRepo;
use domains::{DomainError, Result};
use sqlx::{QueryBuilder, Sqlite};

const POST_COLUMNS: &str = "p.id, p.post_type, p.visibility, p.title, p.path, p.content, \
     p.content_html, p.source_url, p.source_name, p.source_domain, p.reply_to_id, p.thread_id, \
     p.published_at, p.created_at, p.updated_at, p.deleted_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    post_type: String,
    visibility: String,
    title: Option<String>,
    path: Option<String>,
    content: Option<String>,
    content_html: Option<String>,
    source_url: Option<String>,
    source_name: Option<String>,
    source_domain: Option<String>,
    reply_to_id: Option<i64>,
    thread_id: Option<i64>,
    published_at: i64,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl TryFrom<PostRow> for Post {
    type Error = DomainError;

    fn try_from(row: PostRow) -> Result<Self> {
        Ok(Post {
            id: row.id,
            post_type: row.post_type.parse().map_err(|_| {
                DomainError::Internal(format!("post {} has bad type '{}'", row.id, row.post_type))
            })?,
            visibility: row.visibility.parse().map_err(|_| {
                DomainError::Internal(format!(
                    "post {} has bad visibility '{}'",
                    row.id, row.visibility
                ))
            })?,
            title: row.title,
            path: row.path,
            content: row.content,
            content_html: row.content_html,
            source_url: row.source_url,
            source_name: row.source_name,
            source_domain: row.source_domain,
            reply_to_id: row.reply_to_id,
            thread_id: row.thread_id,
            published_at: from_ts(row.published_at),
            created_at: from_ts(row.created_at),
            updated_at: from_ts(row.updated_at),
            deleted_at: row.deleted_at.map(from_ts),
        })
    }
}

#[derive(sqlx::FromRow)]
struct SearchRow {
    #[sqlx(flatten)]
    post: PostRow,
    snippet: Option<String>,
    score: f64,
}

fn into_posts(rows: Vec<PostRow>) -> Result<Vec<Post>> {
    rows.into_iter().map(Post::try_from).collect()
}

fn push_visibility(qb: &mut QueryBuilder<'_, Sqlite>, allowed: &[Visibility]) {
    qb.push(" AND p.visibility IN (");
    let mut sep = qb.separated(", ");
    for v in allowed {
        sep.push_bind(v.as_str());
    }
    sep.push_unseparated(")");
}

impl SqliteStore {
    async fn fetch_post(&self, id: PostId) -> Result<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?");
        sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(Post::try_from)
            .transpose()
    }
}

#[async_trait]
impl PostRepo for SqliteStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let created = to_ts(post.created_at);
        let id = sqlx::query(
            "INSERT INTO posts (post_type, visibility, title, path, content, content_html, \
             source_url, source_name, source_domain, reply_to_id, thread_id, published_at, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post.post_type.as_str())
        .bind(post.visibility.as_str())
        .bind(post.title)
        .bind(post.path)
        .bind(post.content)
        .bind(post.content_html)
        .bind(post.source_url)
        .bind(post.source_name)
        .bind(post.source_domain)
        .bind(post.reply_to_id)
        .bind(post.thread_id)
        .bind(to_ts(post.published_at))
        .bind(created)
        .bind(created)
        .execute(&self.pool)
        .await
        .map_err(db)?
        .last_insert_rowid();

        self.fetch_post(id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("post {id} vanished after insert")))
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>> {
        self.fetch_post(id).await
    }

    async fn get_post_by_path(&self, path: &str) -> Result<Option<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE p.path = ? AND p.deleted_at IS NULL ORDER BY p.id DESC LIMIT 1"
        );
        sqlx::query_as::<_, PostRow>(&sql)
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(Post::try_from)
            .transpose()
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "UPDATE posts SET post_type = ?, visibility = ?, title = ?, path = ?, content = ?, \
             content_html = ?, source_url = ?, source_name = ?, source_domain = ?, \
             published_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(post.post_type.as_str())
        .bind(post.visibility.as_str())
        .bind(&post.title)
        .bind(&post.path)
        .bind(&post.content)
        .bind(&post.content_html)
        .bind(&post.source_url)
        .bind(&post.source_name)
        .bind(&post.source_domain)
        .bind(to_ts(post.published_at))
        .bind(to_ts(post.updated_at))
        .bind(post.id)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn cascade_visibility(
        &self,
        root_id: PostId,
        visibility: Visibility,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let result =
            sqlx::query("UPDATE posts SET visibility = ?, updated_at = ? WHERE thread_id = ?")
                .bind(visibility.as_str())
                .bind(to_ts(at))
                .bind(root_id)
                .execute(&self.pool)
                .await
                .map_err(db)?;
        Ok(result.rows_affected())
    }

    async fn soft_delete_post(&self, id: PostId, at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE posts SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(to_ts(at))
        .bind(to_ts(at))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected())
    }

    async fn soft_delete_thread(&self, root_id: PostId, at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE posts SET deleted_at = ?, updated_at = ? \
             WHERE (id = ? OR thread_id = ?) AND deleted_at IS NULL",
        )
        .bind(to_ts(at))
        .bind(to_ts(at))
        .bind(root_id)
        .bind(root_id)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(result.rows_affected())
    }

    async fn list_posts(&self, filter: &PostFilter, page: PageQuery) -> Result<Vec<Post>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS).push(" FROM posts p");

        if let Some(collection_id) = filter.collection_id {
            qb.push(" JOIN collection_posts cp ON cp.post_id = p.id AND cp.collection_id = ")
                .push_bind(collection_id);
        }

        qb.push(" WHERE 1 = 1");
        if !filter.include_deleted {
            qb.push(" AND p.deleted_at IS NULL");
        }
        if let Some(post_type) = filter.post_type {
            qb.push(" AND p.post_type = ").push_bind(post_type.as_str());
        }
        if let Some(allowed) = &filter.visibility {
            if allowed.is_empty() {
                return Ok(Vec::new());
            }
            push_visibility(&mut qb, allowed);
        }
        if filter.exclude_replies {
            qb.push(" AND p.thread_id IS NULL");
        }
        if let Some(thread_id) = filter.thread_id {
            qb.push(" AND p.thread_id = ").push_bind(thread_id);
        }
        if let Some(cursor) = page.cursor {
            qb.push(" AND p.id < ").push_bind(cursor);
        }

        qb.push(" ORDER BY p.published_at DESC, p.id DESC LIMIT ")
            .push_bind(i64::from(page.limit));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        into_posts(rows)
    }

    async fn thread_replies(&self, root_id: PostId) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE p.thread_id = ? AND p.deleted_at IS NULL \
             ORDER BY p.published_at ASC, p.id ASC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(root_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
        into_posts(rows)
    }

    async fn search_posts(&self, match_expr: &str, opts: &SearchOptions) -> Result<Vec<SearchHit>> {
        if opts.visibility.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(
            ", snippet(posts_fts, -1, '<mark>', '</mark>', '…', 24) AS snippet, \
             bm25(posts_fts) AS score \
             FROM posts_fts JOIN posts p ON p.id = posts_fts.rowid \
             WHERE posts_fts MATCH ",
        );
        qb.push_bind(match_expr.to_string());
        // Soft-deleted rows stay in the index; the join filters them out.
        qb.push(" AND p.deleted_at IS NULL");
        push_visibility(&mut qb, &opts.visibility);
        qb.push(" ORDER BY score ASC, p.id DESC LIMIT ")
            .push_bind(i64::from(opts.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(opts.offset));

        let rows = qb
            .build_query_as::<SearchRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        rows.into_iter()
            .map(|row| {
                Ok(SearchHit {
                    post: Post::try_from(row.post)?,
                    snippet: row.snippet.unwrap_or_default(),
                    rank: row.score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::models::PostType;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn note(content: &str, published: i64) -> NewPost {
        NewPost {
            post_type: PostType::Note,
            visibility: Visibility::Quiet,
            title: None,
            path: None,
            content: Some(content.to_string()),
            content_html: Some(format!("<p>{content}</p>")),
            source_url: None,
            source_name: None,
            source_domain: None,
            reply_to_id: None,
            thread_id: None,
            published_at: at(published),
            created_at: at(published),
        }
    }

    fn reply_to(parent: &Post, content: &str, published: i64) -> NewPost {
        NewPost {
            reply_to_id: Some(parent.id),
            thread_id: Some(parent.root_id()),
            ..note(content, published)
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut new = note("hello world", 1_000);
        new.post_type = PostType::Article;
        new.title = Some("Hello".into());
        new.path = Some("hello".into());

        let post = store.insert_post(new).await.unwrap();
        assert_eq!(post.post_type, PostType::Article);
        assert_eq!(post.published_at, at(1_000));
        assert!(post.is_root());

        let fetched = store.get_post(post.id).await.unwrap().unwrap();
        assert_eq!(fetched, post);
        let by_path = store.get_post_by_path("hello").await.unwrap().unwrap();
        assert_eq!(by_path.id, post.id);
    }

    #[tokio::test]
    async fn cascade_touches_only_the_thread() {
        let store = SqliteStore::in_memory().await.unwrap();
        let root = store.insert_post(note("root", 1)).await.unwrap();
        let reply = store.insert_post(reply_to(&root, "reply", 2)).await.unwrap();
        let other = store.insert_post(note("other", 3)).await.unwrap();

        let touched = store
            .cascade_visibility(root.id, Visibility::Draft, at(10))
            .await
            .unwrap();
        assert_eq!(touched, 1);

        let reply = store.get_post(reply.id).await.unwrap().unwrap();
        assert_eq!(reply.visibility, Visibility::Draft);
        let other = store.get_post(other.id).await.unwrap().unwrap();
        assert_eq!(other.visibility, Visibility::Quiet);
    }

    #[tokio::test]
    async fn thread_delete_hides_every_row() {
        let store = SqliteStore::in_memory().await.unwrap();
        let root = store.insert_post(note("root", 1)).await.unwrap();
        let first = store.insert_post(reply_to(&root, "a", 2)).await.unwrap();
        store.insert_post(reply_to(&first, "b", 3)).await.unwrap();

        let deleted = store.soft_delete_thread(root.id, at(9)).await.unwrap();
        assert_eq!(deleted, 3);
        assert!(store.thread_replies(root.id).await.unwrap().is_empty());
        let listed = store
            .list_posts(&PostFilter::default(), PageQuery { cursor: None, limit: 10 })
            .await
            .unwrap();
        assert!(listed.is_empty());
        // Deleted rows remain fetchable by id
        assert!(store.get_post(root.id).await.unwrap().unwrap().is_deleted());
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_honours_cursor() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.insert_post(note(&format!("n{i}"), 100 + i)).await.unwrap().id);
        }

        let first = store
            .list_posts(&PostFilter::default(), PageQuery { cursor: None, limit: 2 })
            .await
            .unwrap();
        assert_eq!(first.iter().map(|p| p.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);

        let next = store
            .list_posts(&PostFilter::default(), PageQuery { cursor: Some(ids[3]), limit: 10 })
            .await
            .unwrap();
        assert_eq!(next.iter().map(|p| p.id).collect::<Vec<_>>(), vec![ids[2], ids[1], ids[0]]);
    }

    #[tokio::test]
    async fn list_filters_by_visibility_and_roots() {
        let store = SqliteStore::in_memory().await.unwrap();
        let root = store.insert_post(note("root", 1)).await.unwrap();
        store.insert_post(reply_to(&root, "reply", 2)).await.unwrap();
        let mut draft = note("draft", 3);
        draft.visibility = Visibility::Draft;
        store.insert_post(draft).await.unwrap();

        let filter = PostFilter {
            visibility: Some(Visibility::LISTED.to_vec()),
            exclude_replies: true,
            ..PostFilter::default()
        };
        let listed = store
            .list_posts(&filter, PageQuery { cursor: None, limit: 10 })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, root.id);
    }

    #[tokio::test]
    async fn search_matches_prefix_and_skips_deleted() {
        let store = SqliteStore::in_memory().await.unwrap();
        let kept = store.insert_post(note("rustaceans gather here", 1)).await.unwrap();
        let gone = store.insert_post(note("rust everywhere", 2)).await.unwrap();
        store.insert_post(note("nothing to see", 3)).await.unwrap();
        store.soft_delete_post(gone.id, at(5)).await.unwrap();

        let hits = store
            .search_posts("\"rust\"*", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post.id, kept.id);
        assert!(hits[0].snippet.contains("<mark>"));
    }

    #[tokio::test]
    async fn search_respects_visibility_allow_list() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut unlisted = note("hidden gem", 1);
        unlisted.visibility = Visibility::Unlisted;
        store.insert_post(unlisted).await.unwrap();

        let public = store
            .search_posts("\"gem\"*", &SearchOptions::default())
            .await
            .unwrap();
        assert!(public.is_empty());

        let opts = SearchOptions {
            visibility: vec![Visibility::Unlisted],
            ..SearchOptions::default()
        };
        let all = store.search_posts("\"gem\"*", &opts).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn edited_content_is_reindexed() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut post = store.insert_post(note("old words", 1)).await.unwrap();
        post.content = Some("fresh words".into());
        post.updated_at = at(2);
        store.update_post(&post).await.unwrap();

        let opts = SearchOptions::default();
        assert!(store.search_posts("\"old\"*", &opts).await.unwrap().is_empty());
        assert_eq!(store.search_posts("\"fresh\"*", &opts).await.unwrap().len(), 1);
    }
}
