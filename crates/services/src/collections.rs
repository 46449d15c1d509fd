//! Collections: curated groups of posts addressed by slug.

use crate::paths::slugify;
use crate::posts::PostService;
use chrono::Utc;
use domains::{
    Collection, CollectionId, CollectionInput, CollectionRepo, DomainError, NewCollection, Page,
    Post, PostFilter, PostId, PostRepo, Result,
};
use std::sync::Arc;

pub struct CollectionService {
    collections: Arc<dyn CollectionRepo>,
    posts: Arc<dyn PostRepo>,
}

impl CollectionService {
    pub fn new(collections: Arc<dyn CollectionRepo>, posts: Arc<dyn PostRepo>) -> Self {
        Self { collections, posts }
    }

    async fn require(&self, id: CollectionId) -> Result<Collection> {
        self.collections
            .get_collection(id)
            .await?
            .ok_or_else(|| DomainError::not_found("collection", id))
    }

    async fn ensure_slug_free(&self, slug: &str, owner: Option<CollectionId>) -> Result<()> {
        match self.collections.get_collection_by_slug(slug).await? {
            Some(existing) if Some(existing.id) != owner => Err(DomainError::Conflict(format!(
                "collection slug '{slug}' is already taken"
            ))),
            _ => Ok(()),
        }
    }

    /// Creates a collection; the slug defaults to the slugified title.
    pub async fn create(&self, input: CollectionInput) -> Result<Collection> {
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::validation("collections require a title"))?;
        let slug = slugify(input.slug.as_deref().unwrap_or(&title));
        if slug.is_empty() {
            return Err(DomainError::validation(
                "collection slug must contain letters or digits",
            ));
        }
        self.ensure_slug_free(&slug, None).await?;

        let collection = self
            .collections
            .insert_collection(NewCollection {
                title,
                slug,
                description: input.description.filter(|d| !d.trim().is_empty()),
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(collection_id = collection.id, slug = %collection.slug, "collection created");
        Ok(collection)
    }

    pub async fn update(&self, id: CollectionId, input: CollectionInput) -> Result<Collection> {
        let mut collection = self.require(id).await?;

        if let Some(title) = input.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(DomainError::validation("collections require a title"));
            }
            collection.title = title.to_string();
        }
        if let Some(slug) = input.slug {
            let slug = slugify(&slug);
            if slug.is_empty() {
                return Err(DomainError::validation(
                    "collection slug must contain letters or digits",
                ));
            }
            self.ensure_slug_free(&slug, Some(id)).await?;
            collection.slug = slug;
        }
        if let Some(description) = input.description {
            collection.description = (!description.trim().is_empty()).then_some(description);
        }

        collection.updated_at = Utc::now();
        self.collections.update_collection(&collection).await?;
        Ok(collection)
    }

    pub async fn delete(&self, id: CollectionId) -> Result<()> {
        if !self.collections.delete_collection(id).await? {
            return Err(DomainError::not_found("collection", id));
        }
        tracing::info!(collection_id = id, "collection deleted");
        Ok(())
    }

    pub async fn get(&self, id: CollectionId) -> Result<Collection> {
        self.require(id).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Collection> {
        self.collections
            .get_collection_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("collection", slug))
    }

    pub async fn list(&self) -> Result<Vec<Collection>> {
        self.collections.list_collections().await
    }

    /// Adds a live post to the collection. Adding twice is a no-op.
    pub async fn add_post(&self, id: CollectionId, post_id: PostId) -> Result<()> {
        self.require(id).await?;
        match self.posts.get_post(post_id).await? {
            Some(post) if !post.is_deleted() => {}
            _ => return Err(DomainError::not_found("post", post_id)),
        }
        self.collections.add_post(id, post_id, Utc::now()).await
    }

    pub async fn remove_post(&self, id: CollectionId, post_id: PostId) -> Result<()> {
        if !self.collections.remove_post(id, post_id).await? {
            return Err(DomainError::not_found("collection post", post_id));
        }
        Ok(())
    }

    /// Posts of a collection, paginated like every other post listing.
    pub async fn posts(
        &self,
        id: CollectionId,
        mut filter: PostFilter,
        cursor: Option<PostId>,
        limit: Option<u32>,
    ) -> Result<Page<Post>> {
        self.require(id).await?;
        filter.collection_id = Some(id);
        PostService::new(self.posts.clone())
            .list(&filter, cursor, limit)
            .await
    }
}
