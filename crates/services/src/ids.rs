//! Short public ids for posts.

use domains::{DomainError, Post, PostId, Result};
use sqids::Sqids;

/// Encodes post ids as sqids for `/p/{sqid}` URLs.
pub struct IdCodec {
    sqids: Sqids,
}

impl IdCodec {
    pub fn new(min_length: u8) -> Result<Self> {
        let sqids = Sqids::builder()
            .min_length(min_length)
            .build()
            .map_err(DomainError::internal)?;
        Ok(Self { sqids })
    }

    pub fn encode(&self, id: PostId) -> Result<String> {
        let id = u64::try_from(id)
            .map_err(|_| DomainError::validation(format!("cannot encode negative id {id}")))?;
        self.sqids.encode(&[id]).map_err(DomainError::internal)
    }

    /// Decodes a sqid; only the canonical encoding of a single id is accepted.
    pub fn decode(&self, sqid: &str) -> Option<PostId> {
        let numbers = self.sqids.decode(sqid);
        let [id] = numbers.as_slice() else {
            return None;
        };
        let canonical = self.sqids.encode(&[*id]).ok()?;
        if canonical != sqid {
            return None;
        }
        PostId::try_from(*id).ok()
    }

    /// Site-relative URL of a post: its custom path when set, else `/p/{sqid}`.
    pub fn post_path(&self, post: &Post) -> Result<String> {
        match &post.path {
            Some(path) => Ok(format!("/{path}")),
            None => Ok(format!("/p/{}", self.encode(post.id)?)),
        }
    }
}
