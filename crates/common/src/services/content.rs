//! Content service

use super::BaseService;
use crate::db::models::{ContentCategory, ContentEntity, ContentModel, SourceModel};
use crate::db::{ContentRepository, SourceKey};
use crate::dto::Content;
use crate::errors::{AppError, Result};
use sea_orm::Select;
use tracing::debug;

pub type ContentService = BaseService<Content, ContentRepository>;

/// Reads that embed each item's sources
impl BaseService<Content, ContentRepository> {
    async fn load(&self, select: Select<ContentEntity>) -> Result<Vec<Content>> {
        self.repository()
            .query_with_sources(select)
            .await?
            .into_iter()
            .map(|(content, sources): (ContentModel, Vec<SourceModel>)| {
                Content::with_sources(content, sources)
            })
            .collect()
    }

    pub async fn get_with_sources(&self, id: i32) -> Result<Option<Content>> {
        let select = self.repository().by_id(id);
        Ok(self.load(select).await?.into_iter().next())
    }

    pub async fn get_all_with_sources(&self) -> Result<Vec<Content>> {
        self.load(self.repository().ordered()).await
    }

    pub async fn get_all_by_category(&self, category: ContentCategory) -> Result<Vec<Content>> {
        debug!(category = %category, "Listing content by category");
        self.load(self.repository().by_category(category)).await
    }

    /// The content a given source belongs to
    pub async fn get_by_source(&self, key: &SourceKey) -> Result<Option<Content>> {
        debug!(source = %key, "Looking up content by source");
        let select = self.repository().by_source(key);
        Ok(self.load(select).await?.into_iter().next())
    }

    /// Stamp the item as renewed now and return it with its sources
    pub async fn renew(&self, id: i32) -> Result<Content> {
        self.repository().renew(id).await?;
        self.get_with_sources(id)
            .await?
            .ok_or_else(|| AppError::not_found("content", id))
    }
}
