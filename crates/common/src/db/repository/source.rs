//! Source repository: composite-keyed provenance rows

use super::BaseRepository;
use crate::db::models::{SourceActiveModel, SourceColumn, SourceModel};
use crate::errors::Result;
use sea_orm::{ColumnTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type SourceRepository = BaseRepository<SourceActiveModel>;

/// Composite key of a source row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceKey {
    pub name: String,
    pub id: i32,
}

impl SourceKey {
    pub fn new(name: impl Into<String>, id: i32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.id)
    }
}

impl From<SourceKey> for (String, i32) {
    fn from(key: SourceKey) -> Self {
        (key.name, key.id)
    }
}

impl From<&SourceModel> for SourceKey {
    fn from(model: &SourceModel) -> Self {
        Self::new(model.name.clone(), model.id)
    }
}

impl BaseRepository<SourceActiveModel> {
    /// Sources of one content item, in key order
    pub async fn get_by_content(&self, content_id: i32) -> Result<Vec<SourceModel>> {
        let select = self
            .ordered()
            .filter(SourceColumn::ContentId.eq(content_id));
        self.query(select).await
    }
}
