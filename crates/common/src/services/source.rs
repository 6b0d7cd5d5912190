//! Source service

use super::{convert_all, BaseService};
use crate::db::SourceRepository;
use crate::dto::Source;
use crate::errors::Result;

pub type SourceService = BaseService<Source, SourceRepository>;

impl BaseService<Source, SourceRepository> {
    pub async fn get_all_by_content(&self, content_id: i32) -> Result<Vec<Source>> {
        convert_all(self.repository().get_by_content(content_id).await?)
    }
}
