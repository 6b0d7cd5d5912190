//! Content repository: the generic CRUD plus category and source lookups

use super::{BaseRepository, Repository, SourceKey};
use crate::db::models::{
    ContentActiveModel, ContentCategory, ContentColumn, ContentEntity, ContentModel,
    SourceColumn, SourceEntity, SourceModel,
};
use crate::errors::Result;
use sea_orm::sea_query::Query;
use sea_orm::{ColumnTrait, QueryFilter, Select, Set};

pub type ContentRepository = BaseRepository<ContentActiveModel>;

impl BaseRepository<ContentActiveModel> {
    /// Select one content item by id
    pub fn by_id(&self, id: i32) -> Select<ContentEntity> {
        self.ordered().filter(ContentColumn::Id.eq(id))
    }

    /// Select all content of one category, in id order
    pub fn by_category(&self, category: ContentCategory) -> Select<ContentEntity> {
        self.ordered()
            .filter(ContentColumn::ContentType.eq(category.as_str()))
    }

    /// Select the content owning the source with the given composite key
    pub fn by_source(&self, key: &SourceKey) -> Select<ContentEntity> {
        let owner = Query::select()
            .column(SourceColumn::ContentId)
            .from(SourceEntity)
            .and_where(SourceColumn::Name.eq(key.name.as_str()))
            .and_where(SourceColumn::Id.eq(key.id))
            .to_owned();

        self.ordered().filter(ContentColumn::Id.in_subquery(owner))
    }

    pub async fn get_by_category(&self, category: ContentCategory) -> Result<Vec<ContentModel>> {
        self.query(self.by_category(category)).await
    }

    pub async fn get_by_source(&self, key: &SourceKey) -> Result<Option<ContentModel>> {
        self.query_one(self.by_source(key)).await
    }

    /// Run a content select with each row's sources loaded alongside, in one
    /// read transaction. `select` must be ordered by id.
    pub async fn query_with_sources(
        &self,
        select: Select<ContentEntity>,
    ) -> Result<Vec<(ContentModel, Vec<SourceModel>)>> {
        let timer = self.timer("query_with_sources");
        let result: Result<Vec<(ContentModel, Vec<SourceModel>)>> = async {
            let txn = self.begin_read().await?;
            let rows = select.find_with_related(SourceEntity).all(&txn).await?;
            txn.commit().await?;
            Ok(rows)
        }
        .await;
        timer.finish(result)
    }

    /// Stamp `last_renewed` with the current time; `NotFound` if the id is absent
    pub async fn renew(&self, id: i32) -> Result<ContentModel> {
        let patch = ContentActiveModel {
            id: Set(id),
            last_renewed: Set(chrono::Utc::now()),
            ..Default::default()
        };
        self.update(patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SourceActiveModel;
    use crate::db::repository::tests::test_pool;
    use crate::db::repository::SourceRepository;
    use crate::errors::AppError;
    use sea_orm::NotSet;

    fn content(name: &str, category: ContentCategory) -> ContentActiveModel {
        ContentActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            content_type: Set(category.as_str().to_string()),
            last_renewed: NotSet,
        }
    }

    fn source(name: &str, id: i32, content_id: i32) -> SourceActiveModel {
        SourceActiveModel {
            name: Set(name.to_string()),
            id: Set(id),
            last_renewed: NotSet,
            content_id: Set(content_id),
        }
    }

    #[tokio::test]
    async fn test_get_by_category_returns_only_matches() {
        let repo = ContentRepository::new(test_pool().await).unwrap();
        let movie = repo.add(content("Inception", ContentCategory::Movie)).await.unwrap();
        repo.add(content("Planet Earth", ContentCategory::Documentary)).await.unwrap();

        let movies = repo.get_by_category(ContentCategory::Movie).await.unwrap();
        assert_eq!(movies, vec![movie]);

        let shorts = repo.get_by_category(ContentCategory::Short).await.unwrap();
        assert!(shorts.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_source() {
        let pool = test_pool().await;
        let contents = ContentRepository::new(pool.clone()).unwrap();
        let sources = SourceRepository::new(pool).unwrap();

        let owner = contents.add(content("Arrival", ContentCategory::Movie)).await.unwrap();
        contents.add(content("Other", ContentCategory::Movie)).await.unwrap();
        sources.add(source("imdb", 2543164, owner.id)).await.unwrap();

        let found = contents
            .get_by_source(&SourceKey::new("imdb", 2543164))
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id), Some(owner.id));

        let missing = contents.get_by_source(&SourceKey::new("imdb", 1)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_query_with_sources_groups_children() {
        let pool = test_pool().await;
        let contents = ContentRepository::new(pool.clone()).unwrap();
        let sources = SourceRepository::new(pool).unwrap();

        let first = contents.add(content("Alien", ContentCategory::Movie)).await.unwrap();
        let bare = contents.add(content("Dark", ContentCategory::Series)).await.unwrap();
        sources.add(source("imdb", 78748, first.id)).await.unwrap();
        sources.add(source("tmdb", 348, first.id)).await.unwrap();

        let rows = contents.query_with_sources(contents.ordered()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, first);
        assert_eq!(rows[0].1.len(), 2);
        assert_eq!(rows[1].0, bare);
        assert!(rows[1].1.is_empty());

        let one = contents.query_with_sources(contents.by_id(bare.id)).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].0.id, bare.id);
    }

    #[tokio::test]
    async fn test_renew_moves_timestamp_forward() {
        let repo = ContentRepository::new(test_pool().await).unwrap();
        let added = repo.add(content("Heat", ContentCategory::Movie)).await.unwrap();

        let renewed = repo.renew(added.id).await.unwrap();
        assert!(renewed.last_renewed >= added.last_renewed);
        assert_eq!(renewed.name, "Heat");
    }

    #[tokio::test]
    async fn test_renew_missing_is_not_found() {
        let repo = ContentRepository::new(test_pool().await).unwrap();
        let err = repo.renew(7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_cascades_to_sources() {
        let pool = test_pool().await;
        let contents = ContentRepository::new(pool.clone()).unwrap();
        let sources = SourceRepository::new(pool).unwrap();

        let owner = contents.add(content("Alien", ContentCategory::Movie)).await.unwrap();
        let keep = contents.add(content("Aliens", ContentCategory::Movie)).await.unwrap();
        sources.add(source("imdb", 78748, owner.id)).await.unwrap();
        sources.add(source("tmdb", 348, owner.id)).await.unwrap();
        sources.add(source("imdb", 90605, keep.id)).await.unwrap();

        assert!(contents.remove(owner.id).await.unwrap());

        assert!(sources.get_by_content(owner.id).await.unwrap().is_empty());
        assert_eq!(sources.get_by_content(keep.id).await.unwrap().len(), 1);
    }
}
