//! Content entity: a catalog item and the aggregate root of its sources

use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use sea_orm::{ConnectionTrait, DbErr, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of content categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Movie,
    Series,
    Documentary,
    Short,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 4] = [
        ContentCategory::Movie,
        ContentCategory::Series,
        ContentCategory::Documentary,
        ContentCategory::Short,
    ];

    /// Value stored in the `type` column and used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Movie => "movie",
            ContentCategory::Series => "series",
            ContentCategory::Documentary => "documentary",
            ContentCategory::Short => "short",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ContentCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub name: String,

    /// One of `ContentCategory`, stored as its string form
    #[sea_orm(column_name = "type")]
    pub content_type: String,

    pub last_renewed: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::source::Entity")]
    Sources,
}

impl Related<super::source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sources.def()
    }
}

impl Model {
    pub fn category(&self) -> Result<ContentCategory, UnknownCategory> {
        self.content_type.parse()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// `last_renewed` is server-owned: stamped on every insert.
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            self.last_renewed = Set(chrono::Utc::now());
        }
        Ok(self)
    }

    /// Sources go with their content, on the caller's connection so the
    /// cascade shares the delete's transaction.
    async fn before_delete<C>(self, db: &C) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let Some(id) = self.id.clone().into_value() {
            super::source::Entity::delete_many()
                .filter(super::source::Column::ContentId.eq(id))
                .exec(db)
                .await?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_string_forms() {
        for category in ContentCategory::ALL {
            assert_eq!(category.as_str().parse::<ContentCategory>(), Ok(category));
        }
        assert_eq!(ContentCategory::Movie.to_string(), "movie");
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = "opera".parse::<ContentCategory>().unwrap_err();
        assert_eq!(err, UnknownCategory("opera".to_string()));
    }

    #[test]
    fn test_category_serde_matches_column_form() {
        let json = serde_json::to_string(&ContentCategory::Documentary).unwrap();
        assert_eq!(json, "\"documentary\"");
    }
}
