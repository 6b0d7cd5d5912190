//! Wire models
//!
//! The request/response shapes seen by HTTP clients. They are decoupled
//! from the stored rows: server-owned fields are optional on input and never
//! written from it, and the category travels as the `type` field.

use crate::db::models::{
    ContentActiveModel, ContentCategory, ContentModel, SourceActiveModel, SourceModel,
};
use crate::errors::{AppError, Result};
use crate::services::WireModel;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{self, NotSet, Set};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A catalog item as exchanged over HTTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Content {
    /// Store-generated; ignored on create
    pub id: Option<i32>,

    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[serde(rename = "type")]
    pub category: ContentCategory,

    /// Server-owned; stamped on create and renew
    pub last_renewed: Option<DateTime<Utc>>,

    /// Sources of this item; filled on reads, ignored on writes
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Content {
    pub fn new(name: impl Into<String>, category: ContentCategory) -> Self {
        Self {
            id: None,
            name: name.into(),
            category,
            last_renewed: None,
            sources: Vec::new(),
        }
    }

    /// Convert a row together with its loaded sources, ordered by source key
    pub fn with_sources(model: ContentModel, mut sources: Vec<SourceModel>) -> Result<Self> {
        sources.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));

        let mut content = Self::from_entity(model)?;
        content.sources = sources
            .into_iter()
            .map(Source::from_entity)
            .collect::<Result<_>>()?;
        Ok(content)
    }
}

/// Where a catalog item's data came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Source {
    /// Provider name; a single URL path segment
    #[validate(length(min = 1, max = 50), custom(function = "validate_source_name"))]
    pub name: String,

    pub id: i32,

    /// Owning content; taken from the path when posted under a content item
    #[serde(default)]
    pub content_id: i32,

    pub last_renewed: Option<DateTime<Utc>>,
}

impl Source {
    pub fn new(name: impl Into<String>, id: i32, content_id: i32) -> Self {
        Self {
            name: name.into(),
            id,
            content_id,
            last_renewed: None,
        }
    }
}

/// Source names appear as a path segment in source URLs
fn validate_source_name(name: &str) -> std::result::Result<(), ValidationError> {
    let url_safe = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if url_safe {
        Ok(())
    } else {
        let mut err = ValidationError::new("url_safe");
        err.message = Some("may only contain ASCII letters, digits, '-', '_' and '.'".into());
        Err(err)
    }
}

fn set_if_some<T>(value: Option<T>) -> ActiveValue<T>
where
    T: Into<sea_orm::Value>,
{
    match value {
        Some(v) => Set(v),
        None => NotSet,
    }
}

impl WireModel for Content {
    type ActiveModel = ContentActiveModel;

    fn into_new_entity(self) -> ContentActiveModel {
        ContentActiveModel {
            id: NotSet,
            name: Set(self.name),
            content_type: Set(self.category.as_str().to_string()),
            last_renewed: NotSet,
        }
    }

    fn into_patch(self) -> ContentActiveModel {
        ContentActiveModel {
            id: set_if_some(self.id),
            name: Set(self.name),
            content_type: Set(self.category.as_str().to_string()),
            last_renewed: NotSet,
        }
    }

    fn from_entity(model: ContentModel) -> Result<Self> {
        let category = model.category().map_err(|e| AppError::InvalidData {
            message: format!("content {}: {}", model.id, e),
        })?;

        Ok(Self {
            id: Some(model.id),
            name: model.name,
            category,
            last_renewed: Some(model.last_renewed),
            sources: Vec::new(),
        })
    }
}

impl WireModel for Source {
    type ActiveModel = SourceActiveModel;

    fn into_new_entity(self) -> SourceActiveModel {
        SourceActiveModel {
            name: Set(self.name),
            id: Set(self.id),
            last_renewed: NotSet,
            content_id: Set(self.content_id),
        }
    }

    fn into_patch(self) -> SourceActiveModel {
        self.into_new_entity()
    }

    fn from_entity(model: SourceModel) -> Result<Self> {
        Ok(Self {
            name: model.name,
            id: model.id,
            content_id: model.content_id,
            last_renewed: Some(model.last_renewed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_wire_shape() {
        let json = serde_json::json!({ "name": "Inception", "type": "movie" });
        let content: Content = serde_json::from_value(json).unwrap();

        assert_eq!(content, Content::new("Inception", ContentCategory::Movie));
        assert!(content.validate().is_ok());

        let out = serde_json::to_value(&content).unwrap();
        assert_eq!(out["type"], "movie");
        assert!(out.get("category").is_none());
    }

    #[test]
    fn test_unknown_category_is_rejected_on_the_wire() {
        let json = serde_json::json!({ "name": "Tosca", "type": "opera" });
        assert!(serde_json::from_value::<Content>(json).is_err());
    }

    #[test]
    fn test_name_length_is_validated() {
        let long = Content::new("x".repeat(51), ContentCategory::Short);
        assert!(long.validate().is_err());

        let empty = Content::new("", ContentCategory::Short);
        assert!(empty.validate().is_err());

        let max = Content::new("x".repeat(50), ContentCategory::Short);
        assert!(max.validate().is_ok());
    }

    #[test]
    fn test_server_fields_never_written_from_input() {
        let mut input = Content::new("Dune", ContentCategory::Movie);
        input.id = Some(77);
        input.last_renewed = Some(Utc::now());

        let new = input.clone().into_new_entity();
        assert!(new.id.is_not_set());
        assert!(new.last_renewed.is_not_set());
        assert_eq!(new.content_type, Set("movie".to_string()));

        let patch = input.into_patch();
        assert_eq!(patch.id, Set(77));
        assert!(patch.last_renewed.is_not_set());
    }

    #[test]
    fn test_sources_are_optional_on_input() {
        let json = serde_json::json!({ "name": "Up", "type": "movie" });
        let content: Content = serde_json::from_value(json).unwrap();
        assert!(content.sources.is_empty());

        let out = serde_json::to_value(&content).unwrap();
        assert_eq!(out["sources"], serde_json::json!([]));
    }

    #[test]
    fn test_with_sources_orders_by_key() {
        let now = Utc::now();
        let row = ContentModel {
            id: 1,
            name: "Up".into(),
            content_type: "movie".into(),
            last_renewed: now,
        };
        let source = |name: &str, id| SourceModel {
            name: name.into(),
            id,
            last_renewed: now,
            content_id: 1,
        };

        let content =
            Content::with_sources(row, vec![source("tmdb", 1), source("imdb", 9), source("imdb", 2)])
                .unwrap();
        let keys: Vec<(&str, i32)> = content
            .sources
            .iter()
            .map(|s| (s.name.as_str(), s.id))
            .collect();
        assert_eq!(keys, vec![("imdb", 2), ("imdb", 9), ("tmdb", 1)]);
    }

    #[test]
    fn test_source_name_must_be_url_safe() {
        assert!(Source::new("imdb", 1, 1).validate().is_ok());
        assert!(Source::new("the-movie.db_v3", 1, 1).validate().is_ok());
        assert!(Source::new("a/b", 1, 1).validate().is_err());
        assert!(Source::new("a b", 1, 1).validate().is_err());
        assert!(Source::new("a?b", 1, 1).validate().is_err());
    }

    #[test]
    fn test_corrupt_category_is_invalid_data() {
        let row = ContentModel {
            id: 3,
            name: "Broken".into(),
            content_type: "opera".into(),
            last_renewed: Utc::now(),
        };
        let err = Content::from_entity(row).unwrap_err();
        assert!(matches!(err, AppError::InvalidData { .. }));
    }

    #[test]
    fn test_source_round_trip_keeps_key() {
        let now = Utc::now();
        let row = SourceModel {
            name: "imdb".into(),
            id: 1375666,
            last_renewed: now,
            content_id: 9,
        };
        let wire = Source::from_entity(row).unwrap();
        assert_eq!(wire.last_renewed, Some(now));

        let entity = wire.into_patch();
        assert_eq!(entity.name, Set("imdb".to_string()));
        assert_eq!(entity.id, Set(1375666));
        assert_eq!(entity.content_id, Set(9));
        assert!(entity.last_renewed.is_not_set());
    }
}
