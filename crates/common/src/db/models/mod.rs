//! SeaORM entity models
//!
//! Database entities for the catalog

pub mod content;
pub mod source;

pub use content::{
    ContentCategory,
    UnknownCategory,
    Entity as ContentEntity,
    Model as ContentModel,
    ActiveModel as ContentActiveModel,
    Column as ContentColumn,
};

pub use source::{
    Entity as SourceEntity,
    Model as SourceModel,
    ActiveModel as SourceActiveModel,
    Column as SourceColumn,
};
