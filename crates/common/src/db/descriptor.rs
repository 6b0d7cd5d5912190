//! Entity type resolution
//!
//! A repository is generic over an active model type; the entity behind it
//! (table, primary-key columns, key shape) is resolved here exactly once,
//! when the repository is built, and kept on the repository afterwards.

use crate::errors::{AppError, Result};
use sea_orm::{EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn};

/// Whether the primary key is one column or several
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    Scalar,
    Composite(usize),
}

/// Resolved metadata of one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    table: String,
    type_name: &'static str,
    key_columns: Vec<String>,
}

impl EntityDescriptor {
    /// Resolve the descriptor of `E` from its declared table and key columns
    pub fn resolve<E>() -> Result<Self>
    where
        E: EntityTrait,
    {
        let key_columns = <E::PrimaryKey as Iterable>::iter()
            .map(|key| key.into_column().as_str().to_string())
            .collect();

        Self::from_parts(
            E::default().table_name(),
            std::any::type_name::<E>(),
            key_columns,
        )
    }

    /// Build a descriptor from already-extracted parts, rejecting keyless types
    pub fn from_parts(
        table: &str,
        type_name: &'static str,
        key_columns: Vec<String>,
    ) -> Result<Self> {
        if table.is_empty() {
            return Err(AppError::TypeResolution {
                type_name: type_name.to_string(),
                reason: "no table name declared".to_string(),
            });
        }

        if key_columns.is_empty() {
            return Err(AppError::TypeResolution {
                type_name: type_name.to_string(),
                reason: "no primary key column declared".to_string(),
            });
        }

        Ok(Self {
            table: table.to_string(),
            type_name,
            key_columns,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn key_shape(&self) -> KeyShape {
        match self.key_columns.len() {
            1 => KeyShape::Scalar,
            n => KeyShape::Composite(n),
        }
    }
}
