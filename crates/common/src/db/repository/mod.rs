//! Repository pattern for database operations
//!
//! `Repository` is the CRUD contract shared by every entity kind.
//! `BaseRepository<A>` implements it once for any SeaORM active model `A`;
//! the entity, its table and its primary-key shape all follow from `A`.
//! Entity-specific queries live in inherent impls on the concrete
//! repository types (`ContentRepository`, `SourceRepository`).
//!
//! Every operation runs in exactly one transaction. A transaction that is
//! dropped before `commit` (early `?` return, cancelled future) rolls back.

mod content;
mod source;

pub use content::ContentRepository;
pub use source::{SourceKey, SourceRepository};

use crate::db::descriptor::EntityDescriptor;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::metrics::OpTimer;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter,
    QueryOrder, Select, TransactionTrait, Value,
};
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// Entity behind an active model
pub type EntityOf<A> = <A as ActiveModelTrait>::Entity;

/// Row type behind an active model
pub type ModelOf<A> = <EntityOf<A> as EntityTrait>::Model;

/// Primary key value: a scalar for single-column keys, a tuple for composite ones
pub type KeyOf<A> = <<EntityOf<A> as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// CRUD contract over one entity kind
#[async_trait]
pub trait Repository: Send + Sync {
    /// Active model used for writes; determines the entity and its key
    type ActiveModel: ActiveModelTrait + Send + 'static;

    /// Resolved metadata of the entity
    fn descriptor(&self) -> &EntityDescriptor;

    /// Insert a new row and return it with store-generated fields populated
    async fn add(&self, entity: Self::ActiveModel) -> Result<ModelOf<Self::ActiveModel>>;

    /// Fetch one row by primary key; `None` when absent
    async fn get(&self, key: KeyOf<Self::ActiveModel>) -> Result<Option<ModelOf<Self::ActiveModel>>>;

    /// Fetch every row, ordered by primary key
    async fn get_all(&self) -> Result<Vec<ModelOf<Self::ActiveModel>>>;

    /// Merge the set fields into an existing row; `NotFound` when the row is absent
    async fn update(&self, entity: Self::ActiveModel) -> Result<ModelOf<Self::ActiveModel>>;

    /// Delete by primary key; returns whether a row was deleted
    async fn remove(&self, key: KeyOf<Self::ActiveModel>) -> Result<bool>;
}

/// Generic repository over one SeaORM active model
pub struct BaseRepository<A> {
    pool: DbPool,
    descriptor: EntityDescriptor,
    _model: PhantomData<fn() -> A>,
}

impl<A> Clone for BaseRepository<A> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            descriptor: self.descriptor.clone(),
            _model: PhantomData,
        }
    }
}

impl<A> fmt::Debug for BaseRepository<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseRepository")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

impl<A> BaseRepository<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    ModelOf<A>: IntoActiveModel<A>,
{
    /// Create a repository; the entity type is resolved here, once
    pub fn new(pool: DbPool) -> Result<Self> {
        let descriptor = EntityDescriptor::resolve::<EntityOf<A>>()?;
        debug!(
            table = descriptor.table(),
            key = ?descriptor.key_columns(),
            "Repository resolved"
        );

        Ok(Self {
            pool,
            descriptor,
            _model: PhantomData,
        })
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    async fn begin_read(&self) -> Result<DatabaseTransaction> {
        Ok(self.read_conn().begin().await?)
    }

    async fn begin_write(&self) -> Result<DatabaseTransaction> {
        Ok(self.write_conn().begin().await?)
    }

    fn timer(&self, op: &'static str) -> OpTimer {
        OpTimer::start(self.descriptor.table(), op)
    }

    /// Run an arbitrary select over this entity inside one read transaction
    pub async fn query(&self, select: Select<EntityOf<A>>) -> Result<Vec<ModelOf<A>>> {
        let timer = self.timer("query");
        let result: Result<Vec<ModelOf<A>>> = async {
            let txn = self.begin_read().await?;
            let rows = select.all(&txn).await?;
            txn.commit().await?;
            Ok(rows)
        }
        .await;
        timer.finish(result)
    }

    /// Like `query`, keeping only the first row
    pub async fn query_one(&self, select: Select<EntityOf<A>>) -> Result<Option<ModelOf<A>>> {
        let timer = self.timer("query_one");
        let result: Result<Option<ModelOf<A>>> = async {
            let txn = self.begin_read().await?;
            let row = select.one(&txn).await?;
            txn.commit().await?;
            Ok(row)
        }
        .await;
        timer.finish(result)
    }

    /// Primary key values of an active model, in declaration order.
    ///
    /// Fails with `Validation` when a key column is not set: updates are
    /// addressed by key and never fall back to an insert.
    fn key_values(&self, entity: &A) -> Result<Vec<(<EntityOf<A> as EntityTrait>::Column, Value)>> {
        <<EntityOf<A> as EntityTrait>::PrimaryKey as Iterable>::iter()
            .map(|key| {
                let column = key.into_column();
                entity
                    .get(column)
                    .into_value()
                    .map(|value| (column, value))
                    .ok_or_else(|| AppError::Validation {
                        message: format!(
                            "{} update requires every key column to be set",
                            self.descriptor.table()
                        ),
                        field: Some(format!("{:?}", column)),
                    })
            })
            .collect()
    }

    /// Select matching one row by its key values
    fn by_key_values(
        &self,
        values: Vec<(<EntityOf<A> as EntityTrait>::Column, Value)>,
    ) -> Select<EntityOf<A>> {
        values
            .into_iter()
            .fold(<EntityOf<A> as EntityTrait>::find(), |select, (column, value)| {
                select.filter(column.eq(value))
            })
    }

    /// Select over every row in primary key order
    pub fn ordered(&self) -> Select<EntityOf<A>> {
        <<EntityOf<A> as EntityTrait>::PrimaryKey as Iterable>::iter()
            .fold(<EntityOf<A> as EntityTrait>::find(), |select, key| {
                select.order_by_asc(key.into_column())
            })
    }
}

/// Key values as plain text: `42` for a scalar key, `(imdb, 2)` for a composite one
fn key_text<C>(key: &[(C, Value)]) -> String {
    let parts: Vec<String> = key.iter().map(|(_, value)| value_text(value)).collect();
    match parts.as_slice() {
        [single] => single.clone(),
        _ => format!("({})", parts.join(", ")),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Int(Some(v)) => v.to_string(),
        Value::BigInt(Some(v)) => v.to_string(),
        Value::String(Some(v)) => v.to_string(),
        other => format!("{:?}", other),
    }
}

#[async_trait]
impl<A> Repository for BaseRepository<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    ModelOf<A>: IntoActiveModel<A>,
{
    type ActiveModel = A;

    fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    async fn add(&self, entity: A) -> Result<ModelOf<A>> {
        let timer = self.timer("add");
        let result: Result<ModelOf<A>> = async {
            let txn = self.begin_write().await?;
            let model = entity.insert(&txn).await?;
            txn.commit().await?;
            Ok(model)
        }
        .await;

        match &result {
            Ok(model) => info!(table = self.descriptor.table(), entity = ?model, "Row added"),
            Err(e) => warn!(table = self.descriptor.table(), error = %e, "Add failed"),
        }
        timer.finish(result)
    }

    async fn get(&self, key: KeyOf<A>) -> Result<Option<ModelOf<A>>> {
        let timer = self.timer("get");
        debug!(table = self.descriptor.table(), key = ?key, "Fetching by key");
        let result: Result<Option<ModelOf<A>>> = async {
            let txn = self.begin_read().await?;
            let row = <EntityOf<A> as EntityTrait>::find_by_id(key).one(&txn).await?;
            txn.commit().await?;
            Ok(row)
        }
        .await;
        timer.finish(result)
    }

    async fn get_all(&self) -> Result<Vec<ModelOf<A>>> {
        let timer = self.timer("get_all");
        let result: Result<Vec<ModelOf<A>>> = async {
            let txn = self.begin_read().await?;
            let rows = self.ordered().all(&txn).await?;
            txn.commit().await?;
            Ok(rows)
        }
        .await;
        timer.finish(result)
    }

    async fn update(&self, entity: A) -> Result<ModelOf<A>> {
        let timer = self.timer("update");
        let result: Result<ModelOf<A>> = async {
            let key = self.key_values(&entity)?;
            let txn = self.begin_write().await?;

            // Existence check shares the write transaction
            let existing = self.by_key_values(key.clone()).one(&txn).await?;
            if existing.is_none() {
                return Err(AppError::NotFound {
                    resource: self.descriptor.table().to_string(),
                    key: key_text(&key),
                });
            }

            let model = entity.update(&txn).await?;
            txn.commit().await?;
            Ok(model)
        }
        .await;

        match &result {
            Ok(model) => info!(table = self.descriptor.table(), entity = ?model, "Row updated"),
            Err(e) => warn!(table = self.descriptor.table(), error = %e, "Update failed"),
        }
        timer.finish(result)
    }

    async fn remove(&self, key: KeyOf<A>) -> Result<bool> {
        let timer = self.timer("remove");
        let result: Result<bool> = async {
            let txn = self.begin_write().await?;

            // Deleting through the active model runs the entity's delete hooks
            // on this transaction
            let deleted = match <EntityOf<A> as EntityTrait>::find_by_id(key).one(&txn).await? {
                Some(model) => {
                    let active: A = model.into_active_model();
                    active.delete(&txn).await?.rows_affected > 0
                }
                None => false,
            };

            txn.commit().await?;
            Ok(deleted)
        }
        .await;

        match &result {
            Ok(true) => info!(table = self.descriptor.table(), "Row removed"),
            Ok(false) => debug!(table = self.descriptor.table(), "Remove matched no row"),
            Err(e) => warn!(table = self.descriptor.table(), error = %e, "Remove failed"),
        }
        timer.finish(result)
    }
}
