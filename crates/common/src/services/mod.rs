//! Service layer
//!
//! A service maps wire models to entities and back, delegating persistence
//! to a repository. `BaseService` does this once for every pairing of a
//! `WireModel` with a `Repository` over the same active model; the concrete
//! services only add their entity-specific lookups.

mod content;
mod source;

pub use content::ContentService;
pub use source::SourceService;

use crate::db::{BaseRepository, DbPool, KeyOf, ModelOf, Repository};
use crate::errors::Result;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, IntoActiveModel};
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// A wire model convertible to and from one entity kind
pub trait WireModel: Sized + Send {
    type ActiveModel: ActiveModelTrait;

    /// Active model for an insert. Store-generated and server-owned fields
    /// stay unset whatever the input carries, so store defaults and hooks apply
    fn into_new_entity(self) -> Self::ActiveModel;

    /// Active model for an update, addressed by the key; server-owned fields
    /// stay unset so the stored values survive
    fn into_patch(self) -> Self::ActiveModel;

    /// Convert a stored row; fails on rows the wire model cannot represent
    fn from_entity(model: ModelOf<Self::ActiveModel>) -> Result<Self>;
}

/// Generic service pairing a wire model with a repository
pub struct BaseService<M, R> {
    repository: R,
    _model: PhantomData<fn() -> M>,
}

impl<M, R: Clone> Clone for BaseService<M, R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            _model: PhantomData,
        }
    }
}

impl<M, R: fmt::Debug> fmt::Debug for BaseService<M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseService")
            .field("model", &std::any::type_name::<M>())
            .field("repository", &self.repository)
            .finish()
    }
}

impl<M, A> BaseService<M, BaseRepository<A>>
where
    M: WireModel<ActiveModel = A>,
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    ModelOf<A>: IntoActiveModel<A>,
{
    /// Build the service and its repository over a pool
    pub fn from_pool(pool: DbPool) -> Result<Self> {
        Ok(Self::new(BaseRepository::new(pool)?))
    }
}

impl<M, R> BaseService<M, R>
where
    R: Repository,
    M: WireModel<ActiveModel = R::ActiveModel>,
{
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            _model: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn table(&self) -> &str {
        self.repository.descriptor().table()
    }

    /// Persist a new item and return it with server-owned fields populated;
    /// store-generated and server-owned input fields are ignored
    pub async fn add(&self, model: M) -> Result<M> {
        debug!(table = self.table(), "Service add");
        let stored = self.repository.add(model.into_new_entity()).await?;
        M::from_entity(stored)
    }

    pub async fn get_all(&self) -> Result<Vec<M>> {
        debug!(table = self.table(), "Service get_all");
        convert_all(self.repository.get_all().await?)
    }

    /// Absence is `None`, not an error
    pub async fn get(&self, key: KeyOf<R::ActiveModel>) -> Result<Option<M>> {
        debug!(table = self.table(), "Service get");
        self.repository.get(key).await?.map(M::from_entity).transpose()
    }

    /// Write the item's fields over the stored row with the same key
    pub async fn update(&self, model: M) -> Result<M> {
        debug!(table = self.table(), "Service update");
        let stored = self.repository.update(model.into_patch()).await?;
        M::from_entity(stored)
    }

    pub async fn remove(&self, key: KeyOf<R::ActiveModel>) -> Result<bool> {
        debug!(table = self.table(), "Service remove");
        self.repository.remove(key).await
    }
}

/// Convert a batch of rows, failing on the first unrepresentable one
pub(crate) fn convert_all<M: WireModel>(rows: Vec<ModelOf<M::ActiveModel>>) -> Result<Vec<M>> {
    rows.into_iter().map(M::from_entity).collect()
}
