//! Entity store port — per-kind persistence for [`Record`]s.

use std::future::Future;
use std::sync::Arc;

use reefhub_domain::error::ReefHubError;
use reefhub_domain::record::Record;

/// Repository for persisting and querying records of one kind.
pub trait EntityStore<T: Record>: Send + Sync {
    /// Persist a new record. The store assigns a fresh identifier and
    /// returns the stored record.
    fn create(&self, record: T) -> impl Future<Output = Result<T, ReefHubError>> + Send;

    /// Get a record by its identifier.
    fn get_by_id(&self, id: T::Id) -> impl Future<Output = Result<Option<T>, ReefHubError>> + Send;

    /// Get all records, in store-defined order.
    fn get_all(&self) -> impl Future<Output = Result<Vec<T>, ReefHubError>> + Send;

    /// Replace an existing record.
    fn update(&self, record: T) -> impl Future<Output = Result<T, ReefHubError>> + Send;

    /// Delete a record by its identifier.
    fn delete(&self, id: T::Id) -> impl Future<Output = Result<(), ReefHubError>> + Send;
}

impl<T: Record, S: EntityStore<T>> EntityStore<T> for Arc<S> {
    fn create(&self, record: T) -> impl Future<Output = Result<T, ReefHubError>> + Send {
        (**self).create(record)
    }

    fn get_by_id(&self, id: T::Id) -> impl Future<Output = Result<Option<T>, ReefHubError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<T>, ReefHubError>> + Send {
        (**self).get_all()
    }

    fn update(&self, record: T) -> impl Future<Output = Result<T, ReefHubError>> + Send {
        (**self).update(record)
    }

    fn delete(&self, id: T::Id) -> impl Future<Output = Result<(), ReefHubError>> + Send {
        (**self).delete(id)
    }
}
