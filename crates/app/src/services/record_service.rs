//! Record service — validated CRUD over one [`Record`] kind.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::value::RawValue;

use reefhub_domain::error::{InvalidConfigError, NotFoundError, ReefHubError};
use reefhub_domain::record::{Record, parse_id};

use crate::ports::EntityStore;
use crate::registry::CrudEntity;

/// Application service for CRUD on records of kind `T`.
pub struct RecordService<T, S> {
    store: S,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record, S: EntityStore<T>> RecordService<T, S> {
    /// Create a new service backed by the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Create a new record after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns the record's validation error, or a storage error propagated
    /// from the store.
    #[tracing::instrument(skip(self, record), fields(kind = T::KIND, name = %record.name()))]
    pub async fn create(&self, record: T) -> Result<T, ReefHubError> {
        record.validate()?;
        self.store.create(record).await
    }

    /// Look up a record by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] when no record with `id` exists,
    /// or a storage error from the store.
    #[tracing::instrument(skip(self), fields(kind = T::KIND))]
    pub async fn get(&self, id: T::Id) -> Result<T, ReefHubError> {
        self.store.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: T::KIND,
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all records.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list(&self) -> Result<Vec<T>, ReefHubError> {
        self.store.get_all().await
    }

    /// Replace the record stored under `id`. The identifier in `record` is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] if the record does not exist, the
    /// record's validation error, or a storage error.
    #[tracing::instrument(skip(self, record), fields(kind = T::KIND))]
    pub async fn update(&self, id: T::Id, mut record: T) -> Result<T, ReefHubError> {
        record.set_id(id);
        record.validate()?;
        self.get(id).await?;
        self.store.update(record).await
    }

    /// Persist a record fetched through [`get`](Self::get) after an
    /// in-place state change.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn save(&self, record: T) -> Result<T, ReefHubError> {
        self.store.update(record).await
    }

    /// Delete a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`ReefHubError::NotFound`] if the record does not exist, or a
    /// storage error.
    #[tracing::instrument(skip(self), fields(kind = T::KIND))]
    pub async fn delete(&self, id: T::Id) -> Result<(), ReefHubError> {
        self.get(id).await?;
        self.store.delete(id).await
    }
}

fn encode<T: Record>(record: &T) -> Result<Box<RawValue>, ReefHubError> {
    serde_json::value::to_raw_value(record).map_err(|source| {
        InvalidConfigError {
            kind: T::KIND,
            source,
        }
        .into()
    })
}

fn decode<T: Record>(payload: &RawValue) -> Result<T, ReefHubError> {
    serde_json::from_str(payload.get()).map_err(|source| {
        InvalidConfigError {
            kind: T::KIND,
            source,
        }
        .into()
    })
}

#[async_trait]
impl<T, S> CrudEntity for RecordService<T, S>
where
    T: Record,
    S: EntityStore<T>,
{
    async fn list(&self) -> Result<Vec<Box<RawValue>>, ReefHubError> {
        RecordService::list(self).await?.iter().map(encode).collect()
    }

    async fn get(&self, id: &str) -> Result<Box<RawValue>, ReefHubError> {
        let id = parse_id::<T>(id)?;
        encode(&RecordService::get(self, id).await?)
    }

    async fn create(&self, payload: &RawValue) -> Result<Box<RawValue>, ReefHubError> {
        let record = decode::<T>(payload)?;
        encode(&RecordService::create(self, record).await?)
    }

    async fn update(&self, id: &str, payload: &RawValue) -> Result<Box<RawValue>, ReefHubError> {
        let id = parse_id::<T>(id)?;
        let record = decode::<T>(payload)?;
        encode(&RecordService::update(self, id, record).await?)
    }

    async fn delete(&self, id: &str) -> Result<(), ReefHubError> {
        let id = parse_id::<T>(id)?;
        RecordService::delete(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStore;
    use reefhub_domain::equipment::Equipment;
    use reefhub_domain::error::ValidationError;
    use reefhub_domain::id::EntityId;

    fn make_service() -> RecordService<Equipment, InMemoryStore<Equipment>> {
        RecordService::new(InMemoryStore::default())
    }

    #[tokio::test]
    async fn should_assign_id_when_creating() {
        let svc = make_service();
        let draft = Equipment::new("skimmer", 2);
        let draft_id = draft.id;

        let created = svc.create(draft).await.unwrap();

        assert_ne!(created.id, draft_id);
        assert_eq!(svc.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn should_reject_create_when_name_is_empty() {
        let svc = make_service();
        let result = svc.create(Equipment::new("", 2)).await;
        assert!(matches!(
            result,
            Err(ReefHubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_record_is_missing() {
        let svc = make_service();
        let result = svc.get(EntityId::new()).await;
        assert!(matches!(
            result,
            Err(ReefHubError::NotFound(NotFoundError { entity: "equipment", .. }))
        ));
    }

    #[tokio::test]
    async fn should_keep_path_id_when_updating() {
        let svc = make_service();
        let created = svc.create(Equipment::new("skimmer", 2)).await.unwrap();

        let updated = svc
            .update(created.id, Equipment::new("protein skimmer", 5))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(svc.get(created.id).await.unwrap().outlet, 5);
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing_record() {
        let svc = make_service();
        let result = svc.update(EntityId::new(), Equipment::new("x", 1)).await;
        assert!(matches!(result, Err(ReefHubError::NotFound(_))));
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_delete_record() {
        let svc = make_service();
        let created = svc.create(Equipment::new("skimmer", 2)).await.unwrap();

        svc.delete(created.id).await.unwrap();

        assert!(svc.list().await.unwrap().is_empty());
        assert!(matches!(
            svc.delete(created.id).await,
            Err(ReefHubError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_reject_malformed_identifier_through_raw_crud() {
        let svc = make_service();
        let result = CrudEntity::get(&svc, "not-a-uuid").await;
        assert!(matches!(
            result,
            Err(ReefHubError::Validation(ValidationError::InvalidId { .. }))
        ));
    }

    #[tokio::test]
    async fn should_reject_payload_of_wrong_shape_through_raw_crud() {
        let svc = make_service();
        let payload = RawValue::from_string(r#"{"name":"no outlet"}"#.to_string()).unwrap();
        let result = CrudEntity::create(&svc, &payload).await;
        assert!(matches!(result, Err(ReefHubError::InvalidConfig(_))));
    }
}
