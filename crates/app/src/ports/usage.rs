//! Usage port — append-only dosing telemetry.

use std::future::Future;
use std::sync::Arc;

use reefhub_domain::doser::Usage;
use reefhub_domain::error::ReefHubError;
use reefhub_domain::id::EntityId;

/// Sink for [`Usage`] records written after each successful dose.
pub trait UsageRecorder: Send + Sync {
    /// Append a usage record for the given pump.
    fn record(
        &self,
        pump: EntityId,
        usage: Usage,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send;

    /// Most recent usage records of a pump, newest first.
    fn history(
        &self,
        pump: EntityId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Usage>, ReefHubError>> + Send;
}

impl<T: UsageRecorder> UsageRecorder for Arc<T> {
    fn record(
        &self,
        pump: EntityId,
        usage: Usage,
    ) -> impl Future<Output = Result<(), ReefHubError>> + Send {
        (**self).record(pump, usage)
    }

    fn history(
        &self,
        pump: EntityId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Usage>, ReefHubError>> + Send {
        (**self).history(pump, limit)
    }
}
