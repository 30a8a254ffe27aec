//! Handler - trigger event to platform response
//!
//! event -> source location -> fetch artifact -> dispatch -> response envelope.
//! A failed fetch aborts the whole invocation before any target runs.

use tracing::{error, info, instrument};

use contracts::{
    HandlerResponse, InferenceEndpoint, ObjectLocation, ObjectStore, RunResult, TriggerEvent,
};

use crate::dispatcher::Dispatcher;
use crate::error::DispatcherError;

/// Entry point invoked once per storage event
pub struct Handler<S, E> {
    dispatcher: Dispatcher<S, E>,
}

impl<S, E> Handler<S, E>
where
    S: ObjectStore + Sync + 'static,
    E: InferenceEndpoint + Sync + 'static,
{
    pub fn new(dispatcher: Dispatcher<S, E>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<S, E> {
        &self.dispatcher
    }

    /// Process one event and build the platform response
    ///
    /// # Errors
    /// `InvalidEvent` or `Fetch`; per-target failures are reported inside the
    /// response body instead.
    pub async fn handle(&self, event: &TriggerEvent) -> Result<HandlerResponse, DispatcherError> {
        let location = event.source_location().map_err(DispatcherError::InvalidEvent)?;
        let result = self.handle_location(&location).await?;
        HandlerResponse::from_run(&result).map_err(DispatcherError::Response)
    }

    /// Fetch the artifact at `location` and dispatch it
    ///
    /// Results are written back into the artifact's own bucket.
    #[instrument(name = "handler_handle_location", skip(self, location), fields(location = %location))]
    pub async fn handle_location(
        &self,
        location: &ObjectLocation,
    ) -> Result<RunResult, DispatcherError> {
        let artifact = match self
            .dispatcher
            .store()
            .get(&location.bucket, &location.key)
            .await
        {
            Ok(bytes) => bytes,
            Err(source) => {
                observability::record_fetch_failure();
                error!(error = %source, "Artifact fetch failed, no targets dispatched");
                return Err(DispatcherError::Fetch {
                    location: location.clone(),
                    source,
                });
            }
        };

        let artifact_name = location.artifact_base_name();
        info!(bytes = artifact.len(), artifact = artifact_name, "Artifact fetched");

        Ok(self
            .dispatcher
            .run(&location.bucket, artifact, artifact_name)
            .await)
    }
}
