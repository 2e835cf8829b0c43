//! Callback-based user fetch.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::error::FetchError;
use crate::logger::Sink;
use crate::spawn::Spawn;

/// Opaque user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> UserId {
        UserId(id)
    }
}

/// Cooperative cancellation flag shared between a caller and a fetch worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

type Resolver = dyn Fn(UserId) -> Result<UserId, FetchError> + Send + Sync;

/// Fetches users on worker units and reports through a callback.
///
/// Cloning is cheap; clones share the spawner, sink and resolver.
#[derive(Clone)]
pub struct FetchService {
    config: Arc<Config>,
    spawner: Arc<dyn Spawn>,
    sink: Arc<dyn Sink>,
    resolver: Arc<Resolver>,
}

impl FetchService {
    pub fn new(config: Config, spawner: Arc<dyn Spawn>, sink: Arc<dyn Sink>) -> FetchService {
        FetchService {
            config: Arc::new(config),
            spawner,
            sink,
            resolver: Arc::new(|id: UserId| -> Result<UserId, FetchError> { Ok(id) }),
        }
    }

    /// Replaces what a finished fetch produces for an id; identity by default.
    pub fn with_resolver<F>(mut self, resolver: F) -> FetchService
    where
        F: Fn(UserId) -> Result<UserId, FetchError> + Send + Sync + 'static,
    {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Starts fetching `id` and returns immediately.
    ///
    /// The fetch worker logs start and end around the simulated latency, then
    /// hands the outcome to a completion worker which calls `on_complete`
    /// exactly once. An `Err` here means the fetch worker could not be
    /// started and `on_complete` was dropped uncalled.
    pub fn fetch<F>(&self, id: UserId, on_complete: F) -> Result<(), FetchError>
    where
        F: FnOnce(Result<UserId, FetchError>) + Send + 'static,
    {
        self.fetch_with(id, CancelToken::new(), on_complete)
    }

    /// [`FetchService::fetch`] with a token checked before the start and after the latency.
    pub fn fetch_with<F>(
        &self,
        id: UserId,
        cancel: CancelToken,
        on_complete: F,
    ) -> Result<(), FetchError>
    where
        F: FnOnce(Result<UserId, FetchError>) + Send + 'static,
    {
        let service = self.clone();
        self.spawner.spawn(
            &self.config.fetch_worker,
            Box::new(move || {
                let outcome = service.run(id, &cancel);
                service.complete(id, outcome, on_complete);
            }),
        )?;
        Ok(())
    }

    /// Body of the fetch worker.
    ///
    /// Failures are only described by the returned error; the consumer logs them.
    fn run(&self, id: UserId, cancel: &CancelToken) -> Result<UserId, FetchError> {
        if cancel.is_cancelled() {
            log::debug!("fetch of user {} cancelled", id);
            return Err(FetchError::Cancelled(id));
        }

        self.sink.log_here(&format!("start fetch user {} info", id));

        if let Some(after) = self.config.cutoff() {
            thread::sleep(after);
            log::debug!("fetch of user {} timed out after {:?}", id, after);
            return Err(FetchError::TimedOut { id, after });
        }
        thread::sleep(self.config.latency);

        if cancel.is_cancelled() {
            log::debug!("fetch of user {} cancelled", id);
            return Err(FetchError::Cancelled(id));
        }

        self.sink.log_here(&format!("end fetch user {} info", id));
        (self.resolver)(id)
    }

    fn complete<F>(&self, id: UserId, outcome: Result<UserId, FetchError>, on_complete: F)
    where
        F: FnOnce(Result<UserId, FetchError>) + Send + 'static,
    {
        let worker = &self.config.completion_worker;
        let spawned = self
            .spawner
            .spawn(worker, Box::new(move || on_complete(outcome)));
        if let Err(error) = spawned {
            log::error!(
                "lost completion of user {}: could not start {} worker: {}",
                id,
                worker,
                error
            );
        }
    }
}
