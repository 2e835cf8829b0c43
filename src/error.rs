use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::fetch::UserId;

/// Why a fetch did not deliver a [`UserId`].
///
/// Reported to the immediate caller only; nothing is retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch of user {0} failed: {1}")]
    Failed(UserId, String),
    #[error("fetch of user {0} was cancelled")]
    Cancelled(UserId),
    #[error("fetch of user {id} timed out after {after:?}")]
    TimedOut { id: UserId, after: Duration },
    #[error("fetch of user {0} finished without delivering a result")]
    Abandoned(UserId),
    #[error("could not start fetch worker: {0}")]
    Spawn(#[from] io::Error),
}

/// A single-shot completion was resumed a second time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("single-shot completion resumed more than once")]
pub struct DoubleResume;

/// Every resume handle of a single-shot completion was dropped unused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("single-shot completion dropped without being resumed")]
pub struct Abandoned;
