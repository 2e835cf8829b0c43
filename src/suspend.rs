//! Awaitable wrapper around [`FetchService::fetch`].
//!
//! The adapter creates a single-shot completion, registers its resumer as the
//! fetch callback and suspends on the other half. The awaiting task gives its
//! thread back to whatever executor polls it until the completion worker
//! resumes it. Dropping the future does not stop the underlying fetch; pass a
//! [`CancelToken`] to [`await_fetch_with`] for that.

use crate::completion::completion;
use crate::error::FetchError;
use crate::fetch::{CancelToken, FetchService, UserId};

/// Fetches `id` and resolves to the fetched id, or the failure the fetch reported.
pub async fn await_fetch(service: &FetchService, id: UserId) -> Result<UserId, FetchError> {
    await_fetch_with(service, id, CancelToken::new()).await
}

pub async fn await_fetch_with(
    service: &FetchService,
    id: UserId,
    cancel: CancelToken,
) -> Result<UserId, FetchError> {
    let (resumer, suspended) = completion();

    service.fetch_with(id, cancel, move |outcome| {
        if let Err(violation) = resumer.resume(outcome) {
            log::error!("ignoring completion of user {}: {}", id, violation);
        }
    })?;

    match suspended.await {
        Ok(outcome) => outcome,
        Err(_) => Err(FetchError::Abandoned(id)),
    }
}
