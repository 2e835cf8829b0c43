//! Presentation of fetch results.

use crate::error::FetchError;
use crate::fetch::UserId;
use crate::logger::{LogContext, Sink};

/// Logs one line naming `id` and the context this runs on.
pub fn show(sink: &dyn Sink, id: UserId) {
    let context = LogContext::current();
    let message = format!("show user {} in {} thread", id, context.thread);
    sink.log(&message, &context);
}

/// The single line logged for a failed fetch.
pub fn report(sink: &dyn Sink, error: &FetchError) {
    sink.log_here(&format!("failed to show user: {}", error));
}
