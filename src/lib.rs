//! Fetching a user through a callback API, and through an awaitable adapter
//! built on top of that same callback API.

pub mod completion;
pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod logger;
pub mod spawn;
pub mod suspend;
pub mod task;

pub use config::Config;
pub use error::FetchError;
pub use fetch::{CancelToken, FetchService, UserId};
pub use suspend::{await_fetch, await_fetch_with};
