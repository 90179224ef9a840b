pub mod client;
pub mod error;
pub mod sse;

pub use client::{ApiClient, RebuildStream};
pub use error::ApiError;
pub use mcphub_api;
pub use sse::{SseDecoder, SseEvent};
