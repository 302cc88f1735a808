//! Restify - cache-aware request orchestration
//!
//! Issues CRUD-style requests against a remote endpoint and reconciles
//! every response with a local, TTL-governed cache. Each request yields a
//! stream of zero, one or two responses followed by completion or an error.

pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod response;
pub mod storage;
pub mod transport;
pub mod ui;

pub use client::{
    Emission, Filter, Origin, RequestOptions, RequestOutcome, RequestStream, Restify,
    RestifyBuilder,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RestifyError, RestifyResult};
pub use response::{CacheEntry, Response};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use transport::{HttpTransport, Method, Transport};
