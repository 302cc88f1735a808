//! CLI command implementations

pub mod cache;
pub mod config;
pub mod request;

pub use cache::execute as cache;
pub use config::execute as config;
pub use request::{delete, find, get, post, put};
