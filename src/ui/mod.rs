//! Terminal output helpers for the CLI
//!
//! Styled with `console` on a terminal; plain bracketed prefixes when
//! output is piped or running in CI.

mod context;
mod output;

pub use context::UiContext;
pub use output::{key_value, remark, step_error_detail, step_ok, step_ok_detail, step_warn_hint};
