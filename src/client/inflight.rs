//! Opt-in coalescing of concurrent fetches for the same key
//!
//! The first caller for a key (the leader) starts the transport call and
//! publishes it as a shared future. Callers arriving while it is pending
//! await the same future instead of issuing their own request.

use crate::error::{RestifyError, RestifyResult};
use crate::response::Response;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type SharedFetch = Shared<BoxFuture<'static, Result<Response, Arc<RestifyError>>>>;

/// Registry of pending fetches keyed by resolved cache key
#[derive(Default)]
pub struct InFlight {
    pending: Mutex<HashMap<String, SharedFetch>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches currently pending
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Join the pending fetch for `key`, or start one with `start`
    pub async fn fetch<F>(&self, key: &str, start: F) -> RestifyResult<Response>
    where
        F: FnOnce() -> BoxFuture<'static, RestifyResult<Response>>,
    {
        let (shared, leader) = {
            let mut pending = self.lock();
            match pending.get(key) {
                Some(existing) => {
                    debug!("Joining in-flight fetch for {}", key);
                    (existing.clone(), false)
                }
                None => {
                    let fetch = start().map(|result| result.map_err(Arc::new)).boxed().shared();
                    pending.insert(key.to_string(), fetch.clone());
                    (fetch, true)
                }
            }
        };

        let result = shared.await;

        if leader {
            self.lock().remove(key);
        }

        result.map_err(|e| {
            if leader {
                Arc::try_unwrap(e)
                    .unwrap_or_else(|shared| RestifyError::Coalesced(shared.to_string()))
            } else {
                RestifyError::Coalesced(e.to_string())
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SharedFetch>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
