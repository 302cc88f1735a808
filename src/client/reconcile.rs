//! Post-fetch reconciliation
//!
//! After every successful network call the fresh response is compared with
//! the stored entry for the request's key. The comparison decides whether
//! the response reaches the caller and whether it replaces the entry.

use crate::client::options::RequestOptions;
use crate::client::orchestrator::{Emitter, Engine, RequestContext};
use crate::client::stream::Origin;
use crate::error::RestifyResult;
use crate::response::{CacheEntry, Response};
use tracing::debug;

/// Stored entry for the request key, as far as the request has looked
#[derive(Debug, Clone)]
pub(crate) enum Lookup {
    /// Storage has not been consulted yet
    Unread,
    /// Result of the cache-check read
    Read(Option<CacheEntry>),
}

/// Whether the fresh response differs meaningfully from the stored entry
pub fn content_differs(existing: Option<&CacheEntry>, fresh: &Response) -> bool {
    match existing {
        None => true,
        Some(entry) => !entry.has_data() || entry.data != fresh.data,
    }
}

/// Whether a differing fresh response should replace the stored entry
pub fn should_persist(
    options: &RequestOptions,
    existing: Option<&CacheEntry>,
    fresh: &Response,
    now: i64,
) -> bool {
    if !options.save_network {
        return false;
    }

    match existing {
        None => true,
        Some(entry) => fresh.is_empty() || !entry.is_fresh(now),
    }
}

/// Build the entry persisted for a fresh response
///
/// Transport fields are stripped first; the cache transform sees only the
/// sanitized response and runs exactly once.
pub fn build_entry(
    options: &RequestOptions,
    fresh: Response,
    default_ttl: u64,
    now: i64,
) -> CacheEntry {
    let ttl = options.time_to_live.unwrap_or(default_ttl);
    let expires_at = now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX));
    CacheEntry::new(options.shape_for_storage(fresh.sanitize()), expires_at)
}

/// Emit and persist according to the reconciliation rules
pub(crate) async fn post_fetch(
    engine: &Engine,
    ctx: &RequestContext,
    lookup: Lookup,
    fresh: Response,
    cache_emitted: bool,
    emitter: &Emitter,
) -> RestifyResult<()> {
    let existing = match lookup {
        Lookup::Read(entry) => entry,
        Lookup::Unread => engine.storage.get(&ctx.key).await?,
    };
    let now = engine.clock.now_secs();

    if content_differs(existing.as_ref(), &fresh) {
        emitter.emit(Origin::Network, ctx.options.shape_for_caller(fresh.clone()));

        if should_persist(&ctx.options, existing.as_ref(), &fresh, now) {
            let entry = build_entry(&ctx.options, fresh, engine.default_ttl, now);
            engine.storage.set(&ctx.key, &entry).await?;
            debug!("Persisted {} until {}", ctx.key, entry.expires_at);
        } else {
            debug!("Response changed but entry for {} kept", ctx.key);
        }
    } else if ctx.options.network_first() || !cache_emitted {
        emitter.emit(Origin::Network, ctx.options.shape_for_caller(fresh));
    } else {
        debug!("Response for {} unchanged, cache already delivered it", ctx.key);
    }

    Ok(())
}
