//! Request orchestration
//!
//! Each request walks a small state machine:
//!
//! ```text
//! Start ─┬─ use_network ──▶ NetworkOnly ──▶ Fetch ──▶ Complete
//!        └─ otherwise ────▶ CacheCheck ──┬─ fresh hit ──▶ Complete
//!                                        └─ otherwise ──▶ Fetch ──▶ Complete
//! ```
//!
//! Any transport or storage failure ends the request with a single error.
//! The body runs on its own task, so a caller dropping the stream never
//! interrupts a storage write that is already underway.

use crate::client::inflight::InFlight;
use crate::client::key;
use crate::client::options::RequestOptions;
use crate::client::reconcile::{self, Lookup};
use crate::client::stream::{Emission, Origin, RequestStream};
use crate::clock::Clock;
use crate::error::{RestifyError, RestifyResult};
use crate::response::Response;
use crate::storage::Storage;
use crate::transport::{Method, Transport};
use futures_util::{FutureExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Collaborators shared by every request issued from one configuration
pub(crate) struct Engine {
    pub endpoint: String,
    pub storage: Arc<dyn Storage>,
    pub transport: Arc<dyn Transport>,
    pub clock: Arc<dyn Clock>,
    pub inflight: Option<InFlight>,
    pub default_ttl: u64,
}

/// Everything one request needs, owned by that request alone
#[derive(Debug, Clone)]
pub(crate) struct RequestContext {
    pub request_id: Uuid,
    pub method: Method,
    pub url: String,
    pub payload: Option<Value>,
    pub key: String,
    pub options: RequestOptions,
    /// Reads may share a fetch with concurrent identical reads
    pub coalescible: bool,
}

impl RequestContext {
    /// Identity under which concurrent fetches are shared
    ///
    /// Two requests share a fetch only when they would send the same thing,
    /// so an explicit key alone never merges different requests.
    pub fn fetch_identity(&self) -> String {
        let payload = self
            .payload
            .as_ref()
            .map(key::stable_serialize)
            .unwrap_or_default();
        format!("{} {} {} {}", self.key, self.method, self.url, payload)
    }
}

/// Sending half of a request stream
pub(crate) struct Emitter {
    tx: mpsc::UnboundedSender<RestifyResult<Emission>>,
}

impl Emitter {
    pub fn emit(&self, origin: Origin, response: Response) {
        if self.tx.send(Ok(Emission::new(origin, response))).is_err() {
            debug!("Caller went away, {} emission dropped", origin);
        }
    }

    pub fn fail(&self, error: RestifyError) {
        if self.tx.send(Err(error)).is_err() {
            debug!("Caller went away, error dropped");
        }
    }
}

#[derive(Debug)]
enum Phase {
    Start,
    NetworkOnly,
    CacheCheck,
    Fetch(Lookup),
    Complete,
}

/// Build the lazy stream for a request; nothing runs until it is polled
pub(crate) fn spawn_request(engine: Arc<Engine>, ctx: RequestContext) -> RequestStream {
    let stream = async_stream::stream! {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(run(engine, ctx, Emitter { tx }));
        while let Some(item) = rx.recv().await {
            yield item;
        }
    };
    RequestStream::new(stream.boxed())
}

pub(crate) async fn run(engine: Arc<Engine>, ctx: RequestContext, emitter: Emitter) {
    let span = info_span!(
        "restify.request",
        request_id = %ctx.request_id,
        method = %ctx.method,
        key = %ctx.key,
    );

    async move {
        let mut request = Orchestration {
            engine: &engine,
            ctx: &ctx,
            emitter: &emitter,
            cache_emitted: false,
        };

        match request.drive().await {
            Ok(()) => debug!("Request complete"),
            Err(e) => {
                warn!("Request failed: {}", e);
                emitter.fail(e);
            }
        }
    }
    .instrument(span)
    .await
}

struct Orchestration<'a> {
    engine: &'a Engine,
    ctx: &'a RequestContext,
    emitter: &'a Emitter,
    cache_emitted: bool,
}

impl Orchestration<'_> {
    async fn drive(&mut self) -> RestifyResult<()> {
        let mut phase = Phase::Start;

        loop {
            phase = match phase {
                Phase::Start if self.ctx.options.network_first() => Phase::NetworkOnly,
                Phase::Start => Phase::CacheCheck,
                Phase::NetworkOnly => Phase::Fetch(Lookup::Unread),
                Phase::CacheCheck => self.check_cache().await?,
                Phase::Fetch(lookup) => {
                    let fresh = self.fetch().await?;
                    reconcile::post_fetch(
                        self.engine,
                        self.ctx,
                        lookup,
                        fresh,
                        self.cache_emitted,
                        self.emitter,
                    )
                    .await?;
                    Phase::Complete
                }
                Phase::Complete => return Ok(()),
            };
        }
    }

    async fn check_cache(&mut self) -> RestifyResult<Phase> {
        let options = &self.ctx.options;
        let entry = self.engine.storage.get(&self.ctx.key).await?;

        if options.cache_enabled() {
            if let Some(cached) = entry.as_ref().filter(|e| e.has_data()) {
                debug!("Emitting cached entry");
                self.emitter
                    .emit(Origin::Cache, options.shape_for_caller(cached.to_response()));
                self.cache_emitted = true;
            }
        }

        let now = self.engine.clock.now_secs();
        let fresh_hit = options.cache_enabled()
            && entry
                .as_ref()
                .is_some_and(|e| e.is_fresh(now) && e.has_data());

        if fresh_hit {
            debug!("Cached entry still fresh, skipping network");
            return Ok(Phase::Complete);
        }

        Ok(Phase::Fetch(Lookup::Read(entry)))
    }

    async fn fetch(&self) -> RestifyResult<Response> {
        let transport = Arc::clone(&self.engine.transport);
        let method = self.ctx.method;
        let url = self.ctx.url.clone();
        let payload = self.ctx.payload.clone();
        let call = move || {
            async move { transport.request(method, &url, payload.as_ref()).await }.boxed()
        };

        match &self.engine.inflight {
            Some(inflight) if self.ctx.coalescible => {
                inflight.fetch(&self.ctx.fetch_identity(), call).await
            }
            _ => call().await,
        }
    }
}
