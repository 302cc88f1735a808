//! The request client
//!
//! [`Restify`] owns a pending option store and shares its collaborators
//! (storage, transport, clock) with every request it issues. Each verb
//! snapshots the pending options, resets the store, resolves the cache key
//! and returns a lazy [`RequestStream`].
//!
//! ```rust,ignore
//! use restify::{MemoryStorage, Restify};
//!
//! let mut client = Restify::builder()
//!     .endpoint("https://api.example.com/")
//!     .storage(Arc::new(MemoryStorage::new()))
//!     .transport(transport)
//!     .build()?;
//!
//! let outcome = client.use_cache(true).time_to_live(60).get("widgets").collect_all().await;
//! ```

#[cfg(test)]
pub(crate) mod fakes;
pub mod inflight;
pub mod key;
pub mod options;
mod orchestrator;
mod reconcile;
pub mod stream;

pub use options::{Filter, OptionStore, RequestOptions, Transform};
pub use reconcile::{build_entry, content_differs, should_persist};
pub use stream::{Emission, Origin, RequestOutcome, RequestStream};

use crate::clock::{Clock, SystemClock};
use crate::config::schema::Config;
use crate::error::{RestifyError, RestifyResult};
use crate::response::Response;
use crate::storage::{create_storage, Storage};
use crate::transport::{create_transport, Method, Transport};
use inflight::InFlight;
use orchestrator::{Engine, RequestContext};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Default path for [`Restify::find`]
pub const FIND_PATH: &str = "find";
/// Default path for [`Restify::find_one`]
pub const FIND_ONE_PATH: &str = "find-one";
/// Default path for [`Restify::toggle`]
pub const TOGGLE_PATH: &str = "toggle";

/// Builder for [`Restify`]
#[derive(Default)]
pub struct RestifyBuilder {
    endpoint: Option<String>,
    storage: Option<Arc<dyn Storage>>,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    coalesce: bool,
    default_ttl: u64,
}

impl RestifyBuilder {
    /// Base URL prepended to every request path
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Time source for expiry decisions (defaults to the system clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share one fetch between concurrent reads of the same key
    pub fn coalesce(mut self, enabled: bool) -> Self {
        self.coalesce = enabled;
        self
    }

    /// TTL in seconds for requests that do not set their own
    pub fn default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl = seconds;
        self
    }

    /// Validate the configuration and build the client
    pub fn build(self) -> RestifyResult<Restify> {
        let endpoint = self
            .endpoint
            .filter(|e| !e.is_empty())
            .ok_or(RestifyError::MissingEndpoint)?;
        let storage = self.storage.ok_or(RestifyError::MissingStorage)?;
        let transport = self.transport.ok_or(RestifyError::MissingTransport)?;

        debug!(
            "Client ready: endpoint={}, storage={}, coalesce={}",
            endpoint,
            storage.backend_name(),
            self.coalesce
        );

        Ok(Restify {
            engine: Arc::new(Engine {
                endpoint,
                storage,
                transport,
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                inflight: self.coalesce.then(InFlight::new),
                default_ttl: self.default_ttl,
            }),
            store: OptionStore::new(),
        })
    }
}

/// Cache-aware request client
pub struct Restify {
    engine: Arc<Engine>,
    store: OptionStore,
}

impl Restify {
    pub fn builder() -> RestifyBuilder {
        RestifyBuilder::default()
    }

    /// Build a client from a loaded configuration file
    pub async fn from_config(config: &Config) -> RestifyResult<Self> {
        if config.client.endpoint.is_empty() {
            return Err(RestifyError::MissingEndpoint);
        }

        let storage = create_storage(&config.cache).await?;
        let transport = create_transport(&config.client);

        Self::builder()
            .endpoint(config.client.endpoint.clone())
            .storage(storage)
            .transport(transport)
            .coalesce(config.client.coalesce)
            .default_ttl(config.cache.default_ttl_secs)
            .build()
    }

    /// A second handle over the same collaborators with its own option store
    pub fn fork(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            store: OptionStore::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.engine.endpoint
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.engine.storage
    }

    /// Options the next verb call would use
    pub fn pending(&self) -> &RequestOptions {
        self.store.pending()
    }

    /// Replace the pending options with a prepared value
    pub fn options(&mut self, options: RequestOptions) -> &mut Self {
        self.store.replace(options);
        self
    }

    pub fn use_network(&mut self, active: bool) -> &mut Self {
        self.store.use_network(active);
        self
    }

    pub fn save_network(&mut self, active: bool) -> &mut Self {
        self.store.save_network(active);
        self
    }

    pub fn transform_network<F>(&mut self, transform: F) -> &mut Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.store.transform_network(Arc::new(transform));
        self
    }

    pub fn time_to_live(&mut self, seconds: u64) -> &mut Self {
        self.store.time_to_live(seconds);
        self
    }

    pub fn use_cache(&mut self, active: bool) -> &mut Self {
        self.store.use_cache(active);
        self
    }

    pub fn transform_cache<F>(&mut self, transform: F) -> &mut Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.store.transform_cache(Arc::new(transform));
        self
    }

    pub fn key(&mut self, name: impl Into<String>) -> &mut Self {
        self.store.key(name);
        self
    }

    /// Append a query predicate (`where` in query-builder terms)
    pub fn filter(
        &mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.store.filter(field, operator, value);
        self
    }

    pub fn get(&mut self, path: &str) -> RequestStream {
        let options = self.store.take();
        let key = key::resolve(options.explicit_key(), self.endpoint(), path, None);
        self.dispatch(Method::Get, path, None, key, options, true)
    }

    pub fn post(&mut self, path: &str, payload: Value) -> RequestStream {
        let options = self.store.take();
        let key = key::resolve(options.explicit_key(), self.endpoint(), path, Some(&payload));
        self.dispatch(Method::Post, path, Some(payload), key, options, false)
    }

    pub fn put(&mut self, path: &str, payload: Value) -> RequestStream {
        let options = self.store.take();
        let key = key::resolve(options.explicit_key(), self.endpoint(), path, Some(&payload));
        self.dispatch(Method::Put, path, Some(payload), key, options, false)
    }

    pub fn delete(&mut self, path: &str) -> RequestStream {
        let mut options = self.store.take();
        options.force_network();
        let key = key::resolve(options.explicit_key(), self.endpoint(), path, None);
        self.dispatch(Method::Delete, path, None, key, options, false)
    }

    /// Write one record: PUT `{model, id, primaryKey}` to `path`
    pub fn set(
        &mut self,
        id: &str,
        model: Value,
        path: &str,
        primary_key: Option<&str>,
    ) -> RequestStream {
        let mut options = self.store.take();
        options.force_network();
        let key = key::resolve_record(options.explicit_key(), self.endpoint(), path, id);
        let payload = json!({
            "model": model,
            "id": id,
            "primaryKey": primary_key,
        });
        self.dispatch(Method::Put, path, Some(payload), key, options, false)
    }

    /// Query a collection; an empty `path` selects `find`
    pub fn find(&mut self, filters: Map<String, Value>, path: &str) -> RequestStream {
        self.query(filters, or_default(path, FIND_PATH))
    }

    /// Query a single record; an empty `path` selects `find-one`
    pub fn find_one(&mut self, filters: Map<String, Value>, path: &str) -> RequestStream {
        self.query(filters, or_default(path, FIND_ONE_PATH))
    }

    /// Flip state on a record: POST to `{id}/{path}`, always over the network
    pub fn toggle(&mut self, id: &str, filters: Map<String, Value>, path: &str) -> RequestStream {
        let mut options = self.store.take();
        options.force_network();
        let path = format!("{}/{}", id, or_default(path, TOGGLE_PATH));
        let payload = query_payload(filters, &options);
        let key = key::resolve(options.explicit_key(), self.endpoint(), &path, Some(&payload));
        self.dispatch(Method::Post, &path, Some(payload), key, options, false)
    }

    /// Remove one stored entry
    pub async fn remove(&self, key: &str) -> RestifyResult<()> {
        self.engine.storage.remove(key).await
    }

    /// Remove every stored entry
    pub async fn clear(&self) -> RestifyResult<()> {
        self.engine.storage.clear().await
    }

    fn query(&mut self, filters: Map<String, Value>, path: &str) -> RequestStream {
        let options = self.store.take();
        let payload = query_payload(filters, &options);
        let key = key::resolve(options.explicit_key(), self.endpoint(), path, Some(&payload));
        self.dispatch(Method::Post, path, Some(payload), key, options, true)
    }

    fn dispatch(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
        key: String,
        options: RequestOptions,
        coalescible: bool,
    ) -> RequestStream {
        let ctx = RequestContext {
            request_id: Uuid::new_v4(),
            method,
            url: format!("{}{}", self.engine.endpoint, path),
            payload,
            key,
            options,
            coalescible,
        };
        orchestrator::spawn_request(Arc::clone(&self.engine), ctx)
    }
}

fn or_default<'a>(path: &'a str, default: &'a str) -> &'a str {
    if path.is_empty() {
        default
    } else {
        path
    }
}

/// Caller filters plus the accumulated predicates under `query`
fn query_payload(mut filters: Map<String, Value>, options: &RequestOptions) -> Value {
    let query = options
        .filters
        .iter()
        .map(|f| json!({"field": f.field, "operator": f.operator, "value": f.value}))
        .collect();
    filters.insert("query".to_string(), Value::Array(query));
    Value::Object(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fakes::ScriptedTransport;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;

    const ENDPOINT: &str = "http://api.test/";

    struct Fixture {
        client: Restify,
        storage: Arc<MemoryStorage>,
        transport: Arc<ScriptedTransport>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let transport = Arc::new(ScriptedTransport::new());
        let clock = Arc::new(ManualClock::new(10_000));
        let client = Restify::builder()
            .endpoint(ENDPOINT)
            .storage(storage.clone())
            .transport(transport.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        Fixture {
            client,
            storage,
            transport,
            clock,
        }
    }

    #[test]
    fn build_requires_endpoint() {
        let err = Restify::builder()
            .storage(Arc::new(MemoryStorage::new()))
            .transport(Arc::new(ScriptedTransport::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RestifyError::MissingEndpoint));
    }

    #[test]
    fn build_rejects_empty_endpoint() {
        let err = Restify::builder().endpoint("").build().err().unwrap();
        assert!(matches!(err, RestifyError::MissingEndpoint));
    }

    #[test]
    fn build_requires_storage_then_transport() {
        let err = Restify::builder().endpoint(ENDPOINT).build().err().unwrap();
        assert!(matches!(err, RestifyError::MissingStorage));

        let err = Restify::builder()
            .endpoint(ENDPOINT)
            .storage(Arc::new(MemoryStorage::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RestifyError::MissingTransport));
    }

    #[tokio::test]
    async fn from_config_without_endpoint_fails() {
        let err = Restify::from_config(&Config::default()).await.err().unwrap();
        assert!(matches!(err, RestifyError::MissingEndpoint));
    }

    #[tokio::test]
    async fn verb_call_resets_pending_options() {
        let mut f = fixture();
        f.client
            .use_cache(true)
            .time_to_live(60)
            .key("custom")
            .filter("name", "==", "x")
            .transform_network(|r| r);

        let _stream = f.client.get("widgets");

        let pending = f.client.pending();
        assert!(pending.save_network);
        assert!(pending.filters.is_empty());
        assert!(pending.use_cache.is_none());
        assert!(pending.time_to_live.is_none());
        assert!(pending.key.is_none());
        assert!(pending.transform_network.is_none());
    }

    #[tokio::test]
    async fn second_call_does_not_reuse_options() {
        let mut f = fixture();
        f.transport.respond(Ok(Response::new(json!({"n": 1}))));
        f.transport.respond(Ok(Response::new(json!({"n": 1}))));

        f.client.save_network(false).get("widgets").collect_all().await;
        assert!(f.storage.is_empty().await);

        f.client.get("widgets").collect_all().await;
        assert_eq!(f.storage.len().await, 1);
    }

    #[tokio::test]
    async fn cache_first_scenario_with_ttl() {
        let mut f = fixture();
        f.transport.respond(Ok(Response::new(json!({"id": 1}))));

        let first = f
            .client
            .use_cache(true)
            .time_to_live(60)
            .get("widgets/1")
            .collect_all()
            .await;

        assert!(first.is_ok());
        assert_eq!(first.emissions.len(), 1);
        assert_eq!(first.emissions[0].origin, Origin::Network);
        assert_eq!(f.transport.calls().len(), 1);
        let entry = f.storage.get("http://api.test/widgets/1").await.unwrap().unwrap();
        assert_eq!(entry.expires_at, 10_060);

        f.clock.advance(10);
        let second = f
            .client
            .use_cache(true)
            .time_to_live(60)
            .get("widgets/1")
            .collect_all()
            .await;

        assert_eq!(second.emissions.len(), 1);
        assert_eq!(second.emissions[0].origin, Origin::Cache);
        assert_eq!(second.emissions[0].response.data, json!({"id": 1}));
        assert_eq!(f.transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn mutation_verbs_ignore_use_cache() {
        let mut f = fixture();
        let key = "http://api.test/widgets/1";
        f.storage
            .set(key, &crate::response::CacheEntry::new(Response::new(json!(1)), 99_999))
            .await
            .unwrap();

        let deleted = f.client.use_cache(true).delete("widgets/1").collect_all().await;
        let set = f
            .client
            .use_cache(true)
            .set("1", json!({"name": "w"}), "widgets/", None)
            .collect_all()
            .await;
        let toggled = f
            .client
            .use_cache(true)
            .toggle("1", Map::new(), "")
            .collect_all()
            .await;

        for outcome in [&deleted, &set, &toggled] {
            assert!(outcome.emissions.iter().all(|e| e.origin == Origin::Network));
        }
        assert_eq!(f.transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn set_sends_record_envelope() {
        let mut f = fixture();
        f.transport.respond(Ok(Response::new(json!({"ok": true}))));

        f.client
            .set("42", json!({"name": "w"}), "widgets/", Some("uid"))
            .collect_all()
            .await;

        let call = &f.transport.calls()[0];
        assert_eq!(call.method, Method::Put);
        assert_eq!(call.url, "http://api.test/widgets/");
        assert_eq!(
            call.payload,
            Some(json!({"model": {"name": "w"}, "id": "42", "primaryKey": "uid"}))
        );
        assert!(f
            .storage
            .get("http://api.test/widgets/42")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn find_posts_filters_and_query() {
        let mut f = fixture();
        let mut filters = Map::new();
        filters.insert("limit".to_string(), json!(5));

        f.client
            .filter("age", ">", 30)
            .find(filters, "")
            .collect_all()
            .await;

        let call = &f.transport.calls()[0];
        assert_eq!(call.method, Method::Post);
        assert_eq!(call.url, "http://api.test/find");
        assert_eq!(
            call.payload,
            Some(json!({
                "limit": 5,
                "query": [{"field": "age", "operator": ">", "value": 30}]
            }))
        );
    }

    #[tokio::test]
    async fn find_key_is_deterministic() {
        let mut f = fixture();
        f.transport.respond(Ok(Response::new(json!([1]))));

        f.client.find(Map::new(), "").collect_all().await;
        let second = f.client.use_cache(true).find(Map::new(), "").collect_all().await;

        assert_eq!(second.emissions[0].origin, Origin::Cache);
        assert!(f
            .storage
            .get(r#"http://api.test/find/{"query":[]}"#)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn find_one_and_toggle_use_default_paths() {
        let mut f = fixture();

        f.client.find_one(Map::new(), "").collect_all().await;
        f.client.toggle("7", Map::new(), "").collect_all().await;

        let urls: Vec<String> = f.transport.calls().into_iter().map(|c| c.url).collect();
        assert_eq!(urls, vec!["http://api.test/find-one", "http://api.test/7/toggle"]);
    }

    #[tokio::test]
    async fn fork_has_independent_options() {
        let mut f = fixture();
        f.client.use_cache(true);

        let fork = f.client.fork();

        assert!(fork.pending().use_cache.is_none());
        assert_eq!(f.client.pending().use_cache, Some(true));
        assert_eq!(fork.endpoint(), ENDPOINT);
    }

    #[tokio::test]
    async fn remove_and_clear_reach_storage() {
        let f = fixture();
        let entry = crate::response::CacheEntry::new(Response::new(json!(1)), 0);
        f.storage.set("a", &entry).await.unwrap();
        f.storage.set("b", &entry).await.unwrap();

        f.client.remove("a").await.unwrap();
        assert_eq!(f.storage.len().await, 1);

        f.client.clear().await.unwrap();
        assert!(f.storage.is_empty().await);
    }

    #[tokio::test]
    async fn options_value_applies_once() {
        let mut f = fixture();
        f.transport.respond(Ok(Response::new(json!(1))));

        let outcome = f
            .client
            .options(RequestOptions::new().with_key("pinned").with_time_to_live(5))
            .get("widgets")
            .collect_all()
            .await;

        assert!(outcome.is_ok());
        let entry = f.storage.get("pinned").await.unwrap().unwrap();
        assert_eq!(entry.expires_at, 10_005);
        assert!(f.client.pending().key.is_none());
    }
}
