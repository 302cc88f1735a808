//! Integration tests for Restify

mod client_tests {
    use async_trait::async_trait;
    use restify::{
        FileStorage, ManualClock, Method, Origin, Response, Restify, RestifyResult, Storage,
        Transport,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Echoes a counter so every network response differs from the last
    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn request(
            &self,
            method: Method,
            url: &str,
            _payload: Option<&Value>,
        ) -> RestifyResult<Response> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Response::new(json!({"n": n}))
                .with_field("status", json!(200))
                .with_field("request", json!({"method": method.as_str(), "url": url})))
        }
    }

    struct Setup {
        _dir: TempDir,
        client: Restify,
        storage: Arc<FileStorage>,
        transport: Arc<CountingTransport>,
        clock: Arc<ManualClock>,
    }

    async fn setup() -> Setup {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()).await.unwrap());
        let transport = Arc::new(CountingTransport::default());
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let client = Restify::builder()
            .endpoint("http://api.test/")
            .storage(storage.clone())
            .transport(transport.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        Setup {
            _dir: dir,
            client,
            storage,
            transport,
            clock,
        }
    }

    #[tokio::test]
    async fn cache_first_lifecycle_on_disk() {
        let mut s = setup().await;
        let key = "http://api.test/widgets";

        let first = s.client.use_cache(true).time_to_live(60).get("widgets").collect_all().await;
        assert_eq!(first.emissions.len(), 1);
        assert_eq!(first.emissions[0].origin, Origin::Network);

        let stored = s.storage.get(key).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, 1_700_000_060);
        assert_eq!(stored.fields.get("status"), Some(&json!(200)));
        assert!(!stored.fields.contains_key("request"));

        s.clock.advance(30);
        let cached = s.client.use_cache(true).get("widgets").collect_all().await;
        assert_eq!(cached.emissions.len(), 1);
        assert_eq!(cached.emissions[0].origin, Origin::Cache);
        assert_eq!(s.transport.calls.load(Ordering::SeqCst), 1);

        s.clock.advance(30);
        let refreshed = s.client.use_cache(true).get("widgets").collect_all().await;
        let origins: Vec<Origin> = refreshed.emissions.iter().map(|e| e.origin).collect();
        assert_eq!(origins, vec![Origin::Cache, Origin::Network]);
        assert_eq!(refreshed.latest().unwrap().data, json!({"n": 2}));
        assert_eq!(s.storage.get(key).await.unwrap().unwrap().data, json!({"n": 2}));
    }

    #[tokio::test]
    async fn typed_stream_decodes_payloads() {
        use futures_util::StreamExt;

        #[derive(serde::Deserialize)]
        struct Counter {
            n: u32,
        }

        let mut s = setup().await;
        let items: Vec<_> = s.client.get("counter").typed::<Counter>().collect().await;

        assert_eq!(items.len(), 1);
        let (origin, counter) = items.into_iter().next().unwrap().unwrap();
        assert_eq!(origin, Origin::Network);
        assert_eq!(counter.n, 1);
    }

    #[tokio::test]
    async fn forked_handles_share_storage() {
        let mut s = setup().await;
        let mut other = s.client.fork();

        s.client.get("shared").collect_all().await;
        let seen = other.use_cache(true).get("shared").collect_all().await;

        assert_eq!(seen.emissions[0].origin, Origin::Cache);
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn restify(config: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("restify");
        cmd.env("RESTIFY_CONFIG", config).env_remove("RESTIFY_ENDPOINT");
        cmd
    }

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        restify(&dir.path().join("config.toml"))
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache-aware REST client"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        restify(&dir.path().join("config.toml"))
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("restify"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        restify(&dir.path().join("config.toml"))
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        restify(&dir.path().join("config.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[client]"));
    }

    #[test]
    fn config_init_then_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        restify(&path).args(["config", "init"]).assert().success();
        restify(&path)
            .args(["config", "set", "client.endpoint", "http://api.test/"])
            .assert()
            .success();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("http://api.test/"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let dir = TempDir::new().unwrap();
        restify(&dir.path().join("config.toml"))
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn get_without_endpoint_fails() {
        let dir = TempDir::new().unwrap();
        restify(&dir.path().join("config.toml"))
            .args(["get", "widgets"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Endpoint needed"));
    }

    #[test]
    fn get_unreachable_endpoint_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[client]\nendpoint = \"http://127.0.0.1:1/\"\ntimeout_secs = 2\n\n[cache]\nbackend = \"memory\"\n",
        );
        restify(&path)
            .args(["get", "widgets", "--network"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Connection error"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[client\n");
        restify(&path)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("config init --force"));
    }

    #[test]
    fn cache_remove_and_clear() {
        let dir = TempDir::new().unwrap();
        let entries = dir.path().join("entries");
        let path = write_config(
            &dir,
            &format!("[cache]\nbackend = \"file\"\ndir = {:?}\n", entries.display().to_string()),
        );

        restify(&path)
            .args(["cache", "remove", "http://api.test/widgets"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Entry removed"));
        restify(&path)
            .args(["cache", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache cleared"));
    }

    #[test]
    fn cache_show_missing_entry_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[cache]\nbackend = \"memory\"\n");
        restify(&path)
            .args(["cache", "show", "nothing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No entry stored"));
    }
}
