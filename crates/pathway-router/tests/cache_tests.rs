//! Integration tests for compiled table caching
//!
//! Covers fingerprint-keyed reuse through the filesystem store and the
//! fallback to compilation when a stored table is unusable.

use pathway_router::cache::{self, FileStore, TableStore};
use pathway_router::*;
use pretty_assertions::assert_eq;
use std::fs;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn collector() -> RouteCollector {
    let mut collector = RouteCollector::new();
    collector.get("/", "home", Some("home")).unwrap();
    collector
        .get("/posts/{slug:[a-z0-9-]+}[/{page:\\d+}]", ("posts", "show"), Some("post"))
        .unwrap();
    collector
        .add_route(&["PUT", "PATCH"], "/posts/{slug}", ("posts", "update"), None)
        .unwrap();
    collector
}

#[test]
fn test_file_store_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = RouterConfig::default();
    let store = FileStore::new(dir.path()).unwrap();

    let first = collector().compile_cached(&config, &store).unwrap();

    let key = cache::fingerprint(&collector(), &config).unwrap();
    assert!(dir.path().join(format!("{}.json", key)).is_file());

    let second = collector().compile_cached(&config, &store).unwrap();
    assert_eq!(first.table(), second.table());

    let found = second.route("GET", "/posts/hello-world/2").unwrap();
    assert_eq!(found.handler.as_value(), &serde_json::json!(["posts", "show"]));
    assert_eq!(found.param("page"), Some("2"));
    assert_eq!(
        second.format_url_with("post", &[("slug", "hello-world")]).unwrap(),
        "/posts/hello-world"
    );
}

#[test]
fn test_changed_routes_use_a_new_entry() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = RouterConfig::default();
    let store = FileStore::new(dir.path()).unwrap();

    collector().compile_cached(&config, &store).unwrap();

    let mut changed = collector();
    changed.delete("/posts/{slug}", "posts.delete", None).unwrap();
    let dispatcher = changed.compile_cached(&config, &store).unwrap();

    assert!(dispatcher.route("DELETE", "/posts/x").is_ok());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_corrupt_file_falls_back_to_compiling() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = RouterConfig::default();
    let store = FileStore::new(dir.path()).unwrap();

    let key = cache::fingerprint(&collector(), &config).unwrap();
    fs::write(dir.path().join(format!("{}.json", key)), b"{\"routes\": 3}").unwrap();

    let dispatcher = collector().compile_cached(&config, &store).unwrap();
    assert!(dispatcher.route("GET", "/").is_ok());

    let repaired = store.load(&key).unwrap().unwrap();
    assert!(cache::decode(&repaired).is_ok());
}

#[test]
fn test_build_errors_are_not_masked_by_cache() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    let mut collector = RouteCollector::new();
    collector.get("/{a}", "first", None).unwrap();
    collector.get("/{b}", "second", None).unwrap();

    assert!(matches!(
        collector.compile_cached(&RouterConfig::default(), &store),
        Err(BuildError::DuplicateRoute { .. })
    ));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_store_from_config_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let tables = dir.path().join("tables");
    let config_path = dir.path().join("pathway.toml");

    fs::write(
        &config_path,
        format!("[cache]\nenabled = true\ndirectory = {:?}\n", tables.display().to_string()),
    )
    .unwrap();

    let config = RouterConfig::load(&config_path).unwrap();
    let store = config.open_store().unwrap().unwrap();
    assert_eq!(store.directory(), tables.as_path());

    collector().compile_cached(&config, &store).unwrap();
    assert_eq!(fs::read_dir(&tables).unwrap().count(), 1);
}
