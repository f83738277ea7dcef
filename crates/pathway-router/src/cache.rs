//! Route table persistence
//!
//! A compiled [`RouteTable`] is plain data and encodes to JSON. Stores keep
//! encoded tables keyed by a fingerprint of the registered routes, so a
//! process can skip compilation when the route set has not changed.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::collector::RouteCollector;
use crate::compiler::RouteTable;
use crate::config::RouterConfig;
use crate::error::CacheError;
use crate::handler::Handler;
use crate::method::Method;

/// Encodes a table to bytes
pub fn encode(table: &RouteTable) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(table).map_err(CacheError::Encode)
}

/// Decodes a table produced by [`encode`], recompiling its expressions
pub fn decode(bytes: &[u8]) -> Result<RouteTable, CacheError> {
    serde_json::from_slice(bytes).map_err(CacheError::Decode)
}

#[derive(Serialize)]
struct FingerprintEntry<'a> {
    methods: &'a [Method],
    path: &'a str,
    handler: &'a Handler,
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    version: &'static str,
    regex_size_limit: usize,
    routes: Vec<FingerprintEntry<'a>>,
}

/// Hex SHA-256 of the registered routes and the settings that shape the table
pub fn fingerprint(collector: &RouteCollector, config: &RouterConfig) -> Result<String, CacheError> {
    let input = FingerprintInput {
        version: env!("CARGO_PKG_VERSION"),
        regex_size_limit: config.regex_size_limit,
        routes: collector
            .routes()
            .iter()
            .map(|route| FingerprintEntry {
                methods: route.methods(),
                path: route.path(),
                handler: route.handler(),
                name: route.name(),
            })
            .collect(),
    };

    let bytes = serde_json::to_vec(&input).map_err(CacheError::Encode)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Trait for encoded table stores
pub trait TableStore: Send + Sync {
    /// Get an encoded table by fingerprint
    fn load(&self, fingerprint: &str) -> Result<Option<Vec<u8>>>;

    /// Store an encoded table
    fn save(&self, fingerprint: &str, bytes: &[u8]) -> Result<()>;

    /// Get store backend name
    fn name(&self) -> &'static str;
}

/// In-memory table store
///
/// Fast but non-persistent, tables are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tables
    pub fn len(&self) -> usize {
        self.tables.read().map(|tables| tables.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TableStore for MemoryStore {
    fn load(&self, fingerprint: &str) -> Result<Option<Vec<u8>>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| anyhow!("memory table store lock poisoned"))?;
        Ok(tables.get(fingerprint).cloned())
    }

    fn save(&self, fingerprint: &str, bytes: &[u8]) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| anyhow!("memory table store lock poisoned"))?;
        tables.insert(fingerprint.to_string(), bytes.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Filesystem table store
///
/// Stores each encoded table as `<fingerprint>.json` in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Create a new filesystem store, creating the directory if needed
    pub fn new(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)
            .with_context(|| format!("Failed to create table cache directory: {:?}", directory))?;

        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Get the file path for a fingerprint
    fn key_to_path(&self, fingerprint: &str) -> PathBuf {
        let safe_key: String = fingerprint
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        self.directory.join(format!("{}.json", safe_key))
    }
}

impl TableStore for FileStore {
    fn load(&self, fingerprint: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_to_path(fingerprint);

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read cached table: {:?}", path)),
        }
    }

    fn save(&self, fingerprint: &str, bytes: &[u8]) -> Result<()> {
        let path = self.key_to_path(fingerprint);

        fs::write(&path, bytes).with_context(|| format!("Failed to write cached table: {:?}", path))
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
