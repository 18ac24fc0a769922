//! RocksDB-backed button configuration store.
//!
//! Column families:
//! - `buttons`:  full button records (JSON, LZ4 compressed), keyed by id
//! - `metadata`: per-button bookkeeping (JSON: revision, created_at, updated_at)
//!
//! A record and its metadata are written in one `WriteBatch`, so readers
//! see either the previous pair or the new one. Puts are serialized inside
//! the store, so `revision` stays exact under concurrent writers. `get_all` iterates over the
//! implicit snapshot RocksDB takes when an iterator is created.

use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, DBWithThreadMode,
    IteratorMode, Options, SingleThreaded, WriteBatch, WriteOptions,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use super::{ConfigStore, StoreError};
use crate::model::ButtonConfig;

const CF_BUTTONS: &str = "buttons";
const CF_METADATA: &str = "metadata";

/// All column family names for initialization.
const COLUMN_FAMILIES: &[&str] = &[CF_BUTTONS, CF_METADATA];

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database directory path
    pub path: PathBuf,
    /// Block cache size in bytes (default: 32MB)
    pub block_cache_size: usize,
    /// Bloom filter bits per key (default: 10)
    pub bloom_filter_bits: i32,
    /// fsync on every write (default: true, one write per update)
    pub sync_writes: bool,
    /// Max open files for RocksDB (default: 256)
    pub max_open_files: i32,
    /// Write buffer size per column family (default: 16MB)
    pub write_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("orbit_data"),
            block_cache_size: 32 * 1024 * 1024,
            bloom_filter_bits: 10,
            sync_writes: true,
            max_open_files: 256,
            write_buffer_size: 16 * 1024 * 1024,
        }
    }
}

impl StoreConfig {
    /// Create config for testing (small caches, no fsync).
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            bloom_filter_bits: 10,
            sync_writes: false,
            max_open_files: 64,
            write_buffer_size: 2 * 1024 * 1024,
        }
    }
}

/// Bookkeeping stored next to each record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMetadata {
    /// Number of times the record has been written
    pub revision: u64,
    /// First write (seconds since epoch)
    pub created_at: u64,
    /// Last write (seconds since epoch)
    pub updated_at: u64,
}

impl ButtonMetadata {
    fn new() -> Self {
        let now = now_secs();
        Self {
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn encode(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}

/// RocksDB-backed [`ConfigStore`].
pub struct RocksConfigStore {
    /// RocksDB instance (single-threaded mode, concurrency via tokio)
    db: DBWithThreadMode<SingleThreaded>,
    config: StoreConfig,
    /// Serializes the metadata read-modify-write in `put`
    put_lock: Mutex<()>,
}

impl RocksConfigStore {
    /// Open the store, creating the database and column families if needed.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_keep_log_file_num(5);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Self::cf_options(&config)))
            .collect();

        let db = DBWithThreadMode::<SingleThreaded>::open_cf_descriptors(
            &db_opts,
            &config.path,
            cf_descriptors,
        )?;

        log::info!("Opened button store at {}", config.path.display());
        Ok(Self {
            db,
            config,
            put_lock: Mutex::new(()),
        })
    }

    fn cf_options(config: &StoreConfig) -> Options {
        let mut opts = Options::default();

        let mut block_opts = BlockBasedOptions::default();
        let cache = Cache::new_lru_cache(config.block_cache_size);
        block_opts.set_block_cache(&cache);
        block_opts.set_bloom_filter(config.bloom_filter_bits as f64, false);
        opts.set_block_based_table_factory(&block_opts);

        // Values are already LZ4 framed
        opts.set_compression_type(DBCompressionType::None);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(2);
        opts.optimize_for_point_lookup(config.block_cache_size as u64);
        opts
    }

    /// Load bookkeeping for a record.
    pub fn metadata(&self, id: &str) -> Result<Option<ButtonMetadata>, StoreError> {
        let cf = self.cf(CF_METADATA)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => ButtonMetadata::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Flush memtables to disk.
    pub fn sync(&self) -> Result<(), StoreError> {
        self.db.flush().map_err(|e| StoreError::Database(e.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("Column family '{name}' not found")))
    }

    fn encode_record(config: &ButtonConfig) -> Result<Vec<u8>, StoreError> {
        let json = config
            .to_json_bytes()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(lz4_flex::compress_prepend_size(&json))
    }

    fn decode_record(bytes: &[u8]) -> Result<ButtonConfig, StoreError> {
        let json = lz4_flex::decompress_size_prepended(bytes)
            .map_err(|e| StoreError::Compression(e.to_string()))?;
        ButtonConfig::from_json_bytes(&json).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}

impl ConfigStore for RocksConfigStore {
    fn get(&self, id: &str) -> Result<Option<ButtonConfig>, StoreError> {
        let cf = self.cf(CF_BUTTONS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Self::decode_record(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn get_all(&self) -> Result<BTreeMap<String, ButtonConfig>, StoreError> {
        let cf = self.cf(CF_BUTTONS)?;
        let mut records = BTreeMap::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let config = Self::decode_record(&value)?;
            records.insert(config.id.clone(), config);
        }

        Ok(records)
    }

    fn put(&self, config: &ButtonConfig) -> Result<(), StoreError> {
        let cf_buttons = self.cf(CF_BUTTONS)?;
        let cf_meta = self.cf(CF_METADATA)?;

        let _guard = self
            .put_lock
            .lock()
            .map_err(|_| StoreError::Database("put lock poisoned".into()))?;

        let mut meta = self.metadata(&config.id)?.unwrap_or_else(ButtonMetadata::new);
        meta.revision += 1;
        meta.updated_at = now_secs();

        let key = config.id.as_bytes();
        let mut batch = WriteBatch::default();
        batch.put_cf(cf_buttons, key, Self::encode_record(config)?);
        batch.put_cf(cf_meta, key, meta.encode()?);

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db.write_opt(batch, &write_opts)?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
