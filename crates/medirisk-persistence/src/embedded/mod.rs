// Embedded persistence backend using RocksDB
// Provides standalone (single-node) storage without an external database

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use tracing::{debug, info};

use medirisk_common::MediRiskError;
use medirisk_predict::DiseaseType;

use crate::EMAIL_TAKEN;
use crate::model::{HistoryQuery, Page, PredictionRecord, StorageMode, UserInfo};
use crate::traits::{PersistenceService, PredictionPersistence, UserPersistence};

pub const CF_PREDICTIONS: &str = "predictions";
pub const CF_USERS: &str = "users";

/// Standalone embedded persistence using RocksDB
///
/// Predictions are keyed by `{unix_millis:020}-{uuid}` so key order is
/// chronological. Users are keyed by lower-cased email.
pub struct EmbeddedPersistService {
    db: Arc<DB>,
    // check-then-put for new accounts must not interleave
    user_lock: Mutex<()>,
}

impl EmbeddedPersistService {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_PREDICTIONS, cf_opts.clone()),
            ColumnFamilyDescriptor::new(CF_USERS, cf_opts),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cfs)
            .map_err(|e| anyhow::anyhow!("RocksDB open error: {}", e))?;
        info!(path = %path.as_ref().display(), "RocksDB storage initialized");
        Ok(Self::new(Arc::new(db)))
    }

    /// Create from a raw RocksDB instance
    pub fn new(db: Arc<DB>) -> Self {
        Self {
            db,
            user_lock: Mutex::new(()),
        }
    }

    /// Get a column family handle
    fn cf(&self, name: &str) -> anyhow::Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| anyhow::anyhow!("Column family '{}' not found", name))
    }

    /// Write a serializable value to a column family
    fn put_json<T: serde::Serialize>(&self, cf_name: &str, key: &str, value: &T) -> anyhow::Result<()> {
        let cf = self.cf(cf_name)?;
        self.db
            .put_cf(cf, key.as_bytes(), serde_json::to_vec(value)?)
            .map_err(|e| anyhow::anyhow!("RocksDB put error: {}", e))
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &str,
    ) -> anyhow::Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        let value = self
            .db
            .get_cf(cf, key.as_bytes())
            .map_err(|e| anyhow::anyhow!("RocksDB get error: {}", e))?;
        value
            .map(|v| serde_json::from_slice(&v).map_err(anyhow::Error::from))
            .transpose()
    }

    /// Visit every value of a column family in key order (or reverse)
    fn scan<T, F>(&self, cf_name: &str, reverse: bool, mut visit: F) -> anyhow::Result<()>
    where
        T: serde::de::DeserializeOwned,
        F: FnMut(T) -> bool,
    {
        let cf = self.cf(cf_name)?;
        let mode = if reverse {
            IteratorMode::End
        } else {
            IteratorMode::Start
        };
        for item in self.db.iterator_cf(cf, mode) {
            let (_, value) = item.map_err(|e| anyhow::anyhow!("RocksDB iterator error: {}", e))?;
            if !visit(serde_json::from_slice(&value)?) {
                break;
            }
        }
        Ok(())
    }

    pub fn prediction_key(record: &PredictionRecord) -> String {
        format!(
            "{:020}-{}",
            record.timestamp.timestamp_millis().max(0),
            record.id
        )
    }

    pub fn user_key(email: &str) -> String {
        email.to_lowercase()
    }
}

#[async_trait]
impl PredictionPersistence for EmbeddedPersistService {
    async fn prediction_add(&self, record: PredictionRecord) -> anyhow::Result<()> {
        let key = Self::prediction_key(&record);
        debug!(key = %key, "Appending prediction");
        self.put_json(CF_PREDICTIONS, &key, &record)
    }

    async fn prediction_find_all(&self) -> anyhow::Result<Vec<PredictionRecord>> {
        let mut records = Vec::new();
        self.scan(CF_PREDICTIONS, false, |r: PredictionRecord| {
            records.push(r);
            true
        })?;
        Ok(records)
    }

    async fn prediction_find_page(
        &self,
        query: &HistoryQuery,
    ) -> anyhow::Result<Page<PredictionRecord>> {
        let offset = query.offset();
        let mut total = 0u64;
        let mut items = Vec::new();
        self.scan(CF_PREDICTIONS, true, |r: PredictionRecord| {
            if query.matches(&r) {
                if total >= offset && (items.len() as u64) < query.page_size {
                    items.push(r);
                }
                total += 1;
            }
            true
        })?;
        Ok(Page::new(total, query.page_no, query.page_size, items))
    }

    async fn prediction_find_last(
        &self,
        disease: DiseaseType,
    ) -> anyhow::Result<Option<PredictionRecord>> {
        let mut found = None;
        self.scan(CF_PREDICTIONS, true, |r: PredictionRecord| {
            if r.disease_type() == disease {
                found = Some(r);
                return false;
            }
            true
        })?;
        Ok(found)
    }

    async fn prediction_find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<PredictionRecord>> {
        let mut records = Vec::new();
        self.scan(CF_PREDICTIONS, false, |r: PredictionRecord| {
            if r.user_id.as_deref() == Some(user_id) {
                records.push(r);
            }
            true
        })?;
        Ok(records)
    }
}

#[async_trait]
impl UserPersistence for EmbeddedPersistService {
    async fn user_find_by_email(&self, email: &str) -> anyhow::Result<Option<UserInfo>> {
        self.get_json(CF_USERS, &Self::user_key(email))
    }

    async fn user_find_by_id(&self, id: &str) -> anyhow::Result<Option<UserInfo>> {
        let mut found = None;
        self.scan(CF_USERS, false, |u: UserInfo| {
            if u.id == id {
                found = Some(u);
                return false;
            }
            true
        })?;
        Ok(found)
    }

    async fn user_create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> anyhow::Result<UserInfo> {
        let key = Self::user_key(email);
        let _guard = self.user_lock.lock();
        if self.get_json::<UserInfo>(CF_USERS, &key)?.is_some() {
            return Err(MediRiskError::Conflict(EMAIL_TAKEN.to_string()).into());
        }
        let user = UserInfo::new(email, name, password_hash);
        self.put_json(CF_USERS, &key, &user)?;
        Ok(user)
    }
}

#[async_trait]
impl PersistenceService for EmbeddedPersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::Embedded
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        // Verify we can access column families
        self.cf(CF_PREDICTIONS)?;
        self.cf(CF_USERS)?;
        Ok(())
    }
}
