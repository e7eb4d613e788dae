// File persistence backend
// Keeps history and accounts as JSON arrays on local disk

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use medirisk_common::MediRiskError;
use medirisk_predict::DiseaseType;

use crate::EMAIL_TAKEN;
use crate::model::{HistoryQuery, Page, PredictionRecord, StorageMode, UserInfo};
use crate::traits::{PersistenceService, PredictionPersistence, UserPersistence};

/// Default history file name
pub const HISTORY_FILE: &str = "prediction_history.json";

/// Default accounts file name, stored next to the history file
pub const USERS_FILE: &str = "users.json";

/// Contents of a JSON array file
enum Loaded<T> {
    Items(Vec<T>),
    /// Present but not parseable; never overwritten
    Corrupt,
}

impl<T> Loaded<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Loaded::Items(items) => items,
            Loaded::Corrupt => Vec::new(),
        }
    }
}

/// JSON file persistence
///
/// Every read parses the whole file and every write replaces it through a
/// temporary file and a rename. A single async lock serializes access to
/// both files.
pub struct FilePersistService {
    history_path: PathBuf,
    users_path: PathBuf,
    lock: RwLock<()>,
}

impl FilePersistService {
    /// Use `history_path` for predictions and a sibling `users.json`
    pub async fn new(history_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let history_path = history_path.into();
        let users_path = history_path
            .parent()
            .map(|p| p.join(USERS_FILE))
            .unwrap_or_else(|| PathBuf::from(USERS_FILE));
        Self::with_paths(history_path, users_path).await
    }

    pub async fn with_paths(
        history_path: impl Into<PathBuf>,
        users_path: impl Into<PathBuf>,
    ) -> anyhow::Result<Self> {
        let service = Self {
            history_path: history_path.into(),
            users_path: users_path.into(),
            lock: RwLock::new(()),
        };
        Self::ensure_file(&service.history_path).await?;
        Self::ensure_file(&service.users_path).await?;
        Ok(service)
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Create the file as an empty array when missing
    async fn ensure_file(path: &Path) -> anyhow::Result<()> {
        if tokio::fs::try_exists(path).await? {
            return Ok(());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, b"[]").await?;
        debug!(path = %path.display(), "Created empty storage file");
        Ok(())
    }

    async fn read_array<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Loaded<T>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Loaded::Items(Vec::new()));
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(items) => Ok(Loaded::Items(items)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Storage file is not valid, reading as empty");
                Ok(Loaded::Corrupt)
            }
        }
    }

    /// Load for modification, refusing files that could not be parsed
    async fn read_for_write<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
        match Self::read_array(path).await? {
            Loaded::Items(items) => Ok(items),
            Loaded::Corrupt => Err(MediRiskError::StorageError(format!(
                "{} is not valid JSON, refusing to overwrite it",
                path.display()
            ))
            .into()),
        }
    }

    async fn write_array<T: Serialize>(path: &Path, items: &[T]) -> anyhow::Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(items)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn load_predictions(&self) -> anyhow::Result<Vec<PredictionRecord>> {
        let _guard = self.lock.read().await;
        Ok(Self::read_array(&self.history_path).await?.into_items())
    }

    async fn load_users(&self) -> anyhow::Result<Vec<UserInfo>> {
        let _guard = self.lock.read().await;
        Ok(Self::read_array(&self.users_path).await?.into_items())
    }
}

#[async_trait]
impl PredictionPersistence for FilePersistService {
    async fn prediction_add(&self, record: PredictionRecord) -> anyhow::Result<()> {
        let _guard = self.lock.write().await;
        let mut records: Vec<PredictionRecord> = Self::read_for_write(&self.history_path).await?;
        debug!(id = %record.id, disease = %record.disease_type(), "Appending prediction");
        records.push(record);
        Self::write_array(&self.history_path, &records).await
    }

    async fn prediction_find_all(&self) -> anyhow::Result<Vec<PredictionRecord>> {
        self.load_predictions().await
    }

    async fn prediction_find_page(
        &self,
        query: &HistoryQuery,
    ) -> anyhow::Result<Page<PredictionRecord>> {
        Ok(query.paginate(self.load_predictions().await?))
    }

    async fn prediction_find_last(
        &self,
        disease: DiseaseType,
    ) -> anyhow::Result<Option<PredictionRecord>> {
        Ok(self
            .load_predictions()
            .await?
            .into_iter()
            .filter(|r| r.disease_type() == disease)
            .max_by_key(|r| r.timestamp))
    }

    async fn prediction_find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<PredictionRecord>> {
        Ok(self
            .load_predictions()
            .await?
            .into_iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .collect())
    }
}

#[async_trait]
impl UserPersistence for FilePersistService {
    async fn user_find_by_email(&self, email: &str) -> anyhow::Result<Option<UserInfo>> {
        Ok(self
            .load_users()
            .await?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn user_find_by_id(&self, id: &str) -> anyhow::Result<Option<UserInfo>> {
        Ok(self.load_users().await?.into_iter().find(|u| u.id == id))
    }

    async fn user_create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> anyhow::Result<UserInfo> {
        let _guard = self.lock.write().await;
        let mut users: Vec<UserInfo> = Self::read_for_write(&self.users_path).await?;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(MediRiskError::Conflict(EMAIL_TAKEN.to_string()).into());
        }
        let user = UserInfo::new(email, name, password_hash);
        users.push(user.clone());
        Self::write_array(&self.users_path, &users).await?;
        Ok(user)
    }
}

#[async_trait]
impl PersistenceService for FilePersistService {
    fn storage_mode(&self) -> StorageMode {
        StorageMode::File
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        let _guard = self.lock.read().await;
        // Both files must be present; contents are checked on use
        tokio::fs::metadata(&self.history_path).await?;
        tokio::fs::metadata(&self.users_path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::record;
    use medirisk_predict::RiskLevel;
    use tempfile::TempDir;

    async fn create_test_service() -> (FilePersistService, TempDir) {
        let tmp_dir = TempDir::new().unwrap();
        let service = FilePersistService::new(tmp_dir.path().join("data").join(HISTORY_FILE))
            .await
            .unwrap();
        (service, tmp_dir)
    }

    #[tokio::test]
    async fn test_files_created_as_empty_arrays() {
        let (svc, tmp) = create_test_service().await;
        let history = std::fs::read_to_string(svc.history_path()).unwrap();
        assert_eq!(history, "[]");
        assert!(tmp.path().join("data").join(USERS_FILE).exists());
        assert!(svc.prediction_find_all().await.unwrap().is_empty());
        assert!(svc.health_check().await.is_ok());
        assert_eq!(svc.storage_mode(), StorageMode::File);
    }

    #[tokio::test]
    async fn test_add_and_find() {
        let (svc, _tmp) = create_test_service().await;
        let first = record(DiseaseType::Diabetes, RiskLevel::Low, (2024, 1, 1, 8));
        let second = record(DiseaseType::Diabetes, RiskLevel::High, (2024, 1, 2, 8));
        let other = record(DiseaseType::Hypertension, RiskLevel::Moderate, (2024, 1, 3, 8));
        svc.prediction_add(second.clone()).await.unwrap();
        svc.prediction_add(first.clone()).await.unwrap();
        svc.prediction_add(other.clone()).await.unwrap();

        let all = svc.prediction_find_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, second.id);

        // greatest timestamp wins over insertion order
        let last = svc
            .prediction_find_last(DiseaseType::Diabetes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(last.id, second.id);
        assert!(
            svc.prediction_find_last(DiseaseType::Cardiovascular)
                .await
                .unwrap()
                .is_none()
        );

        let page = svc
            .prediction_find_page(&HistoryQuery::new(None, 1, 2))
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.page_items[0].id, other.id);
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let (svc, _tmp) = create_test_service().await;
        let mut mine = record(DiseaseType::Diabetes, RiskLevel::Low, (2024, 1, 1, 8));
        mine.user_id = Some("u-1".to_string());
        svc.prediction_add(mine.clone()).await.unwrap();
        svc.prediction_add(record(DiseaseType::Diabetes, RiskLevel::Low, (2024, 1, 1, 9)))
            .await
            .unwrap();

        let found = svc.prediction_find_by_user("u-1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, mine.id);
    }

    #[tokio::test]
    async fn test_corrupt_history_reads_empty_and_is_preserved() {
        let (svc, _tmp) = create_test_service().await;
        std::fs::write(svc.history_path(), "{not json").unwrap();

        assert!(svc.prediction_find_all().await.unwrap().is_empty());
        let err = svc
            .prediction_add(record(DiseaseType::Diabetes, RiskLevel::Low, (2024, 1, 1, 8)))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MediRiskError>(),
            Some(MediRiskError::StorageError(_))
        ));
        assert_eq!(std::fs::read_to_string(svc.history_path()).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_missing_history_is_recreated_on_write() {
        let (svc, _tmp) = create_test_service().await;
        std::fs::remove_file(svc.history_path()).unwrap();
        assert!(svc.prediction_find_all().await.unwrap().is_empty());
        svc.prediction_add(record(DiseaseType::Diabetes, RiskLevel::Low, (2024, 1, 1, 8)))
            .await
            .unwrap();
        assert_eq!(svc.prediction_find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_create_and_conflict() {
        let (svc, _tmp) = create_test_service().await;
        let user = svc
            .user_create("Jane@Example.com", "Jane", "$2b$hash")
            .await
            .unwrap();

        let by_email = svc.user_find_by_email("jane@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        let by_id = svc.user_find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Jane");

        let err = svc
            .user_create("JANE@example.com", "Other", "$2b$x")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MediRiskError>(),
            Some(MediRiskError::Conflict(_))
        ));
        assert!(svc.user_find_by_id("missing").await.unwrap().is_none());
    }
}
