//! Version Store
//!
//! In-memory store of immutable schema versions, indexed by id, by semantic
//! version and by snapshot hash. Generated diffs are cached here as well.

use crate::error::AppError;
use crate::versioning::types::{SchemaDiff, SchemaVersion};
use semver::Version;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Result of an insert: hash collisions resolve to the stored version
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(SchemaVersion),
    Existing(SchemaVersion),
}

#[derive(Default)]
struct StoreInner {
    versions: HashMap<Uuid, SchemaVersion>,
    by_number: BTreeMap<Version, Uuid>,
    by_hash: HashMap<String, Uuid>,
}

/// Store for schema versions. All indexes live behind one lock so an insert
/// is a single compare-and-set on the hash index.
pub struct VersionStore {
    inner: RwLock<StoreInner>,
    diffs: RwLock<HashMap<Uuid, SchemaDiff>>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            diffs: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new version unless one with the same hash exists
    pub async fn insert(&self, version: SchemaVersion) -> Result<InsertOutcome, AppError> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .by_hash
            .get(&version.snapshot_hash)
            .and_then(|id| inner.versions.get(id))
        {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }

        if inner.by_number.contains_key(&version.version) {
            return Err(AppError::Internal(format!(
                "version {} is already allocated",
                version.version
            )));
        }
        if let Some(latest) = inner.by_number.keys().next_back() {
            if version.version <= *latest {
                return Err(AppError::Internal(format!(
                    "version {} does not follow latest {}",
                    version.version, latest
                )));
            }
        }

        inner.by_hash.insert(version.snapshot_hash.clone(), version.id);
        inner.by_number.insert(version.version.clone(), version.id);
        inner.versions.insert(version.id, version.clone());

        tracing::info!(
            "Stored schema version {} ({} tables, hash {})",
            version.version,
            version.snapshot.tables.len(),
            &version.snapshot_hash[..12.min(version.snapshot_hash.len())]
        );

        Ok(InsertOutcome::Inserted(version))
    }

    pub async fn get(&self, id: Uuid) -> Option<SchemaVersion> {
        self.inner.read().await.versions.get(&id).cloned()
    }

    pub async fn get_by_number(&self, number: &Version) -> Option<SchemaVersion> {
        let inner = self.inner.read().await;
        inner
            .by_number
            .get(number)
            .and_then(|id| inner.versions.get(id))
            .cloned()
    }

    pub async fn find_by_hash(&self, hash: &str) -> Option<SchemaVersion> {
        let inner = self.inner.read().await;
        inner
            .by_hash
            .get(hash)
            .and_then(|id| inner.versions.get(id))
            .cloned()
    }

    pub async fn latest(&self) -> Option<SchemaVersion> {
        let inner = self.inner.read().await;
        inner
            .by_number
            .values()
            .next_back()
            .and_then(|id| inner.versions.get(id))
            .cloned()
    }

    /// All versions ordered by semantic version
    pub async fn list(&self) -> Vec<SchemaVersion> {
        let inner = self.inner.read().await;
        inner
            .by_number
            .values()
            .filter_map(|id| inner.versions.get(id))
            .cloned()
            .collect()
    }

    /// Immediate predecessor of `number`
    pub async fn previous(&self, number: &Version) -> Option<SchemaVersion> {
        let inner = self.inner.read().await;
        inner
            .by_number
            .range(..number.clone())
            .next_back()
            .and_then(|(_, id)| inner.versions.get(id))
            .cloned()
    }

    /// Next patch version after the latest, `1.0.0` for an empty store
    pub async fn next_version(&self) -> Version {
        let inner = self.inner.read().await;
        match inner.by_number.keys().next_back() {
            Some(latest) => Version::new(latest.major, latest.minor, latest.patch + 1),
            None => Version::new(1, 0, 0),
        }
    }

    /// Apply `update` to a stored version; nothing is written if it fails
    pub async fn update<F>(&self, id: Uuid, update: F) -> Result<SchemaVersion, AppError>
    where
        F: FnOnce(&mut SchemaVersion) -> Result<(), AppError>,
    {
        let mut inner = self.inner.write().await;
        let stored = inner
            .versions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Schema version {} not found", id)))?;

        let mut updated = stored.clone();
        update(&mut updated)?;
        *stored = updated.clone();

        Ok(updated)
    }

    pub async fn save_diff(&self, diff: SchemaDiff) {
        self.diffs.write().await.insert(diff.id, diff);
    }

    pub async fn get_diff(&self, id: Uuid) -> Option<SchemaDiff> {
        self.diffs.read().await.get(&id).cloned()
    }
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaSnapshot;
    use crate::versioning::types::{MetadataInput, VersionStatus};
    use chrono::Utc;

    fn version(number: &str, hash: &str) -> SchemaVersion {
        SchemaVersion {
            id: Uuid::new_v4(),
            version: Version::parse(number).unwrap(),
            created_at: Utc::now(),
            snapshot_hash: hash.to_string(),
            snapshot: SchemaSnapshot::default(),
            metadata: MetadataInput::default().merge(),
            ai_analysis: None,
            breaking_changes: Vec::new(),
            migration_plan: None,
            rollback_plan: None,
            confidence_score: 0.0,
            status: VersionStatus::Draft,
        }
    }

    #[test]
    fn test_empty_store() {
        let store = VersionStore::new();
        tokio_test::block_on(async {
            assert_eq!(store.next_version().await, Version::new(1, 0, 0));
            assert!(store.latest().await.is_none());
            assert!(store.list().await.is_empty());
        });
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = VersionStore::new();
        let v = version("1.0.0", "aaa");
        let id = v.id;

        assert!(matches!(store.insert(v).await.unwrap(), InsertOutcome::Inserted(_)));
        assert_eq!(store.get(id).await.unwrap().version, Version::new(1, 0, 0));
        assert_eq!(store.find_by_hash("aaa").await.unwrap().id, id);
        assert_eq!(
            store.get_by_number(&Version::new(1, 0, 0)).await.unwrap().id,
            id
        );
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_hash_returns_existing() {
        let store = VersionStore::new();
        let first = version("1.0.0", "aaa");
        let first_id = first.id;
        store.insert(first).await.unwrap();

        match store.insert(version("1.0.1", "aaa")).await.unwrap() {
            InsertOutcome::Existing(existing) => assert_eq!(existing.id, first_id),
            InsertOutcome::Inserted(_) => panic!("duplicate hash must not be inserted"),
        }
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_version_numbers_never_reused() {
        let store = VersionStore::new();
        store.insert(version("1.0.1", "aaa")).await.unwrap();

        assert!(store.insert(version("1.0.1", "bbb")).await.is_err());
        assert!(store.insert(version("1.0.0", "ccc")).await.is_err());
    }

    #[tokio::test]
    async fn test_semantic_ordering() {
        let store = VersionStore::new();
        assert_eq!(store.next_version().await, Version::new(1, 0, 0));

        for patch in 0..=10 {
            store
                .insert(version(&format!("1.0.{}", patch), &format!("h{}", patch)))
                .await
                .unwrap();
        }

        let numbers: Vec<String> = store
            .list()
            .await
            .iter()
            .map(|v| v.version.to_string())
            .collect();
        assert_eq!(numbers[9], "1.0.9");
        assert_eq!(numbers[10], "1.0.10");

        assert_eq!(store.latest().await.unwrap().version, Version::new(1, 0, 10));
        assert_eq!(
            store.previous(&Version::new(1, 0, 10)).await.unwrap().version,
            Version::new(1, 0, 9)
        );
        assert!(store.previous(&Version::new(1, 0, 0)).await.is_none());
        assert_eq!(store.next_version().await, Version::new(1, 0, 11));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_version_untouched() {
        let store = VersionStore::new();
        let v = version("1.0.0", "aaa");
        let id = v.id;
        store.insert(v).await.unwrap();

        let result = store
            .update(id, |v| {
                v.status = VersionStatus::Approved;
                Err(AppError::Validation("nope".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get(id).await.unwrap().status, VersionStatus::Draft);

        let missing = store.update(Uuid::new_v4(), |_| Ok(())).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
