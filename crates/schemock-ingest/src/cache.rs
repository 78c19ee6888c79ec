//! Process-local cache of parsed entity sets.
//!
//! Entries are keyed by path and format and validated against the SHA-256
//! of the file content; an entry misses once its TTL has elapsed or the
//! content changed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::debug;

use schemock_core::EntitySet;

use crate::format::FormatId;

/// Cache collaborator consulted by the parser registry.
pub trait SchemaCache: Send + Sync {
    /// Entity set parsed from `path` as `format`, if still fresh.
    fn get_cached(&self, path: &Path, format: FormatId) -> Option<EntitySet>;
    fn set_cached(&self, path: &Path, format: FormatId, entities: &EntitySet);
}

struct CacheEntry {
    content_hash: String,
    stored_at: Instant,
    entities: EntitySet,
}

type CacheKey = (PathBuf, FormatId);

/// In-memory cache keyed by content hash with a fixed time-to-live.
pub struct ContentHashCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ContentHashCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SchemaCache for ContentHashCache {
    fn get_cached(&self, path: &Path, format: FormatId) -> Option<EntitySet> {
        let current_hash = hash_file(path)?;
        let key = (path.to_path_buf(), format);
        let mut entries = self.lock();
        let (expired, changed) = {
            let entry = entries.get(&key)?;
            (
                entry.stored_at.elapsed() >= self.ttl,
                entry.content_hash != current_hash,
            )
        };

        if expired || changed {
            debug!(
                path = %path.display(),
                format = %format,
                expired,
                changed,
                "cache entry invalidated"
            );
            entries.remove(&key);
            return None;
        }

        entries.get(&key).map(|entry| entry.entities.clone())
    }

    fn set_cached(&self, path: &Path, format: FormatId, entities: &EntitySet) {
        let Some(content_hash) = hash_file(path) else {
            return;
        };
        self.lock().insert(
            (path.to_path_buf(), format),
            CacheEntry {
                content_hash,
                stored_at: Instant::now(),
                entities: entities.clone(),
            },
        );
    }
}

/// Hex SHA-256 of a byte slice.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn hash_file(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|bytes| content_hash(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemock_core::Entity;
    use std::fs;

    fn entities() -> EntitySet {
        EntitySet::from_entities([Entity::new("User")]).expect("entity set")
    }

    #[test]
    fn hit_until_content_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schema.prisma");
        fs::write(&path, "model User {\n  id Int @id\n}\n").expect("write schema");

        let cache = ContentHashCache::new(Duration::from_secs(60));
        assert!(cache.get_cached(&path, FormatId::Prisma).is_none());

        cache.set_cached(&path, FormatId::Prisma, &entities());
        assert_eq!(cache.get_cached(&path, FormatId::Prisma), Some(entities()));

        fs::write(&path, "model User {\n  id String @id\n}\n").expect("rewrite schema");
        assert!(cache.get_cached(&path, FormatId::Prisma).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_always_expires() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schema.sql");
        fs::write(&path, "CREATE TABLE users (id INT);").expect("write schema");

        let cache = ContentHashCache::new(Duration::ZERO);
        cache.set_cached(&path, FormatId::Sql, &entities());
        assert_eq!(cache.len(), 1);
        assert!(cache.get_cached(&path, FormatId::Sql).is_none());
    }

    #[test]
    fn entries_are_separate_per_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schema.sql");
        fs::write(&path, "CREATE TABLE users (id INT);").expect("write schema");

        let cache = ContentHashCache::new(Duration::from_secs(60));
        cache.set_cached(&path, FormatId::Sql, &entities());

        assert!(cache.get_cached(&path, FormatId::Prisma).is_none());
        assert_eq!(cache.get_cached(&path, FormatId::Sql), Some(entities()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn content_hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
