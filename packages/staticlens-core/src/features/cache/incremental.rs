//! Incremental analysis cache
//!
//! A single versioned JSON document per analysis directory holding file
//! states (FNV-1a content hash, modification time, size) plus the cached
//! declarations and references per path. A version mismatch or corrupt
//! payload is a silent rebuild, never an error surfaced to the caller.
//! Writes go to a temporary sibling and are renamed into place.
//! Concurrent writers are not supported.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shared::models::{
    AccessLevel, CoreError, CoreResult, DecodeError, Declaration, DeclarationKind, Location,
    Reference, ReferenceContext, SourceRange,
};
use crate::shared::utils::fnv::fnv1a;

/// Current cache format version; any mismatch discards the cache.
pub const CACHE_VERSION: u32 = 1;

/// Name of the cache document inside the cache directory.
const CACHE_FILE_NAME: &str = "staticlens-cache.json";

/// Content fingerprint of one analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    /// FNV-1a over the file bytes
    pub content_hash: u64,
    pub modification_time: DateTime<Utc>,
    pub size: u64,
}

impl FileState {
    pub fn from_bytes(bytes: &[u8], modification_time: DateTime<Utc>) -> Self {
        Self {
            content_hash: fnv1a(bytes),
            modification_time,
            size: bytes.len() as u64,
        }
    }
}

/// Slim persisted form of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedDeclaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub access_level: AccessLevel,
    pub modifiers: Vec<String>,
    pub attributes: Vec<String>,
    pub location: Location,
    pub range: SourceRange,
    pub scope_id: String,
    pub signature: Option<String>,
    pub conformances: Vec<String>,
    pub type_annotation: Option<String>,
}

impl From<&Declaration> for CachedDeclaration {
    fn from(declaration: &Declaration) -> Self {
        Self {
            name: declaration.name.clone(),
            kind: declaration.kind,
            access_level: declaration.access_level,
            modifiers: declaration.modifiers.clone(),
            attributes: declaration.attributes.clone(),
            location: declaration.location.clone(),
            range: declaration.range.clone(),
            scope_id: declaration.scope_id.clone(),
            signature: declaration.signature.clone(),
            conformances: declaration.conformances.clone(),
            type_annotation: declaration.type_annotation.clone(),
        }
    }
}

impl CachedDeclaration {
    /// Rehydrate into the full declaration model.
    pub fn into_declaration(self) -> Declaration {
        let mut declaration = Declaration::new(self.name, self.kind, self.location)
            .with_access(self.access_level)
            .with_range(self.range)
            .with_modifiers(self.modifiers)
            .with_attributes(self.attributes)
            .with_conformances(self.conformances)
            .with_scope(self.scope_id);
        declaration.signature = self.signature;
        declaration.type_annotation = self.type_annotation;
        declaration
    }
}

/// Slim persisted form of a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedReference {
    pub identifier: String,
    pub location: Location,
    pub scope_id: String,
    pub context: ReferenceContext,
    pub is_qualified: bool,
    pub qualifier: Option<String>,
}

impl From<&Reference> for CachedReference {
    fn from(reference: &Reference) -> Self {
        Self {
            identifier: reference.identifier.clone(),
            location: reference.location.clone(),
            scope_id: reference.scope_id.clone(),
            context: reference.context,
            is_qualified: reference.is_qualified,
            qualifier: reference.qualifier.clone(),
        }
    }
}

impl CachedReference {
    pub fn into_reference(self) -> Reference {
        Reference {
            identifier: self.identifier,
            location: self.location,
            scope_id: self.scope_id,
            context: self.context,
            is_qualified: self.is_qualified,
            qualifier: self.qualifier,
        }
    }
}

/// The persisted cache document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub file_states: BTreeMap<String, FileState>,
    pub declarations: BTreeMap<String, Vec<CachedDeclaration>>,
    pub references: BTreeMap<String, Vec<CachedReference>>,
}

impl CacheData {
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            timestamp: Utc::now(),
            file_states: BTreeMap::new(),
            declarations: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }

    /// Paths whose observed state differs from the cached one, plus paths
    /// never seen before.
    pub fn changed_files(&self, current: &BTreeMap<String, FileState>) -> Vec<String> {
        let mut changed: Vec<String> = current
            .iter()
            .filter(|(path, state)| self.file_states.get(*path) != Some(state))
            .map(|(path, _)| path.clone())
            .collect();
        changed.sort();
        changed
    }

    /// Cached paths that no longer exist in the observed set.
    pub fn removed_files(&self, current: &BTreeMap<String, FileState>) -> Vec<String> {
        self.file_states
            .keys()
            .filter(|path| !current.contains_key(*path))
            .cloned()
            .collect()
    }
}

/// File-backed cache with `load` / `save` / `clear` / `delete` lifecycle.
#[derive(Debug, Clone)]
pub struct IncrementalCache {
    path: PathBuf,
}

impl IncrementalCache {
    /// Cache located inside the caller-supplied directory.
    pub fn new(directory: &Path) -> Self {
        Self {
            path: directory.join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load with typed failures; callers wanting silent-rebuild semantics
    /// use [`IncrementalCache::load`].
    pub fn try_load(&self) -> CoreResult<CacheData> {
        let bytes = fs::read(&self.path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CoreError::FileNotFound(self.path.clone())
            } else {
                CoreError::Io(err)
            }
        })?;

        let data: CacheData = serde_json::from_slice(&bytes).map_err(|err| {
            CoreError::Decode(DecodeError::CorruptPayload(err.to_string()))
        })?;

        if data.version != CACHE_VERSION {
            return Err(CoreError::Decode(DecodeError::VersionMismatch {
                found: data.version,
                expected: CACHE_VERSION,
            }));
        }
        Ok(data)
    }

    /// Load the cache; any failure is a silent rebuild.
    pub fn load(&self) -> Option<CacheData> {
        match self.try_load() {
            Ok(data) => Some(data),
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "cache unavailable, rebuilding");
                None
            }
        }
    }

    /// Persist atomically: write a temporary sibling, then rename.
    pub fn save(&self, data: &CacheData) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(data)
            .map_err(|err| CoreError::Decode(DecodeError::CorruptPayload(err.to_string())))?;

        let temporary = self.path.with_extension("json.tmp");
        fs::write(&temporary, payload)?;
        fs::rename(&temporary, &self.path)?;
        Ok(())
    }

    /// Reset the cache to an empty document at the current version.
    pub fn clear(&self) -> CoreResult<()> {
        self.save(&CacheData::empty())
    }

    /// Remove the cache file entirely.
    pub fn delete(&self) -> CoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CoreError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ReferenceContext;

    fn sample_data() -> CacheData {
        let mut data = CacheData::empty();
        data.file_states.insert(
            "src/app.swift".to_string(),
            FileState::from_bytes(b"func main() {}", Utc::now()),
        );
        let declaration = Declaration::new(
            "main",
            DeclarationKind::Function,
            Location::new("src/app.swift", 1, 0),
        );
        data.declarations.insert(
            "src/app.swift".to_string(),
            vec![CachedDeclaration::from(&declaration)],
        );
        let reference = Reference::new(
            "helper",
            Location::new("src/app.swift", 2, 4),
            ReferenceContext::Call,
        );
        data.references.insert(
            "src/app.swift".to_string(),
            vec![CachedReference::from(&reference)],
        );
        data
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = IncrementalCache::new(dir.path());
        let data = sample_data();

        cache.save(&data).expect("save");
        let loaded = cache.load().expect("load");
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_missing_cache_is_silent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = IncrementalCache::new(dir.path());
        assert!(cache.load().is_none());
        assert!(matches!(
            cache.try_load(),
            Err(CoreError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_version_mismatch_discards() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = IncrementalCache::new(dir.path());

        let mut data = sample_data();
        data.version = 2;
        // Bypass `save` version handling by writing the document directly.
        std::fs::write(cache.path(), serde_json::to_vec(&data).expect("json")).expect("write");

        assert!(cache.load().is_none());
        assert!(matches!(
            cache.try_load(),
            Err(CoreError::Decode(DecodeError::VersionMismatch {
                found: 2,
                expected: 1
            }))
        ));
    }

    #[test]
    fn test_corrupt_payload_discards() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = IncrementalCache::new(dir.path());
        std::fs::write(cache.path(), b"{ not json").expect("write");

        assert!(cache.load().is_none());
        assert!(matches!(
            cache.try_load(),
            Err(CoreError::Decode(DecodeError::CorruptPayload(_)))
        ));
    }

    #[test]
    fn test_clear_and_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = IncrementalCache::new(dir.path());

        cache.save(&sample_data()).expect("save");
        cache.clear().expect("clear");
        let cleared = cache.load().expect("load after clear");
        assert!(cleared.file_states.is_empty());

        cache.delete().expect("delete");
        assert!(cache.load().is_none());
        // Deleting a missing cache is not an error.
        cache.delete().expect("delete again");
    }

    #[test]
    fn test_changed_files_diff() {
        let mut data = CacheData::empty();
        let now = Utc::now();
        data.file_states.insert(
            "a.swift".to_string(),
            FileState::from_bytes(b"let a = 1", now),
        );
        data.file_states.insert(
            "b.swift".to_string(),
            FileState::from_bytes(b"let b = 2", now),
        );

        let mut current = BTreeMap::new();
        // a.swift unchanged, b.swift edited, c.swift new.
        current.insert(
            "a.swift".to_string(),
            FileState::from_bytes(b"let a = 1", now),
        );
        current.insert(
            "b.swift".to_string(),
            FileState::from_bytes(b"let b = 22", now),
        );
        current.insert(
            "c.swift".to_string(),
            FileState::from_bytes(b"let c = 3", now),
        );

        assert_eq!(data.changed_files(&current), vec!["b.swift", "c.swift"]);
        assert!(data.removed_files(&current).is_empty());

        current.remove("a.swift");
        assert_eq!(data.removed_files(&current), vec!["a.swift"]);
    }

    #[test]
    fn test_cached_declaration_rehydrates() {
        let original = Declaration::new(
            "Service",
            DeclarationKind::Class,
            Location::new("s.swift", 3, 0),
        )
        .with_access(AccessLevel::Public)
        .with_conformances(vec!["Codable".to_string()]);

        let cached = CachedDeclaration::from(&original);
        let restored = cached.into_declaration();
        assert_eq!(restored.name, original.name);
        assert_eq!(restored.kind, original.kind);
        assert_eq!(restored.access_level, original.access_level);
        assert_eq!(restored.conformances, original.conformances);
    }
}
