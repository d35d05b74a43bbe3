//! The in-memory asset set shared between ingestion and rendering.
//!
//! [`AssetStore`] is the write handle held by the ingestion pipeline and
//! [`AssetReader`] the read-only handle given to consumers. Both wrap the same
//! `RwLock`, and every mutation happens under a single write lock so
//! concurrent completions append instead of overwriting each other.
//!
//! Each ingestion starts a new batch. Results tagged with an older batch are
//! dropped on commit, so a superseded ingestion can't leak into the current
//! set.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stormworks_decode::{MeshData, Mod, Part};

/// Identifies one ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(u64);

/// One successfully decoded file.
#[derive(Debug, Clone)]
pub enum DecodedAsset {
    /// Contents of a `mod.xml`.
    Mod(Mod),
    /// A part definition.
    Part(Part),
    /// A mesh, keyed by its path relative to the ingestion root.
    Mesh { key: String, mesh: MeshData },
}

#[derive(Debug, Default)]
struct AssetSet {
    batch: BatchId,
    mod_info: Option<Arc<Mod>>,
    parts: Vec<Arc<Part>>,
    meshes: HashMap<String, Arc<MeshData>>,
}

/// A consistent copy of the asset set at one point in time.
#[derive(Debug, Clone, Default)]
pub struct AssetSnapshot {
    pub batch: BatchId,
    pub mod_info: Option<Arc<Mod>>,
    pub parts: Vec<Arc<Part>>,
    pub meshes: HashMap<String, Arc<MeshData>>,
}

impl AssetSnapshot {
    /// Look up a mesh referenced by a part, see [`AssetReader::resolve_mesh`].
    #[must_use]
    pub fn resolve_mesh(&self, reference: &str) -> Option<&Arc<MeshData>> {
        resolve_key(&self.meshes, reference).and_then(|key| self.meshes.get(key))
    }
}

/// Write handle to the asset set.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    inner: Arc<RwLock<AssetSet>>,
}

impl AssetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A read-only handle onto the same asset set.
    #[must_use]
    pub fn reader(&self) -> AssetReader {
        AssetReader {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Start a new batch, clearing parts and meshes.
    ///
    /// The mod metadata survives until a new `mod.xml` is committed.
    pub fn begin_batch(&self) -> BatchId {
        let mut set = self.write();
        set.batch = BatchId(set.batch.0 + 1);
        set.parts.clear();
        set.meshes.clear();
        tracing::debug!(batch = set.batch.0, "started asset batch");
        set.batch
    }

    /// Add a decoded asset to the set.
    ///
    /// Returns `false` and discards the asset if `batch` is no longer the
    /// current batch. Meshes with an existing key replace the previous entry.
    pub fn commit(&self, batch: BatchId, asset: DecodedAsset) -> bool {
        let mut set = self.write();
        if set.batch != batch {
            tracing::debug!(
                stale = batch.0,
                current = set.batch.0,
                "discarding result from superseded batch"
            );
            return false;
        }

        match asset {
            DecodedAsset::Mod(mod_info) => set.mod_info = Some(Arc::new(mod_info)),
            DecodedAsset::Part(part) => set.parts.push(Arc::new(part)),
            DecodedAsset::Mesh { key, mesh } => {
                set.meshes.insert(key, Arc::new(mesh));
            }
        }
        true
    }

    fn write(&self) -> RwLockWriteGuard<'_, AssetSet> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only handle to the asset set.
#[derive(Debug, Clone)]
pub struct AssetReader {
    inner: Arc<RwLock<AssetSet>>,
}

impl AssetReader {
    /// Copy out the whole set under one lock.
    #[must_use]
    pub fn snapshot(&self) -> AssetSnapshot {
        let set = self.read();
        AssetSnapshot {
            batch: set.batch,
            mod_info: set.mod_info.clone(),
            parts: set.parts.clone(),
            meshes: set.meshes.clone(),
        }
    }

    #[must_use]
    pub fn current_batch(&self) -> BatchId {
        self.read().batch
    }

    #[must_use]
    pub fn mod_info(&self) -> Option<Arc<Mod>> {
        self.read().mod_info.clone()
    }

    #[must_use]
    pub fn parts(&self) -> Vec<Arc<Part>> {
        self.read().parts.clone()
    }

    /// Mesh stored under exactly `key`.
    #[must_use]
    pub fn mesh(&self, key: &str) -> Option<Arc<MeshData>> {
        self.read().meshes.get(key).cloned()
    }

    /// All mesh keys, sorted.
    #[must_use]
    pub fn mesh_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.read().meshes.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Look up a mesh referenced by a part's `mesh_*_name`.
    ///
    /// Tries the exact key, then a key ending in `/reference`, then a key
    /// with the same file name. Ties are broken by the smallest key.
    #[must_use]
    pub fn resolve_mesh(&self, reference: &str) -> Option<Arc<MeshData>> {
        let set = self.read();
        resolve_key(&set.meshes, reference).and_then(|key| set.meshes.get(key).cloned())
    }

    fn read(&self) -> RwLockReadGuard<'_, AssetSet> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve_key<'a, V>(meshes: &'a HashMap<String, V>, reference: &str) -> Option<&'a str> {
    let reference = reference.replace('\\', "/");
    let reference = reference.trim_start_matches("./").trim_start_matches('/');
    if reference.is_empty() {
        return None;
    }
    if let Some((key, _)) = meshes.get_key_value(reference) {
        return Some(key.as_str());
    }

    let suffix = format!("/{reference}");
    let by_suffix = meshes.keys().filter(|key| key.ends_with(&suffix)).min();
    if let Some(key) = by_suffix {
        return Some(key.as_str());
    }

    let file_name = Path::new(reference).file_name()?;
    meshes
        .keys()
        .filter(|key| Path::new(key.as_str()).file_name() == Some(file_name))
        .min()
        .map(String::as_str)
}
