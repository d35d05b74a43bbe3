//! Batch ingestion of dropped or selected filesystem entries.
//!
//! Directories are walked recursively, every recognized file is read and
//! decoded on its own task, and results flow back over a channel to a single
//! merge loop that commits them to the [`AssetStore`]. A failing file is
//! logged and reported but never stops its siblings.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use stormworks_decode::{ElementDiagnostic, decode_mesh, parse_mod, parse_part_definition_with};
use tokio::sync::Semaphore;

use crate::error::{Error, Result};
use crate::store::{AssetStore, BatchId, DecodedAsset};

/// How a file is decoded, chosen from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// `mod.xml`
    Mod,
    /// Any other `*.xml`
    Part,
    /// `*.mesh`
    Mesh,
}

impl AssetKind {
    /// Classify a path by file name and extension, ignoring case.
    #[must_use]
    pub fn classify(path: &Path) -> Option<Self> {
        let name = path.file_name().and_then(OsStr::to_str)?;
        if name.eq_ignore_ascii_case("mod.xml") {
            return Some(Self::Mod);
        }
        let extension = path.extension().and_then(OsStr::to_str)?;
        if extension.eq_ignore_ascii_case("xml") {
            Some(Self::Part)
        } else if extension.eq_ignore_ascii_case("mesh") {
            Some(Self::Mesh)
        } else {
            None
        }
    }
}

/// Runtime settings for an [`Ingestor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Upper bound on files being read and decoded at once.
    pub max_concurrent_reads: usize,
    /// Whether symlinked files and directories are followed while walking.
    pub follow_symlinks: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_concurrent_reads: 16,
            follow_symlinks: true,
        }
    }
}

impl IngestOptions {
    #[must_use]
    pub fn with_max_concurrent_reads(mut self, max_concurrent_reads: usize) -> Self {
        self.max_concurrent_reads = max_concurrent_reads.max(1);
        self
    }

    #[must_use]
    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }
}

/// A file that contributed nothing to the asset set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// A voxel that was replaced by the default while decoding a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelDiagnostic {
    pub path: PathBuf,
    pub diagnostic: ElementDiagnostic,
}

/// Outcome of one [`Ingestor::ingest`] call.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// The batch the results were committed under.
    pub batch: BatchId,
    pub parts: usize,
    pub meshes: usize,
    pub mods: usize,
    pub failures: Vec<FileFailure>,
    pub voxel_diagnostics: Vec<VoxelDiagnostic>,
    /// Files ignored because their kind was not recognized.
    pub skipped: Vec<PathBuf>,
    /// Decoded files dropped because a newer batch had started.
    pub discarded: usize,
}

impl IngestReport {
    /// Number of files committed to the store.
    #[must_use]
    pub fn committed(&self) -> usize {
        self.parts + self.meshes + self.mods
    }
}

/// Drives the decoders over a selection of paths.
#[derive(Debug, Clone)]
pub struct Ingestor {
    store: AssetStore,
    options: IngestOptions,
}

impl Ingestor {
    #[must_use]
    pub fn new(store: AssetStore) -> Self {
        Self {
            store,
            options: IngestOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the asset set with the contents of `paths`.
    ///
    /// Directories are walked recursively. Mesh keys are relative to the
    /// common root of the selection, using `/` separators. Per-file failures
    /// end up in the report; the returned error is reserved for the pipeline
    /// itself.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn ingest<P: AsRef<Path>>(&self, paths: &[P]) -> Result<IngestReport> {
        let batch = self.store.begin_batch();
        let mut report = IngestReport {
            batch,
            ..IngestReport::default()
        };

        let mut roots = Vec::new();
        let mut listings = Vec::new();
        for path in paths {
            let path = path.as_ref().to_path_buf();
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    fail(&mut report, Error::io(&path, &e));
                    continue;
                }
            };

            if metadata.is_dir() {
                roots.push(path.clone());
                listings.push(walk_dir(path, Vec::new(), self.options.follow_symlinks));
            } else {
                roots.push(path.parent().map(Path::to_path_buf).unwrap_or_default());
                listings.push(async move { Listing::file(path) }.boxed());
            }
        }

        let root = common_root(&roots);
        let mut files = Vec::new();
        for listing in join_all(listings).await {
            files.extend(listing.files);
            for error in listing.errors {
                fail(&mut report, error);
            }
        }

        tracing::debug!(
            batch = ?batch,
            root = %root.display(),
            files = files.len(),
            "ingesting asset batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_reads.max(1)));
        let (tx, rx) = async_channel::unbounded();
        let mut tasks = Vec::new();

        for path in files {
            let Some(kind) = AssetKind::classify(&path) else {
                tracing::trace!(path = %path.display(), "skipping unrecognized file");
                report.skipped.push(path);
                continue;
            };

            let key = relative_key(&root, &path);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let task_path = path.clone();
            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let outcome = load_file(task_path, key, kind).await;
                let _ = tx.send(outcome).await;
            });
            tasks.push((path, handle));
        }
        drop(tx);

        while let Ok(outcome) = rx.recv().await {
            self.merge(&mut report, outcome);
        }

        for (path, handle) in tasks {
            if let Err(e) = handle.await {
                let error = Error::from(e);
                tracing::error!(path = %path.display(), %error, "decode task did not finish");
                report.failures.push(FileFailure { path, error });
            }
        }

        tracing::debug!(
            batch = ?batch,
            parts = report.parts,
            meshes = report.meshes,
            failures = report.failures.len(),
            discarded = report.discarded,
            "finished asset batch"
        );
        Ok(report)
    }

    fn merge(&self, report: &mut IngestReport, outcome: FileOutcome) {
        let FileOutcome {
            path,
            result,
            diagnostics,
        } = outcome;

        let asset = match result {
            Ok(asset) => asset,
            Err(error) => {
                fail(report, error);
                return;
            }
        };

        let kind = match &asset {
            DecodedAsset::Mod(_) => AssetKind::Mod,
            DecodedAsset::Part(_) => AssetKind::Part,
            DecodedAsset::Mesh { .. } => AssetKind::Mesh,
        };
        if !self.store.commit(report.batch, asset) {
            report.discarded += 1;
            return;
        }

        match kind {
            AssetKind::Mod => report.mods += 1,
            AssetKind::Part => report.parts += 1,
            AssetKind::Mesh => report.meshes += 1,
        }
        report
            .voxel_diagnostics
            .extend(diagnostics.into_iter().map(|diagnostic| VoxelDiagnostic {
                path: path.clone(),
                diagnostic,
            }));
    }
}

fn fail(report: &mut IngestReport, error: Error) {
    let path = error.path().map(Path::to_path_buf).unwrap_or_default();
    tracing::error!(path = %path.display(), %error, "failed to ingest file");
    report.failures.push(FileFailure { path, error });
}

/// Result of reading and decoding one file.
struct FileOutcome {
    path: PathBuf,
    result: Result<DecodedAsset>,
    diagnostics: Vec<ElementDiagnostic>,
}

async fn load_file(path: PathBuf, key: String, kind: AssetKind) -> FileOutcome {
    let mut diagnostics = Vec::new();
    let result = match tokio::fs::read(&path).await {
        Ok(bytes) => decode_file(&path, key, kind, &bytes, &mut diagnostics),
        Err(e) => Err(Error::io(&path, &e)),
    };
    FileOutcome {
        path,
        result,
        diagnostics,
    }
}

fn decode_file(
    path: &Path,
    key: String,
    kind: AssetKind,
    bytes: &[u8],
    diagnostics: &mut Vec<ElementDiagnostic>,
) -> Result<DecodedAsset> {
    let decoded = match kind {
        AssetKind::Mesh => decode_mesh(bytes).map(|mesh| DecodedAsset::Mesh { key, mesh }),
        AssetKind::Mod => parse_mod(&xml_text(bytes)).map(DecodedAsset::Mod),
        AssetKind::Part => parse_part_definition_with(&xml_text(bytes), |diagnostic| {
            diagnostics.push(diagnostic);
        })
        .map(DecodedAsset::Part),
    };
    decoded.map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn xml_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

/// Files found under one selected entry.
#[derive(Default)]
struct Listing {
    files: Vec<PathBuf>,
    errors: Vec<Error>,
}

impl Listing {
    fn file(path: PathBuf) -> Self {
        Self {
            files: vec![path],
            errors: Vec::new(),
        }
    }

    fn error(error: Error) -> Self {
        Self {
            files: Vec::new(),
            errors: vec![error],
        }
    }
}

/// Recursively list `dir`. Sibling directories are walked concurrently.
///
/// `ancestors` holds the canonical paths of the directories above `dir`, a
/// symlink pointing back into one of them is not descended into.
fn walk_dir(
    dir: PathBuf,
    ancestors: Vec<PathBuf>,
    follow_symlinks: bool,
) -> BoxFuture<'static, Listing> {
    async move {
        let canonical = tokio::fs::canonicalize(&dir).await.unwrap_or_else(|_| dir.clone());
        if ancestors.contains(&canonical) {
            tracing::warn!(path = %dir.display(), "skipping symlink cycle");
            return Listing::default();
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => return Listing::error(Error::io(&dir, &e)),
        };

        let mut listing = Listing::default();
        let mut subdirs = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    listing.errors.push(Error::io(&dir, &e));
                    break;
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    listing.errors.push(Error::io(&path, &e));
                    continue;
                }
            };

            let is_dir = if file_type.is_symlink() {
                if !follow_symlinks {
                    tracing::trace!(path = %path.display(), "not following symlink");
                    continue;
                }
                match tokio::fs::metadata(&path).await {
                    Ok(metadata) => metadata.is_dir(),
                    Err(e) => {
                        listing.errors.push(Error::io(&path, &e));
                        continue;
                    }
                }
            } else {
                file_type.is_dir()
            };

            if is_dir {
                subdirs.push(path);
            } else {
                listing.files.push(path);
            }
        }

        let mut ancestors = ancestors;
        ancestors.push(canonical);
        let nested = subdirs
            .into_iter()
            .map(|subdir| walk_dir(subdir, ancestors.clone(), follow_symlinks));
        for sub in join_all(nested).await {
            listing.files.extend(sub.files);
            listing.errors.extend(sub.errors);
        }
        listing
    }
    .boxed()
}

/// Deepest directory containing every path in `roots`.
fn common_root(roots: &[PathBuf]) -> PathBuf {
    let Some((first, rest)) = roots.split_first() else {
        return PathBuf::new();
    };

    let mut common: Vec<Component<'_>> = first.components().collect();
    for root in rest {
        let shared = common
            .iter()
            .zip(root.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }
    common.into_iter().collect()
}

/// Lookup key of `path`: its components below `root`, joined with `/`.
fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(AssetKind::classify(Path::new("a/mod.xml")), Some(AssetKind::Mod));
        assert_eq!(AssetKind::classify(Path::new("MOD.XML")), Some(AssetKind::Mod));
        assert_eq!(AssetKind::classify(Path::new("a/engine.xml")), Some(AssetKind::Part));
        assert_eq!(AssetKind::classify(Path::new("a/b/hull.MESH")), Some(AssetKind::Mesh));
        assert_eq!(AssetKind::classify(Path::new("readme.txt")), None);
        assert_eq!(AssetKind::classify(Path::new("xml")), None);
        assert_eq!(AssetKind::classify(Path::new("thumbnail.png")), None);
    }

    #[test]
    fn test_common_root() {
        let roots = [
            PathBuf::from("/mods/boat/meshes"),
            PathBuf::from("/mods/boat/definitions"),
            PathBuf::from("/mods/boat"),
        ];
        assert_eq!(common_root(&roots), PathBuf::from("/mods/boat"));
        assert_eq!(common_root(&roots[..1]), PathBuf::from("/mods/boat/meshes"));
        assert_eq!(common_root(&[]), PathBuf::new());

        let disjoint = [PathBuf::from("a/b"), PathBuf::from("c/d")];
        assert_eq!(common_root(&disjoint), PathBuf::new());
    }

    #[test]
    fn test_relative_key() {
        let root = Path::new("/mods/boat");
        assert_eq!(
            relative_key(root, Path::new("/mods/boat/meshes/hull.mesh")),
            "meshes/hull.mesh"
        );
        assert_eq!(relative_key(Path::new(""), Path::new("a/b.mesh")), "a/b.mesh");
        assert_eq!(relative_key(Path::new("/other"), Path::new("/x/y.mesh")), "x/y.mesh");
    }

    #[test]
    fn test_options() {
        let options = IngestOptions::default();
        assert_eq!(options.max_concurrent_reads, 16);
        assert!(options.follow_symlinks);

        let options = options
            .with_max_concurrent_reads(0)
            .with_follow_symlinks(false);
        assert_eq!(options.max_concurrent_reads, 1);
        assert!(!options.follow_symlinks);
    }

    #[test]
    fn test_xml_text_strips_bom() {
        assert_eq!(xml_text("\u{feff}<a/>".as_bytes()), "<a/>");
        assert_eq!(xml_text(b"<a/>"), "<a/>");
    }
}
