//! Async ingestion of Stormworks mod folders.
//!
//! An [`Ingestor`] takes a selection of files and directories, decodes every
//! part definition, `mod.xml` and `.mesh` it finds with `stormworks-decode`,
//! and commits the results to an [`AssetStore`]. Renderers hold an
//! [`AssetReader`] onto the same store.
//!
//! ```no_run
//! # async fn run() -> stormworks_assets::Result<()> {
//! use stormworks_assets::{AssetStore, Ingestor};
//!
//! let store = AssetStore::new();
//! let reader = store.reader();
//! let report = Ingestor::new(store).ingest(&["my_mod"]).await?;
//! println!("{} parts, {} failures", reader.parts().len(), report.failures.len());
//! # Ok(())
//! # }
//! ```

mod error;
pub mod ingest;
pub mod store;

pub use error::{Error, Result};
pub use ingest::{
    AssetKind, FileFailure, IngestOptions, IngestReport, Ingestor, VoxelDiagnostic,
};
pub use store::{AssetReader, AssetSnapshot, AssetStore, BatchId, DecodedAsset};
