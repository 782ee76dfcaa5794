//! Durable storage for a [`CorpusIndex`].
//!
//! A saved corpus is a directory holding:
//!
//! - `manifest.json`: format version, embedding model, dimensions, chunk count
//! - `vectors.bin`: the flat vector index (bincode)
//! - `chunks.json`: chunk texts, in position order
//! - `chunks_meta.json`: `{doc_name, chunk_id}` records, in position order
//! - `chunks_export.json`: optional `{position, doc_name, chunk_id, text}`
//!   records for inspection; never read back
//!
//! Saving writes a complete bundle into a staging directory next to the
//! target and then swaps directories, so a reader sees either the previous
//! bundle or the new one. Loading treats any missing required artifact as
//! "no index" and any disagreement between artifacts as an error.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::corpus::CorpusIndex;
use crate::document::{Chunk, ChunkMetadata};
use crate::error::{RagError, Result};
use crate::index::FlatL2Index;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const METADATA_FILE: &str = "chunks_meta.json";
pub const EXPORT_FILE: &str = "chunks_export.json";

const REQUIRED_FILES: [&str; 4] = [MANIFEST_FILE, VECTORS_FILE, CHUNKS_FILE, METADATA_FILE];

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Summary of a saved bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreManifest {
    pub format_version: u32,
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ExportRecord<'a> {
    position: usize,
    doc_name: &'a str,
    chunk_id: usize,
    text: &'a str,
}

/// Reads and writes corpus bundles under one directory.
///
/// # Example
///
/// ```rust,ignore
/// use lecture_rag::IndexStore;
///
/// let store = IndexStore::new("index").with_export(true);
/// store.save(&corpus)?;
/// let corpus = store.load_required()?;
/// ```
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
    export: bool,
}

impl IndexStore {
    /// Create a store rooted at `dir`. Nothing is touched until `save`/`load`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), export: false }
    }

    /// Also write the human-readable `chunks_export.json` on save.
    pub fn with_export(mut self, export: bool) -> Self {
        self.export = export;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether every required artifact is present.
    pub fn exists(&self) -> bool {
        self.missing_artifact().is_none()
    }

    fn missing_artifact(&self) -> Option<&'static str> {
        REQUIRED_FILES.into_iter().find(|name| !self.dir.join(name).is_file())
    }

    /// Write `corpus` as a complete bundle, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the directory already exists and
    /// is neither empty nor a saved bundle. Returns an I/O or encoding error
    /// if the bundle cannot be written; the previously saved bundle, if any,
    /// is left in place.
    pub fn save(&self, corpus: &CorpusIndex) -> Result<StoreManifest> {
        let (parent, name) = self.split_dir()?;
        self.check_replaceable()?;
        fs::create_dir_all(&parent)?;

        let manifest = StoreManifest {
            format_version: FORMAT_VERSION,
            embedding_model: corpus.embedding_model().to_string(),
            dimensions: corpus.index().dimensions(),
            chunk_count: corpus.len(),
            created_at: Utc::now(),
        };

        let staging = parent.join(format!("{name}.staging-{}", Uuid::new_v4().simple()));
        fs::create_dir(&staging)?;
        if let Err(e) = self.write_bundle(&staging, corpus, &manifest) {
            remove_quietly(&staging);
            return Err(e);
        }

        self.swap_in(&staging, &parent, &name)?;

        info!(
            dir = %self.dir.display(),
            chunk_count = manifest.chunk_count,
            dimensions = manifest.dimensions,
            "saved corpus index"
        );
        Ok(manifest)
    }

    /// Load the saved bundle.
    ///
    /// Returns `Ok(None)` when the directory or any required artifact is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexUnavailable`] if the artifacts disagree on
    /// length or dimension or use an unknown format version, and decoding
    /// errors if an artifact is corrupt.
    pub fn load(&self) -> Result<Option<CorpusIndex>> {
        if let Some(missing) = self.missing_artifact() {
            debug!(dir = %self.dir.display(), missing, "index artifact missing");
            return Ok(None);
        }

        let manifest: StoreManifest = read_json(&self.dir.join(MANIFEST_FILE))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(RagError::IndexUnavailable(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                manifest.format_version
            )));
        }

        let index: FlatL2Index =
            bincode::deserialize_from(BufReader::new(File::open(self.dir.join(VECTORS_FILE))?))?;
        index.check_layout()?;
        let texts: Vec<String> = read_json(&self.dir.join(CHUNKS_FILE))?;
        let metadata: Vec<ChunkMetadata> = read_json(&self.dir.join(METADATA_FILE))?;

        let counts = [index.len(), texts.len(), metadata.len()];
        if counts.iter().any(|&n| n != manifest.chunk_count) {
            return Err(RagError::IndexUnavailable(format!(
                "artifact lengths disagree (manifest {}, vectors {}, texts {}, metadata {}); rebuild the index",
                manifest.chunk_count, counts[0], counts[1], counts[2]
            )));
        }
        if index.dimensions() != manifest.dimensions {
            return Err(RagError::IndexUnavailable(format!(
                "vector dimension {} does not match manifest dimension {}; rebuild the index",
                index.dimensions(),
                manifest.dimensions
            )));
        }

        let chunks = texts
            .into_iter()
            .zip(metadata)
            .map(|(text, metadata)| Chunk { text, metadata })
            .collect();
        let corpus = CorpusIndex::new(manifest.embedding_model, index, chunks)?;

        info!(dir = %self.dir.display(), chunk_count = corpus.len(), "loaded corpus index");
        Ok(Some(corpus))
    }

    /// Load the saved bundle, treating its absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexUnavailable`] if no complete bundle exists,
    /// plus everything [`IndexStore::load`] can return.
    pub fn load_required(&self) -> Result<CorpusIndex> {
        self.load()?.ok_or_else(|| {
            RagError::IndexUnavailable(format!(
                "no complete index in {}; build one first",
                self.dir.display()
            ))
        })
    }

    /// Read only the manifest of the saved bundle.
    pub fn manifest(&self) -> Result<Option<StoreManifest>> {
        let path = self.dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn split_dir(&self) -> Result<(PathBuf, String)> {
        let name = self
            .dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                RagError::ConfigError(format!(
                    "index directory {} must end in a UTF-8 directory name",
                    self.dir.display()
                ))
            })?
            .to_string();
        let parent = match self.dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((parent, name))
    }

    /// Only a missing path, an empty directory or a directory holding a
    /// manifest may be replaced by a new bundle.
    fn check_replaceable(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }
        if !self.dir.is_dir() {
            return Err(RagError::ConfigError(format!(
                "refusing to replace {}: it is not a directory",
                self.dir.display()
            )));
        }
        if self.dir.join(MANIFEST_FILE).is_file() || fs::read_dir(&self.dir)?.next().is_none() {
            return Ok(());
        }
        Err(RagError::ConfigError(format!(
            "refusing to replace {}: it holds files but no {MANIFEST_FILE}",
            self.dir.display()
        )))
    }

    fn write_bundle(
        &self,
        dir: &Path,
        corpus: &CorpusIndex,
        manifest: &StoreManifest,
    ) -> Result<()> {
        let mut vectors = BufWriter::new(File::create(dir.join(VECTORS_FILE))?);
        bincode::serialize_into(&mut vectors, corpus.index())?;
        finish(vectors)?;

        let texts: Vec<&str> = corpus.texts().collect();
        write_json(&dir.join(CHUNKS_FILE), &texts)?;
        let metadata: Vec<&ChunkMetadata> = corpus.metadata().collect();
        write_json(&dir.join(METADATA_FILE), &metadata)?;

        if self.export {
            let records: Vec<ExportRecord<'_>> = corpus
                .chunks()
                .iter()
                .enumerate()
                .map(|(position, chunk)| ExportRecord {
                    position,
                    doc_name: &chunk.metadata.doc_name,
                    chunk_id: chunk.metadata.chunk_id,
                    text: &chunk.text,
                })
                .collect();
            write_json(&dir.join(EXPORT_FILE), &records)?;
        }

        // Written last: a staging directory without a manifest is never loadable.
        write_json(&dir.join(MANIFEST_FILE), manifest)
    }

    fn swap_in(&self, staging: &Path, parent: &Path, name: &str) -> Result<()> {
        if !self.dir.exists() {
            return fs::rename(staging, &self.dir).map_err(|e| {
                remove_quietly(staging);
                RagError::Io(e)
            });
        }

        let backup = parent.join(format!("{name}.backup-{}", Uuid::new_v4().simple()));
        if let Err(e) = fs::rename(&self.dir, &backup) {
            remove_quietly(staging);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(staging, &self.dir) {
            if let Err(restore) = fs::rename(&backup, &self.dir) {
                warn!(
                    backup = %backup.display(),
                    error = %restore,
                    "could not restore previous index after failed swap"
                );
            }
            remove_quietly(staging);
            return Err(e.into());
        }
        remove_quietly(&backup);
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    finish(writer)
}

fn finish(mut writer: BufWriter<File>) -> Result<()> {
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

fn remove_quietly(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "failed to remove temporary index directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CorpusIndex {
        let index = FlatL2Index::build(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let chunks = vec![
            Chunk { text: "alpha".into(), metadata: ChunkMetadata::new("a.pdf", 0) },
            Chunk { text: "beta".into(), metadata: ChunkMetadata::new("a.pdf", 1) },
        ];
        CorpusIndex::new("test-model", index, chunks).unwrap()
    }

    #[test]
    fn save_replaces_previous_bundle_without_leftovers() {
        let temp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(temp.path().join("index"));

        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();

        let entries: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["index".to_string()]);
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn export_is_written_only_on_request() {
        let temp = tempfile::tempdir().unwrap();
        let plain = IndexStore::new(temp.path().join("plain"));
        plain.save(&sample()).unwrap();
        assert!(!plain.dir().join(EXPORT_FILE).exists());

        let exported = IndexStore::new(temp.path().join("exported")).with_export(true);
        exported.save(&sample()).unwrap();
        let records: Vec<serde_json::Value> =
            read_json(&exported.dir().join(EXPORT_FILE)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["position"], 1);
        assert_eq!(records[1]["doc_name"], "a.pdf");
        assert_eq!(records[1]["text"], "beta");
    }

    #[test]
    fn manifest_describes_bundle() {
        let temp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(temp.path().join("index"));
        assert!(store.manifest().unwrap().is_none());
        store.save(&sample()).unwrap();
        let manifest = store.manifest().unwrap().unwrap();
        assert_eq!(manifest.chunk_count, 2);
        assert_eq!(manifest.dimensions, 2);
        assert_eq!(manifest.embedding_model, "test-model");
    }
}
