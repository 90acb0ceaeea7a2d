use crate::error::Result;
use crate::index::Index;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Human-readable summary written next to the snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn describe(index: &Index) -> Self {
        Self {
            num_docs: index.num_docs(),
            num_terms: index.idf().len(),
            created_at: index.created_at().to_string(),
            version: index.version(),
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn snapshot(&self) -> PathBuf { self.root.join("snapshot.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Write `bytes` to a uniquely named temporary file in `dir`, flushed to disk.
/// The file is removed on drop unless it is persisted.
fn write_temp(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        w.write_all(bytes)?;
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Persist the whole index.
///
/// Both files are staged as temporaries first. `meta.json` is moved into
/// place before `snapshot.bin`; the snapshot rename is the commit point, so an
/// error at any step leaves the previous snapshot in place.
pub fn save_snapshot(paths: &IndexPaths, index: &Index) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(index)?;
    let meta_json = serde_json::to_string_pretty(&MetaFile::describe(index))?;

    let snapshot_tmp = write_temp(&paths.root, &bytes)?;
    let meta_tmp = write_temp(&paths.root, meta_json.as_bytes())?;

    meta_tmp.persist(paths.meta()).map_err(|e| e.error)?;
    snapshot_tmp.persist(paths.snapshot()).map_err(|e| e.error)?;

    tracing::info!(path = %paths.snapshot().display(), num_docs = index.num_docs(), "saved index snapshot");
    Ok(())
}

/// Load and validate a snapshot.
pub fn load_snapshot(paths: &IndexPaths) -> Result<Index> {
    let bytes = fs::read(paths.snapshot())?;
    let index: Index = bincode::deserialize(&bytes)?;
    index.validate()?;
    tracing::info!(path = %paths.snapshot().display(), num_docs = index.num_docs(), "loaded index snapshot");
    Ok(index)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let f = File::open(paths.meta())?;
    let meta: MetaFile = serde_json::from_reader(BufReader::new(f))?;
    Ok(meta)
}
