use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::CdsError;

/// Named blobs that survive a restart of the engine.
pub trait KeyValueStore {
    /// Returns `Ok(None)` when nothing was ever written under `key`.
    fn read(&mut self, key: &str) -> Result<Option<Vec<u8>>, CdsError>;
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), CdsError>;
}

/// Directory-backed store: one file per key, replaced atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CdsError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CdsError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(CdsError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.cds")))
    }
}

impl KeyValueStore for FileStore {
    fn read(&mut self, key: &str) -> Result<Option<Vec<u8>>, CdsError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to `<key>.cds.tmp`, fsyncs, then renames over the live file.
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), CdsError> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("cds.tmp");
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            f.write_all(bytes)?;
            f.flush()?;
            f.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// In-process store, mostly for tests and hosts without a persistent area.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.blobs.get(key).map(Vec::as_slice)
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&mut self, key: &str) -> Result<Option<Vec<u8>>, CdsError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), CdsError> {
        self.blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
