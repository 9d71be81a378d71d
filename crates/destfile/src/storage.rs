use std::fs::{self, OpenOptions};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

/// A writable, seekable destination file handle.
pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek> WriteSeek for T {}

/// File-system operations the destination manager needs.
pub trait Storage {
    /// Creates (or truncates) the file called `name`.
    fn create(&mut self, name: &str) -> io::Result<Box<dyn WriteSeek>>;

    /// Moves a closed file.
    fn relocate(&mut self, from: &str, to: &str) -> io::Result<()>;
}

/// Storage on the local file system.
///
/// With a root, names are resolved beneath it (`/ram/a.dat` becomes
/// `<root>/ram/a.dat`); without one they are used as given.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    root: Option<PathBuf>,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn rooted(root: impl AsRef<Path>) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    /// Host path for a destination file name.
    pub fn resolve(&self, name: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(name.trim_start_matches('/')),
            None => PathBuf::from(name),
        }
    }
}

impl Storage for LocalStorage {
    fn create(&mut self, name: &str) -> io::Result<Box<dyn WriteSeek>> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(self.resolve(name))?;
        Ok(Box::new(file))
    }

    /// Renames; falls back to copy + remove when the rename crosses devices.
    fn relocate(&mut self, from: &str, to: &str) -> io::Result<()> {
        let src = self.resolve(from);
        let dst = self.resolve(to);
        if fs::rename(&src, &dst).is_err() {
            fs::copy(&src, &dst)?;
            fs::remove_file(&src)?;
        }
        Ok(())
    }
}
