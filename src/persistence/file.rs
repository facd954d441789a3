use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PersistenceResult, SnapshotBackend};

/// Snapshot backend storing `<dir>/<collection>.json`.
///
/// Writes go to `<collection>.json.tmp`, are synced, then renamed over the
/// live file, so a crash mid-write leaves the previous snapshot readable.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens (creating if needed) a data directory.
    pub fn open(dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn snapshot_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    fn temp_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json.tmp"))
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> io::Result<()> {
        File::open(&self.dir)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> io::Result<()> {
        Ok(())
    }
}

impl SnapshotBackend for FileBackend {
    fn load(&self, collection: &str) -> PersistenceResult<Option<Vec<u8>>> {
        match fs::read(self.snapshot_path(collection)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, collection: &str, bytes: &[u8]) -> PersistenceResult<()> {
        let temp_path = self.temp_path(collection);

        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.snapshot_path(collection))?;
        self.sync_directory()?;

        debug!(collection, bytes = bytes.len(), "Snapshot written");
        Ok(())
    }
}
