use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{entry_size, StorageBackend};

/// Directory-backed storage: one file per key, replaced atomically.
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>, quota_bytes: Option<u64>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes,
        }
    }

    /// Ensure the storage directory exists
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).context("Failed to create storage directory")?;
        }
        Ok(())
    }

    /// Map a key to its file, escaping anything that is not safe in a filename
    fn key_path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for b in key.bytes() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' => name.push(b as char),
                _ => name.push_str(&format!("_{:02x}", b)),
            }
        }
        self.dir.join(format!("{}.value", name))
    }

    /// Bytes used by every stored value except the one under `key`
    fn used_by_others(&self, key_path: &Path) -> Result<u64> {
        let mut total = 0u64;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == key_path || path.extension().map_or(true, |ext| ext != "value") {
                continue;
            }
            if entry.file_type()?.is_file() {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    }
}

impl StorageBackend for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(value))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir()?;
        let path = self.key_path(key);

        if let Some(quota) = self.quota_bytes {
            let needed = self.used_by_others(&path)? + entry_size(key, value);
            if needed > quota {
                bail!("storage quota of {} bytes exceeded ({} needed)", quota, needed);
            }
        }

        // Write beside the target then rename over it so readers never see
        // a half-written value
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }

        tracing::debug!(key, bytes = value.len(), "Saved storage value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}
