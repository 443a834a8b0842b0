use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{KeyValueStore, Result, StoreError, store::validate_key};

const VALUE_EXTENSION: &str = "kv";
const TEMP_EXTENSION: &str = "kv.tmp";

/// File-backed key-value store.
///
/// Each key lives in its own file under `root`. Writes go to a sibling
/// temp file which is flushed, synced and then renamed over the target, so
/// readers see either the old or the new contents.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the directory holding the value files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{VALUE_EXTENSION}", encode_key(key)))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{TEMP_EXTENSION}", encode_key(key)))
    }
}

/// Longest encoded stem written verbatim. Leaves room for the hash suffix
/// and extension under the usual 255-byte file name limit.
const MAX_STEM_LEN: usize = 200;

/// Maps a key onto a file name. Bytes outside `[A-Za-z0-9_-]` are written
/// as `%XX`, so distinct keys never collide.
///
/// Stems longer than [`MAX_STEM_LEN`] are truncated and suffixed with
/// `~` and a hash of the full key. `~` never appears in a verbatim stem.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }

    if out.len() > MAX_STEM_LEN {
        out.truncate(MAX_STEM_LEN);
        out.push_str(&format!("~{:016x}", fnv1a(key.as_bytes())));
    }
    out
}

/// 64-bit FNV-1a. Stable across builds, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, &byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

#[async_trait]
impl KeyValueStore for FileStore {
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;

        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    #[tracing::instrument(skip(self, value), fields(root = %self.root.display(), bytes = value.len()))]
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.root).await?;

        let temp_path = self.temp_path_for(key);
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&value).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, self.path_for(key)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::Io(e));
        }

        metrics::counter!("kv_store_file_writes_total").increment(1);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let _guard = self.write_lock.lock().await;

        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MAX_KEY_LEN;
    use tempfile::TempDir;

    #[test]
    fn encode_key_escapes_separators() {
        assert_eq!(encode_key("ledger/state"), "ledger%2Fstate");
        assert_eq!(encode_key("plain_key-1"), "plain_key-1");
        assert_ne!(encode_key("a/b"), encode_key("a%2Fb"));
    }

    #[test]
    fn encode_key_bounds_long_names() {
        let slashes = "/".repeat(MAX_KEY_LEN);
        let dots = ".".repeat(MAX_KEY_LEN);

        let a = encode_key(&slashes);
        let b = encode_key(&dots);

        assert!(a.len() <= MAX_STEM_LEN + 17);
        assert!(a.contains('~'));
        assert_ne!(a, b);
        assert_eq!(a, encode_key(&slashes));
        assert_eq!(encode_key("short"), "short");
    }

    #[tokio::test]
    async fn longest_key_of_escaped_bytes_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = "/".repeat(MAX_KEY_LEN);
        let other = format!("{}.", "/".repeat(MAX_KEY_LEN - 1));

        store.put(&key, b"first".to_vec()).await.unwrap();
        store.put(&other, b"second".to_vec()).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(store.get(&other).await.unwrap(), Some(b"second".to_vec()));

        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.put("ledger/state", b"{}".to_vec()).await.unwrap();
        let value = store.get("ledger/state").await.unwrap();

        assert_eq!(value, Some(b"{}".to_vec()));
        assert!(store.path_for("ledger/state").exists());
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("not-created-yet"));

        assert!(store.get("ledger").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.put("k", vec![1, 2, 3]).await.unwrap();
        store.put("k", vec![4, 5]).await.unwrap();

        assert!(!store.temp_path_for("k").exists());
        assert_eq!(store.get("k").await.unwrap(), Some(vec![4, 5]));
    }

    #[tokio::test]
    async fn values_survive_reopening() {
        let dir = TempDir::new().unwrap();
        FileStore::new(dir.path())
            .put("k", b"durable".to_vec())
            .await
            .unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.get("k").await.unwrap(), Some(b"durable".to_vec()));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.put("k", vec![1]).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();

        assert!(store.get("k").await.unwrap().is_none());
    }
}
