//! Local implementation of the fetcher contract.

use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use bytes::Bytes;
use futures_util::stream;
use tracing::{debug, trace};

use crate::data::{DataSource, Priority};
use crate::error::{FetchError, Result};
use crate::fetcher::{DataCallback, DataFetcher};
use crate::stream::{ByteStream, ReleasableStream, ReleaseHandle};

/// Opens bundled assets by path.
pub trait AssetManager: Send + Sync {
    fn open(&self, path: &str) -> Result<ByteStream>;
}

/// [`AssetManager`] serving files below a root directory.
///
/// Paths are interpreted relative to the root, with a leading `/` ignored.
/// Paths that would leave the root are rejected.
#[derive(Debug, Clone)]
pub struct DirAssetManager {
    root: PathBuf,
}

impl DirAssetManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(FetchError::InvalidPath(path.to_string())),
            }
        }
        Ok(resolved)
    }
}

impl AssetManager for DirAssetManager {
    fn open(&self, path: &str) -> Result<ByteStream> {
        let contents = std::fs::read(self.resolve(path)?)?;
        Ok(Box::pin(stream::iter([Ok::<_, FetchError>(Bytes::from(contents))])))
    }
}

/// Fetches an asset through an [`AssetManager`].
///
/// The asset is opened synchronously inside [`DataFetcher::load_data`].
pub struct AssetPathFetcher<M> {
    manager: M,
    path: String,
    opened: Mutex<Option<ReleaseHandle>>,
}

impl<M: AssetManager> AssetPathFetcher<M> {
    pub fn new(manager: M, path: impl Into<String>) -> Self {
        Self {
            manager,
            path: path.into(),
            opened: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn take_opened(&self) -> Option<ReleaseHandle> {
        self.opened
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl<M: AssetManager> DataFetcher for AssetPathFetcher<M> {
    type Data = ByteStream;

    fn load_data(&self, priority: Priority, callback: Box<dyn DataCallback<ByteStream>>) {
        trace!(path = %self.path, %priority, "opening asset");
        match self.manager.open(&self.path) {
            Ok(body) => {
                let (stream, handle) = ReleasableStream::new(body);
                *self
                    .opened
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
                callback.on_data_ready(Some(Box::pin(stream)));
            }
            Err(error) => {
                debug!(path = %self.path, %error, "failed to open asset");
                callback.on_load_failed(error);
            }
        }
    }

    fn cleanup(&self) {
        if let Some(handle) = self.take_opened() {
            handle.release();
        }
    }

    fn cancel(&self) {}

    fn data_source(&self) -> DataSource {
        DataSource::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::oneshot_callback;
    use futures_util::StreamExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct MockAssets {
        closed: Arc<AtomicBool>,
        opens: AtomicUsize,
    }

    impl AssetManager for MockAssets {
        fn open(&self, path: &str) -> Result<ByteStream> {
            assert_eq!(path, "/some/asset/path");
            self.opens.fetch_add(1, Ordering::SeqCst);
            let flag = DropFlag(Arc::clone(&self.closed));
            Ok(Box::pin(stream::iter([Ok::<_, FetchError>(Bytes::from_static(b"asset"))]).map(
                move |chunk| {
                    let _keep = &flag;
                    chunk
                },
            )))
        }
    }

    fn fetcher() -> (AssetPathFetcher<MockAssets>, Arc<AtomicBool>) {
        let assets = MockAssets::default();
        let closed = Arc::clone(&assets.closed);
        (AssetPathFetcher::new(assets, "/some/asset/path"), closed)
    }

    #[tokio::test]
    async fn test_opens_stream_for_path() {
        let (fetcher, _closed) = fetcher();
        let (callback, rx) = oneshot_callback::<ByteStream>();
        fetcher.load_data(Priority::Normal, Box::new(callback));

        let mut stream = rx.await.unwrap().unwrap().expect("stream delivered");
        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b"asset"));
        assert_eq!(fetcher.manager.opens.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.data_source(), DataSource::Local);
    }

    #[tokio::test]
    async fn test_closes_opened_stream_on_cleanup() {
        let (fetcher, closed) = fetcher();
        let (callback, rx) = oneshot_callback::<ByteStream>();
        fetcher.load_data(Priority::Normal, Box::new(callback));
        let _stream = rx.await.unwrap().unwrap();

        fetcher.cleanup();
        assert!(closed.load(Ordering::SeqCst));
        fetcher.cleanup();
    }

    #[test]
    fn test_does_nothing_on_cleanup_if_no_data_loaded() {
        let (fetcher, closed) = fetcher();
        fetcher.cleanup();
        assert!(!closed.load(Ordering::SeqCst));
        assert_eq!(fetcher.manager.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_does_nothing_on_cancel() {
        let (fetcher, closed) = fetcher();
        let (callback, rx) = oneshot_callback::<ByteStream>();
        fetcher.load_data(Priority::Normal, Box::new(callback));
        let _stream = rx.await.unwrap().unwrap();

        fetcher.cancel();
        assert!(!closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dir_asset_manager_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/logo.png"), b"png-bytes").unwrap();

        let fetcher = AssetPathFetcher::new(DirAssetManager::new(dir.path()), "/img/logo.png");
        let (callback, rx) = oneshot_callback::<ByteStream>();
        fetcher.load_data(Priority::High, Box::new(callback));

        let stream = rx.await.unwrap().unwrap().unwrap();
        let bytes: Vec<u8> = stream
            .map(|chunk| chunk.unwrap().to_vec())
            .concat()
            .await;
        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn test_dir_asset_manager_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = AssetPathFetcher::new(DirAssetManager::new(dir.path()), "missing.png");
        let (callback, rx) = oneshot_callback::<ByteStream>();
        fetcher.load_data(Priority::Normal, Box::new(callback));

        assert!(matches!(rx.await.unwrap(), Err(FetchError::Io(_))));
    }

    #[test]
    fn test_dir_asset_manager_rejects_escaping_paths() {
        let assets = DirAssetManager::new("/srv/assets");
        assert!(matches!(
            assets.open("../etc/passwd"),
            Err(FetchError::InvalidPath(_))
        ));
        assert_eq!(
            assets.resolve("/a/./b.png").unwrap(),
            PathBuf::from("/srv/assets/a/b.png")
        );
    }
}
