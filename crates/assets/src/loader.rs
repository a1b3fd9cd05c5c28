use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError, bounded};

use crate::gltf::{ModelHandle, import_model};
use crate::AssetError;

/// Spawns background model loads.
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    root: Option<PathBuf>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Start loading a model on a worker thread and return immediately.
    pub fn load(&self, path: impl AsRef<Path>) -> PendingLoad {
        let path = self.resolve(path);
        let (tx, rx) = bounded(1);
        let worker_tx = tx.clone();
        let worker_path = path.clone();

        let spawned = std::thread::Builder::new()
            .name("asset-load".into())
            .spawn(move || {
                tracing::debug!(path = %worker_path.display(), "loading model");
                let result = import_model(&worker_path);
                // The receiver may be gone if the walk ended first.
                let _ = worker_tx.send(result);
            });
        if let Err(e) = spawned {
            let _ = tx.send(Err(AssetError::Io(e)));
        }

        PendingLoad { path, rx }
    }
}

/// A model load in flight; resolves exactly once.
#[derive(Debug)]
pub struct PendingLoad {
    path: PathBuf,
    rx: Receiver<Result<ModelHandle, AssetError>>,
}

impl PendingLoad {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blocking check for completion.
    ///
    /// Returns `None` while the worker is still running. Once a result has
    /// been returned the load should be dropped; polling again reports
    /// [`AssetError::Disconnected`].
    pub fn poll(&self) -> Option<Result<ModelHandle, AssetError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AssetError::Disconnected)),
        }
    }

    /// Block until the load finishes or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> Result<ModelHandle, AssetError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(AssetError::Timeout(timeout)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(AssetError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::tests::{DOG_GLTF, glb};

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn loads_gltf_in_background() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dog.gltf"), DOG_GLTF).unwrap();

        let loader = AssetLoader::with_root(dir.path());
        let model = loader.load("dog.gltf").wait(WAIT).unwrap();
        assert_eq!(model.mesh_count(), 2);
        assert_eq!(model.path, dir.path().join("dog.gltf"));
    }

    #[test]
    fn loads_glb_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dog.glb");
        std::fs::write(&path, glb(DOG_GLTF)).unwrap();

        let model = AssetLoader::new().load(&path).wait(WAIT).unwrap();
        assert_eq!(model.material_count(), 1);
    }

    #[test]
    fn missing_file_resolves_to_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pending = AssetLoader::with_root(dir.path()).load("nope.glb");
        assert!(matches!(pending.wait(WAIT), Err(AssetError::Io(_))));
    }

    #[test]
    fn poll_eventually_yields_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dog.gltf"), DOG_GLTF).unwrap();
        let pending = AssetLoader::with_root(dir.path()).load("dog.gltf");

        let deadline = std::time::Instant::now() + WAIT;
        let next = || loop {
            if let Some(result) = pending.poll() {
                break result;
            }
            assert!(std::time::Instant::now() < deadline, "load never finished");
            std::thread::sleep(Duration::from_millis(1));
        };
        assert!(next().is_ok());
        // The worker may still be exiting; once it has, the load reports gone.
        assert!(matches!(next(), Err(AssetError::Disconnected)));
    }

    #[test]
    fn absolute_paths_ignore_root() {
        let loader = AssetLoader::with_root("/assets");
        assert_eq!(loader.resolve("/tmp/a.glb"), PathBuf::from("/tmp/a.glb"));
        assert_eq!(loader.resolve("a.glb"), PathBuf::from("/assets/a.glb"));
    }
}
