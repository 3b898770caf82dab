//! Background loading of the core surface texture.
//!
//! The image is read (from disk or over HTTP) and decoded on its own thread.
//! The frame loop polls the loader without blocking and gets the outcome
//! exactly once. There is no retry, timeout or cancellation; a result that
//! arrives after the loader is dropped is discarded.

use std::io::Read;
use std::path::PathBuf;

use crossbeam_channel::{Receiver, TryRecvError, bounded};

/// Largest HTTP body accepted for a texture.
const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error("failed to read texture file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch texture from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("failed to read texture body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode texture: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture loader thread exited without a result")]
    WorkerLost,
}

/// Where the texture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    File(PathBuf),
    Url(String),
}

impl TextureSource {
    /// `http://` and `https://` strings are URLs, anything else is a path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::File(PathBuf::from(source))
        }
    }

    /// Read and decode synchronously.
    pub fn load(&self) -> Result<DecodedImage, TextureLoadError> {
        let bytes = match self {
            Self::File(path) => std::fs::read(path).map_err(|source| TextureLoadError::Io {
                path: path.clone(),
                source,
            })?,
            Self::Url(url) => {
                let response = ureq::get(url).call().map_err(|e| TextureLoadError::Http {
                    url: url.clone(),
                    source: Box::new(e),
                })?;
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .take(MAX_DOWNLOAD_BYTES)
                    .read_to_end(&mut bytes)
                    .map_err(|source| TextureLoadError::Body {
                        url: url.clone(),
                        source,
                    })?;
                bytes
            }
        };
        DecodedImage::from_bytes(&bytes)
    }
}

impl std::fmt::Display for TextureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Decode any format `image` was built with.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureLoadError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }
}

type LoadResult = Result<DecodedImage, TextureLoadError>;

/// One-shot texture load running off the frame loop.
pub struct TextureLoader {
    receiver: Option<Receiver<LoadResult>>,
}

impl TextureLoader {
    /// Start loading `source` on a background thread.
    pub fn spawn(source: TextureSource) -> Self {
        tracing::info!(%source, "loading core texture");
        Self::spawn_with(move || source.load())
    }

    /// Run an arbitrary load job on a background thread.
    pub fn spawn_with<F>(job: F) -> Self
    where
        F: FnOnce() -> LoadResult + Send + 'static,
    {
        let (sender, receiver) = bounded(1);
        let spawned = std::thread::Builder::new()
            .name("texture-loader".into())
            .spawn(move || {
                // The receiver may already be gone after teardown.
                let _ = sender.send(job());
            });
        if let Err(e) = spawned {
            // The job and its sender are dropped, so the first poll reports WorkerLost.
            tracing::error!(error = %e, "failed to spawn texture loader thread");
        }
        Self {
            receiver: Some(receiver),
        }
    }

    /// A loader whose outcome is already known.
    pub fn resolved(result: LoadResult) -> Self {
        let (sender, receiver) = bounded(1);
        let _ = sender.send(result);
        Self {
            receiver: Some(receiver),
        }
    }

    /// Non-blocking. Returns the outcome on the first poll after it arrives,
    /// then `None` forever.
    pub fn poll(&mut self) -> Option<LoadResult> {
        let receiver = self.receiver.as_ref()?;
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(TextureLoadError::WorkerLost),
        };
        self.receiver = None;
        Some(result)
    }

    /// Whether the outcome has not been handed over yet.
    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }

    /// Block until the outcome arrives. Test helper.
    #[cfg(test)]
    pub(crate) fn wait(&mut self) -> LoadResult {
        let receiver = self.receiver.take().expect("loader already resolved");
        receiver.recv().unwrap_or(Err(TextureLoadError::WorkerLost))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 10, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!(
            TextureSource::parse("https://cdn.example.com/planet.jpg"),
            TextureSource::Url("https://cdn.example.com/planet.jpg".into())
        );
        assert_eq!(
            TextureSource::parse("assets/planet.png"),
            TextureSource::File(PathBuf::from("assets/planet.png"))
        );
    }

    #[test]
    fn test_decode_png() {
        let image = DecodedImage::from_bytes(&png_bytes(4, 2)).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.rgba.len(), 4 * 2 * 4);
        assert_eq!(&image.rgba[..4], &[200, 40, 10, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = DecodedImage::from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, TextureLoadError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("core.png");
        std::fs::write(&path, png_bytes(8, 8)).unwrap();

        let mut loader = TextureLoader::spawn(TextureSource::File(path));
        let image = loader.wait().unwrap();
        assert_eq!(image.width, 8);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = TextureLoader::spawn(TextureSource::File(dir.path().join("missing.png")));
        let err = loader.wait().unwrap_err();
        assert!(matches!(err, TextureLoadError::Io { .. }), "got {err:?}");
    }

    #[test]
    fn test_poll_yields_outcome_once() {
        let mut loader = TextureLoader::resolved(Err(TextureLoadError::WorkerLost));
        assert!(loader.is_pending());
        assert!(matches!(loader.poll(), Some(Err(TextureLoadError::WorkerLost))));
        assert!(!loader.is_pending());
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_poll_is_non_blocking_while_pending() {
        let (gate_tx, gate_rx) = bounded::<()>(0);
        let mut loader = TextureLoader::spawn_with(move || {
            let _ = gate_rx.recv();
            DecodedImage::from_bytes(&png_bytes(1, 1))
        });
        assert!(loader.poll().is_none());
        assert!(loader.is_pending());
        gate_tx.send(()).unwrap();
        assert!(loader.wait().is_ok());
    }

    #[test]
    fn test_panicking_job_reports_worker_lost() {
        let mut loader = TextureLoader::spawn_with(|| panic!("decoder blew up"));
        assert!(matches!(loader.wait(), Err(TextureLoadError::WorkerLost)));
    }
}
