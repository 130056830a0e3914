//! Cover processing backend trait and shared error type.
//!
//! The [`CoverBackend`] trait covers the three pixel-level operations the
//! cover pipeline needs: decode, resize, and PNG encode. Bounds detection
//! and sizing stay outside the trait — they are pure math over the
//! decoded buffer and identical for every backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust,
//! statically linked. Tests use the recording [`MockBackend`] defined
//! here.

use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Trait for cover processing backends.
///
/// Every backend must implement all three operations — load, resize, and
/// save — so the rest of the codebase is backend-agnostic.
pub trait CoverBackend: Sync {
    /// Decode an image file into an RGBA pixel buffer.
    fn load_pixels(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Resize a buffer to exact target dimensions. The filter choice is
    /// the backend's business.
    fn resize(&self, image: &RgbaImage, width: u32, height: u32) -> RgbaImage;

    /// Encode a buffer as PNG at `path`.
    fn save_png(&self, image: &RgbaImage, path: &Path) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching the
    /// filesystem. Uses Mutex (not RefCell) so it is Sync and works with
    /// rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub load_results: Mutex<Vec<RgbaImage>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Load(String),
        Resize {
            input_width: u32,
            input_height: u32,
            width: u32,
            height: u32,
        },
        Save {
            output: String,
            width: u32,
            height: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_pixels(buffers: Vec<RgbaImage>) -> Self {
            Self {
                load_results: Mutex::new(buffers),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl CoverBackend for MockBackend {
        fn load_pixels(&self, path: &Path) -> Result<RgbaImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Load(path.to_string_lossy().to_string()));

            self.load_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::DecodeFailed("No mock pixels".to_string()))
        }

        fn resize(&self, image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
            let (input_width, input_height) = image.dimensions();
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                input_width,
                input_height,
                width,
                height,
            });
            RgbaImage::new(width, height)
        }

        fn save_png(&self, image: &RgbaImage, path: &Path) -> Result<(), BackendError> {
            let (width, height) = image.dimensions();
            self.operations.lock().unwrap().push(RecordedOp::Save {
                output: path.to_string_lossy().to_string(),
                width,
                height,
            });
            Ok(())
        }
    }

    #[test]
    fn mock_records_load() {
        let backend = MockBackend::with_pixels(vec![RgbaImage::new(80, 240)]);

        let buffer = backend.load_pixels(Path::new("/covers/dune.jpg")).unwrap();
        assert_eq!(buffer.dimensions(), (80, 240));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Load(p) if p == "/covers/dune.jpg"));
    }

    #[test]
    fn mock_load_fails_when_exhausted() {
        let backend = MockBackend::new();
        let err = backend.load_pixels(Path::new("/covers/none.png")).unwrap_err();
        assert!(matches!(err, BackendError::DecodeFailed(_)));
    }

    #[test]
    fn mock_records_resize_with_input_dimensions() {
        let backend = MockBackend::new();

        let out = backend.resize(&RgbaImage::new(100, 50), 80, 40);
        assert_eq!(out.dimensions(), (80, 40));

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                input_width: 100,
                input_height: 50,
                width: 80,
                height: 40,
            }
        ));
    }

    #[test]
    fn mock_records_save() {
        let backend = MockBackend::new();
        backend
            .save_png(&RgbaImage::new(10, 20), Path::new("/out/cover.png"))
            .unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Save {
                output,
                width: 10,
                height: 20,
            } if output == "/out/cover.png"
        ));
    }
}
