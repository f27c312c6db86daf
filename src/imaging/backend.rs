//! Image processing backend trait and shared error type.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and execute. Planning never happens here; a backend
//! receives a finished [`ResizePlan`](super::ResizePlan) inside
//! [`ExecuteParams`] and only moves pixels.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::calculations::PlanError;
use super::params::{Dimensions, ExecuteParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Planning failed: {0}")]
    Plan(#[from] PlanError),
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve a rayon `par_iter` over variants.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding pixels where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, apply `params.plan`, encode to `params.output`.
    ///
    /// Returns the dimensions of the written image.
    fn execute(&self, params: &ExecuteParams) -> Result<Dimensions, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{Offset, Quality, ResizePlan, Strategy};
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Execute {
            source: String,
            output: String,
            plan: ResizePlan,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Results are handed out last-first, one per `identify` call.
        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn executed_plans(&self) -> Vec<ResizePlan> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Execute { plan, .. } => Some(plan),
                    RecordedOp::Identify(_) => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn execute(&self, params: &ExecuteParams) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Execute {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                plan: params.plan,
                quality: params.quality.value(),
            });
            Ok(params.plan.output_size())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions::new(800, 600)]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result, Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_identify_without_results_errors() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.identify(Path::new("/missing.jpg")),
            Err(BackendError::ProcessingFailed(_))
        ));
    }

    #[test]
    fn mock_records_execute_and_reports_output_size() {
        let backend = MockBackend::new();
        let plan = ResizePlan {
            size: Dimensions::new(1500, 3000),
            offset: Offset::new(250, 0),
            strategy: Strategy::CropThenScale {
                target: Dimensions::new(1000, 2000),
            },
        };

        let written = backend
            .execute(&ExecuteParams {
                source: "/source.jpg".into(),
                output: "/output.jpg".into(),
                plan,
                quality: Quality::new(85),
            })
            .unwrap();

        assert_eq!(written, Dimensions::new(1000, 2000));
        assert_eq!(backend.executed_plans(), vec![plan]);
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Execute { quality: 85, output, .. } if output == "/output.jpg"
        ));
    }
}
