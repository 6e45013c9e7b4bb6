//! Run tracking schema
//!
//! Serializable records the registry persists for audit. A run record lists
//! every artifact version it consumed and produced, so any stage execution
//! can be traced back to exact inputs.
//!
//! ## Schema Overview
//!
//! ```text
//! RunRecord ──< InputRecord (N)      [resolved artifact versions read]
//!     │
//!     ├──< MetricRecord (N)          [summary writes, last wins]
//!     └──< ArtifactRecord (N)        [versions published, by name:vN]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rental_pipeline::experiment::{MetricRecord, RunRecord, RunStatus};
//!
//! let mut run = RunRecord::builder("run-001", "default", "test_model")
//!     .config(serde_json::json!({"test_dataset": "test_data.csv:latest"}))
//!     .build();
//! run.start();
//!
//! run.log_metric(MetricRecord::new(run.run_id(), "mae", 32.1));
//!
//! run.complete(RunStatus::Success);
//! assert_eq!(run.summary()["mae"], 32.1);
//! ```

mod artifact_record;
mod metric_record;
mod run_record;

pub use artifact_record::{ArtifactKind, ArtifactRecord, CommitState};
pub use metric_record::MetricRecord;
pub use run_record::{InputRecord, RunRecord, RunRecordBuilder, RunStatus};
