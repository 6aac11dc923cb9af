//! Types and traits for recording diagnostics.
//!
//! Every environment step returns a [`Record`] next to its [`Step`](crate::Step).
//! Low-level simulators use it for per-step values, the episodic wrapper for
//! trajectory summaries (return, executed length, replanning events).
//!
//! ```rust
//! use mpgym_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("trajectory_length", RecordValue::Scalar(50.0));
//! record.insert("step_rewards", RecordValue::Array1(vec![-1.0, -0.5]));
//! assert_eq!(record.get_scalar("trajectory_length").unwrap(), 50.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
