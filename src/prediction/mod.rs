//! Tire wear and lifecycle prediction.
//!
//! The calculator turns one tire's inspection history into a wear rate,
//! remaining life, CPK and retirement date; the benchmark ranks brand/model
//! groups by mean CPK. Both are pure. `report` and `upload` wire them to the
//! file system and to S3-compatible storage.

pub mod benchmark;
pub mod history;
pub mod lifecycle;
pub mod metrics;
pub mod report;
pub mod types;
pub mod upload;
pub mod urgency;
pub mod utility;
