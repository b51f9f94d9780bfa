//! Batch tiling.
//!
//! Runs the tile engine once per image of a [`BatchJob`], in queue order.
//!
//! # Failure Policy
//!
//! - An unusable grid (zero rows or columns) aborts the batch before any
//!   image is loaded, since every image shares the same spec.
//! - A failure scoped to one image (load, decode, encode, or a grid finer
//!   than that image) is recorded and the batch moves on.
//! - Cancellation stops the batch between images; the report keeps the work
//!   finished so far.
//!
//! # Naming
//!
//! Each image gets its own tile name prefix, derived from its file name up
//! to the first `.` (`photos/beach.day.jpg` → `beach`). Repeated prefixes
//! within one batch get a `-2`, `-3`, ... suffix so no two tiles share a
//! name.

mod driver;

pub use driver::{
    derive_prefix, BatchDriver, BatchFailure, BatchJob, BatchProgress, BatchReport,
};
