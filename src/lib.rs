//! Core library for the ratecard-tools command line application.
//!
//! The library exposes the normalization-and-layout pipeline that powers the
//! command-line interface as well as the tests. The modules are structured to
//! keep responsibilities narrow and composable: schedule canonicalization in
//! [`schedule`], sort-key derivation in [`ordering`], record deduplication in
//! [`consolidate`], template projection in [`template`], IO adapters under
//! [`io`], and the batch-stage orchestration in [`pipeline`].

pub mod config;
pub mod consolidate;
pub mod error;
pub mod io;
pub mod model;
pub mod ordering;
pub mod pipeline;
pub mod schedule;
pub mod template;

pub use error::{PipelineError, Result};
