//! Thread memory sharing analyzer (`memshare`)
//!
//! Classifies the accesses of a multi-threaded memory trace by how the
//! accessed page is shared between threads within a window of recent
//! accesses, and aggregates the results into frequencies and time series.

// Modules
pub mod analysis;
pub mod checkpoint;
pub mod classifier;
pub mod config;
pub mod data;
pub mod page;
pub mod report;
pub mod run;
pub mod statistics;
pub mod trace;

// Exports
pub use self::{
	analysis::{analyze, Analysis},
	classifier::{SharingClass, SharingVerdict, SlidingWindowClassifier},
	config::Config,
	page::PagePtr,
	report::Report,
	run::AnalysisRun,
	trace::{AccessKind, AccessRecord, TraceEvent, TraceSource},
};
