//! Memory access traces.
//!
//! Traces come in two forms, a line-based text form and a compact binary form,
//! both yielding the same [`TraceEvent`]s through [`TraceSource`].

// Modules
pub mod binary;
pub mod text;

// Exports
pub use self::{
	binary::{BinaryTraceReader, BinaryTraceWriter},
	text::TextTraceReader,
};

// Imports
use {
	anyhow::Context,
	std::{fs, io, path::Path},
};

/// Access kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub enum AccessKind {
	/// Read
	Read,

	/// Write
	Write,
}

impl AccessKind {
	/// Returns if this is a write
	pub fn is_write(self) -> bool {
		matches!(self, Self::Write)
	}
}

/// A single memory access
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct AccessRecord {
	/// Thread that performed the access
	pub thread_id: u32,

	/// Access kind
	pub kind: AccessKind,

	/// Accessed address
	pub addr: u64,

	/// Timestamp, if the trace carries one
	pub time: Option<u64>,
}

/// Trace event
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum TraceEvent {
	/// Memory access
	Access(AccessRecord),

	/// Phase marker, with its label
	Phase(String),
}

/// Phase marker
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct PhaseMarker {
	/// Number of access records before this marker
	pub record_idx: u64,

	/// Label
	pub label: String,
}

/// Trace source
pub trait TraceSource {
	/// Reads the next event.
	///
	/// Returns `Ok(None)` once the trace is over.
	fn read_next(&mut self) -> Result<Option<TraceEvent>, anyhow::Error>;

	/// Returns the fraction (`0.0..=1.0`) of the trace consumed so far, if known
	fn progress(&self) -> Option<f64>;
}

/// Trace format
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TraceFormat {
	/// Chosen from the file extension (`.bin` is binary, anything else text)
	#[default]
	Auto,

	/// Text
	Text,

	/// Binary
	Binary,
}

impl TraceFormat {
	/// Resolves [`TraceFormat::Auto`] for `path`
	pub fn resolve(self, path: &Path) -> Self {
		match self {
			Self::Auto => match path.extension().and_then(|ext| ext.to_str()) {
				Some("bin") => Self::Binary,
				_ => Self::Text,
			},
			format => format,
		}
	}
}

/// Opens the trace at `path` with format `format`
pub fn open(path: &Path, format: TraceFormat) -> Result<Box<dyn TraceSource>, anyhow::Error> {
	let file = fs::File::open(path).with_context(|| format!("Unable to open trace file {path:?}"))?;
	let file_len = file.metadata().context("Unable to get trace file metadata")?.len();
	let reader = io::BufReader::new(file);

	let source: Box<dyn TraceSource> = match format.resolve(path) {
		TraceFormat::Binary => Box::new(
			BinaryTraceReader::from_reader(reader, Some(file_len)).context("Unable to parse binary trace header")?,
		),
		TraceFormat::Text | TraceFormat::Auto => Box::new(TextTraceReader::new(reader, Some(file_len))),
	};
	tracing::debug!(target: "memshare::trace", ?path, file_len, "Opened trace");

	Ok(source)
}

/// Extracts the label of a phase marker line.
///
/// The line is expected without its terminator, in the form `=== <label> ===`.
pub(crate) fn phase_label(line: &str) -> String {
	line.get(3..line.len().saturating_sub(3))
		.unwrap_or_default()
		.trim()
		.to_owned()
}

/// Returns the fraction of `consumed` over `total`
pub(crate) fn fraction(consumed: u64, total: Option<u64>) -> Option<f64> {
	match total {
		Some(0) | None => None,
		Some(total) => Some((consumed as f64 / total as f64).min(1.0)),
	}
}
