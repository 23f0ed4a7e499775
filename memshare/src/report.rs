//! Frequency report

// Imports
use {
	crate::{
		data::AnalysisData,
		statistics::{Summary, TimeSeries},
		trace::PhaseMarker,
	},
	std::fmt,
};

/// Frequency report.
///
/// Summarizes each sharing class, the time series and the phases of an analysis.
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Report {
	/// Portion each summary covers
	pub portion: f64,

	// Summaries of each class
	pub rr: Summary,
	pub rw: Summary,
	pub ww: Summary,

	/// Number of intervals
	pub intervals: usize,

	/// Series totals over all pages
	pub all_totals: SeriesTotals,

	/// Series totals over non-ignored pages
	pub filtered_totals: SeriesTotals,

	/// Phases
	pub phases: Vec<PhaseMarker>,
}

impl Report {
	/// Creates a report from analysis data
	pub fn new(data: &AnalysisData, portion: f64) -> Self {
		Self {
			portion,
			rr: data.frequencies.rr.summarize(portion),
			rw: data.frequencies.rw.summarize(portion),
			ww: data.frequencies.ww.summarize(portion),
			intervals: data.time_series.all.len(),
			all_totals: SeriesTotals::new(&data.time_series.all),
			filtered_totals: SeriesTotals::new(&data.time_series.filtered),
			phases: data.phases.clone(),
		}
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (name, summary) in [("RR", &self.rr), ("RW", &self.rw), ("WW", &self.ww)] {
			writeln!(f, "==== {name} sharing ====")?;
			write!(f, "{summary}")?;
		}

		writeln!(f, "==== Time series ({} intervals) ====", self.intervals)?;
		writeln!(f, "All pages:         {}", self.all_totals)?;
		writeln!(f, "Non-ignored pages: {}", self.filtered_totals)?;

		if !self.phases.is_empty() {
			writeln!(f, "==== Phases ====")?;
			for phase in &self.phases {
				writeln!(f, "  [{}] {}", phase.record_idx, phase.label)?;
			}
		}

		Ok(())
	}
}

/// Totals of a time series
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SeriesTotals {
	pub read_only: u64,
	pub write:     u64,
}

impl SeriesTotals {
	/// Sums a time series
	pub fn new(series: &TimeSeries) -> Self {
		Self {
			read_only: series.read_only.iter().sum(),
			write:     series.write.iter().sum(),
		}
	}
}

impl fmt::Display for SeriesTotals {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "read-only {}, write {}", self.read_only, self.write)
	}
}
