//! Analysis data

// Imports
use {
	crate::{
		report::Report,
		statistics::{FrequencyAggregator, TimeSeries},
		trace::PhaseMarker,
	},
	std::ops::Range,
};

/// Analysis data.
///
/// Everything a checkpoint stores.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct AnalysisData {
	pub frequencies: Frequencies,
	pub time_series: TimeSeriesData,
	pub phases:      Vec<PhaseMarker>,
}

/// Frequencies of each sharing class
#[derive(PartialEq, Eq, Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Frequencies {
	pub rr: FrequencyAggregator,
	pub rw: FrequencyAggregator,
	pub ww: FrequencyAggregator,
}

/// Time series data
#[derive(PartialEq, Eq, Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct TimeSeriesData {
	/// Series over all pages
	pub all: TimeSeries,

	/// Series over non-ignored pages
	pub filtered: TimeSeries,
}

/// Output data, for external plotting
#[derive(Debug)]
#[derive(serde::Serialize)]
pub struct Output<'a> {
	pub report:      &'a Report,
	pub time_series: &'a TimeSeriesData,
	pub phases:      &'a [PhaseMarker],

	/// Sharing degree of each record, if collected
	pub degrees: Option<&'a [u32]>,

	/// Span of the record timestamps, if any
	pub time_span: Option<Range<u64>>,
}
