//! Analysis run

// Imports
use {
	crate::{
		classifier::{SharingClass, SharingVerdict, SlidingWindowClassifier},
		config::{Config, FrequencySource, RunMode},
		data::{AnalysisData, Frequencies, TimeSeriesData},
		page::PagePtr,
		statistics::{time_log::IntervalCompanions, Statistics, TimeLog},
		trace::{AccessRecord, PhaseMarker, TraceEvent, TraceSource},
	},
	anyhow::Context,
	std::{
		fmt,
		ops::Range,
		time::{Duration, Instant},
	},
};

/// Analysis run.
///
/// Feeds every access of a trace through the classifier and into the
/// frequencies and time logs.
#[derive(Debug)]
pub struct AnalysisRun {
	/// Classifier
	classifier: SlidingWindowClassifier,

	/// Records per interval
	interval: u64,

	/// Mode
	mode: RunMode,

	/// Frequency source
	frequency_source: FrequencySource,

	/// Debug output period
	///
	/// Interval in which to output debug output for the run
	debug_output_period: Duration,

	/// Frequencies
	frequencies: Frequencies,

	/// Time log over all pages
	all_log: TimeLog,

	/// Time log over non-ignored pages
	filtered_log: TimeLog,

	/// Phases
	phases: Vec<PhaseMarker>,

	/// Verdict statistics
	statistics: Statistics,

	/// Degree of every record, in [`RunMode::Full`]
	degrees: Vec<u32>,

	/// Records processed
	records_processed: u64,
}

impl AnalysisRun {
	/// Creates a new run.
	///
	/// # Panics
	/// Panics if the granularity or interval of `config` are 0, or if the
	/// debug output period isn't a valid duration. See [`Config::validate`].
	pub fn new(config: &Config) -> Self {
		assert!(config.interval > 0, "Interval must be positive");
		let debug_output_period = config
			.debug_output_period()
			.unwrap_or_else(|err| panic!("Invalid configuration: {err:?}"));

		Self {
			classifier: SlidingWindowClassifier::new(config.granularity, config.ignored_pages()),
			interval: config.interval,
			mode: config.mode,
			frequency_source: config.frequency_source,
			debug_output_period,
			frequencies: Frequencies::default(),
			all_log: TimeLog::new(),
			filtered_log: TimeLog::new(),
			phases: vec![],
			statistics: Statistics::new(),
			degrees: vec![],
			records_processed: 0,
		}
	}

	/// Runs on all events of `source`
	pub fn run(&mut self, source: &mut (impl TraceSource + ?Sized)) -> Result<RunOutput, anyhow::Error> {
		// Note: No debug output yet means we output right away at the start
		let mut last_debug_time = None::<Instant>;

		let mut first_time = None;
		let mut last_time = None;
		while let Some(event) = source.read_next().context("Unable to read next event")? {
			let record = match event {
				TraceEvent::Access(record) => record,
				TraceEvent::Phase(label) => {
					self.handle_phase(label);
					continue;
				},
			};

			// Note: Records are assumed to be ordered by time
			if let Some(time) = record.time {
				first_time.get_or_insert(time);
				last_time = Some(time);
			}

			self.handle_access(&record);

			// Then show debug output, if it's been long enough
			let cur_time = Instant::now();
			if last_debug_time.map_or(true, |last| cur_time.duration_since(last) >= self.debug_output_period) {
				let progress = match source.progress() {
					Some(progress) => format!("{:.2}%", 100.0 * progress),
					None => format!("{} records", self.records_processed),
				};
				tracing::info!(
					"[{progress}] Debug: {}",
					memshare_util::DisplayWrapper::new(|f| self.fmt_debug(f))
				);
				last_debug_time = Some(cur_time);
			}
		}

		Ok(RunOutput {
			records:   self.records_processed,
			time_span: first_time
				.zip(last_time)
				.map(|(first, last)| first..last.saturating_add(1)),
		})
	}

	/// Handles a single access
	pub fn handle_access(&mut self, record: &AccessRecord) -> SharingVerdict {
		let verdict = self.classifier.classify(record);
		self.statistics.register_verdict(verdict);

		let page_ptr = PagePtr::new(record.addr);
		let per_access = self.frequency_source == FrequencySource::Accesses;
		match verdict.class {
			SharingClass::Rr if verdict.is_shared() && per_access => self.frequencies.rr.record(page_ptr, record.addr, 1),
			SharingClass::Rw => self.frequencies.rw.record(page_ptr, record.addr, 1),
			SharingClass::Ww if per_access => self.frequencies.ww.record(page_ptr, record.addr, 1),
			_ => (),
		}

		self.all_log.log(record.kind, page_ptr, record.thread_id);
		if verdict.class != SharingClass::Ignored {
			self.filtered_log.log(record.kind, page_ptr, record.thread_id);
		}

		if self.mode == RunMode::Full {
			self.degrees.push(u32::try_from(verdict.degree).unwrap_or(u32::MAX));
		}

		self.records_processed += 1;
		if self.records_processed % self.interval == 0 {
			self.close_interval();
		}

		verdict
	}

	/// Handles a phase marker
	pub fn handle_phase(&mut self, label: String) {
		tracing::debug!(target: "memshare::run", record_idx = self.records_processed, %label, "Phase");
		self.phases.push(PhaseMarker {
			record_idx: self.records_processed,
			label,
		});
	}

	/// Closes the current interval of both time logs
	fn close_interval(&mut self) {
		let companions = match self.frequency_source {
			FrequencySource::Accesses => None,
			FrequencySource::Intervals => Some(IntervalCompanions {
				write:     &mut self.frequencies.ww,
				read_only: &mut self.frequencies.rr,
			}),
		};
		// Note: Ignored pages never feed the aggregators
		self.all_log.new_interval(None);
		self.filtered_log.new_interval(companions);
	}

	/// Finishes this run.
	///
	/// Closes the trailing interval, if any records were logged since the last one.
	pub fn finish(mut self) -> RunResult {
		if !self.all_log.is_interval_empty() {
			self.close_interval();
		}

		RunResult {
			data:       AnalysisData {
				frequencies: self.frequencies,
				time_series: TimeSeriesData {
					all:      self.all_log.into_series(),
					filtered: self.filtered_log.into_series(),
				},
				phases:      self.phases,
			},
			statistics: self.statistics,
			degrees:    match self.mode {
				RunMode::Full => Some(self.degrees),
				RunMode::FrequencyReport => None,
			},
		}
	}

	/// Returns the verdict statistics
	pub fn statistics(&self) -> &Statistics {
		&self.statistics
	}

	/// Formats debug output to `f`.
	fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// Note: Start with a newline, since we're a multi-line output
		f.pad("\n")?;

		writeln!(f, "Records: {}", self.records_processed)?;
		for class in [
			SharingClass::None,
			SharingClass::Rr,
			SharingClass::Rw,
			SharingClass::Ww,
			SharingClass::Ignored,
		] {
			let count = self.statistics.class_count(class);
			let percentage = 100.0 * (count as f64 / self.records_processed.max(1) as f64);
			writeln!(f, "{class:?}: {count} ({percentage:.2}%)")?;
		}

		let shared_degree = self.statistics.shared_degree();
		writeln!(
			f,
			"Average shared degree: {:.4} ± {:.4}",
			shared_degree.mean(),
			shared_degree.error()
		)?;

		writeln!(
			f,
			"Pages: {} (RR), {} (RW), {} (WW)",
			self.frequencies.rr.pages().len(),
			self.frequencies.rw.pages().len(),
			self.frequencies.ww.pages().len()
		)?;
		write!(f, "Intervals: {}", self.all_log.series().len())?;

		Ok(())
	}
}

/// Output for [`AnalysisRun::run`]
#[derive(Clone, Debug)]
pub struct RunOutput {
	/// Records processed
	pub records: u64,

	/// Time span
	pub time_span: Option<Range<u64>>,
}

/// Result of a finished [`AnalysisRun`]
#[derive(Clone, Debug)]
pub struct RunResult {
	/// Analysis data
	pub data: AnalysisData,

	/// Verdict statistics
	pub statistics: Statistics,

	/// Degree of every record, in [`RunMode::Full`]
	pub degrees: Option<Vec<u32>>,
}
