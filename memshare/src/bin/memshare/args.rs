//! Arguments

// Imports
use {
	memshare::{
		config::{Config, FrequencySource, RunMode},
		page,
		trace::TraceFormat,
	},
	std::path::PathBuf,
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Trace file
	pub trace_file: PathBuf,

	/// Config file
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Granularity, the number of recent accesses considered for sharing
	#[clap(long = "granularity")]
	pub granularity: Option<usize>,

	/// Records per time series interval
	#[clap(long = "interval")]
	pub interval: Option<u64>,

	/// Portion of events shown in the frequency report
	#[clap(long = "portion")]
	pub portion: Option<f64>,

	/// Ignored address (hexadecimal), masked to its page.
	///
	/// May be given multiple times
	#[clap(long = "ignore", value_parser = page::parse_hex_addr)]
	pub ignored_pages: Vec<u64>,

	/// Trace format
	#[clap(long = "format")]
	pub trace_format: Option<TraceFormat>,

	/// Only collects frequencies and time series
	#[clap(long = "frequency-report")]
	pub frequency_report: bool,

	/// Counts read-read and write-write frequencies per interval instead of per access
	#[clap(long = "interval-frequencies")]
	pub interval_frequencies: bool,

	/// Processes the whole trace, even if a checkpoint exists
	#[clap(long = "no-checkpoint")]
	pub no_checkpoint: bool,

	/// Checkpoint directory
	#[clap(long = "checkpoint-dir")]
	pub checkpoint_dir: Option<PathBuf>,

	/// Report file.
	///
	/// If not given, the report is written to stdout
	#[clap(long = "report")]
	pub report_file: Option<PathBuf>,

	/// Output file, with all data as json
	#[clap(long = "output")]
	pub output_file: Option<PathBuf>,
}

impl Args {
	/// Applies all overrides to `config`
	pub fn apply(&self, config: &mut Config) {
		if let Some(granularity) = self.granularity {
			config.granularity = granularity;
		}
		if let Some(interval) = self.interval {
			config.interval = interval;
		}
		if let Some(portion) = self.portion {
			config.portion = portion;
		}
		config.ignored_pages.extend(&self.ignored_pages);
		if let Some(trace_format) = self.trace_format {
			config.trace_format = trace_format;
		}
		if self.frequency_report {
			config.mode = RunMode::FrequencyReport;
		}
		if self.interval_frequencies {
			config.frequency_source = FrequencySource::Intervals;
		}
		if self.no_checkpoint {
			config.bypass_checkpoint = true;
		}
		if let Some(checkpoint_dir) = &self.checkpoint_dir {
			config.checkpoint_dir = checkpoint_dir.clone();
		}
	}
}
