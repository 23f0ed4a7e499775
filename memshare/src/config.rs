//! Configuration

// Imports
use {
	crate::{page::PagePtr, trace::TraceFormat},
	anyhow::Context,
	std::{
		collections::BTreeSet,
		fs,
		path::{Path, PathBuf},
		time::Duration,
	},
};

/// Configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
	/// Granularity, the number of recent accesses considered for sharing
	pub granularity: usize,

	/// Records per time series interval
	pub interval: u64,

	/// Portion of events shown in frequency summaries
	pub portion: f64,

	/// Ignored addresses, masked to their page
	pub ignored_pages: Vec<u64>,

	/// Run mode
	pub mode: RunMode,

	/// Frequency source
	pub frequency_source: FrequencySource,

	/// Trace format
	pub trace_format: TraceFormat,

	/// Checkpoint directory
	pub checkpoint_dir: PathBuf,

	/// Skips restoring from a checkpoint
	pub bypass_checkpoint: bool,

	/// Debug output period (in seconds)
	pub debug_output_period_secs: f64,
}

impl Config {
	/// Reads a configuration from a json file.
	///
	/// Missing fields take their default value.
	pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
		let config_file = fs::File::open(path).with_context(|| format!("Unable to open config file {path:?}"))?;
		serde_json::from_reader(config_file).context("Unable to parse config file")
	}

	/// Validates this configuration
	pub fn validate(&self) -> Result<(), anyhow::Error> {
		anyhow::ensure!(self.granularity > 0, "Granularity must be positive");
		anyhow::ensure!(self.interval > 0, "Interval must be positive");
		anyhow::ensure!(
			(0.0..=1.0).contains(&self.portion),
			"Portion must be within `0.0..=1.0`, found {}",
			self.portion
		);
		self.debug_output_period()?;

		Ok(())
	}

	/// Returns the debug output period
	pub fn debug_output_period(&self) -> Result<Duration, anyhow::Error> {
		Duration::try_from_secs_f64(self.debug_output_period_secs).with_context(|| {
			format!(
				"Debug output period must be a non-negative number of seconds, found {}",
				self.debug_output_period_secs
			)
		})
	}

	/// Returns the ignored pages
	pub fn ignored_pages(&self) -> BTreeSet<PagePtr> {
		self.ignored_pages.iter().copied().map(PagePtr::new).collect()
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			granularity:              30,
			interval:                 10_000,
			portion:                  0.85,
			ignored_pages:            vec![],
			mode:                     RunMode::Full,
			frequency_source:         FrequencySource::Accesses,
			trace_format:             TraceFormat::Auto,
			checkpoint_dir:           PathBuf::from(".memshare-checkpoints"),
			bypass_checkpoint:        false,
			debug_output_period_secs: 1.0,
		}
	}
}

/// Run mode
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
	/// Also collects the sharing degree of every record
	Full,

	/// Only collects frequencies and time series
	FrequencyReport,
}

/// Source of the read-read and write-write frequencies
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
#[serde(rename_all = "snake_case")]
pub enum FrequencySource {
	/// Every shared access is counted on its address
	Accesses,

	/// Every shared page of each interval is counted with its operations.
	///
	/// Read-write frequencies are still counted per access.
	Intervals,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_uses_defaults() {
		let config = serde_json::from_str::<Config>(
			r#"{ "granularity": 100, "ignored_pages": [4097, 8192], "mode": "frequency_report" }"#,
		)
		.expect("Unable to parse config");

		assert_eq!(config.granularity, 100);
		assert_eq!(config.interval, Config::default().interval);
		assert_eq!(config.mode, RunMode::FrequencyReport);
		assert_eq!(config.frequency_source, FrequencySource::Accesses);
		assert_eq!(
			config.ignored_pages().into_iter().collect::<Vec<_>>(),
			[PagePtr::new(0x1000), PagePtr::new(0x2000)]
		);
		config.validate().expect("Config should be valid");
	}

	#[test]
	fn rejects_invalid_values() {
		for config in [
			Config {
				granularity: 0,
				..Config::default()
			},
			Config {
				interval: 0,
				..Config::default()
			},
			Config {
				portion: 1.5,
				..Config::default()
			},
			Config {
				debug_output_period_secs: f64::NAN,
				..Config::default()
			},
			Config {
				debug_output_period_secs: -1.0,
				..Config::default()
			},
			Config {
				debug_output_period_secs: 1e30,
				..Config::default()
			},
		] {
			assert!(config.validate().is_err(), "Accepted invalid config {config:?}");
		}
	}

	#[test]
	fn debug_output_period() {
		let config = Config {
			debug_output_period_secs: 0.5,
			..Config::default()
		};
		assert_eq!(config.debug_output_period().ok(), Some(Duration::from_millis(500)));
	}

	#[test]
	fn reads_from_file() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let path = dir.path().join("config.json");
		fs::write(&path, r#"{ "portion": 0.5, "frequency_source": "intervals" }"#).expect("Unable to write config");

		let config = Config::from_file(&path).expect("Unable to read config");
		assert_eq!(config.portion, 0.5);
		assert_eq!(config.frequency_source, FrequencySource::Intervals);

		assert!(Config::from_file(&dir.path().join("missing.json")).is_err());
	}
}
