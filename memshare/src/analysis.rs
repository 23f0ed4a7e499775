//! Analysis

// Imports
use {
	crate::{
		checkpoint::{CheckpointKey, CheckpointStore},
		config::{Config, RunMode},
		data::AnalysisData,
		run::{AnalysisRun, RunOutput},
		statistics::Statistics,
		trace,
	},
	anyhow::Context,
	std::path::Path,
};

/// Analysis of a trace
#[derive(Clone, Debug)]
pub struct Analysis {
	/// Analysis data
	pub data: AnalysisData,

	/// Run details, if the trace was processed instead of restored
	pub details: Option<RunDetails>,
}

/// Details of a processed trace
#[derive(Clone, Debug)]
pub struct RunDetails {
	/// Run output
	pub output: RunOutput,

	/// Verdict statistics
	pub statistics: Statistics,

	/// Degree of every record, in [`RunMode::Full`]
	pub degrees: Option<Vec<u32>>,
}

/// Analyzes the trace at `trace_path`.
///
/// Restores a previous analysis from the checkpoint store, unless bypassed
/// by the configuration, and otherwise processes the whole trace, saving a
/// checkpoint at the end.
pub fn analyze(trace_path: &Path, config: &Config) -> Result<Analysis, anyhow::Error> {
	config.validate().context("Invalid configuration")?;

	let store = CheckpointStore::new(&config.checkpoint_dir);
	let key = CheckpointKey::new(trace_path, config).context("Unable to create checkpoint key")?;

	match config.bypass_checkpoint {
		true => tracing::info!("Bypassing checkpoint"),
		false =>
			if let Some(data) = store.try_restore(&key) {
				if config.mode == RunMode::Full {
					tracing::warn!("Restored from checkpoint, per-record sharing degrees are unavailable");
				}

				return Ok(Analysis { data, details: None });
			},
	}

	let mut source = trace::open(trace_path, config.trace_format).context("Unable to open trace")?;
	let mut run = AnalysisRun::new(config);
	let output = run.run(&mut *source).context("Unable to run analysis")?;
	let result = run.finish();
	tracing::info!(records = output.records, "Processed trace");

	if let Err(err) = store.save(&key, &result.data) {
		tracing::warn!("Unable to save checkpoint: {err:?}");
	}

	Ok(Analysis {
		data:    result.data,
		details: Some(RunDetails {
			output,
			statistics: result.statistics,
			degrees: result.degrees,
		}),
	})
}
