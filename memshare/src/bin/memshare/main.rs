//! Thread memory sharing analyzer (`memshare`)

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	memshare::{data, Config, Report},
	memshare_util::logger,
	std::{fs, io::BufWriter},
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config file, if any, and apply the arguments over it
	let mut config = match &args.config_file {
		Some(config_file) => Config::from_file(config_file).context("Unable to read config file")?,
		None => Config::default(),
	};
	args.apply(&mut config);
	tracing::debug!(?config, "Configuration");

	// Analyze the trace
	let analysis = memshare::analyze(&args.trace_file, &config).context("Unable to analyze trace")?;
	let report = Report::new(&analysis.data, config.portion);

	match &args.report_file {
		Some(report_path) => fs::write(report_path, report.to_string()).context("Unable to write report file")?,
		None => print!("{report}"),
	}

	if let Some(output_path) = &args.output_file {
		let output = data::Output {
			report:      &report,
			time_series: &analysis.data.time_series,
			phases:      &analysis.data.phases,
			degrees:     analysis
				.details
				.as_ref()
				.and_then(|details| details.degrees.as_deref()),
			time_span:   analysis
				.details
				.as_ref()
				.and_then(|details| details.output.time_span.clone()),
		};

		let output_file = fs::File::create(output_path).context("Unable to create output file")?;
		serde_json::to_writer(BufWriter::new(output_file), &output).context("Unable to write to output file")?;
	}

	Ok(())
}
