//! Converts a text memory trace into a binary trace.

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	memshare::{
		trace::{BinaryTraceWriter, TextTraceReader},
		TraceEvent,
	},
	memshare_util::logger,
	std::{
		fs,
		io::{BufReader, BufWriter},
	},
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Open the input trace
	let input = fs::File::open(&args.input_file).context("Unable to open input trace")?;
	let input_len = input.metadata().context("Unable to get input trace metadata")?.len();
	let mut reader = TextTraceReader::new(BufReader::new(input), Some(input_len));

	// And create the output one
	let output = fs::File::create(&args.output_file).context("Unable to create output trace")?;
	let mut writer = BinaryTraceWriter::new(BufWriter::new(output)).context("Unable to create trace writer")?;

	let mut phases = 0_usize;
	while let Some(event) = reader.read_next().context("Unable to read input trace")? {
		match event {
			// Note: Text traces carry no timestamps, so we use the record index instead
			TraceEvent::Access(mut record) => {
				record.time = Some(record.time.unwrap_or_else(|| writer.records_written()));
				writer.write(&record).with_context(|| {
					format!("Unable to write record from line {}", reader.lines_read())
				})?;
			},
			TraceEvent::Phase(label) => {
				tracing::debug!(%label, "Phase");
				writer.write_phase(&label).context("Unable to write phase marker")?;
				phases += 1;
			},
		}
	}

	let records = writer.records_written();
	writer.finish().context("Unable to finish writing output trace")?;
	tracing::info!(records, phases, "Converted trace");

	Ok(())
}
