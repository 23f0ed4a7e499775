//! Text traces.
//!
//! Each access is a line of the form `[<thread id>]<eip>: <W|R> <addr>`, with
//! the thread id in decimal and the addresses in hexadecimal. Lines starting
//! with `#` are comments and lines starting with `===` are phase markers.

// Imports
use {
	super::{AccessKind, AccessRecord, TraceEvent, TraceSource},
	crate::page,
	anyhow::Context,
	std::io,
};

/// Text trace reader
#[derive(Debug)]
pub struct TextTraceReader<R> {
	/// Reader
	reader: R,

	/// Line buffer
	line: String,

	/// Lines read
	lines_read: u64,

	/// Bytes read
	bytes_read: u64,

	/// Total bytes, if known
	total_bytes: Option<u64>,
}

impl<R: io::BufRead> TextTraceReader<R> {
	/// Creates a new text trace reader.
	///
	/// `total_bytes` is only used for progress reporting.
	pub fn new(reader: R, total_bytes: Option<u64>) -> Self {
		Self {
			reader,
			line: String::new(),
			lines_read: 0,
			bytes_read: 0,
			total_bytes,
		}
	}

	/// Reads the next event
	pub fn read_next(&mut self) -> Result<Option<TraceEvent>, anyhow::Error> {
		loop {
			self.line.clear();
			let line_len = self
				.reader
				.read_line(&mut self.line)
				.with_context(|| format!("Unable to read line {}", self.lines_read + 1))?;
			if line_len == 0 {
				return Ok(None);
			}
			self.lines_read += 1;
			self.bytes_read += line_len as u64;

			let line = self.line.trim_end_matches(['\n', '\r']);
			if line.trim().is_empty() || line.starts_with('#') {
				continue;
			}

			if line.starts_with("===") {
				return Ok(Some(TraceEvent::Phase(super::phase_label(line))));
			}

			let record = self::parse_access(line)
				.with_context(|| format!("Malformed record at line {}: {line:?}", self.lines_read))?;
			return Ok(Some(TraceEvent::Access(record)));
		}
	}

	/// Returns the number of lines read
	pub fn lines_read(&self) -> u64 {
		self.lines_read
	}
}

impl<R: io::BufRead> TraceSource for TextTraceReader<R> {
	fn read_next(&mut self) -> Result<Option<TraceEvent>, anyhow::Error> {
		TextTraceReader::read_next(self)
	}

	fn progress(&self) -> Option<f64> {
		super::fraction(self.bytes_read, self.total_bytes)
	}
}

/// Parses an access line
fn parse_access(line: &str) -> Result<AccessRecord, anyhow::Error> {
	let rest = line.strip_prefix('[').context("Expected `[` before thread id")?;
	let (thread_id, rest) = rest.split_once(']').context("Expected `]` after thread id")?;
	anyhow::ensure!(
		!thread_id.is_empty() && thread_id.bytes().all(|ch| ch.is_ascii_digit()),
		"Thread id must be decimal, found {thread_id:?}"
	);
	let thread_id = thread_id.parse::<u32>().context("Unable to parse thread id")?;

	// Note: The instruction pointer is validated, but otherwise unused
	let (eip, rest) = rest.split_once(": ").context("Expected `: ` after instruction pointer")?;
	page::parse_hex_addr(eip).context("Unable to parse instruction pointer")?;

	let (op, addr) = rest.split_once(' ').context("Expected operation before address")?;
	let kind = match op {
		"R" => AccessKind::Read,
		"W" => AccessKind::Write,
		_ => anyhow::bail!("Unknown operation {op:?}"),
	};
	let addr = page::parse_hex_addr(addr.trim_end()).context("Unable to parse address")?;

	Ok(AccessRecord {
		thread_id,
		kind,
		addr,
		time: None,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn read_all(input: &str) -> Result<Vec<TraceEvent>, anyhow::Error> {
		let mut reader = TextTraceReader::new(input.as_bytes(), Some(input.len() as u64));
		std::iter::from_fn(|| reader.read_next().transpose()).collect()
	}

	fn access(thread_id: u32, kind: AccessKind, addr: u64) -> TraceEvent {
		TraceEvent::Access(AccessRecord {
			thread_id,
			kind,
			addr,
			time: None,
		})
	}

	#[test]
	fn parses_accesses_and_markers() {
		let input = concat!(
			"#\n",
			"# Memory Access Trace Generated By Pin\n",
			"#\n",
			"[0]0x400a1b: W 0x7ffd1000\n",
			"=== PHASE : map ===\n",
			"[12]400a20: R 7ffd1008\r\n",
			"\n",
			"#eof\n",
		);
		let events = read_all(input).expect("Unable to parse trace");
		assert_eq!(events, [
			access(0, AccessKind::Write, 0x7ffd_1000),
			TraceEvent::Phase("PHASE : map".to_owned()),
			access(12, AccessKind::Read, 0x7ffd_1008),
		]);
	}

	#[test]
	fn malformed_line_is_fatal() {
		let input = "[0]0x1: R 0x1000\nnot a record\n[1]0x1: R 0x1000\n";
		let mut reader = TextTraceReader::new(input.as_bytes(), None);
		assert!(reader.read_next().expect("First line is valid").is_some());

		let err = reader.read_next().expect_err("Second line is malformed");
		assert!(format!("{err:#}").contains("line 2"), "Unexpected error: {err:#}");
	}

	#[test]
	fn rejects_bad_fields() {
		for line in [
			"[x]0x1: R 0x1000",
			"[]0x1: R 0x1000",
			"[1]0x1: X 0x1000",
			"[1]0x1: R zz",
			"[1]0x1 R 0x1000",
			"[1]zz: R 0x1000",
			"1]0x1: R 0x1000",
			"[1]+1: R +1000",
			"[1]0x1: R 0x+1000",
		] {
			assert!(parse_access(line).is_err(), "Parsed invalid line {line:?}");
		}
	}

	#[test]
	fn reports_progress() {
		let input = "[0]0x1: R 0x1000\n[0]0x1: R 0x1000\n";
		let mut reader = TextTraceReader::new(input.as_bytes(), Some(input.len() as u64));
		assert_eq!(TraceSource::progress(&reader), Some(0.0));
		reader.read_next().expect("Unable to read");
		assert_eq!(TraceSource::progress(&reader), Some(0.5));
		reader.read_next().expect("Unable to read");
		assert_eq!(reader.read_next().expect("Unable to read"), None);
		assert_eq!(TraceSource::progress(&reader), Some(1.0));
		assert_eq!(reader.lines_read(), 2);
	}
}
