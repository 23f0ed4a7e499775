//! Binary traces.
//!
//! Layout: an 8-byte little-endian total size (header included), followed by
//! fixed-size records of `thread id: u8, op: u8, addr: u64, time: u64`.
//! A record starting with `#` is a comment line, terminating the trace if it
//! contains `eof`, and a record starting with `=` is a phase marker line.

// Imports
use {
	super::{AccessKind, AccessRecord, TraceEvent, TraceSource},
	anyhow::Context,
	byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt},
	memshare_util::ReadByteArray,
	std::io,
};

/// Header size
pub const HEADER_SIZE: u64 = 8;

/// Record size
pub const RECORD_SIZE: usize = 18;

/// Binary trace reader
#[derive(Debug)]
pub struct BinaryTraceReader<R> {
	/// Reader
	reader: R,

	/// Bytes read, header included
	bytes_read: u64,

	/// Total bytes, according to the header
	total_bytes: u64,

	/// If we reached the end of the trace
	finished: bool,
}

impl<R: io::BufRead> BinaryTraceReader<R> {
	/// Parses the header of a binary trace from a reader.
	///
	/// If `stream_len` is given, it's checked against the header.
	pub fn from_reader(mut reader: R, stream_len: Option<u64>) -> Result<Self, anyhow::Error> {
		let total_bytes = reader
			.read_u64::<LittleEndian>()
			.context("Unable to read total size")?;
		tracing::trace!(target: "memshare::trace::binary", total_bytes, "Parsed header");

		match stream_len {
			Some(stream_len) if stream_len != total_bytes => tracing::warn!(
				"Binary trace size differs from header. Found {stream_len}, expected {total_bytes}"
			),
			_ => (),
		}

		Ok(Self {
			reader,
			bytes_read: HEADER_SIZE,
			total_bytes,
			finished: false,
		})
	}

	/// Reads the next event
	pub fn read_next(&mut self) -> Result<Option<TraceEvent>, anyhow::Error> {
		loop {
			if self.finished {
				return Ok(None);
			}

			let first_byte = match self.reader.fill_buf().context("Unable to read from trace")?.first() {
				Some(&byte) => byte,
				None => {
					tracing::debug!(target: "memshare::trace::binary", "Trace ended without an `eof` marker");
					self.finished = true;
					return Ok(None);
				},
			};

			match first_byte {
				b'#' => {
					let line = self.read_line()?;
					if line.contains("eof") {
						self.finished = true;
					}
				},
				b'=' => {
					let line = self.read_line()?;
					return Ok(Some(TraceEvent::Phase(super::phase_label(&line))));
				},
				_ => {
					let record = self.read_record()?;
					return Ok(Some(TraceEvent::Access(record)));
				},
			}
		}
	}

	/// Reads a line, without its terminator
	fn read_line(&mut self) -> Result<String, anyhow::Error> {
		let mut line = vec![];
		let line_len = self
			.reader
			.read_until(b'\n', &mut line)
			.with_context(|| format!("Unable to read line at byte {}", self.bytes_read))?;
		self.bytes_read += line_len as u64;

		let line = String::from_utf8_lossy(&line);
		Ok(line.trim_end_matches(['\n', '\r']).to_owned())
	}

	/// Reads an access record
	fn read_record(&mut self) -> Result<AccessRecord, anyhow::Error> {
		let bytes = self
			.reader
			.read_byte_array::<RECORD_SIZE>()
			.with_context(|| format!("Truncated record at byte {}", self.bytes_read))?;
		self.bytes_read += RECORD_SIZE as u64;

		Ok(AccessRecord {
			thread_id: u32::from(bytes[0]),
			kind:      match bytes[1] {
				b'W' => AccessKind::Write,
				_ => AccessKind::Read,
			},
			addr:      LittleEndian::read_u64(&bytes[2..10]),
			time:      Some(LittleEndian::read_u64(&bytes[10..18])),
		})
	}
}

impl<R: io::BufRead> TraceSource for BinaryTraceReader<R> {
	fn read_next(&mut self) -> Result<Option<TraceEvent>, anyhow::Error> {
		BinaryTraceReader::read_next(self)
	}

	fn progress(&self) -> Option<f64> {
		super::fraction(self.bytes_read, Some(self.total_bytes))
	}
}

/// Binary trace writer
#[derive(Debug)]
pub struct BinaryTraceWriter<W> {
	/// Bytes written, header included
	bytes_written: u64,

	/// Records written
	records_written: u64,

	/// Writer
	writer: W,
}

impl<W: io::Write + io::Seek> BinaryTraceWriter<W> {
	/// Creates a new writer
	pub fn new(mut writer: W) -> Result<Self, anyhow::Error> {
		// Note: We rewind to ensure we write at the start, because we then
		//       later come back to write the header
		writer.rewind().context("Unable to rewind to start")?;
		writer
			.write_u64::<LittleEndian>(0)
			.context("Unable to reserve header")?;

		Ok(Self {
			bytes_written: HEADER_SIZE,
			records_written: 0,
			writer,
		})
	}

	/// Writes an access record.
	///
	/// A missing timestamp is written as `0`.
	pub fn write(&mut self, record: &AccessRecord) -> Result<(), anyhow::Error> {
		// Note: `#` and `=` would be read back as a comment or phase marker
		let thread_id = u8::try_from(record.thread_id)
			.ok()
			.filter(|thread_id| ![b'#', b'='].contains(thread_id))
			.with_context(|| format!("Thread id {} cannot be represented in a binary trace", record.thread_id))?;

		let mut bytes = [0; RECORD_SIZE];
		bytes[0] = thread_id;
		bytes[1] = match record.kind {
			AccessKind::Read => b'R',
			AccessKind::Write => b'W',
		};
		LittleEndian::write_u64(&mut bytes[2..10], record.addr);
		LittleEndian::write_u64(&mut bytes[10..18], record.time.unwrap_or(0));
		self.writer.write_all(&bytes).context("Unable to write record")?;

		self.bytes_written += RECORD_SIZE as u64;
		self.records_written += 1;
		Ok(())
	}

	/// Writes a phase marker
	pub fn write_phase(&mut self, label: &str) -> Result<(), anyhow::Error> {
		anyhow::ensure!(!label.contains('\n'), "Phase label cannot contain newlines: {label:?}");
		self.write_line(&format!("=== {label} ==="))
			.context("Unable to write phase marker")
	}

	/// Returns the number of records written
	pub fn records_written(&self) -> u64 {
		self.records_written
	}

	/// Finishes writing.
	///
	/// Writes the `eof` marker and then the header.
	pub fn finish(mut self) -> Result<W, anyhow::Error> {
		self.write_line("#eof").context("Unable to write eof marker")?;

		self.writer
			.seek(io::SeekFrom::Start(0))
			.context("Unable to seek to header")?;
		self.writer
			.write_u64::<LittleEndian>(self.bytes_written)
			.context("Unable to write header")?;
		self.writer
			.seek(io::SeekFrom::End(0))
			.context("Unable to seek to end")?;
		self.writer.flush().context("Unable to flush writer")?;

		Ok(self.writer)
	}

	/// Writes a line
	fn write_line(&mut self, line: &str) -> Result<(), anyhow::Error> {
		self.writer.write_all(line.as_bytes())?;
		self.writer.write_all(b"\n")?;
		self.bytes_written += line.len() as u64 + 1;
		Ok(())
	}
}
