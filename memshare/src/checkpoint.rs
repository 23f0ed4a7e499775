//! Checkpoints.
//!
//! A checkpoint stores the [`AnalysisData`] of a whole run, keyed by the trace
//! and the parameters it was analyzed with. Checkpoints are only ever restored
//! whole: anything unreadable or mismatched is treated as missing.

// Imports
use {
	crate::{
		config::{Config, FrequencySource},
		data::AnalysisData,
	},
	anyhow::Context,
	byteorder::{BigEndian, ByteOrder},
	sha2::{Digest, Sha256},
	std::{
		fs,
		io::{self, Write},
		path::{Path, PathBuf},
	},
};

/// Checkpoint format version
pub const FORMAT_VERSION: u32 = 1;

/// Checkpoint key
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct CheckpointKey {
	/// Trace path
	pub trace: String,

	/// Trace size, in bytes
	pub trace_len: u64,

	/// Granularity
	pub granularity: u64,

	/// Ignored pages, sorted
	pub ignored_pages: Vec<u64>,

	/// Records per interval
	pub interval: u64,

	/// Frequency source
	pub frequency_source: FrequencySource,
}

impl CheckpointKey {
	/// Creates the key for analyzing `trace_path` with `config`
	pub fn new(trace_path: &Path, config: &Config) -> Result<Self, anyhow::Error> {
		let trace_path = trace_path
			.canonicalize()
			.with_context(|| format!("Unable to canonicalize trace path {trace_path:?}"))?;
		let trace_len = fs::metadata(&trace_path)
			.context("Unable to get trace file metadata")?
			.len();

		Ok(Self {
			trace: trace_path.to_string_lossy().into_owned(),
			trace_len,
			granularity: config.granularity as u64,
			ignored_pages: config.ignored_pages().into_iter().map(|page_ptr| page_ptr.to_u64()).collect(),
			interval: config.interval,
			frequency_source: config.frequency_source,
		})
	}

	/// Returns the file name of this key's checkpoint
	fn file_name(&self) -> Result<String, anyhow::Error> {
		let key_bytes = bincode::encode_to_vec(self, bincode::config::standard()).context("Unable to encode key")?;
		let digest = Sha256::digest(&key_bytes);
		let digest = BigEndian::read_u64(&digest[..8]);

		let trace_name = Path::new(&self.trace)
			.file_name()
			.map(|name| name.to_string_lossy())
			.unwrap_or_default()
			.chars()
			.map(|ch| match ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
				true => ch,
				false => '_',
			})
			.collect::<String>();

		Ok(format!("{trace_name}.{digest:016x}.ckpt"))
	}
}

/// Checkpoint store
#[derive(Clone, Debug)]
pub struct CheckpointStore {
	/// Directory of all checkpoints
	dir: PathBuf,
}

impl CheckpointStore {
	/// Creates a checkpoint store on `dir`.
	///
	/// The directory is only created when saving.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Returns the path of the checkpoint for `key`
	pub fn path(&self, key: &CheckpointKey) -> Result<PathBuf, anyhow::Error> {
		Ok(self.dir.join(key.file_name()?))
	}

	/// Tries to restore the checkpoint for `key`.
	///
	/// Returns `None` if there is no usable checkpoint.
	pub fn try_restore(&self, key: &CheckpointKey) -> Option<AnalysisData> {
		match self.restore(key) {
			Ok(Some(data)) => {
				tracing::info!(target: "memshare::checkpoint", trace = %key.trace, "Restored checkpoint");
				Some(data)
			},
			Ok(None) => {
				tracing::debug!(target: "memshare::checkpoint", trace = %key.trace, "No checkpoint found");
				None
			},
			Err(err) => {
				tracing::warn!(target: "memshare::checkpoint", "Ignoring unusable checkpoint: {err:?}");
				None
			},
		}
	}

	/// Restores the checkpoint for `key`
	fn restore(&self, key: &CheckpointKey) -> Result<Option<AnalysisData>, anyhow::Error> {
		let path = self.path(key)?;
		let file = match fs::File::open(&path) {
			Ok(file) => file,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(err).with_context(|| format!("Unable to open checkpoint {path:?}")),
		};
		let mut reader = io::BufReader::new(file);
		let config = bincode::config::standard();

		let version: u32 = bincode::decode_from_std_read(&mut reader, config).context("Unable to read version")?;
		anyhow::ensure!(
			version == FORMAT_VERSION,
			"Checkpoint {path:?} has version {version}, expected {FORMAT_VERSION}"
		);

		let found_key: CheckpointKey =
			bincode::decode_from_std_read(&mut reader, config).context("Unable to read key")?;
		anyhow::ensure!(
			found_key == *key,
			"Checkpoint {path:?} key mismatch. Found {found_key:?}, expected {key:?}"
		);

		let data = bincode::decode_from_std_read(&mut reader, config).context("Unable to read data")?;

		Ok(Some(data))
	}

	/// Saves the checkpoint for `key`.
	///
	/// The checkpoint is first written to a temporary file, so an interrupted
	/// save never leaves a partial checkpoint behind.
	pub fn save(&self, key: &CheckpointKey, data: &AnalysisData) -> Result<PathBuf, anyhow::Error> {
		fs::create_dir_all(&self.dir)
			.with_context(|| format!("Unable to create checkpoint directory {:?}", self.dir))?;

		let path = self.path(key)?;
		let tmp_path = path.with_extension("ckpt.tmp");
		{
			let file = fs::File::create(&tmp_path)
				.with_context(|| format!("Unable to create checkpoint {tmp_path:?}"))?;
			let mut writer = io::BufWriter::new(file);
			let config = bincode::config::standard();

			bincode::encode_into_std_write(FORMAT_VERSION, &mut writer, config).context("Unable to write version")?;
			bincode::encode_into_std_write(key, &mut writer, config).context("Unable to write key")?;
			bincode::encode_into_std_write(data, &mut writer, config).context("Unable to write data")?;
			writer.flush().context("Unable to flush checkpoint")?;
		}
		fs::rename(&tmp_path, &path).with_context(|| format!("Unable to move checkpoint into {path:?}"))?;
		tracing::info!(target: "memshare::checkpoint", ?path, "Saved checkpoint");

		Ok(path)
	}
}
