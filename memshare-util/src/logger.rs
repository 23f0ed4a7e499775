//! Logger
//!
//! Logs to stderr, filtered by `RUST_LOG` (default `info`), and optionally to a
//! file, filtered by `RUST_LOG_FILE` (default `debug`).

// Imports
use {
	std::{fs, io, path::Path, sync::Mutex},
	tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

/// Initializes the global logger.
///
/// Any messages queued with [`pre_init`] are emitted afterwards.
///
/// # Panics
/// Panics if a global logger was already initialized.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let term_layer = fmt::layer()
		.with_writer(io::stderr)
		.with_filter(self::env_filter("RUST_LOG", "info"));

	let file_layer = match log_file {
		Some(path) => match fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(path)
		{
			Ok(file) => Some(
				fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(self::env_filter("RUST_LOG_FILE", "debug")),
			),
			Err(err) => {
				pre_init::warn(format!("Unable to open log file {path:?}: {err}"));
				None
			},
		},
		None => None,
	};

	tracing_subscriber::registry().with(term_layer).with(file_layer).init();

	pre_init::flush();
}

/// Creates an env filter from `var`, falling back to `default`
fn env_filter(var: &str, default: &str) -> EnvFilter {
	EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Logging before the logger is initialized.
///
/// Messages are queued and emitted once [`init`](super::init) is called.
pub mod pre_init {
	// Imports
	use std::sync::Mutex;

	/// Message level
	#[derive(Clone, Copy, Debug)]
	enum Level {
		Trace,
		Debug,
		Info,
		Warn,
		Error,
	}

	/// Queued messages
	static MESSAGES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

	/// Queues a message
	fn push(level: Level, message: String) {
		// Note: A poisoned queue only means another thread panicked mid-push.
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		messages.push((level, message));
	}

	macro_rules! level_fns {
		($($name:ident => $level:ident),* $(,)?) => {
			$(
				#[doc = concat!("Queues a `", stringify!($name), "` message")]
				pub fn $name(message: impl Into<String>) {
					self::push(Level::$level, message.into());
				}
			)*
		};
	}

	level_fns! {
		trace => Trace,
		debug => Debug,
		info => Info,
		warn => Warn,
		error => Error,
	}

	/// Emits all queued messages
	pub(super) fn flush() {
		let messages = std::mem::take(&mut *MESSAGES.lock().unwrap_or_else(|err| err.into_inner()));
		for (level, message) in messages {
			match level {
				Level::Trace => tracing::trace!(target: "memshare_util::pre_init", "{message}"),
				Level::Debug => tracing::debug!(target: "memshare_util::pre_init", "{message}"),
				Level::Info => tracing::info!(target: "memshare_util::pre_init", "{message}"),
				Level::Warn => tracing::warn!(target: "memshare_util::pre_init", "{message}"),
				Level::Error => tracing::error!(target: "memshare_util::pre_init", "{message}"),
			}
		}
	}
}
