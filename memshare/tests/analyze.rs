//! End-to-end analysis of small traces

// Imports
use {
	memshare::{
		config::{Config, RunMode},
		trace::BinaryTraceWriter,
		AccessKind,
		AccessRecord,
		Analysis,
		PagePtr,
		Report,
	},
	std::{
		fs,
		io::BufWriter,
		path::{Path, PathBuf},
	},
	tempfile::TempDir,
};

/// Trace exercising every kind of interval
const TRACE: &str = concat!(
	"#\n",
	"# Memory Access Trace Generated By Pin\n",
	"#\n",
	"[0]0x400a1b: W 0x1000\n",
	"[1]0x400a1b: R 0x1008\n",
	"=== PHASE : compute ===\n",
	"[1]0x400a20: R 0x2000\n",
	"[2]0x400a20: R 0x2010\n",
	"[3]0x400a28: R 0x3000\n",
	"#eof\n",
);

fn config(dir: &Path) -> Config {
	Config {
		granularity: 2,
		interval: 2,
		checkpoint_dir: dir.join("checkpoints"),
		..Config::default()
	}
}

fn write_trace(dir: &Path, name: &str, contents: &str) -> PathBuf {
	let path = dir.join(name);
	fs::write(&path, contents).expect("Unable to write trace");
	path
}

fn page(addr: u64) -> PagePtr {
	PagePtr::new(addr)
}

#[test]
fn analyzes_text_trace() {
	let dir = TempDir::new().expect("Unable to create temporary directory");
	let trace = self::write_trace(dir.path(), "trace.txt", TRACE);
	let analysis = memshare::analyze(&trace, &self::config(dir.path())).expect("Unable to analyze trace");

	let frequencies = &analysis.data.frequencies;
	assert_eq!(frequencies.rw.total(), 1);
	assert_eq!(frequencies.rw.pages()[&page(0x1000)].addrs[&0x1008], 1);
	assert_eq!(frequencies.rr.total(), 1);
	assert_eq!(frequencies.rr.pages()[&page(0x2000)].addrs[&0x2010], 1);
	assert!(frequencies.ww.is_empty());

	let all = &analysis.data.time_series.all;
	assert_eq!(all.read_only, [0, 2, 0]);
	assert_eq!(all.write, [2, 0, 0]);
	assert_eq!(analysis.data.time_series.filtered, *all);

	assert_eq!(analysis.data.phases.len(), 1);
	assert_eq!(analysis.data.phases[0].record_idx, 2);
	assert_eq!(analysis.data.phases[0].label, "PHASE : compute");

	let details = analysis.details.expect("Trace should have been processed");
	assert_eq!(details.output.records, 5);
	assert_eq!(details.output.time_span, None);
	assert_eq!(details.degrees.as_deref(), Some(&[1, 2, 1, 2, 1][..]));
	assert_eq!(details.statistics.total(), 5);

	let report = Report::new(&analysis.data, 0.85).to_string();
	assert!(report.contains("==== RW sharing ===="), "Unexpected report: {report}");
	assert!(report.contains("==== Time series (3 intervals) ===="), "Unexpected report: {report}");
	assert!(report.contains("[2] PHASE : compute"), "Unexpected report: {report}");
}

#[test]
fn ignored_pages_are_filtered() {
	let dir = TempDir::new().expect("Unable to create temporary directory");
	let trace = self::write_trace(dir.path(), "trace.txt", TRACE);
	let config = Config {
		ignored_pages: vec![0x2abc],
		..self::config(dir.path())
	};
	let analysis = memshare::analyze(&trace, &config).expect("Unable to analyze trace");

	assert!(analysis.data.frequencies.rr.is_empty());
	assert_eq!(analysis.data.frequencies.rw.total(), 1);

	let series = &analysis.data.time_series;
	assert_eq!(series.all.read_only, [0, 2, 0]);
	assert_eq!(series.filtered.read_only, [0, 0, 0]);
	assert_eq!(series.filtered.write, [2, 0, 0]);
}

#[test]
fn restores_from_checkpoint() {
	let dir = TempDir::new().expect("Unable to create temporary directory");
	let trace = self::write_trace(dir.path(), "trace.txt", TRACE);
	let config = self::config(dir.path());

	let first = memshare::analyze(&trace, &config).expect("Unable to analyze trace");
	assert!(first.details.is_some());

	let second = memshare::analyze(&trace, &config).expect("Unable to analyze trace");
	assert!(second.details.is_none(), "Second analysis should be restored");
	assert_eq!(second.data, first.data);

	// Different parameters shouldn't reuse the checkpoint
	let other = Config {
		granularity: 3,
		..config.clone()
	};
	let third = memshare::analyze(&trace, &other).expect("Unable to analyze trace");
	assert!(third.details.is_some());
}

#[test]
fn bypassing_checkpoint_processes_trace() {
	let dir = TempDir::new().expect("Unable to create temporary directory");
	let trace = self::write_trace(dir.path(), "trace.txt", TRACE);
	let config = self::config(dir.path());
	memshare::analyze(&trace, &config).expect("Unable to analyze trace");

	let bypass = Config {
		bypass_checkpoint: true,
		..config
	};
	let analysis = memshare::analyze(&trace, &bypass).expect("Unable to analyze trace");
	assert!(analysis.details.is_some());
}

#[test]
fn frequency_report_skips_degrees() {
	let dir = TempDir::new().expect("Unable to create temporary directory");
	let trace = self::write_trace(dir.path(), "trace.txt", TRACE);
	let config = Config {
		mode: RunMode::FrequencyReport,
		..self::config(dir.path())
	};
	let analysis = memshare::analyze(&trace, &config).expect("Unable to analyze trace");
	let details = analysis.details.expect("Trace should have been processed");
	assert_eq!(details.degrees, None);
}

#[test]
fn malformed_trace_is_fatal() {
	let dir = TempDir::new().expect("Unable to create temporary directory");
	let trace = self::write_trace(dir.path(), "trace.txt", "[0]0x1: R 0x1000\n[1]0x1 R\n");
	let config = self::config(dir.path());

	let err = memshare::analyze(&trace, &config).expect_err("Malformed trace should fail");
	assert!(format!("{err:#}").contains("line 2"), "Unexpected error: {err:#}");
	assert!(
		!config.checkpoint_dir.exists() || fs::read_dir(&config.checkpoint_dir).expect("Unable to read dir").count() == 0,
		"No checkpoint should be saved"
	);
}

#[test]
fn invalid_config_is_rejected() {
	let dir = TempDir::new().expect("Unable to create temporary directory");
	let trace = self::write_trace(dir.path(), "trace.txt", TRACE);
	for config in [
		Config {
			granularity: 0,
			..self::config(dir.path())
		},
		Config {
			debug_output_period_secs: 1e30,
			..self::config(dir.path())
		},
	] {
		assert!(memshare::analyze(&trace, &config).is_err(), "Accepted invalid config {config:?}");
	}
}

#[test]
fn analyzes_binary_trace() {
	let dir = TempDir::new().expect("Unable to create temporary directory");
	let path = dir.path().join("trace.bin");

	let file = fs::File::create(&path).expect("Unable to create trace");
	let mut writer = BinaryTraceWriter::new(BufWriter::new(file)).expect("Unable to create writer");
	let accesses = [
		(0, AccessKind::Write, 0x1000),
		(1, AccessKind::Read, 0x1008),
		(1, AccessKind::Read, 0x2000),
		(2, AccessKind::Read, 0x2010),
		(3, AccessKind::Read, 0x3000),
	];
	for (idx, (thread_id, kind, addr)) in accesses.into_iter().enumerate() {
		if idx == 2 {
			writer.write_phase("PHASE : compute").expect("Unable to write phase");
		}
		let record = AccessRecord {
			thread_id,
			kind,
			addr,
			time: Some(100 + idx as u64),
		};
		writer.write(&record).expect("Unable to write record");
	}
	writer.finish().expect("Unable to finish trace");

	let analysis: Analysis = memshare::analyze(&path, &self::config(dir.path())).expect("Unable to analyze trace");
	assert_eq!(analysis.data.frequencies.rw.total(), 1);
	assert_eq!(analysis.data.frequencies.rr.total(), 1);
	assert_eq!(analysis.data.time_series.all.read_only, [0, 2, 0]);
	assert_eq!(analysis.data.phases[0].label, "PHASE : compute");

	let details = analysis.details.expect("Trace should have been processed");
	assert_eq!(details.output.time_span, Some(100..105));
}
