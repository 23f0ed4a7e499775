//! Windowed time series.
//!
//! Accesses are logged into the current interval, which is closed with
//! [`TimeLog::new_interval`]. Closing an interval appends one point to each of
//! two series: operations on pages shared read-only, and operations on shared
//! pages that saw at least one write.

// Imports
use {
	super::FrequencyAggregator,
	crate::{page::PagePtr, trace::AccessKind},
	std::collections::{BTreeMap, BTreeSet},
};

/// Time log
#[derive(Clone, Debug, Default)]
pub struct TimeLog {
	/// Activity of the current interval, by page
	current: BTreeMap<PagePtr, PageActivity>,

	/// Series of all closed intervals
	series: TimeSeries,
}

impl TimeLog {
	/// Creates an empty time log
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a time log from the series of a previous one
	pub fn from_series(series: TimeSeries) -> Self {
		Self {
			current: BTreeMap::new(),
			series,
		}
	}

	/// Logs an access in the current interval
	pub fn log(&mut self, kind: AccessKind, page_ptr: PagePtr, thread_id: u32) {
		let activity = self.current.entry(page_ptr).or_default();
		activity.threads.insert(thread_id);
		activity.ops.push(kind);
	}

	/// Closes the current interval, appending a point to both series.
	///
	/// Pages touched by a single thread during the interval are not counted.
	/// If `companions` is given, each counted page's operation count is also
	/// recorded on its aggregator.
	pub fn new_interval(&mut self, mut companions: Option<IntervalCompanions<'_>>) -> IntervalStats {
		let mut stats = IntervalStats::default();
		for (page_ptr, activity) in std::mem::take(&mut self.current) {
			if activity.threads.len() <= 1 {
				continue;
			}

			let ops = activity.ops.len() as u64;
			let wrote = activity.ops.iter().any(|kind| kind.is_write());
			match wrote {
				true => stats.write += ops,
				false => stats.read_only += ops,
			}

			if let Some(companions) = &mut companions {
				let aggregator = match wrote {
					true => &mut *companions.write,
					false => &mut *companions.read_only,
				};
				aggregator.record(page_ptr, page_ptr.to_u64(), ops);
			}
		}

		self.series.read_only.push(stats.read_only);
		self.series.write.push(stats.write);
		tracing::trace!(target: "memshare::time_log", ?stats, interval = self.series.len() - 1, "Closed interval");

		stats
	}

	/// Returns if nothing was logged in the current interval
	pub fn is_interval_empty(&self) -> bool {
		self.current.is_empty()
	}

	/// Returns the series of all closed intervals
	pub fn series(&self) -> &TimeSeries {
		&self.series
	}

	/// Consumes this log, returning its series.
	///
	/// The current interval is discarded.
	pub fn into_series(self) -> TimeSeries {
		self.series
	}
}

/// Activity on a page during an interval
#[derive(Clone, Debug, Default)]
struct PageActivity {
	/// Threads that touched the page
	threads: BTreeSet<u32>,

	/// All operations, in order
	ops: Vec<AccessKind>,
}

/// Aggregators fed by [`TimeLog::new_interval`]
#[derive(Debug)]
pub struct IntervalCompanions<'a> {
	/// Receives pages with at least one write
	pub write: &'a mut FrequencyAggregator,

	/// Receives pages only read
	pub read_only: &'a mut FrequencyAggregator,
}

/// Statistics of a single interval
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct IntervalStats {
	/// Operations on pages shared read-only
	pub read_only: u64,

	/// Operations on shared pages with at least one write
	pub write: u64,
}

/// Time series, one point per interval
#[derive(PartialEq, Eq, Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct TimeSeries {
	pub read_only: Vec<u64>,
	pub write:     Vec<u64>,
}

impl TimeSeries {
	/// Returns the number of intervals
	pub fn len(&self) -> usize {
		self.read_only.len()
	}

	/// Returns if there are no intervals
	pub fn is_empty(&self) -> bool {
		self.read_only.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn page(addr: u64) -> PagePtr {
		PagePtr::new(addr)
	}

	#[test]
	fn single_thread_pages_are_dropped() {
		let mut log = TimeLog::new();
		log.log(AccessKind::Write, page(0x1000), 1);
		log.log(AccessKind::Read, page(0x1000), 1);

		assert_eq!(log.new_interval(None), IntervalStats::default());
		assert_eq!(log.series(), &TimeSeries {
			read_only: vec![0],
			write:     vec![0],
		});
	}

	#[test]
	fn classifies_interval_activity() {
		let mut log = TimeLog::new();

		// Read-only shared page, 3 ops
		log.log(AccessKind::Read, page(0x1000), 1);
		log.log(AccessKind::Read, page(0x1000), 2);
		log.log(AccessKind::Read, page(0x1008), 1);

		// Written shared page, 2 ops
		log.log(AccessKind::Read, page(0x2000), 1);
		log.log(AccessKind::Write, page(0x2000), 2);

		// Unshared page
		log.log(AccessKind::Write, page(0x3000), 3);

		assert_eq!(log.new_interval(None), IntervalStats { read_only: 3, write: 2 });
		assert!(log.is_interval_empty());

		// The next interval starts empty
		log.log(AccessKind::Read, page(0x1000), 2);
		assert_eq!(log.new_interval(None), IntervalStats::default());

		assert_eq!(log.series(), &TimeSeries {
			read_only: vec![3, 0],
			write:     vec![2, 0],
		});
	}

	#[test]
	fn forwards_to_companions() {
		let mut write = FrequencyAggregator::new();
		let mut read_only = FrequencyAggregator::new();

		let mut log = TimeLog::new();
		log.log(AccessKind::Read, page(0x1000), 1);
		log.log(AccessKind::Read, page(0x1000), 2);
		log.log(AccessKind::Write, page(0x2000), 1);
		log.log(AccessKind::Write, page(0x2000), 2);
		log.log(AccessKind::Write, page(0x2000), 3);
		log.new_interval(Some(IntervalCompanions {
			write:     &mut write,
			read_only: &mut read_only,
		}));

		assert_eq!(read_only.total(), 2);
		assert_eq!(read_only.pages()[&page(0x1000)].addrs[&0x1000], 2);
		assert_eq!(write.total(), 3);
		assert_eq!(write.pages()[&page(0x2000)].total, 3);
	}

	#[test]
	fn restores_from_series() {
		let series = TimeSeries {
			read_only: vec![1, 2],
			write:     vec![3, 4],
		};
		let mut log = TimeLog::from_series(series.clone());
		assert_eq!(log.series(), &series);

		log.log(AccessKind::Read, page(0x1000), 1);
		log.log(AccessKind::Read, page(0x1000), 2);
		log.new_interval(None);
		assert_eq!(log.into_series(), TimeSeries {
			read_only: vec![1, 2, 2],
			write:     vec![3, 4, 0],
		});
	}
}
