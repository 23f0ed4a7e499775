//! Page / address frequencies

// Imports
use {
	crate::page::PagePtr,
	itertools::Itertools,
	std::{collections::BTreeMap, fmt},
};

/// Frequency aggregator.
///
/// Counts events by page and, within each page, by address.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct FrequencyAggregator {
	/// All pages
	// Note: We use a `BTreeMap` so that ties are always summarized in the same order.
	pages: BTreeMap<PagePtr, PageFrequency>,
}

impl FrequencyAggregator {
	/// Creates an empty aggregator
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `weight` events on `addr` of page `page_ptr`
	pub fn record(&mut self, page_ptr: PagePtr, addr: u64, weight: u64) {
		let page = self.pages.entry(page_ptr).or_default();
		page.total += weight;
		*page.addrs.entry(addr).or_default() += weight;
	}

	/// Adds all events of `other` to this aggregator
	pub fn merge(&mut self, other: &Self) {
		for (&page_ptr, page) in &other.pages {
			for (&addr, &count) in &page.addrs {
				self.record(page_ptr, addr, count);
			}
		}
	}

	/// Returns the total number of events
	pub fn total(&self) -> u64 {
		self.pages.values().map(|page| page.total).sum()
	}

	/// Returns all pages
	pub fn pages(&self) -> &BTreeMap<PagePtr, PageFrequency> {
		&self.pages
	}

	/// Returns if no pages were recorded
	pub fn is_empty(&self) -> bool {
		self.pages.is_empty()
	}

	/// Summarizes the most frequent pages and addresses.
	///
	/// Pages are emitted by descending count until either their cumulative count
	/// exceeds `portion` of the total, or a quarter of all pages was emitted.
	/// The same applies to the addresses of each emitted page, relative to the page.
	pub fn summarize(&self, portion: f64) -> Summary {
		let total = self.total();
		if total == 0 {
			return Summary::Empty;
		}

		let pages = self::select_top(self.pages.iter().map(|(&page_ptr, page)| (page_ptr, page.total)), portion)
			.into_iter()
			.map(|top| {
				let page = &self.pages[&top.key];
				let addrs = self::select_top(page.addrs.iter().map(|(&addr, &count)| (addr, count)), portion)
					.into_iter()
					.map(|top| AddrSummary {
						addr:       top.key,
						count:      top.count,
						percentage: top.percentage,
					})
					.collect();

				PageSummary {
					page_ptr: top.key,
					count: top.count,
					percentage: top.percentage,
					addrs,
				}
			})
			.collect();

		Summary::Pages { total, pages }
	}
}

/// Page frequency
#[derive(PartialEq, Eq, Clone, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct PageFrequency {
	/// Total events on this page
	pub total: u64,

	/// Events by address
	pub addrs: BTreeMap<u64, u64>,
}

/// Entry selected by [`select_top`]
struct Top<K> {
	key:        K,
	count:      u64,
	percentage: u64,
}

/// Selects the top entries by count.
///
/// Entries are visited by descending count (ties in iteration order) and emitted
/// until the cumulative count exceeds `portion` of the total or a quarter of the
/// entries have been emitted, whichever happens first.
fn select_top<K: Copy>(entries: impl Iterator<Item = (K, u64)>, portion: f64) -> Vec<Top<K>> {
	let entries = entries.collect::<Vec<_>>();
	let total = entries.iter().map(|&(_, count)| count).sum::<u64>();
	if total == 0 {
		return vec![];
	}

	let threshold = portion * total as f64;
	let mut selected = vec![];
	let mut cumulative = 0;
	// Note: `sorted_by` is stable, so ties keep their iteration order
	for (key, count) in entries.iter().copied().sorted_by(|lhs, rhs| rhs.1.cmp(&lhs.1)) {
		cumulative += count;
		selected.push(Top {
			key,
			count,
			percentage: self::percentage(count, total),
		});

		if cumulative as f64 > threshold || selected.len() * 4 >= entries.len() {
			break;
		}
	}

	selected
}

/// Returns `count` as an integer percentage of `total`, rounded down.
///
/// # Panics
/// Panics if `total` is 0.
fn percentage(count: u64, total: u64) -> u64 {
	(u128::from(count) * 100 / u128::from(total)) as u64
}

/// Frequency summary
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Summary {
	/// No events were recorded
	Empty,

	/// Most frequent pages
	Pages { total: u64, pages: Vec<PageSummary> },
}

/// Page summary
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PageSummary {
	pub page_ptr:   PagePtr,
	pub count:      u64,
	pub percentage: u64,
	pub addrs:      Vec<AddrSummary>,
}

/// Address summary
#[derive(PartialEq, Eq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AddrSummary {
	pub addr:       u64,
	pub count:      u64,
	pub percentage: u64,
}

impl fmt::Display for Summary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => writeln!(f, "(empty)"),
			Self::Pages { total, pages } => {
				writeln!(f, "Total: {total}")?;
				for page in pages {
					writeln!(f, "  Page {}: {} ({}%)", page.page_ptr, page.count, page.percentage)?;
					for addr in &page.addrs {
						writeln!(f, "    {:#x}: {} ({}%)", addr.addr, addr.count, addr.percentage)?;
					}
				}

				Ok(())
			},
		}
	}
}
