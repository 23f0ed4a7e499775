//! Sharing classifier

// Imports
use {
	crate::{
		page::PagePtr,
		trace::{AccessKind, AccessRecord},
	},
	std::collections::{BTreeMap, BTreeSet, VecDeque},
};

/// Sliding window sharing classifier.
///
/// Keeps the last `granularity` accesses and classifies each new access
/// by the threads that touched the same page within that window.
#[derive(Clone, Debug)]
pub struct SlidingWindowClassifier {
	/// Window of most recent accesses, oldest first
	window: VecDeque<WindowEntry>,

	/// Window capacity
	granularity: usize,

	/// Ignored pages
	ignored_pages: BTreeSet<PagePtr>,
}

impl SlidingWindowClassifier {
	/// Creates a new classifier.
	///
	/// # Panics
	/// Panics if `granularity` is 0.
	pub fn new(granularity: usize, ignored_pages: impl IntoIterator<Item = PagePtr>) -> Self {
		assert!(granularity > 0, "Granularity must be positive");

		Self {
			window: VecDeque::with_capacity(granularity),
			granularity,
			ignored_pages: ignored_pages.into_iter().collect(),
		}
	}

	/// Classifies an access, pushing it onto the window
	pub fn classify(&mut self, record: &AccessRecord) -> SharingVerdict {
		let page_ptr = PagePtr::new(record.addr);
		self.push(WindowEntry {
			thread_id: record.thread_id,
			page_ptr,
			kind: record.kind,
		});

		// Note: Ignored pages still take up a slot in the window
		if self.is_ignored(page_ptr) {
			return SharingVerdict {
				degree: 1,
				class:  SharingClass::Ignored,
			};
		}

		// Tally the writes of each thread touching this page
		let mut write_tallies = BTreeMap::<u32, usize>::new();
		for entry in self.window.iter().filter(|entry| entry.page_ptr == page_ptr) {
			*write_tallies.entry(entry.thread_id).or_default() += usize::from(entry.kind.is_write());
		}

		let degree = write_tallies.len();
		if degree <= 1 {
			return SharingVerdict {
				degree: 1,
				class:  SharingClass::Rr,
			};
		}

		let writers = write_tallies.values().filter(|&&writes| writes > 0).count();
		let class = match writers {
			0 => SharingClass::Rr,
			_ if writers == degree => SharingClass::Ww,
			_ => SharingClass::Rw,
		};
		tracing::trace!(target: "memshare::classifier", ?page_ptr, degree, ?class, "Shared access");

		SharingVerdict { degree, class }
	}

	/// Pushes an entry onto the window, evicting the oldest if full
	fn push(&mut self, entry: WindowEntry) {
		if self.window.len() == self.granularity {
			self.window.pop_front();
		}
		self.window.push_back(entry);
	}

	/// Returns if a page is ignored
	pub fn is_ignored(&self, page_ptr: PagePtr) -> bool {
		self.ignored_pages.contains(&page_ptr)
	}

	/// Returns the granularity
	pub fn granularity(&self) -> usize {
		self.granularity
	}

	/// Returns the current window, oldest first
	pub fn window(&self) -> impl Iterator<Item = &WindowEntry> {
		self.window.iter()
	}
}

/// Window entry
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct WindowEntry {
	pub thread_id: u32,
	pub page_ptr:  PagePtr,
	pub kind:      AccessKind,
}

/// Sharing verdict for a single access
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct SharingVerdict {
	/// Number of distinct threads touching the page within the window
	pub degree: usize,

	/// Sharing class
	pub class: SharingClass,
}

impl SharingVerdict {
	/// Returns if the page is shared between threads
	pub fn is_shared(&self) -> bool {
		self.degree > 1 && self.class != SharingClass::Ignored
	}
}

/// Sharing class
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum SharingClass {
	/// No sharing
	None,

	/// Read-read sharing.
	///
	/// Unshared accesses are also reported as this, with degree 1.
	Rr,

	/// Read-write sharing
	Rw,

	/// Write-write sharing
	Ww,

	/// Access to an ignored page
	Ignored,
}
