//! Statistics

// Modules
pub mod frequency;
pub mod time_log;

// Exports
pub use self::{
	frequency::{FrequencyAggregator, Summary},
	time_log::{TimeLog, TimeSeries},
};

// Imports
use {
	crate::classifier::{SharingClass, SharingVerdict},
	average::Estimate,
	std::collections::BTreeMap,
};

/// Verdict statistics
#[derive(Clone, Debug)]
pub struct Statistics {
	/// Verdicts, by class
	class_counts: BTreeMap<SharingClass, u64>,

	/// Degree of all shared accesses
	shared_degree: average::Variance,
}

impl Statistics {
	/// Creates new, empty, statistics
	pub fn new() -> Self {
		Self {
			class_counts:  BTreeMap::new(),
			shared_degree: average::Variance::new(),
		}
	}

	/// Registers a verdict on these statistics
	pub fn register_verdict(&mut self, verdict: SharingVerdict) {
		// Note: Unshared accesses are reported as read-read with degree 1
		let class = match verdict.is_shared() || verdict.class == SharingClass::Ignored {
			true => verdict.class,
			false => SharingClass::None,
		};
		*self.class_counts.entry(class).or_default() += 1;

		if verdict.is_shared() {
			self.shared_degree.add(verdict.degree as f64);
		}
	}

	/// Returns the number of verdicts of class `class`
	pub fn class_count(&self, class: SharingClass) -> u64 {
		self.class_counts.get(&class).copied().unwrap_or(0)
	}

	/// Returns the total number of verdicts
	pub fn total(&self) -> u64 {
		self.class_counts.values().sum()
	}

	/// Returns the degree statistics of all shared accesses
	pub fn shared_degree(&self) -> &average::Variance {
		&self.shared_degree
	}
}

impl Default for Statistics {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn verdict(degree: usize, class: SharingClass) -> SharingVerdict {
		SharingVerdict { degree, class }
	}

	#[test]
	fn counts_unshared_as_none() {
		let mut statistics = Statistics::new();
		statistics.register_verdict(verdict(1, SharingClass::Rr));
		statistics.register_verdict(verdict(2, SharingClass::Rr));
		statistics.register_verdict(verdict(4, SharingClass::Ww));
		statistics.register_verdict(verdict(1, SharingClass::Ignored));

		assert_eq!(statistics.class_count(SharingClass::None), 1);
		assert_eq!(statistics.class_count(SharingClass::Rr), 1);
		assert_eq!(statistics.class_count(SharingClass::Rw), 0);
		assert_eq!(statistics.class_count(SharingClass::Ww), 1);
		assert_eq!(statistics.class_count(SharingClass::Ignored), 1);
		assert_eq!(statistics.total(), 4);

		assert_eq!(statistics.shared_degree().len(), 2);
		assert_eq!(statistics.shared_degree().mean(), 3.0);
	}
}
