//! Pages

// Imports
use {anyhow::Context, std::fmt};

/// Page size, in bytes
pub const PAGE_SIZE: u64 = 1 << 12;

/// Page pointer.
///
/// Guaranteed to be page-aligned
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct PagePtr(u64);

impl fmt::Debug for PagePtr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("PagePtr")
			.field(&format_args!("{:#010x}", self.0))
			.finish()
	}
}

impl fmt::Display for PagePtr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:#x}", self.0)
	}
}

impl PagePtr {
	/// Page mask
	pub const PAGE_MASK: u64 = PAGE_SIZE - 1;

	/// Creates a page pointer from an address.
	///
	/// Will truncate any bits below the page mask.
	pub const fn new(addr: u64) -> Self {
		Self(addr & !Self::PAGE_MASK)
	}

	/// Returns the page pointer as a u64
	pub const fn to_u64(self) -> u64 {
		self.0
	}
}

/// Parses a hexadecimal address, with or without a `0x` prefix
pub fn parse_hex_addr(s: &str) -> Result<u64, anyhow::Error> {
	let digits = s
		.strip_prefix("0x")
		.or_else(|| s.strip_prefix("0X"))
		.unwrap_or(s);

	// Note: `from_str_radix` accepts a leading sign
	anyhow::ensure!(
		digits.bytes().all(|ch| ch.is_ascii_hexdigit()),
		"Expected hexadecimal digits, found {s:?}"
	);
	u64::from_str_radix(digits, 16).with_context(|| format!("Unable to parse address {s:?}"))
}
