use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Reserved segment standing for "any key" in flattened attribute names.
///
/// A multi-value attribute `addresses` whose elements carry a `street` field is
/// described as `addresses.[key].street`.
pub const KEY_PLACEHOLDER: &str = "[key]";

/// Key of a [`MultiValueMap`], ordered with [`compare_keys`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultiValueKey(String);

impl MultiValueKey {
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}
}

impl Ord for MultiValueKey {
	fn cmp(&self, other: &Self) -> Ordering {
		compare_keys(&self.0, &other.0)
	}
}

impl PartialOrd for MultiValueKey {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl fmt::Display for MultiValueKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for MultiValueKey {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for MultiValueKey {
	fn from(value: String) -> Self {
		Self(value)
	}
}

/// Orders multi-value keys.
///
/// Purely numeric keys compare as numbers, so `"2"` sorts before `"10"`. Any other
/// pair compares lexicographically. Numeric keys sort ahead of non-numeric ones, which
/// keeps the relation a total order when both kinds share a map.
///
/// Numbers are compared by digit count after stripping leading zeros, so keys of
/// any length work. Numerically equal keys (`"7"`, `"007"`) stay distinct through a
/// lexicographic tie-break.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
	match (is_numeric(a), is_numeric(b)) {
		(true, true) => {
			let (ta, tb) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
			ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb)).then_with(|| a.cmp(b))
		}
		(true, false) => Ordering::Less,
		(false, true) => Ordering::Greater,
		(false, false) => a.cmp(b),
	}
}

fn is_numeric(key: &str) -> bool {
	!key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Ordered string-keyed container for dynamically-sized configured collections.
///
/// Read operations hand out snapshots: [`get`](Self::get), [`keys`](Self::keys),
/// [`values`](Self::values) and [`entries`](Self::entries) clone, so callers never
/// observe later mutations through a value they already hold. The only live access
/// is [`entry_mut`](Self::entry_mut), used by attribute assignment to fill the
/// sub-object addressed by `attr.<key>.field`.
#[derive(Clone, PartialEq, Eq)]
pub struct MultiValueMap<T> {
	entries: BTreeMap<MultiValueKey, T>,
}

impl<T> Default for MultiValueMap<T> {
	fn default() -> Self {
		Self { entries: BTreeMap::new() }
	}
}

impl<T: fmt::Debug> fmt::Debug for MultiValueMap<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.entries.iter().map(|(k, v)| (k.as_str(), v))).finish()
	}
}

impl<T> MultiValueMap<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.contains_key(&MultiValueKey::new(key))
	}

	/// Stores `value` under `key`, returning the value it replaced.
	pub fn put(&mut self, key: impl Into<MultiValueKey>, value: T) -> Option<T> {
		self.entries.insert(key.into(), value)
	}

	pub fn remove(&mut self, key: &str) -> Option<T> {
		self.entries.remove(&MultiValueKey::new(key))
	}

	/// Keys in iteration order.
	pub fn keys(&self) -> Vec<String> {
		self.entries.keys().map(|k| k.0.clone()).collect()
	}

	/// Returns the value stored under `key`, creating a default one first if absent.
	pub fn entry_mut(&mut self, key: &str) -> &mut T
	where
		T: Default,
	{
		self.entries.entry(MultiValueKey::new(key)).or_default()
	}
}

impl<T: Clone> MultiValueMap<T> {
	pub fn get(&self, key: &str) -> Option<T> {
		self.entries.get(&MultiValueKey::new(key)).cloned()
	}

	pub fn values(&self) -> Vec<T> {
		self.entries.values().cloned().collect()
	}

	pub fn entries(&self) -> Vec<(String, T)> {
		self.entries.iter().map(|(k, v)| (k.0.clone(), v.clone())).collect()
	}
}

impl<K: Into<MultiValueKey>, T> FromIterator<(K, T)> for MultiValueMap<T> {
	fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
		Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
	}
}

impl<K: Into<MultiValueKey>, T> Extend<(K, T)> for MultiValueMap<T> {
	fn extend<I: IntoIterator<Item = (K, T)>>(&mut self, iter: I) {
		self.entries.extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
	}
}

/// Tells whether a concrete property name fits a flattened attribute template.
///
/// Both names are split on `.` and compared segment by segment. A
/// [`KEY_PLACEHOLDER`] segment in the template accepts any literal segment of the
/// candidate, including the empty one left by a trailing dot (`phones.` fits
/// `phones.[key]`). Every other segment must match exactly.
pub fn prop_name_matches(template: &str, candidate: &str) -> bool {
	let mut template_segments = template.split('.');
	let mut candidate_segments = candidate.split('.');
	loop {
		match (template_segments.next(), candidate_segments.next()) {
			(None, None) => return true,
			(Some(t), Some(c)) if t == KEY_PLACEHOLDER || t == c => {}
			_ => return false,
		}
	}
}

/// Splits a dotted name into its head segment and the remaining path, if any.
///
/// `"addresses.main.street"` gives `("addresses", Some("main.street"))`.
pub fn split_head(path: &str) -> (&str, Option<&str>) {
	match path.split_once('.') {
		Some((head, rest)) => (head, Some(rest)),
		None => (path, None),
	}
}
