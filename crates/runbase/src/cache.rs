//! Scope-by-path memoization.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

type Slot<T> = Arc<Mutex<Option<Arc<T>>>>;

/// Values memoized by absolute path, created at most once per path.
///
/// The map lock is only held to fetch a path's slot; creation runs under the
/// slot's own lock, so different paths are created concurrently and concurrent
/// requests for the same path wait for the first one.
pub struct PathCache<T> {
	slots: Mutex<FxHashMap<PathBuf, Slot<T>>>,
}

impl<T> Default for PathCache<T> {
	fn default() -> Self {
		Self { slots: Mutex::new(FxHashMap::default()) }
	}
}

impl<T> PathCache<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// The value cached for `path`, or the result of `create` stored for it.
	///
	/// A failed creation leaves the path vacant.
	pub fn get_or_create<E>(&self, path: &Path, create: impl FnOnce() -> Result<Arc<T>, E>) -> Result<Arc<T>, E> {
		let slot = Arc::clone(self.slots.lock().entry(path.to_path_buf()).or_default());
		let mut value = slot.lock();
		if let Some(existing) = value.as_ref() {
			return Ok(Arc::clone(existing));
		}
		let created = create()?;
		*value = Some(Arc::clone(&created));
		Ok(created)
	}

	pub fn get(&self, path: &Path) -> Option<Arc<T>> {
		let slot = self.slots.lock().get(path).cloned()?;
		let value = slot.lock();
		value.clone()
	}

	/// Number of paths holding a value.
	pub fn len(&self) -> usize {
		let slots: Vec<Slot<T>> = self.slots.lock().values().cloned().collect();
		slots.iter().filter(|slot| slot.lock().is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
