use std::path::Path;

use anyhow::anyhow;

use crate::instance::{Handle, Instance};
use crate::key::{Component, ComponentKey};

/// The execution scope owning live components, as seen by component code.
///
/// Factories, init operations, operations and dynamic resolvers receive the
/// scope explicitly.
pub trait Scope: Send + Sync {
	/// Directory the scope is rooted at.
	fn base_dir(&self) -> &Path;

	/// Looks up a layered property value.
	fn property(&self, name: &str) -> Option<String>;

	/// Returns the live instance, creating and fully initializing it when absent.
	fn load_instance(&self, key: ComponentKey) -> anyhow::Result<Instance>;

	/// Non-creating lookup: the live instance, or one the scope already decided
	/// to activate.
	fn find_instance(&self, key: ComponentKey) -> Option<Instance>;
}

impl dyn Scope + '_ {
	pub fn load<T: Component>(&self) -> anyhow::Result<Handle<T>> {
		let instance = self.load_instance(T::key())?;
		instance
			.downcast::<T>()
			.ok_or_else(|| anyhow!("component '{}' does not hold a {}", T::key(), std::any::type_name::<T>()))
	}

	pub fn find<T: Component>(&self) -> Option<Handle<T>> {
		self.find_instance(T::key()).and_then(|instance| instance.downcast::<T>())
	}
}
