use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::def::Boxed;
use crate::key::{Component, ComponentKey};

/// Shared, lockable live component.
///
/// The boxed value is never replaced after creation, so its concrete type is fixed
/// for the lifetime of the instance.
#[derive(Clone)]
pub struct Instance {
	key: ComponentKey,
	cell: Arc<RwLock<Boxed>>,
}

impl Instance {
	pub fn new(key: ComponentKey, value: Boxed) -> Self {
		Self { key, cell: Arc::new(RwLock::new(value)) }
	}

	pub fn key(&self) -> ComponentKey {
		self.key
	}

	pub fn read(&self) -> MappedRwLockReadGuard<'_, dyn Any + Send + Sync> {
		RwLockReadGuard::map(self.cell.read(), |value| &**value)
	}

	pub fn write(&self) -> MappedRwLockWriteGuard<'_, dyn Any + Send + Sync> {
		RwLockWriteGuard::map(self.cell.write(), |value| &mut **value)
	}

	/// Write access without blocking; `None` while the component is borrowed elsewhere.
	pub fn try_write(&self) -> Option<MappedRwLockWriteGuard<'_, dyn Any + Send + Sync>> {
		self.cell.try_write().map(|guard| RwLockWriteGuard::map(guard, |value| &mut **value))
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.cell, &other.cell)
	}

	pub fn is<T: Any>(&self) -> bool {
		self.read().is::<T>()
	}

	/// Typed view of this instance, if it holds a `T`.
	pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Handle<T>> {
		self.is::<T>().then(|| Handle { instance: self.clone(), _marker: PhantomData })
	}
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance").field("key", &self.key).finish_non_exhaustive()
	}
}

/// Typed reference to a live component, as held by components that inject others.
pub struct Handle<T> {
	instance: Instance,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Handle<T> {
	pub fn read(&self) -> MappedRwLockReadGuard<'_, T> {
		MappedRwLockReadGuard::map(self.instance.read(), |value| {
			value.downcast_ref::<T>().expect("handle type checked on creation")
		})
	}

	pub fn write(&self) -> MappedRwLockWriteGuard<'_, T> {
		MappedRwLockWriteGuard::map(self.instance.write(), |value| {
			value.downcast_mut::<T>().expect("handle type checked on creation")
		})
	}

	pub fn instance(&self) -> &Instance {
		&self.instance
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.instance.ptr_eq(&other.instance)
	}
}

impl<T: Component> Handle<T> {
	pub fn key(&self) -> ComponentKey {
		T::key()
	}
}

impl<T> Clone for Handle<T> {
	fn clone(&self) -> Self {
		Self { instance: self.instance.clone(), _marker: PhantomData }
	}
}

impl<T> fmt::Debug for Handle<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handle").field(&self.instance.key).finish()
	}
}
