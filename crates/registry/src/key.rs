use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::def::ComponentDef;

/// Identity of a component type: the address of its static definition.
#[derive(Clone, Copy)]
pub struct ComponentKey(&'static ComponentDef);

impl ComponentKey {
	pub const fn new(def: &'static ComponentDef) -> Self {
		Self(def)
	}

	pub fn def(self) -> &'static ComponentDef {
		self.0
	}

	pub fn name(self) -> &'static str {
		self.0.name
	}

	pub fn type_name(self) -> &'static str {
		self.0.type_name
	}
}

impl PartialEq for ComponentKey {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.0, other.0)
	}
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		std::ptr::hash(self.0, state);
	}
}

impl fmt::Debug for ComponentKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ComponentKey").field(&self.0.name).finish()
	}
}

impl fmt::Display for ComponentKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.0.name)
	}
}

/// Implemented by every concrete component type, linking it to its definition.
pub trait Component: Any + Send + Sync {
	fn def() -> &'static ComponentDef;

	fn key() -> ComponentKey {
		ComponentKey::new(Self::def())
	}
}

/// Wrapper for `inventory::collect!`.
pub struct ComponentReg(pub &'static ComponentDef);
inventory::collect!(ComponentReg);
