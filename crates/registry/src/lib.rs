//! Component registry: static capability tables and everything derived from them.
//!
//! Components are plain Rust types described by a static [`ComponentDef`]. The
//! definition lists configurable attributes, operations, requirement edges and
//! initializer contributions as fn pointers, so the engine never needs runtime
//! reflection.
//!
//! # Modules
//!
//! - [`def`] - the static tables
//! - [`macros`] - `component!` and friends, which build the tables
//! - [`assign`] - dotted-path assignment into live values
//! - [`description`] - flattened descriptions and their cache
//! - [`catalog`] - the set of component types available to a scope

pub mod assign;
pub mod catalog;
pub mod def;
pub mod description;
pub mod error;
pub mod instance;
pub mod key;
pub mod macros;
pub mod scope;
pub mod value;

pub use assign::assign;
pub use catalog::Catalog;
pub use def::{
	AttributeDef, AttributeFlags, AttributeKind, Boxed, ComponentDef, CreateFn, ElementDef, InitFn, InjectDef,
	OperationDef, OperationFn, PostInitDef, PreInitDef, Requirement, ResolveFn, StructDef, boxed, downcast_mut,
	downcast_ref,
};
pub use description::{AttributeDescription, ComponentDescription, DescriptionCache, OperationDescription};
pub use error::{AssignError, DescribeError, RegistryError, Result};
pub use instance::{Handle, Instance};
pub use key::{Component, ComponentKey, ComponentReg};
pub use scope::Scope;
pub use value::AttributeValue;

#[doc(hidden)]
pub mod __private {
	pub use {anyhow, inventory};
}
