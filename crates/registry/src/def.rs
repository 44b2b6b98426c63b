//! Static capability tables describing components.
//!
//! A component type is described once by a `static` [`ComponentDef`], usually
//! produced by the [`component!`](crate::component) macro. Tables hold plain fn
//! pointers that downcast the erased instance back to the concrete type, so the
//! engine can create, configure and drive components without knowing their types.

use std::any::Any;
use std::fmt;

use bitflags::bitflags;

use crate::key::ComponentKey;
use crate::scope::Scope;

/// Erased component value as stored by a scope.
pub type Boxed = Box<dyn Any + Send + Sync>;

/// Creates a fresh component. The owning scope is passed explicitly.
pub type CreateFn = fn(&dyn Scope) -> Boxed;
/// Declared init operation, run after attributes are injected.
pub type InitFn = fn(&mut dyn Any, &dyn Scope) -> anyhow::Result<()>;
/// Invocable operation. Runs with exclusive access to the component.
pub type OperationFn = fn(&mut dyn Any, &dyn Scope) -> anyhow::Result<()>;
/// Assigns a raw value to a terminal attribute. `None` resets it to the type default.
pub type SetFn = fn(&mut dyn Any, Option<&str>) -> Result<(), String>;
/// Renders the current value of a terminal attribute.
pub type GetFn = fn(&dyn Any) -> Option<String>;
/// Borrows the sub-object behind a nested attribute, if it exists.
pub type NestedFn = fn(&dyn Any) -> Option<&dyn Any>;
/// Mutably borrows the sub-object behind a nested attribute, if it exists.
pub type NestedMutFn = fn(&mut dyn Any) -> Option<&mut dyn Any>;
/// Stores a parsed element under a multi-value key.
pub type PutFn = fn(&mut dyn Any, &str, Option<&str>) -> Result<(), String>;
/// Returns the element stored under a multi-value key, creating it if absent.
pub type EntryMutFn = for<'a> fn(&'a mut dyn Any, &str) -> Option<&'a mut dyn Any>;
/// Computes a requirement from scope state.
pub type ResolveFn = fn(&dyn Scope) -> Option<ComponentKey>;
/// Stores a reference to another live component.
pub type InjectFn = fn(&mut dyn Any, crate::Instance) -> Result<(), String>;
/// Configures the target right after it is instantiated.
pub type PreInitFn = fn(&mut dyn Any) -> anyhow::Result<()>;
/// Lets the contributor observe and mutate the target once both are configured.
pub type PostInitFn = fn(&mut dyn Any, &mut dyn Any) -> anyhow::Result<()>;

bitflags! {
	/// Visibility of an attribute to external configuration.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct AttributeFlags: u8 {
		/// Part of the component's public surface.
		const PUBLIC = 1 << 0;
		/// Explicitly marked as configurable.
		const CONFIGURABLE = 1 << 1;
		/// Never assigned from outside.
		const FINAL = 1 << 2;
	}
}

/// Static description of a component type.
pub struct ComponentDef {
	/// Short name used on the command line and in properties (`project`).
	pub name: &'static str,
	/// Rust type name (`ProjectComponent`).
	pub type_name: &'static str,
	/// Full type path (`my_crate::builtins::ProjectComponent`).
	pub type_path: &'static str,
	/// Documentation; the first line is the header, the rest the detail.
	pub description: &'static str,
	pub create: CreateFn,
	pub attributes: &'static [AttributeDef],
	pub operations: &'static [OperationDef],
	pub requires: &'static [Requirement],
	pub injects: &'static [InjectDef],
	pub pre_inits: &'static [PreInitDef],
	pub post_inits: &'static [PostInitDef],
	pub init: Option<InitFn>,
}

impl ComponentDef {
	pub fn key(&'static self) -> ComponentKey {
		ComponentKey::new(self)
	}

	/// Names accepted for this component on the command line and in properties.
	pub fn accepted_names(&self) -> [&'static str; 3] {
		[self.name, self.type_name, self.type_path]
	}

	pub fn accepts(&self, name: &str) -> bool {
		self.accepted_names().contains(&name)
	}

	pub fn attribute(&self, name: &str) -> Option<&'static AttributeDef> {
		self.attributes.iter().find(|a| a.name == name)
	}

	pub fn operation(&self, name: &str) -> Option<&'static OperationDef> {
		self.operations.iter().find(|o| o.name == name)
	}
}

impl fmt::Debug for ComponentDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentDef")
			.field("name", &self.name)
			.field("type_path", &self.type_path)
			.finish()
	}
}

/// A plain struct reachable through a nested or multi-value attribute.
#[derive(Debug)]
pub struct StructDef {
	pub type_name: &'static str,
	pub attributes: &'static [AttributeDef],
}

/// A configurable member of a component or nested struct.
pub struct AttributeDef {
	pub name: &'static str,
	pub doc: &'static str,
	/// Type tag shown in descriptions.
	pub value_type: &'static str,
	pub flags: AttributeFlags,
	/// Declaring layer depth. Members of shared base layers use lower levels and
	/// are listed first.
	pub level: u8,
	/// External property providing this attribute's default value.
	pub binding: Option<&'static str>,
	pub kind: AttributeKind,
}

impl AttributeDef {
	/// Binds the attribute to an external property name.
	pub const fn bind(mut self, property: &'static str) -> Self {
		self.binding = Some(property);
		self
	}

	pub const fn level(mut self, level: u8) -> Self {
		self.level = level;
		self
	}

	pub const fn flags(mut self, flags: AttributeFlags) -> Self {
		self.flags = flags;
		self
	}

	/// Whether external configuration may address this attribute.
	pub fn is_configurable(&self) -> bool {
		!self.flags.contains(AttributeFlags::FINAL)
			&& self.flags.intersects(AttributeFlags::PUBLIC | AttributeFlags::CONFIGURABLE)
	}
}

impl fmt::Debug for AttributeDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AttributeDef")
			.field("name", &self.name)
			.field("value_type", &self.value_type)
			.field("flags", &self.flags)
			.finish()
	}
}

/// How an attribute is reached on a live value.
pub enum AttributeKind {
	/// Terminal value parsed from text.
	Value { set: SetFn, get: GetFn },
	/// Sub-object whose own attributes are addressed with dotted names.
	Nested { def: &'static StructDef, get: NestedFn, get_mut: NestedMutFn },
	/// Keyed collection of elements (`name.<key>` or `name.<key>.field`).
	MultiValue { element: Option<ElementDef> },
}

/// Element type of a multi-value attribute.
pub enum ElementDef {
	Value { value_type: &'static str, put: PutFn },
	Struct { def: &'static StructDef, entry_mut: EntryMutFn },
}

/// A zero-argument operation invocable from the command line.
pub struct OperationDef {
	pub name: &'static str,
	pub doc: &'static str,
	pub level: u8,
	/// Excluded from descriptions.
	pub hidden: bool,
	pub run: OperationFn,
}

impl OperationDef {
	pub const fn hidden(mut self) -> Self {
		self.hidden = true;
		self
	}

	pub const fn level(mut self, level: u8) -> Self {
		self.level = level;
		self
	}
}

impl fmt::Debug for OperationDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OperationDef").field("name", &self.name).field("hidden", &self.hidden).finish()
	}
}

/// A declared requirement edge.
pub enum Requirement {
	/// Always requires the given component.
	Component(&'static ComponentDef),
	/// Requirement computed from scope state; `None` means no requirement.
	Dynamic { name: &'static str, resolve: ResolveFn },
}

impl fmt::Debug for Requirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Component(def) => f.debug_tuple("Component").field(&def.name).finish(),
			Self::Dynamic { name, .. } => f.debug_struct("Dynamic").field("name", name).finish(),
		}
	}
}

/// An attribute holding a reference to another component, filled through `load`.
pub struct InjectDef {
	pub name: &'static str,
	pub target: &'static ComponentDef,
	pub set: InjectFn,
}

/// Contribution applied to `target` right after it is instantiated.
pub struct PreInitDef {
	pub target: &'static ComponentDef,
	pub apply: PreInitFn,
}

/// Contribution applied to `target` in the second pass, once every activated
/// component has its attributes injected.
pub struct PostInitDef {
	pub target: &'static ComponentDef,
	/// Folds the target into the contributor's requirements.
	pub required: bool,
	pub apply: PostInitFn,
}

/// Boxes a component value for [`CreateFn`].
pub fn boxed<T: Any + Send + Sync>(value: T) -> Boxed {
	Box::new(value)
}

/// Downcasts an erased component or struct to its concrete type.
pub fn downcast_mut<T: Any>(target: &mut dyn Any) -> Result<&mut T, String> {
	target
		.downcast_mut::<T>()
		.ok_or_else(|| format!("expected a value of type {}", std::any::type_name::<T>()))
}

/// Shared-reference counterpart of [`downcast_mut`].
pub fn downcast_ref<T: Any>(target: &dyn Any) -> Result<&T, String> {
	target
		.downcast_ref::<T>()
		.ok_or_else(|| format!("expected a value of type {}", std::any::type_name::<T>()))
}
