//! Derived descriptions of component types.
//!
//! A description flattens the attribute tables into dotted names, lists the
//! visible operations, and splits the documentation into header and detail.
//! It is a pure function of the component definition; [`DescriptionCache`]
//! memoizes it per type.

use std::any::Any;
use std::sync::Arc;

use anvil_primitives::{KEY_PLACEHOLDER, prop_name_matches};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::def::{AttributeDef, AttributeKind, ElementDef};
use crate::error::DescribeError;
use crate::key::ComponentKey;
use crate::scope::Scope;

/// One configurable attribute, with nested members flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescription {
	/// Dotted name, e.g. `layout.style` or `agents.[key].coordinates`.
	pub name: String,
	pub value_type: &'static str,
	pub doc: &'static str,
	pub binding: Option<&'static str>,
	pub level: u8,
	/// Value found on a freshly created instance, when requested.
	pub default_value: Option<String>,
}

impl AttributeDescription {
	/// Whether the name addresses an element of a multi-value attribute.
	pub fn is_multi_value(&self) -> bool {
		self.name.split('.').any(|segment| segment == KEY_PLACEHOLDER)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescription {
	pub name: &'static str,
	pub doc: &'static str,
	pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescription {
	pub key: ComponentKey,
	/// First line of the documentation.
	pub header: String,
	/// Remaining documentation lines.
	pub detail: String,
	pub attributes: Vec<AttributeDescription>,
	pub operations: Vec<OperationDescription>,
}

impl ComponentDescription {
	/// Describes a component type without instantiating it.
	pub fn describe(key: ComponentKey) -> Result<Self, DescribeError> {
		Self::build(key, None)
	}

	/// Describes a component type, reading default values from a scratch
	/// instance created in `scope`.
	pub fn with_defaults(key: ComponentKey, scope: &dyn Scope) -> Result<Self, DescribeError> {
		let scratch = (key.def().create)(scope);
		let scratch: &dyn Any = &*scratch;
		Self::build(key, Some(scratch))
	}

	fn build(key: ComponentKey, instance: Option<&dyn Any>) -> Result<Self, DescribeError> {
		let def = key.def();
		let (header, detail) = split_doc(def.description);

		let mut attributes = Vec::new();
		for attr in def.attributes.iter().filter(|a| a.is_configurable()) {
			flatten(def.name, attr, "", attr.level, instance, &mut attributes)?;
		}
		attributes.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));

		let mut operations: Vec<OperationDescription> = def
			.operations
			.iter()
			.filter(|op| !op.hidden)
			.map(|op| OperationDescription { name: op.name, doc: op.doc, level: op.level })
			.collect();
		operations.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(b.name)));

		Ok(Self { key, header, detail, attributes, operations })
	}

	/// Finds the attribute template matching a concrete dotted name.
	pub fn find_attribute(&self, name: &str) -> Option<&AttributeDescription> {
		self.attributes.iter().find(|a| prop_name_matches(&a.name, name))
	}

	pub fn has_operation(&self, name: &str) -> bool {
		self.operations.iter().any(|op| op.name == name)
	}
}

fn split_doc(doc: &str) -> (String, String) {
	match doc.split_once('\n') {
		Some((header, detail)) => (header.trim().to_string(), detail.trim().to_string()),
		None => (doc.trim().to_string(), String::new()),
	}
}

fn flatten(
	component: &'static str,
	attr: &'static AttributeDef,
	prefix: &str,
	level: u8,
	instance: Option<&dyn Any>,
	out: &mut Vec<AttributeDescription>,
) -> Result<(), DescribeError> {
	let name = format!("{prefix}{}", attr.name);
	let describe = |name: String, value_type, default_value| AttributeDescription {
		name,
		value_type,
		doc: attr.doc,
		binding: attr.binding,
		level,
		default_value,
	};

	match &attr.kind {
		AttributeKind::Value { get, .. } => {
			out.push(describe(name, attr.value_type, instance.and_then(get)));
		}
		AttributeKind::Nested { def, get, .. } => {
			let child = instance.and_then(get);
			let prefix = format!("{name}.");
			for nested in def.attributes.iter().filter(|a| a.is_configurable()) {
				flatten(component, nested, &prefix, level, child, out)?;
			}
		}
		AttributeKind::MultiValue { element: None } => {
			return Err(DescribeError::UnresolvedElementType { component, attribute: name });
		}
		AttributeKind::MultiValue { element: Some(ElementDef::Value { value_type, .. }) } => {
			out.push(describe(format!("{name}.{KEY_PLACEHOLDER}"), *value_type, None));
		}
		AttributeKind::MultiValue { element: Some(ElementDef::Struct { def, .. }) } => {
			let prefix = format!("{name}.{KEY_PLACEHOLDER}.");
			for nested in def.attributes.iter().filter(|a| a.is_configurable()) {
				flatten(component, nested, &prefix, level, None, out)?;
			}
		}
	}
	Ok(())
}

/// Memoized descriptions, one per component type.
///
/// Owned by whoever drives the engine and passed by reference, so separate
/// caches never share state.
#[derive(Default)]
pub struct DescriptionCache {
	entries: Mutex<FxHashMap<ComponentKey, Arc<ComponentDescription>>>,
}

impl DescriptionCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn describe(&self, key: ComponentKey) -> Result<Arc<ComponentDescription>, DescribeError> {
		let mut entries = self.entries.lock();
		if let Some(description) = entries.get(&key) {
			return Ok(Arc::clone(description));
		}
		let description = Arc::new(ComponentDescription::describe(key)?);
		tracing::trace!(component = %key, "described component");
		entries.insert(key, Arc::clone(&description));
		Ok(description)
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
