//! Dotted-path assignment into live components.
//!
//! `addresses.main.street=Elm` walks the `addresses` multi-value attribute, fetches
//! (or creates) the element stored under `main`, then assigns its `street` field.

use std::any::Any;

use anvil_primitives::split_head;

use crate::def::{AttributeDef, AttributeKind, ElementDef};
use crate::error::AssignError;

/// Assigns `raw` to the attribute addressed by `path` within `target`.
///
/// `attributes` is the table describing `target`. A `None` value resets the
/// terminal attribute to its type default.
pub fn assign(attributes: &'static [AttributeDef], target: &mut dyn Any, path: &str, raw: Option<&str>) -> Result<(), AssignError> {
	assign_at(attributes, target, path, 0, raw)
}

/// `offset` is where the unresolved part of `full` starts, for error messages.
fn assign_at(
	attributes: &'static [AttributeDef],
	target: &mut dyn Any,
	full: &str,
	offset: usize,
	raw: Option<&str>,
) -> Result<(), AssignError> {
	let unknown = || AssignError::UnknownAttribute { path: full.to_string() };
	let (head, rest) = split_head(&full[offset..]);
	let attr = attributes.iter().find(|a| a.name == head && a.is_configurable()).ok_or_else(unknown)?;
	let invalid = |reason: String| AssignError::InvalidValue { path: full.to_string(), reason };
	let parent = |end: usize| full[..end].to_string();
	let rest_offset = offset + head.len() + 1;

	match (&attr.kind, rest) {
		(AttributeKind::Value { set, .. }, None) => set(target, raw).map_err(invalid),
		(AttributeKind::Nested { def, get_mut, .. }, Some(_)) => {
			let child = get_mut(target).ok_or_else(|| AssignError::MissingParent {
				path: full.to_string(),
				parent: parent(rest_offset - 1),
			})?;
			assign_at(def.attributes, child, full, rest_offset, raw)
		}
		(AttributeKind::MultiValue { element: None }, _) => {
			Err(AssignError::UnresolvedElementType { path: full.to_string() })
		}
		(AttributeKind::MultiValue { element: Some(element) }, Some(rest)) => {
			let (key, sub) = split_head(rest);
			match (element, sub) {
				(ElementDef::Value { put, .. }, None) => put(target, key, raw).map_err(invalid),
				(ElementDef::Struct { def, entry_mut }, Some(_)) => {
					let key_end = rest_offset + key.len();
					let child = entry_mut(target, key).ok_or_else(|| AssignError::MissingParent {
						path: full.to_string(),
						parent: parent(key_end),
					})?;
					assign_at(def.attributes, child, full, key_end + 1, raw)
				}
				_ => Err(unknown()),
			}
		}
		_ => Err(unknown()),
	}
}
