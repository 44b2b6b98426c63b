use std::fmt;

use anvil_primitives::mask_if_sensitive;
use anvil_registry::ComponentKey;

/// What an [`Action`] does to its component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
	/// Create the component and carry it through its lifecycle.
	Instantiate,
	/// Assign a value to a (possibly dotted) attribute.
	SetAttribute,
	/// Run an operation once the scope is initialized.
	InvokeOperation,
}

impl ActionKind {
	/// Position within a component's group when a log is sorted.
	pub const fn rank(self) -> u8 {
		match self {
			Self::Instantiate => 0,
			Self::SetAttribute => 1,
			Self::InvokeOperation => 2,
		}
	}
}

/// Where an action came from. Later sources override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionSource {
	/// Property-bound defaults and engine decisions.
	Defaults,
	/// `@component.attr=value` entries of the layered properties.
	Properties,
	/// Command-line tokens.
	CommandLine,
}

impl fmt::Display for ActionSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Defaults => write!(f, "defaults"),
			Self::Properties => write!(f, "properties"),
			Self::CommandLine => write!(f, "cmdline"),
		}
	}
}

/// One entry of an [`ActionLog`](crate::ActionLog).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
	pub kind: ActionKind,
	pub component: ComponentKey,
	/// Attribute path or operation name; `None` for instantiation.
	pub member: Option<String>,
	/// Assigned value; `None` is a null assignment resetting the attribute.
	pub value: Option<String>,
	pub source: ActionSource,
}

impl Action {
	pub fn instantiate(component: ComponentKey, source: ActionSource) -> Self {
		Self { kind: ActionKind::Instantiate, component, member: None, value: None, source }
	}

	pub fn set(component: ComponentKey, member: impl Into<String>, value: Option<String>, source: ActionSource) -> Self {
		Self { kind: ActionKind::SetAttribute, component, member: Some(member.into()), value, source }
	}

	pub fn invoke(component: ComponentKey, member: impl Into<String>, source: ActionSource) -> Self {
		Self { kind: ActionKind::InvokeOperation, component, member: Some(member.into()), value: None, source }
	}

	pub fn member(&self) -> &str {
		self.member.as_deref().unwrap_or("")
	}

	/// Whether two actions occupy the same de-duplication slot.
	pub(crate) fn same_slot(&self, other: &Self) -> bool {
		self.kind == other.kind
			&& self.component == other.component
			&& (self.kind == ActionKind::Instantiate || self.member == other.member)
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			ActionKind::Instantiate => write!(f, "{}.init()", self.component),
			ActionKind::InvokeOperation => write!(f, "{}.{}()", self.component, self.member()),
			ActionKind::SetAttribute => write!(
				f,
				"{}.{}={}  [from {}]",
				self.component,
				self.member(),
				self.value.as_deref().map_or("null", |value| mask_if_sensitive(self.member(), value)),
				self.source
			),
		}
	}
}
