use thiserror::Error;

/// Catalog-level configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error("components {first} and {second} share the short name '{name}'")]
	DuplicateName { name: &'static str, first: &'static str, second: &'static str },

	#[error("no component named '{name}'{}; available: {available}", suggestion_hint(.suggestion))]
	UnknownComponent { name: String, available: String, suggestion: Option<&'static str> },

	#[error("component name '{name}' is ambiguous, it matches {candidates}")]
	AmbiguousName { name: String, candidates: String },

	#[error("component '{component}' declares {relation} '{target}', which is not part of the catalog")]
	UnknownTarget { component: &'static str, relation: &'static str, target: &'static str },

	#[error("component '{component}' declares itself as {relation} target")]
	SelfTarget { component: &'static str, relation: &'static str },
}

fn suggestion_hint(suggestion: &Option<&'static str>) -> String {
	suggestion.map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default()
}

/// Failures while deriving a component description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescribeError {
	#[error(
		"attribute '{attribute}' of component '{component}' is a multi-value map without a resolvable element type"
	)]
	UnresolvedElementType { component: &'static str, attribute: String },
}

/// Failures while assigning a configured value into a live component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
	#[error("unknown attribute '{path}'")]
	UnknownAttribute { path: String },

	#[error(
		"cannot assign '{path}': '{parent}' is absent; instantiate it in the component constructor so it can be configured"
	)]
	MissingParent { path: String, parent: String },

	#[error("cannot assign '{path}': multi-value element type is unresolved")]
	UnresolvedElementType { path: String },

	#[error("invalid value for '{path}': {reason}")]
	InvalidValue { path: String, reason: String },
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
