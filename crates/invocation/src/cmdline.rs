//! Command-line tokens to actions.
//!
//! Tokens are grouped by target component:
//!
//! ```text
//! anvil project: version=1.2 pack  git: tag
//! ```
//!
//! - `name:` switches the target to the component accepting `name`,
//! - `attr=value` assigns an attribute (dotted paths allowed),
//! - a bare `name` invokes the operation `name`, or switches a boolean attribute on.
//!
//! Tokens before any `name:` target the default component.

use anvil_registry::{Catalog, ComponentDescription, ComponentKey, DescribeError, DescriptionCache, RegistryError};
use thiserror::Error;

use crate::action::{Action, ActionSource};
use crate::log::ActionLog;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	#[error(transparent)]
	Component(#[from] RegistryError),

	#[error(transparent)]
	Describe(#[from] DescribeError),

	#[error("'{token}' does not follow a component name and no default component is set")]
	NoDefaultComponent { token: String },

	#[error("component '{component}' has no attribute or operation '{member}'{}", hint(.suggestion))]
	UnknownMember { component: &'static str, member: String, suggestion: Option<String> },
}

fn hint(suggestion: &Option<String>) -> String {
	suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default()
}

/// Parses command-line tokens against a catalog of components.
pub struct CmdLineParser<'a> {
	catalog: &'a Catalog,
	descriptions: &'a DescriptionCache,
	default_component: Option<ComponentKey>,
}

impl<'a> CmdLineParser<'a> {
	pub fn new(catalog: &'a Catalog, descriptions: &'a DescriptionCache) -> Self {
		Self { catalog, descriptions, default_component: None }
	}

	/// Component receiving tokens that precede any `name:` token.
	pub fn with_default(mut self, component: Option<ComponentKey>) -> Self {
		self.default_component = component;
		self
	}

	pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ActionLog, ParseError> {
		let mut log = ActionLog::new();
		let mut current = self.default_component;

		for token in tokens.iter().map(|t| t.as_ref()).filter(|t| !t.is_empty()) {
			if let Some(name) = token.strip_suffix(':') {
				let key = self.catalog.find(name)?;
				log.add(Action::instantiate(key, ActionSource::CommandLine));
				current = Some(key);
				continue;
			}

			let key = current.ok_or_else(|| ParseError::NoDefaultComponent { token: token.to_string() })?;
			log.add(Action::instantiate(key, ActionSource::CommandLine));
			let description = self.descriptions.describe(key)?;
			log.add(member_action(&description, token)?);
		}
		Ok(log)
	}
}

fn member_action(description: &ComponentDescription, token: &str) -> Result<Action, ParseError> {
	let key = description.key;
	let unknown = |member: &str| ParseError::UnknownMember {
		component: key.name(),
		member: member.to_string(),
		suggestion: suggest_member(description, member),
	};

	if let Some((name, value)) = token.split_once('=') {
		description.find_attribute(name).ok_or_else(|| unknown(name))?;
		return Ok(Action::set(key, name, Some(value.to_string()), ActionSource::CommandLine));
	}
	if description.has_operation(token) {
		return Ok(Action::invoke(key, token, ActionSource::CommandLine));
	}
	match description.find_attribute(token) {
		Some(attr) if attr.value_type == "bool" => {
			Ok(Action::set(key, token, Some(String::from("true")), ActionSource::CommandLine))
		}
		_ => Err(unknown(token)),
	}
}

fn suggest_member(description: &ComponentDescription, member: &str) -> Option<String> {
	let attributes = description.attributes.iter().map(|a| a.name.as_str());
	let operations = description.operations.iter().map(|op| op.name);
	attributes
		.chain(operations)
		.min_by_key(|candidate| strsim::levenshtein(member, candidate))
		.filter(|candidate| strsim::levenshtein(member, candidate) <= 3)
		.map(str::to_string)
}

#[cfg(test)]
mod tests;
