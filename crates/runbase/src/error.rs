//! Error types for runbase construction and the component lifecycle.

use std::path::PathBuf;

use anvil_invocation::{ActionSource, ParseError};
use anvil_registry::{AssignError, DescribeError, RegistryError};
use thiserror::Error;

/// Errors raised while opening, initializing or running a runbase.
///
/// Only [`RunbaseError::Init`] is a lifecycle failure; force mode downgrades it
/// to a warning. Every other variant aborts the invocation.
#[derive(Debug, Error)]
pub enum RunbaseError {
	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error(transparent)]
	Describe(#[from] DescribeError),

	#[error(transparent)]
	Parse(#[from] ParseError),

	/// Reading or writing a file failed.
	#[error("I/O error on {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	/// A property file is not valid TOML.
	#[error("invalid property file {path}: {error}")]
	PropertyFile {
		path: PathBuf,
		error: toml::de::Error,
	},

	/// The discovery cache could not be written.
	#[error("cannot write discovery cache {path}: {error}")]
	DiscoveryCache {
		path: PathBuf,
		error: serde_json::Error,
	},

	/// The named default component is not among the discovered ones.
	#[error("default component '{name}' not found among discovered components: {available}")]
	MissingDefault { name: String, available: String },

	/// The requirement graph loops back on itself.
	#[error("requirement cycle: {}", .path.join(" -> "))]
	RequirementCycle { path: Vec<&'static str> },

	/// A dynamic requirement resolved to a component outside this runbase's catalog.
	#[error(
		"requirement resolver '{resolver}' of component '{component}' returned '{target}', which is not part of the catalog"
	)]
	UnknownRequirement {
		component: &'static str,
		resolver: &'static str,
		target: &'static str,
	},

	/// A component key outside this runbase's catalog was requested.
	#[error("component '{component}' is not part of this runbase's catalog")]
	NotInCatalog { component: &'static str },

	/// A `@component.attr` property names no attribute.
	#[error("property '{property}' does not address an attribute of component '{component}'")]
	UnknownProperty { component: &'static str, property: String },

	#[error("cannot configure {component}.{attribute} from {origin}: {error}")]
	Assign {
		component: &'static str,
		attribute: String,
		origin: ActionSource,
		#[source]
		error: AssignError,
	},

	#[error("cannot inject '{attribute}' into component '{component}': {reason}")]
	Inject {
		component: &'static str,
		attribute: &'static str,
		reason: String,
	},

	/// A component's declared init operation failed.
	#[error("init of component '{component}' failed")]
	Init {
		component: &'static str,
		#[source]
		error: anyhow::Error,
	},

	/// A pre- or post-initializer contributed by another component failed.
	#[error("{phase} initializer of '{target}' contributed by '{contributor}' failed")]
	Initializer {
		phase: &'static str,
		contributor: &'static str,
		target: &'static str,
		#[source]
		error: anyhow::Error,
	},

	#[error("component '{component}' has no operation '{operation}'")]
	UnknownOperation { component: &'static str, operation: String },

	#[error("operation {component}.{operation}() failed")]
	Operation {
		component: &'static str,
		operation: String,
		#[source]
		error: anyhow::Error,
	},

	#[error("clean action '{name}' failed")]
	CleanAction {
		name: String,
		#[source]
		error: anyhow::Error,
	},

	/// A directory listed in `anvil.child.bases` does not exist.
	#[error("child base {path} of {parent} is not a directory")]
	MissingChildBase { parent: PathBuf, path: PathBuf },

	/// A component was locked again while the engine already held it.
	#[error("component '{component}' is already borrowed by a running callback")]
	Reentrant { component: &'static str },
}

impl RunbaseError {
	/// Whether force mode may downgrade this failure to a warning.
	pub fn is_lifecycle(&self) -> bool {
		matches!(self, Self::Init { .. })
	}
}

/// Result type for runbase operations.
pub type Result<T> = std::result::Result<T, RunbaseError>;
