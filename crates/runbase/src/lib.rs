//! Execution scopes for anvil components.
//!
//! A [`Runbase`] owns the live components of one base directory. Opening it
//! layers the [`Properties`] of that directory and runs component
//! [`discovery`]; [`Runbase::init`] then resolves the [`RequirementGraph`] for
//! the requested components and drives each one through its lifecycle, merging
//! configuration from property-bound defaults, `@component.attr` properties and
//! the command line, in that order of increasing precedence.
//!
//! Runbases of one invocation share a [`Session`]: the catalog, the description
//! cache, the [`Settings`] and the cache of child runbases by path.

pub mod cache;
pub mod discovery;
pub mod error;
pub mod properties;
pub mod requirements;
pub mod runbase;
pub mod session;
pub mod settings;

pub use cache::PathCache;
pub use discovery::{ComponentScanner, Discovery, DiscoveryCache, Scan, StaticScanner};
pub use error::{Result, RunbaseError};
pub use properties::{
	CHILD_BASES_PROP, COMPONENT_OFF, COMPONENT_PREFIX, ComponentProperty, DEFAULT_COMPONENT_PROP, Layer, PROPERTIES_FILE,
	Properties, PropertySources,
};
pub use requirements::RequirementGraph;
pub use runbase::{Contribution, InitializerPhase, LifecycleState, Runbase};
pub use session::{RunbaseCache, Session};
pub use settings::Settings;
