//! State shared by every runbase of one invocation.

use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::Arc;

use anvil_registry::{Catalog, DescriptionCache};

use crate::cache::PathCache;
use crate::discovery::{ComponentScanner, StaticScanner};
use crate::error::{Result, RunbaseError};
use crate::properties::PropertySources;
use crate::runbase::Runbase;
use crate::settings::Settings;

/// Child runbases, memoized by absolute base directory.
pub type RunbaseCache = PathCache<Runbase>;

/// Owner of the catalog, the caches and the invocation-wide settings.
///
/// A session is built once, wrapped in an [`Arc`] and shared by the root
/// runbase and every child runbase opened from it.
pub struct Session {
	catalog: Catalog,
	descriptions: DescriptionCache,
	scanner: Box<dyn ComponentScanner>,
	settings: Settings,
	sources: PropertySources,
	default_component: Option<String>,
	runbases: RunbaseCache,
}

impl Session {
	/// A session over `catalog` where every component is discoverable and none is local.
	pub fn new(catalog: Catalog) -> Self {
		let scanner = StaticScanner::from_catalog(&catalog);
		Self {
			catalog,
			descriptions: DescriptionCache::new(),
			scanner: Box::new(scanner),
			settings: Settings::default(),
			sources: PropertySources::default(),
			default_component: None,
			runbases: RunbaseCache::new(),
		}
	}

	pub fn with_scanner(mut self, scanner: impl ComponentScanner + 'static) -> Self {
		self.scanner = Box::new(scanner);
		self
	}

	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = settings;
		self
	}

	pub fn with_sources(mut self, sources: PropertySources) -> Self {
		self.sources = sources;
		self
	}

	/// Names the root runbase's default component, taking precedence over
	/// the `anvil.default.component` property.
	pub fn with_default_component(mut self, name: Option<String>) -> Self {
		self.default_component = name;
		self
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	pub fn descriptions(&self) -> &DescriptionCache {
		&self.descriptions
	}

	pub fn scanner(&self) -> &dyn ComponentScanner {
		self.scanner.as_ref()
	}

	pub fn settings(&self) -> Settings {
		self.settings
	}

	pub fn sources(&self) -> &PropertySources {
		&self.sources
	}

	pub fn runbases(&self) -> &RunbaseCache {
		&self.runbases
	}

	/// Opens the root runbase at `base_dir`. It is not initialized yet.
	///
	/// The root takes its path's place in the runbase cache, so a child base
	/// resolving to the same directory yields the root itself.
	pub fn open(self: &Arc<Self>, base_dir: &Path) -> Result<Arc<Runbase>> {
		let base_dir = normalize(base_dir)?;
		self.runbases.get_or_create(&base_dir, || {
			Runbase::open(Arc::clone(self), base_dir.clone(), self.default_component.as_deref()).map(Arc::new)
		})
	}

	/// The runbase at `base_dir`, created and initialized once per path. The
	/// root is returned as opened.
	pub fn runbase(self: &Arc<Self>, base_dir: &Path) -> Result<Arc<Runbase>> {
		let base_dir = normalize(base_dir)?;
		self.runbases.get_or_create(&base_dir, || {
			tracing::debug!(base = %base_dir.display(), "opening child runbase");
			let runbase = Runbase::open(Arc::clone(self), base_dir.clone(), None)?;
			runbase.init(&Default::default())?;
			Ok(Arc::new(runbase))
		})
	}
}

/// Absolute form of `path` with `.` and `..` segments resolved lexically.
pub fn normalize(path: &Path) -> Result<PathBuf> {
	let absolute = std::path::absolute(path).map_err(|error| RunbaseError::Io { path: path.to_path_buf(), error })?;
	let mut normalized = PathBuf::new();
	for component in absolute.components() {
		match component {
			PathComponent::CurDir => {}
			PathComponent::ParentDir => {
				normalized.pop();
			}
			other => normalized.push(other),
		}
	}
	Ok(normalized)
}
