//! Which components a runbase can see, and which one is its default.
//!
//! A [`ComponentScanner`] reports component names for a base directory: the
//! ones declared by the directory itself and the ones provided by its resolved
//! dependencies (the classpath). Classpath scans are cached on disk by
//! [`DiscoveryCache`] and reused while the classpath fingerprint is unchanged.

use std::path::{Path, PathBuf};

use anvil_registry::{Catalog, ComponentKey, RegistryError};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunbaseError};

/// Work directory holding caches, relative to the base directory.
pub const WORK_DIR: &str = ".anvil-work";
const CACHE_FILE: &str = "discovery.json";

/// Source of component names for a base directory.
pub trait ComponentScanner: Send + Sync {
	/// Fingerprint of the resolved dependencies of `base_dir`.
	fn classpath(&self, base_dir: &Path) -> Vec<String>;

	/// Components declared by `base_dir` itself. Never cached.
	fn scan_local(&self, base_dir: &Path) -> Vec<String>;

	/// Components provided by the classpath.
	fn scan_classpath(&self, base_dir: &Path, classpath: &[String]) -> Vec<String>;
}

/// Scanner returning fixed lists, whatever the directory.
#[derive(Debug, Clone, Default)]
pub struct StaticScanner {
	pub local: Vec<String>,
	pub classpath: Vec<String>,
}

impl StaticScanner {
	/// Every catalog component on the classpath, none local.
	pub fn from_catalog(catalog: &Catalog) -> Self {
		Self {
			local: Vec::new(),
			classpath: catalog.names().into_iter().map(str::to_string).collect(),
		}
	}
}

impl ComponentScanner for StaticScanner {
	fn classpath(&self, _base_dir: &Path) -> Vec<String> {
		self.classpath.clone()
	}

	fn scan_local(&self, _base_dir: &Path) -> Vec<String> {
		self.local.clone()
	}

	fn scan_classpath(&self, _base_dir: &Path, _classpath: &[String]) -> Vec<String> {
		self.classpath.clone()
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
	classpath: Vec<String>,
	components: Vec<String>,
}

/// On-disk record of the last classpath scan of a base directory.
#[derive(Debug, Clone)]
pub struct DiscoveryCache {
	path: PathBuf,
}

impl DiscoveryCache {
	pub fn for_base(base_dir: &Path) -> Self {
		Self { path: base_dir.join(WORK_DIR).join(CACHE_FILE) }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Cached components, if the recorded classpath equals `classpath`.
	///
	/// A missing or unreadable cache is a miss.
	pub fn read(&self, classpath: &[String]) -> Option<Vec<String>> {
		let text = std::fs::read_to_string(&self.path).ok()?;
		let cached: CacheFile = match serde_json::from_str(&text) {
			Ok(cached) => cached,
			Err(error) => {
				tracing::debug!(path = %self.path.display(), %error, "ignoring unreadable discovery cache");
				return None;
			}
		};
		(cached.classpath == classpath && !cached.components.is_empty()).then_some(cached.components)
	}

	pub fn write(&self, classpath: &[String], components: &[String]) -> Result<()> {
		if let Some(dir) = self.path.parent() {
			std::fs::create_dir_all(dir).map_err(|error| RunbaseError::Io { path: dir.to_path_buf(), error })?;
		}
		let record = CacheFile { classpath: classpath.to_vec(), components: components.to_vec() };
		let text = serde_json::to_string_pretty(&record).map_err(|error| RunbaseError::DiscoveryCache {
			path: self.path.clone(),
			error,
		})?;
		std::fs::write(&self.path, text).map_err(|error| RunbaseError::Io { path: self.path.clone(), error })
	}

	/// Cached components for `classpath`, or a fresh scan that replaces the cache.
	pub fn components_or_scan(&self, classpath: &[String], scan: impl FnOnce() -> Vec<String>) -> Result<Vec<String>> {
		if let Some(components) = self.read(classpath) {
			tracing::trace!(path = %self.path.display(), "discovery cache hit");
			return Ok(components);
		}
		let components = scan();
		self.write(classpath, &components)?;
		tracing::debug!(path = %self.path.display(), count = components.len(), "discovery cache refreshed");
		Ok(components)
	}
}

/// Component names reported for one base directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
	pub local: Vec<String>,
	pub classpath: Vec<String>,
}

impl Scan {
	/// Runs `scanner` for `base_dir`, going through the discovery cache for the
	/// classpath part.
	pub fn run(scanner: &dyn ComponentScanner, base_dir: &Path) -> Result<Self> {
		let local = scanner.scan_local(base_dir);
		let classpath = scanner.classpath(base_dir);
		let cache = DiscoveryCache::for_base(base_dir);
		let provided = cache.components_or_scan(&classpath, || scanner.scan_classpath(base_dir, &classpath))?;
		Ok(Self { local, classpath: provided })
	}
}

/// Discovered components of a runbase and its default and init components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
	all: Vec<ComponentKey>,
	local: Vec<ComponentKey>,
	default_component: Option<ComponentKey>,
	init_component: Option<ComponentKey>,
}

impl Discovery {
	/// Maps scanned names onto `catalog` and picks the default component.
	///
	/// The default is the component named by `default_name`, else the first
	/// local one. The init component, activated ahead of everything else, is the
	/// default when it is local, else the first local component, else the
	/// default. A `default_name` matching no discovered component is fatal
	/// unless `lenient`.
	pub fn resolve(catalog: &Catalog, scan: &Scan, default_name: Option<&str>, lenient: bool) -> Result<Self> {
		let mut local = Vec::new();
		for name in &scan.local {
			let key = catalog.find(name)?;
			if !local.contains(&key) {
				local.push(key);
			}
		}
		let mut all = local.clone();
		for name in &scan.classpath {
			let key = catalog.find(name)?;
			if !all.contains(&key) {
				all.push(key);
			}
		}

		let named = default_name.map(str::trim).filter(|name| !name.is_empty());
		let default_component = match named {
			Some(name) => find_default(&all, &local, name, lenient)?,
			None => local.first().copied(),
		};
		let init_component = match default_component {
			Some(default) if local.contains(&default) => Some(default),
			_ => local.first().copied().or(default_component),
		};

		tracing::debug!(
			discovered = all.len(),
			local = local.len(),
			default = ?default_component.map(ComponentKey::name),
			init = ?init_component.map(ComponentKey::name),
			"resolved discovery"
		);
		Ok(Self { all, local, default_component, init_component })
	}

	pub fn all(&self) -> &[ComponentKey] {
		&self.all
	}

	pub fn local(&self) -> &[ComponentKey] {
		&self.local
	}

	pub fn contains(&self, key: ComponentKey) -> bool {
		self.all.contains(&key)
	}

	pub fn default_component(&self) -> Option<ComponentKey> {
		self.default_component
	}

	pub fn init_component(&self) -> Option<ComponentKey> {
		self.init_component
	}

	/// Resolves a component name as written in properties. An empty name
	/// designates the default component.
	pub fn find(&self, name: &str) -> Option<ComponentKey> {
		if name.is_empty() {
			return self.default_component;
		}
		self.all.iter().copied().find(|key| key.def().accepts(name))
	}
}

fn find_default(all: &[ComponentKey], local: &[ComponentKey], name: &str, lenient: bool) -> Result<Option<ComponentKey>> {
	let matches: Vec<ComponentKey> = all.iter().copied().filter(|key| key.def().accepts(name)).collect();
	match matches.as_slice() {
		[key] => Ok(Some(*key)),
		[] if lenient => {
			tracing::warn!(name, "default component not found among discovered components");
			Ok(local.first().copied())
		}
		[] => Err(RunbaseError::MissingDefault {
			name: name.to_string(),
			available: names(all),
		}),
		many => Err(RegistryError::AmbiguousName {
			name: name.to_string(),
			candidates: many.iter().map(|key| key.def().type_path).collect::<Vec<_>>().join(", "),
		}
		.into()),
	}
}

fn names(keys: &[ComponentKey]) -> String {
	keys.iter().map(|key| key.name()).collect::<Vec<_>>().join(", ")
}
