//! Discovery of the builtin components from marker files.

use std::path::Path;

use anvil_registry::Catalog;
use anvil_runbase::{ComponentScanner, PROPERTIES_FILE};

/// Files whose presence in a base directory declares a local component, in
/// declaration order. The first declared component becomes the default; the
/// others are only activated when requested, e.g. with `"@maven" = ""`.
pub const MARKERS: &[(&str, &str)] = &[
	(PROPERTIES_FILE, "project"),
	("pom.xml", "maven"),
	("Dockerfile", "docker"),
	(".git", "git"),
];

/// Scanner declaring components by marker files and providing the whole
/// compiled-in catalog on the classpath.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
	components: Vec<String>,
}

impl MarkerScanner {
	pub fn new(catalog: &Catalog) -> Self {
		Self { components: catalog.names().into_iter().map(str::to_string).collect() }
	}
}

impl ComponentScanner for MarkerScanner {
	/// The binary version plus the compiled-in component names; any change
	/// invalidates cached scans.
	fn classpath(&self, _base_dir: &Path) -> Vec<String> {
		std::iter::once(format!("{}@{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
			.chain(self.components.iter().cloned())
			.collect()
	}

	fn scan_local(&self, base_dir: &Path) -> Vec<String> {
		MARKERS
			.iter()
			.filter(|(marker, component)| {
				base_dir.join(marker).exists() && self.components.iter().any(|known| known == component)
			})
			.map(|(_, component)| component.to_string())
			.collect()
	}

	fn scan_classpath(&self, _base_dir: &Path, _classpath: &[String]) -> Vec<String> {
		self.components.clone()
	}
}

#[cfg(test)]
mod tests;
