//! Layered key/value properties.
//!
//! Layers are consulted in priority order; the first layer defining a key wins:
//!
//! 1. explicit overrides (`-D key=value`)
//! 2. the process environment, each variable exposed as `MY_VAR` and `my.var`
//! 3. `<base>/anvil.toml`
//! 4. `anvil.toml` of each ancestor directory, walking up while one exists
//! 5. the global `<config dir>/anvil/global.toml`
//!
//! TOML tables are flattened into dotted keys. A key starting with `_` applies,
//! without its underscore, only to the runbase whose own directory holds the
//! file; inherited layers drop it. Values may reference other properties with
//! `${name}`; unresolved references stay literal.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anvil_primitives::{ColumnText, mask_if_sensitive};
use indexmap::IndexMap;

use crate::error::{Result, RunbaseError};

/// Name of the per-directory property file.
pub const PROPERTIES_FILE: &str = "anvil.toml";
/// Property naming the default component.
pub const DEFAULT_COMPONENT_PROP: &str = "anvil.default.component";
/// Comma-separated child base directories, relative to the base directory.
/// Written `_anvil.child.bases` it is not inherited by the children.
pub const CHILD_BASES_PROP: &str = "anvil.child.bases";
/// Prefix of component-related property keys (`@project.version`).
pub const COMPONENT_PREFIX: &str = "@";
/// Value of `@name` excluding the component.
pub const COMPONENT_OFF: &str = "off";

const ENVIRONMENT_SOURCE: &str = "environment";
const MAX_INTERPOLATION_DEPTH: usize = 16;

/// One source of properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
	source: String,
	values: BTreeMap<String, String>,
}

impl Layer {
	pub fn new<K, V>(source: impl Into<String>, values: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			source: source.into(),
			values: values.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}

	/// Environment variables, each under its own name and its dotted lowercase form.
	pub fn environment(vars: impl IntoIterator<Item = (String, String)>) -> Self {
		let mut values = BTreeMap::new();
		for (name, value) in vars {
			values.insert(name.to_lowercase().replace('_', "."), value.clone());
			values.insert(name, value);
		}
		Self { source: ENVIRONMENT_SOURCE.to_string(), values }
	}

	/// Parses TOML text. `own` keeps underscore-prefixed keys (without the
	/// underscore); otherwise they are dropped.
	pub fn from_toml(source: impl Into<String>, text: &str, own: bool) -> std::result::Result<Self, toml::de::Error> {
		let table: toml::Table = toml::from_str(text)?;
		let mut flat = BTreeMap::new();
		flatten("", &table, &mut flat);

		let values = flat
			.into_iter()
			.filter_map(|(key, value)| match key.strip_prefix('_') {
				Some(stripped) if own => Some((stripped.to_string(), value)),
				Some(_) => None,
				None => Some((key, value)),
			})
			.collect();
		Ok(Self { source: source.into(), values })
	}

	pub fn from_file(path: &Path, own: bool) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| RunbaseError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml(path.display().to_string(), &text, own).map_err(|error| RunbaseError::PropertyFile {
			path: path.to_path_buf(),
			error,
		})
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.values.get(key).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
	for (key, value) in table {
		let name = if prefix.is_empty() {
			key.clone()
		} else {
			format!("{prefix}.{key}")
		};
		match value {
			toml::Value::Table(nested) => flatten(&name, nested, out),
			other => {
				out.insert(name, render(other));
			}
		}
	}
}

fn render(value: &toml::Value) -> String {
	match value {
		toml::Value::String(text) => text.clone(),
		toml::Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
		other => other.to_string(),
	}
}

/// Inputs shared by every runbase of an invocation when layering properties.
#[derive(Debug, Clone, Default)]
pub struct PropertySources {
	pub overrides: IndexMap<String, String>,
	pub environment: Vec<(String, String)>,
	pub global_file: Option<PathBuf>,
}

impl PropertySources {
	/// Captures the process environment and locates the global file.
	pub fn from_process() -> Self {
		Self {
			overrides: IndexMap::new(),
			environment: std::env::vars().collect(),
			global_file: dirs::config_dir().map(|dir| dir.join("anvil").join("global.toml")),
		}
	}
}

/// A `@component.attr.path = value` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentProperty {
	/// Component name as written; empty for the default component.
	pub component: String,
	pub path: String,
	pub value: String,
}

/// Layered property set of one runbase.
#[derive(Debug, Clone, Default)]
pub struct Properties {
	layers: Vec<Layer>,
}

impl Properties {
	/// Layers in priority order, highest first.
	pub fn new(layers: Vec<Layer>) -> Self {
		Self { layers }
	}

	/// Assembles the layers for a runbase rooted at `base_dir`.
	pub fn load(base_dir: &Path, sources: &PropertySources) -> Result<Self> {
		let mut layers = vec![
			Layer::new("overrides", sources.overrides.clone()),
			Layer::environment(sources.environment.iter().cloned()),
		];

		let own = base_dir.join(PROPERTIES_FILE);
		if own.is_file() {
			layers.push(Layer::from_file(&own, true)?);
		}
		let mut dir = base_dir.parent();
		while let Some(parent) = dir {
			let file = parent.join(PROPERTIES_FILE);
			if !file.is_file() {
				break;
			}
			layers.push(Layer::from_file(&file, false)?);
			dir = parent.parent();
		}

		if let Some(global) = sources.global_file.as_deref().filter(|path| path.is_file()) {
			layers.push(Layer::from_file(global, false)?);
		}

		let properties = Self::new(layers.into_iter().filter(|layer| !layer.is_empty()).collect());
		tracing::debug!(
			base = %base_dir.display(),
			layers = properties.layers.len(),
			"loaded properties"
		);
		Ok(properties)
	}

	pub fn layers(&self) -> &[Layer] {
		&self.layers
	}

	/// Returns a copy with `key` set in a new top-priority layer.
	pub fn with_override(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let mut layers = Vec::with_capacity(self.layers.len() + 1);
		layers.push(Layer::new("overrides", [(key.into(), value.into())]));
		layers.extend(self.layers.iter().cloned());
		Self { layers }
	}

	/// Interpolated value of `name`.
	pub fn get(&self, name: &str) -> Option<String> {
		self.get_raw(name).map(|raw| self.interpolate(raw, 0))
	}

	/// Value of `name` as written, without interpolation.
	pub fn get_raw(&self, name: &str) -> Option<&str> {
		self.layers.iter().find_map(|layer| layer.get(name))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.get_raw(name).is_some()
	}

	/// Source of the layer defining `name`.
	pub fn source_of(&self, name: &str) -> Option<&str> {
		self.layers.iter().find(|layer| layer.get(name).is_some()).map(Layer::source)
	}

	/// Every key defined by any layer.
	pub fn keys(&self) -> BTreeSet<&str> {
		self.layers.iter().flat_map(|layer| layer.values.keys().map(String::as_str)).collect()
	}

	/// Interpolated values of keys starting with `prefix`, keyed without it.
	pub fn starting_with(&self, prefix: &str) -> BTreeMap<String, String> {
		self.keys()
			.into_iter()
			.filter_map(|key| {
				let stripped = key.strip_prefix(prefix)?;
				Some((stripped.to_string(), self.get(key)?))
			})
			.collect()
	}

	/// `@name` entries: component name and whether it is switched on.
	pub fn component_switches(&self) -> Vec<(String, bool)> {
		self.starting_with(COMPONENT_PREFIX)
			.into_iter()
			.filter(|(name, _)| !name.contains('.'))
			.map(|(name, value)| {
				let on = value.trim() != COMPONENT_OFF;
				(name, on)
			})
			.collect()
	}

	/// `@name.attr.path` entries.
	pub fn component_assignments(&self) -> Vec<ComponentProperty> {
		self.starting_with(COMPONENT_PREFIX)
			.into_iter()
			.filter_map(|(key, value)| {
				let (component, path) = key.split_once('.')?;
				Some(ComponentProperty {
					component: component.to_string(),
					path: path.to_string(),
					value,
				})
			})
			.collect()
	}

	/// Key, value and source of every file-defined property. Sensitive values are masked.
	pub fn to_column_text(&self) -> ColumnText {
		let mut text = ColumnText::new().column(1, 40).column(1, 60).column(5, 60);
		for key in self.keys() {
			let Some(source) = self.source_of(key) else {
				continue;
			};
			if source == ENVIRONMENT_SOURCE {
				continue;
			}
			let value = self.get(key).unwrap_or_default();
			text.add_row([key.to_string(), mask_if_sensitive(key, &value).to_string(), source.to_string()]);
		}
		text
	}

	fn interpolate(&self, raw: &str, depth: usize) -> String {
		if depth >= MAX_INTERPOLATION_DEPTH || !raw.contains("${") {
			return raw.to_string();
		}
		let mut out = String::with_capacity(raw.len());
		let mut rest = raw;
		while let Some(start) = rest.find("${") {
			out.push_str(&rest[..start]);
			let after = &rest[start + 2..];
			let Some(end) = after.find('}') else {
				out.push_str(&rest[start..]);
				return out;
			};
			let name = &after[..end];
			match self.get_raw(name) {
				Some(value) => out.push_str(&self.interpolate(value, depth + 1)),
				None => {
					out.push_str("${");
					out.push_str(name);
					out.push('}');
				}
			}
			rest = &after[end + 1..];
		}
		out.push_str(rest);
		out
	}
}

#[cfg(test)]
mod tests;
