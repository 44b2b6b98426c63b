use rustc_hash::FxHashMap;

use crate::def::{ComponentDef, Requirement};
use crate::error::{RegistryError, Result};
use crate::key::{ComponentKey, ComponentReg};

/// The set of component types available to a scope.
///
/// Definitions keep their insertion order; duplicates are dropped.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	components: Vec<ComponentKey>,
}

impl Catalog {
	/// Builds a catalog and checks its consistency: unique short names, and
	/// every statically referenced target present.
	pub fn new(defs: impl IntoIterator<Item = &'static ComponentDef>) -> Result<Self> {
		let mut components: Vec<ComponentKey> = Vec::new();
		for def in defs {
			let key = ComponentKey::new(def);
			if !components.contains(&key) {
				components.push(key);
			}
		}
		let catalog = Self { components };
		catalog.validate()?;
		Ok(catalog)
	}

	/// Every component submitted with [`register_component!`](crate::register_component),
	/// ordered by short name.
	pub fn from_inventory() -> Result<Self> {
		let mut defs: Vec<&'static ComponentDef> = inventory::iter::<ComponentReg>.into_iter().map(|reg| reg.0).collect();
		defs.sort_by_key(|def| (def.name, def.type_path));
		Self::new(defs)
	}

	fn validate(&self) -> Result<()> {
		let mut names: FxHashMap<&'static str, &'static ComponentDef> = FxHashMap::default();
		for key in &self.components {
			let def = key.def();
			if let Some(first) = names.insert(def.name, def) {
				return Err(RegistryError::DuplicateName { name: def.name, first: first.type_path, second: def.type_path });
			}
		}

		for key in &self.components {
			let def = key.def();
			let statics = def.requires.iter().filter_map(|req| match req {
				Requirement::Component(target) => Some(("requirement", *target)),
				Requirement::Dynamic { .. } => None,
			});
			let injects = def.injects.iter().map(|inject| ("injected component", inject.target));
			let pre = def.pre_inits.iter().map(|pre| ("pre-initializer", pre.target));
			let post = def.post_inits.iter().map(|post| ("post-initializer", post.target));

			for (relation, target) in statics.chain(injects).chain(pre).chain(post) {
				let target = ComponentKey::new(target);
				if target == *key && relation != "requirement" {
					return Err(RegistryError::SelfTarget { component: def.name, relation });
				}
				if !self.contains(target) {
					return Err(RegistryError::UnknownTarget { component: def.name, relation, target: target.name() });
				}
			}
		}
		Ok(())
	}

	pub fn contains(&self, key: ComponentKey) -> bool {
		self.components.contains(&key)
	}

	pub fn iter(&self) -> impl Iterator<Item = ComponentKey> + '_ {
		self.components.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.components.len()
	}

	pub fn is_empty(&self) -> bool {
		self.components.is_empty()
	}

	pub fn names(&self) -> Vec<&'static str> {
		self.components.iter().map(|key| key.name()).collect()
	}

	/// Resolves a name accepted by exactly one component.
	pub fn find(&self, name: &str) -> Result<ComponentKey> {
		let matches: Vec<ComponentKey> = self.components.iter().copied().filter(|key| key.def().accepts(name)).collect();
		match matches.as_slice() {
			[key] => Ok(*key),
			[] => Err(RegistryError::UnknownComponent {
				name: name.to_string(),
				available: self.names().join(", "),
				suggestion: self.suggest(name),
			}),
			many => Err(RegistryError::AmbiguousName {
				name: name.to_string(),
				candidates: many.iter().map(|key| key.def().type_path).collect::<Vec<_>>().join(", "),
			}),
		}
	}

	/// Closest short name to `name`, if it is a plausible typo.
	pub fn suggest(&self, name: &str) -> Option<&'static str> {
		self.components
			.iter()
			.map(|key| key.name())
			.min_by_key(|candidate| strsim::levenshtein(name, candidate))
			.filter(|candidate| strsim::levenshtein(name, candidate) <= 3)
	}
}
