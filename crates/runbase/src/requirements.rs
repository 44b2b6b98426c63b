//! Which components to activate, and in which order.
//!
//! Starting from a seed list, requirements are discovered until a fixed point;
//! each newly found component is inserted right before the component that
//! required it. The final order places every component after everything it
//! transitively depends on, through requirement edges or initializer edges,
//! and otherwise keeps the discovery order.

use anvil_registry::{Catalog, ComponentKey, Requirement, Scope};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Result, RunbaseError};

/// Requirement resolution over one catalog, as seen from one scope.
///
/// Direct requirements are memoized per component, so every dynamic resolver
/// runs at most once per graph.
pub struct RequirementGraph<'a> {
	catalog: &'a Catalog,
	scope: &'a dyn Scope,
	direct: FxHashMap<ComponentKey, Vec<ComponentKey>>,
}

impl<'a> RequirementGraph<'a> {
	pub fn new(catalog: &'a Catalog, scope: &'a dyn Scope) -> Self {
		Self { catalog, scope, direct: FxHashMap::default() }
	}

	/// Components `key` needs activated: static and dynamic requirements,
	/// injected components and required post-initializer targets.
	pub fn direct_requirements(&mut self, key: ComponentKey) -> Result<Vec<ComponentKey>> {
		if let Some(known) = self.direct.get(&key) {
			return Ok(known.clone());
		}
		let def = key.def();
		let mut found: Vec<ComponentKey> = Vec::new();
		let mut push = |target: ComponentKey| {
			if !found.contains(&target) {
				found.push(target);
			}
		};

		for inject in def.injects {
			push(inject.target.key());
		}
		for post in def.post_inits.iter().filter(|post| post.required) {
			push(post.target.key());
		}
		for requirement in def.requires {
			match requirement {
				Requirement::Component(target) => push(target.key()),
				Requirement::Dynamic { name, resolve } => {
					let Some(target) = resolve(self.scope) else {
						tracing::trace!(component = %key, resolver = name, "dynamic requirement resolved to nothing");
						continue;
					};
					if !self.catalog.contains(target) {
						return Err(RunbaseError::UnknownRequirement {
							component: def.name,
							resolver: name,
							target: target.name(),
						});
					}
					push(target);
				}
			}
		}

		self.direct.insert(key, found.clone());
		Ok(found)
	}

	/// Activation order for `seeds`: the seeds plus everything they
	/// transitively require, dependencies first.
	///
	/// Cycles through requirement or initializer edges are rejected.
	pub fn resolve(&mut self, seeds: &[ComponentKey]) -> Result<Vec<ComponentKey>> {
		let mut result: Vec<ComponentKey> = Vec::new();
		for seed in seeds {
			if !result.contains(seed) {
				result.push(*seed);
			}
		}

		loop {
			let working = result.clone();
			let mut grown = false;
			for key in working {
				for required in self.direct_requirements(key)? {
					if result.contains(&required) {
						continue;
					}
					let Some(at) = result.iter().position(|present| *present == key) else {
						continue;
					};
					result.insert(at, required);
					grown = true;
				}
			}
			if !grown {
				break;
			}
		}

		let edges = self.edges(&result)?;
		check_acyclic(&result, &edges)?;
		let depends = closure(&result, &edges);

		let mut ordered: Vec<ComponentKey> = Vec::with_capacity(result.len());
		for key in result {
			let at = ordered
				.iter()
				.position(|present| depends.get(present).is_some_and(|deps| deps.contains(&key)))
				.unwrap_or(ordered.len());
			ordered.insert(at, key);
		}

		tracing::debug!(
			order = ?ordered.iter().map(|key| key.name()).collect::<Vec<_>>(),
			"resolved activation order"
		);
		Ok(ordered)
	}

	/// Direct edges among `activated`: requirements plus pre- and
	/// post-initializer targets, which are ordered ahead of their contributor.
	fn edges(&mut self, activated: &[ComponentKey]) -> Result<FxHashMap<ComponentKey, Vec<ComponentKey>>> {
		let mut edges = FxHashMap::default();
		for &key in activated {
			let mut targets = self.direct_requirements(key)?;
			let def = key.def();
			let initialized = def.post_inits.iter().map(|post| post.target.key()).chain(def.pre_inits.iter().map(|pre| pre.target.key()));
			for target in initialized {
				if activated.contains(&target) && !targets.contains(&target) {
					targets.push(target);
				}
			}
			edges.insert(key, targets);
		}
		Ok(edges)
	}
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
	Visiting,
	Done,
}

fn check_acyclic(nodes: &[ComponentKey], edges: &FxHashMap<ComponentKey, Vec<ComponentKey>>) -> Result<()> {
	let mut marks: FxHashMap<ComponentKey, Mark> = FxHashMap::default();
	let mut path: Vec<ComponentKey> = Vec::new();
	for &node in nodes {
		visit(node, edges, &mut marks, &mut path)?;
	}
	Ok(())
}

fn visit(
	node: ComponentKey,
	edges: &FxHashMap<ComponentKey, Vec<ComponentKey>>,
	marks: &mut FxHashMap<ComponentKey, Mark>,
	path: &mut Vec<ComponentKey>,
) -> Result<()> {
	match marks.get(&node) {
		Some(Mark::Done) => return Ok(()),
		Some(Mark::Visiting) => {
			let start = path.iter().position(|key| *key == node).unwrap_or(0);
			let mut cycle: Vec<&'static str> = path[start..].iter().map(|key| key.name()).collect();
			cycle.push(node.name());
			return Err(RunbaseError::RequirementCycle { path: cycle });
		}
		None => {}
	}
	marks.insert(node, Mark::Visiting);
	path.push(node);
	for &next in edges.get(&node).map(Vec::as_slice).unwrap_or_default() {
		visit(next, edges, marks, path)?;
	}
	path.pop();
	marks.insert(node, Mark::Done);
	Ok(())
}

/// Transitive dependencies of every node. The graph is known to be acyclic.
fn closure(
	nodes: &[ComponentKey],
	edges: &FxHashMap<ComponentKey, Vec<ComponentKey>>,
) -> FxHashMap<ComponentKey, FxHashSet<ComponentKey>> {
	fn collect(
		node: ComponentKey,
		edges: &FxHashMap<ComponentKey, Vec<ComponentKey>>,
		memo: &mut FxHashMap<ComponentKey, FxHashSet<ComponentKey>>,
	) -> FxHashSet<ComponentKey> {
		if let Some(known) = memo.get(&node) {
			return known.clone();
		}
		let mut deps = FxHashSet::default();
		for &next in edges.get(&node).map(Vec::as_slice).unwrap_or_default() {
			deps.insert(next);
			deps.extend(collect(next, edges, memo));
		}
		memo.insert(node, deps.clone());
		deps
	}

	let mut memo = FxHashMap::default();
	for &node in nodes {
		collect(node, edges, &mut memo);
	}
	memo
}
