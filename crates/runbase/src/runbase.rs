//! The execution scope owning live components.
//!
//! [`Runbase::init`] resolves the activation order and carries every activated
//! component through its lifecycle:
//!
//! 1. **Instantiated**: the factory ran and component references are injected.
//! 2. **AttributesInjected**: pre-initializers contributed by other components
//!    ran, then the merged configuration was assigned.
//! 3. **PreInitialized**: ready for its init operation and registered as a
//!    post-initializer candidate.
//! 4. **InitRun**: the declared init operation (if any) returned.
//! 5. **PostInitialized**: the second pass ran the post-initializers other
//!    components contribute to it.
//!
//! The second pass starts only once every activated component went through
//! the first one. In force mode a failing init operation leaves the component
//! at `AttributesInjected`; its post-initializers are withdrawn and it is not
//! post-initialized.
//!
//! A component loaded by an operation of one of its post-initializer
//! contributors stays at `InitRun` until that operation returns; the
//! contribution is applied then.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anvil_invocation::{Action, ActionLog, ActionSource};
use anvil_registry::{
	Component, ComponentDescription, ComponentKey, Handle, Instance, PostInitDef, PreInitDef, Scope, assign,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::discovery::{Discovery, Scan};
use crate::error::{Result, RunbaseError};
use crate::properties::{CHILD_BASES_PROP, DEFAULT_COMPONENT_PROP, Properties};
use crate::requirements::RequirementGraph;
use crate::session::{Session, normalize};
use crate::settings::Settings;

/// Lifecycle position of a component within its runbase. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
	Uncreated,
	Instantiated,
	AttributesInjected,
	PreInitialized,
	InitRun,
	PostInitialized,
}

/// Which initializer pass a contribution belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializerPhase {
	Pre,
	Post,
}

impl InitializerPhase {
	fn label(self) -> &'static str {
		match self {
			Self::Pre => "pre",
			Self::Post => "post",
		}
	}
}

/// An initializer applied by one component to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
	pub phase: InitializerPhase,
	pub contributor: ComponentKey,
	pub target: ComponentKey,
}

struct Entry {
	instance: Instance,
	state: LifecycleState,
}

#[derive(Default)]
struct State {
	initialized: bool,
	activation_order: Vec<ComponentKey>,
	excluded: Vec<ComponentKey>,
	/// Command-line configuration, kept for components loaded after `init`.
	configuration: ActionLog,
	entries: IndexMap<ComponentKey, Entry>,
	pre_inits: FxHashMap<ComponentKey, Vec<(ComponentKey, &'static PreInitDef)>>,
	/// Components whose post-initializers apply, in registration order.
	candidates: Vec<ComponentKey>,
	contributions: Vec<Contribution>,
	/// Post-initializers whose contributor was running an operation when its
	/// target was loaded. Applied once that operation returns.
	deferred: Vec<(ComponentKey, ComponentKey, &'static PostInitDef)>,
	effective: ActionLog,
}

type CleanFn = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

#[derive(Default)]
struct CleanActions {
	pending: Vec<(String, CleanFn)>,
	done: bool,
}

/// Ownership boundary for the live components of one base directory, plus
/// its layered properties.
pub struct Runbase {
	session: Arc<Session>,
	base_dir: PathBuf,
	child_bases: Vec<PathBuf>,
	properties: Properties,
	discovery: Discovery,
	state: Mutex<State>,
	clean: Mutex<CleanActions>,
}

impl Runbase {
	/// Loads properties and discovers components for `base_dir`, which must be
	/// normalized. `default_name` takes precedence over the property naming
	/// the default component.
	pub(crate) fn open(session: Arc<Session>, base_dir: PathBuf, default_name: Option<&str>) -> Result<Self> {
		let properties = Properties::load(&base_dir, session.sources())?;
		let scan = Scan::run(session.scanner(), &base_dir)?;
		let named = default_name.map(str::to_string).or_else(|| properties.get(DEFAULT_COMPONENT_PROP));
		let discovery = Discovery::resolve(session.catalog(), &scan, named.as_deref(), session.settings().force_mode)?;
		let child_bases = child_bases(&base_dir, &properties)?;
		tracing::debug!(base = %base_dir.display(), children = child_bases.len(), "opened runbase");
		Ok(Self {
			session,
			base_dir,
			child_bases,
			properties,
			discovery,
			state: Mutex::new(State::default()),
			clean: Mutex::new(CleanActions::default()),
		})
	}

	pub fn base_dir(&self) -> &Path {
		&self.base_dir
	}

	pub fn properties(&self) -> &Properties {
		&self.properties
	}

	pub fn discovery(&self) -> &Discovery {
		&self.discovery
	}

	pub fn session(&self) -> &Arc<Session> {
		&self.session
	}

	pub fn settings(&self) -> Settings {
		self.session.settings()
	}

	pub fn is_initialized(&self) -> bool {
		self.state.lock().initialized
	}

	/// Activates the components `log` involves, plus those switched on in
	/// properties, and brings them to [`LifecycleState::PostInitialized`].
	pub fn init(&self, log: &ActionLog) -> Result<()> {
		let excluded = self.excluded_components();
		let mut actions = match self.discovery.init_component() {
			Some(init) => log.with_initialization(init),
			None => log.clone(),
		};
		actions = actions.without_components(&excluded);

		let mut seeds = actions.involved_components();
		for key in self.declared_components() {
			if !seeds.contains(&key) && !excluded.contains(&key) {
				seeds.push(key);
			}
		}

		let order = RequirementGraph::new(self.session.catalog(), self).resolve(&seeds)?;
		{
			let mut state = self.state.lock();
			state.configuration = actions;
			state.excluded = excluded;
			state.activation_order = order.clone();
			for &contributor in &order {
				for pre in contributor.def().pre_inits {
					state.pre_inits.entry(pre.target.key()).or_default().push((contributor, pre));
				}
			}
		}

		for &key in &order {
			self.activate(key)?;
		}
		self.state.lock().initialized = true;

		let mut targets = order.clone();
		let lazily_loaded: Vec<ComponentKey> = self.state.lock().entries.keys().copied().collect();
		for key in lazily_loaded {
			if !targets.contains(&key) {
				targets.push(key);
			}
		}
		for key in targets {
			self.post_initialize(key)?;
		}

		if self.settings().inspect {
			self.log_inspection();
		}
		Ok(())
	}

	/// Returns the live instance of `key`, creating it and running its full
	/// lifecycle when absent.
	pub fn load(&self, key: ComponentKey) -> Result<Instance> {
		let (initialized, live) = {
			let state = self.state.lock();
			(state.initialized, state.entries.get(&key).map(|entry| entry.instance.clone()))
		};
		if !initialized {
			let registered: Vec<&str> = self.state.lock().entries.keys().map(|key| key.name()).collect();
			tracing::warn!(
				component = %key,
				base = %self.base_dir.display(),
				registered = ?registered,
				"component loaded while the runbase is initializing; declare a requirement or a post-initializer instead"
			);
		}
		if let Some(instance) = live {
			return Ok(instance);
		}
		let instance = self.activate(key)?;
		if initialized {
			self.post_initialize(key)?;
		}
		Ok(instance)
	}

	/// Typed [`load`](Self::load).
	pub fn load_as<T: Component>(&self) -> Result<Handle<T>> {
		let instance = self.load(T::key())?;
		Ok(instance.downcast::<T>().expect("component key and type are declared together"))
	}

	/// Non-creating lookup: the live instance, or one the activation order
	/// already holds a place for.
	pub fn find(&self, key: ComponentKey) -> Option<Instance> {
		let planned = {
			let state = self.state.lock();
			if let Some(entry) = state.entries.get(&key) {
				return Some(entry.instance.clone());
			}
			state.activation_order.contains(&key)
		};
		if !planned {
			return None;
		}
		self.load(key)
			.inspect_err(|error| tracing::warn!(component = %key, %error, "cannot activate planned component"))
			.ok()
	}

	/// Invokes the operations of `log` in order. Registered clean actions run
	/// first when the clean setting is on.
	pub fn run(&self, log: &ActionLog) -> Result<()> {
		let excluded = self.state.lock().excluded.clone();
		let log = log.without_components(&excluded);
		let units = log.split_by_component();
		if units.len() > 1 {
			for unit in units.values() {
				tracing::info!(run = %unit.to_cmd_line_run(), "running component operations");
				self.run_unit(unit)?;
			}
			Ok(())
		} else {
			self.run_unit(&log)
		}
	}

	fn run_unit(&self, log: &ActionLog) -> Result<()> {
		if self.settings().clean {
			self.run_clean_actions()?;
		}
		for action in log.find_invokes() {
			let key = action.component;
			let name = action.member();
			let instance = self.load(key)?;
			let operation = key.def().operation(name).ok_or_else(|| RunbaseError::UnknownOperation {
				component: key.name(),
				operation: name.to_string(),
			})?;
			tracing::debug!(component = %key, operation = name, "invoking operation");
			let mut target = instance.try_write().ok_or(RunbaseError::Reentrant { component: key.name() })?;
			(operation.run)(&mut *target, self).map_err(|error| RunbaseError::Operation {
				component: key.name(),
				operation: name.to_string(),
				error,
			})?;
			drop(target);
			self.apply_deferred(key)?;
		}
		Ok(())
	}

	/// Applies the post-initializers `contributor` could not apply while its
	/// operation held it.
	fn apply_deferred(&self, contributor: ComponentKey) -> Result<()> {
		let ready: Vec<(ComponentKey, &'static PostInitDef)> = {
			let mut state = self.state.lock();
			let (ready, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut state.deferred).into_iter().partition(|(owner, ..)| *owner == contributor);
			state.deferred = rest;
			ready.into_iter().map(|(_, target, post)| (target, post)).collect()
		};
		for (target, post) in ready {
			let (owner, observed) = {
				let state = self.state.lock();
				let instance = |key: ComponentKey| state.entries.get(&key).map(|entry| entry.instance.clone());
				match (instance(contributor), instance(target)) {
					(Some(owner), Some(observed)) => (owner, observed),
					_ => continue,
				}
			};
			tracing::debug!(contributor = %contributor, target = %target, "applying deferred post-initializer");
			self.apply_post_init(contributor, &owner, target, &observed, post)?;
			let pending = self.state.lock().deferred.iter().any(|(_, other, _)| *other == target);
			if !pending {
				self.set_state(target, LifecycleState::PostInitialized);
			}
		}
		Ok(())
	}

	/// Registers a cleanup run once, before the first operation, when the
	/// clean setting is on.
	pub fn register_clean_action(&self, name: impl Into<String>, action: impl FnOnce() -> anyhow::Result<()> + Send + 'static) {
		self.clean.lock().pending.push((name.into(), Box::new(action)));
	}

	fn run_clean_actions(&self) -> Result<()> {
		let pending = {
			let mut clean = self.clean.lock();
			if clean.done {
				return Ok(());
			}
			clean.done = true;
			std::mem::take(&mut clean.pending)
		};
		for (name, action) in pending {
			tracing::debug!(action = %name, "running clean action");
			action().map_err(|error| RunbaseError::CleanAction { name, error })?;
		}
		Ok(())
	}

	/// The initialized runbase of a directory relative to this one.
	pub fn child(&self, relative: impl AsRef<Path>) -> Result<Arc<Runbase>> {
		let path = normalize(&self.base_dir.join(relative))?;
		self.session.runbase(&path)
	}

	/// Directories declared by `anvil.child.bases`, normalized.
	pub fn child_bases(&self) -> &[PathBuf] {
		&self.child_bases
	}

	/// Runbases of the declared child bases, in declaration order.
	pub fn children(&self) -> Result<Vec<Arc<Runbase>>> {
		self.child_bases
			.iter()
			.map(|path| {
				if !path.is_dir() {
					return Err(RunbaseError::MissingChildBase { parent: self.base_dir.clone(), path: path.clone() });
				}
				self.session.runbase(path)
			})
			.collect()
	}

	/// Loads `T` in every child runbase.
	pub fn load_children<T: Component>(&self) -> Result<Vec<Handle<T>>> {
		self.children()?.iter().map(|child| child.load_as::<T>()).collect()
	}

	/// Live or planned instances of `T` in the child runbases holding one.
	pub fn find_children<T: Component>(&self) -> Result<Vec<Handle<T>>> {
		Ok(self
			.children()?
			.iter()
			.filter_map(|child| child.find(T::key()).and_then(|instance| instance.downcast::<T>()))
			.collect())
	}

	/// Describes `key` with default values read from a scratch instance.
	pub fn describe_with_defaults(&self, key: ComponentKey) -> Result<ComponentDescription> {
		Ok(ComponentDescription::with_defaults(key, self)?)
	}

	/// Every instantiation and assignment performed so far.
	pub fn effective_actions(&self) -> ActionLog {
		self.state.lock().effective.clone()
	}

	pub fn state_of(&self, key: ComponentKey) -> LifecycleState {
		self.state.lock().entries.get(&key).map_or(LifecycleState::Uncreated, |entry| entry.state)
	}

	/// Live instances in creation order.
	pub fn instances(&self) -> Vec<Instance> {
		self.state.lock().entries.values().map(|entry| entry.instance.clone()).collect()
	}

	pub fn activation_order(&self) -> Vec<ComponentKey> {
		self.state.lock().activation_order.clone()
	}

	/// Initializers applied so far, in application order.
	pub fn contributions(&self) -> Vec<Contribution> {
		self.state.lock().contributions.clone()
	}

	/// Components switched off with `@name=off`.
	fn excluded_components(&self) -> Vec<ComponentKey> {
		self.switched_components(false)
	}

	/// Components switched on with `@name=`.
	fn declared_components(&self) -> Vec<ComponentKey> {
		self.switched_components(true)
	}

	fn switched_components(&self, on: bool) -> Vec<ComponentKey> {
		let mut keys = Vec::new();
		for (name, switched_on) in self.properties.component_switches() {
			if switched_on != on {
				continue;
			}
			match self.discovery.find(&name) {
				Some(key) if !keys.contains(&key) => keys.push(key),
				Some(_) => {}
				None => tracing::debug!(component = %name, "ignoring switch of undiscovered component"),
			}
		}
		keys
	}

	fn set_state(&self, key: ComponentKey, to: LifecycleState) {
		if let Some(entry) = self.state.lock().entries.get_mut(&key) {
			entry.state = to;
		}
	}

	/// First pass for one component, up to [`LifecycleState::InitRun`].
	fn activate(&self, key: ComponentKey) -> Result<Instance> {
		if !self.session.catalog().contains(key) {
			return Err(RunbaseError::NotInCatalog { component: key.name() });
		}
		if let Some(entry) = self.state.lock().entries.get(&key) {
			return Ok(entry.instance.clone());
		}

		let def = key.def();
		tracing::debug!(component = %key, base = %self.base_dir.display(), "instantiating component");
		let instance = Instance::new(key, (def.create)(self));
		{
			let mut state = self.state.lock();
			state.entries.insert(key, Entry { instance: instance.clone(), state: LifecycleState::Instantiated });
			state.effective.add(Action::instantiate(key, ActionSource::Defaults));
		}

		for inject in def.injects {
			let target = self.activate(inject.target.key())?;
			(inject.set)(&mut *instance.write(), target).map_err(|reason| RunbaseError::Inject {
				component: key.name(),
				attribute: inject.name,
				reason,
			})?;
		}

		let pre_inits = self.state.lock().pre_inits.get(&key).cloned().unwrap_or_default();
		for (contributor, pre) in pre_inits {
			(pre.apply)(&mut *instance.write()).map_err(|error| RunbaseError::Initializer {
				phase: InitializerPhase::Pre.label(),
				contributor: contributor.name(),
				target: key.name(),
				error,
			})?;
			self.state.lock().contributions.push(Contribution { phase: InitializerPhase::Pre, contributor, target: key });
		}

		self.configure(key, &instance)?;
		self.set_state(key, LifecycleState::AttributesInjected);

		self.set_state(key, LifecycleState::PreInitialized);
		self.state.lock().candidates.push(key);

		let outcome = match def.init {
			Some(init) => init(&mut *instance.write(), self),
			None => Ok(()),
		};
		if let Err(error) = outcome {
			if !self.settings().force_mode {
				return Err(RunbaseError::Init { component: key.name(), error });
			}
			tracing::warn!(component = %key, "component init failed, continuing in force mode: {error:#}");
			let mut state = self.state.lock();
			state.candidates.retain(|candidate| *candidate != key);
			if let Some(entry) = state.entries.get_mut(&key) {
				entry.state = LifecycleState::AttributesInjected;
			}
			return Ok(instance);
		}
		self.set_state(key, LifecycleState::InitRun);
		Ok(instance)
	}

	/// Second pass for one component: applies the post-initializers of every
	/// registered candidate targeting it.
	fn post_initialize(&self, key: ComponentKey) -> Result<()> {
		let (target, contributors) = {
			let state = self.state.lock();
			let Some(entry) = state.entries.get(&key) else {
				return Ok(());
			};
			if entry.state != LifecycleState::InitRun {
				return Ok(());
			}
			let contributors: Vec<(ComponentKey, Instance, &'static PostInitDef)> = state
				.candidates
				.iter()
				.filter(|candidate| **candidate != key)
				.filter_map(|candidate| Some((*candidate, state.entries.get(candidate)?.instance.clone())))
				.flat_map(|(candidate, instance)| {
					candidate
						.def()
						.post_inits
						.iter()
						.filter(|post| post.target.key() == key)
						.map(move |post| (candidate, instance.clone(), post))
				})
				.collect();
			(entry.instance.clone(), contributors)
		};

		let mut deferred = false;
		for (contributor, instance, post) in contributors {
			if instance.try_write().is_none() {
				tracing::debug!(contributor = %contributor, target = %key, "contributor is running an operation, deferring post-initializer");
				self.state.lock().deferred.push((contributor, key, post));
				deferred = true;
				continue;
			}
			self.apply_post_init(contributor, &instance, key, &target, post)?;
		}
		if !deferred {
			self.set_state(key, LifecycleState::PostInitialized);
		}
		Ok(())
	}

	fn apply_post_init(
		&self,
		contributor: ComponentKey,
		owner: &Instance,
		key: ComponentKey,
		target: &Instance,
		post: &'static PostInitDef,
	) -> Result<()> {
		let mut owner = owner.try_write().ok_or(RunbaseError::Reentrant { component: contributor.name() })?;
		let mut observed = target.try_write().ok_or(RunbaseError::Reentrant { component: key.name() })?;
		tracing::trace!(contributor = %contributor, target = %key, "applying post-initializer");
		(post.apply)(&mut *owner, &mut *observed).map_err(|error| RunbaseError::Initializer {
			phase: InitializerPhase::Post.label(),
			contributor: contributor.name(),
			target: key.name(),
			error,
		})?;
		drop(observed);
		drop(owner);
		self.state.lock().contributions.push(Contribution { phase: InitializerPhase::Post, contributor, target: key });
		Ok(())
	}

	/// Merged configuration of `key`: property-bound defaults, then
	/// `@component.attr` properties, then command-line assignments.
	pub fn configuration(&self, key: ComponentKey) -> Result<ActionLog> {
		let description = self.session.descriptions().describe(key)?;
		let mut log = ActionLog::new();

		for attribute in description.attributes.iter().filter(|attr| !attr.is_multi_value()) {
			let Some(binding) = attribute.binding else {
				continue;
			};
			if let Some(value) = self.properties.get(binding) {
				log.add(Action::set(key, attribute.name.clone(), Some(value), ActionSource::Defaults));
			}
		}

		let is_default = self.discovery.default_component() == Some(key);
		for property in self.properties.component_assignments() {
			let addressed = if property.component.is_empty() {
				is_default
			} else {
				key.def().accepts(&property.component)
			};
			if !addressed {
				continue;
			}
			if description.find_attribute(&property.path).is_none() {
				return Err(RunbaseError::UnknownProperty { component: key.name(), property: property.path });
			}
			log.add(Action::set(key, property.path, Some(property.value), ActionSource::Properties));
		}

		let configuration = self.state.lock().configuration.clone();
		log.add_all(configuration.find_set_attributes(key).into_iter().cloned());
		Ok(log)
	}

	fn configure(&self, key: ComponentKey, instance: &Instance) -> Result<()> {
		let log = self.configuration(key)?;
		let description = self.session.descriptions().describe(key)?;
		let attributes = key.def().attributes;
		{
			let mut target = instance.write();
			for action in &log {
				assign(attributes, &mut *target, action.member(), action.value.as_deref()).map_err(|error| {
					RunbaseError::Assign {
						component: key.name(),
						attribute: action.member().to_string(),
						origin: action.source,
						error,
					}
				})?;
			}
		}

		let mut state = self.state.lock();
		for attribute in description.attributes.iter().filter(|attr| !attr.is_multi_value()) {
			state.effective.add(Action::set(key, attribute.name.clone(), None, ActionSource::Defaults));
		}
		state.effective.add_all(log.iter().cloned());
		Ok(())
	}

	fn log_inspection(&self) {
		let state = self.state.lock();
		let order: Vec<&str> = state.activation_order.iter().map(|key| key.name()).collect();
		tracing::info!(base = %self.base_dir.display(), order = %order.join(", "), "activated components");
		for contribution in &state.contributions {
			tracing::info!(
				phase = contribution.phase.label(),
				contributor = %contribution.contributor,
				target = %contribution.target,
				"initializer applied"
			);
		}
		tracing::info!(
			"effective configuration:\n{}",
			state.effective.to_column_text(self.settings().verbose).render()
		);
	}
}

impl Scope for Runbase {
	fn base_dir(&self) -> &Path {
		&self.base_dir
	}

	fn property(&self, name: &str) -> Option<String> {
		self.properties.get(name)
	}

	fn load_instance(&self, key: ComponentKey) -> anyhow::Result<Instance> {
		Ok(self.load(key)?)
	}

	fn find_instance(&self, key: ComponentKey) -> Option<Instance> {
		self.find(key)
	}
}

impl std::fmt::Debug for Runbase {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Runbase").field("base_dir", &self.base_dir).finish_non_exhaustive()
	}
}

fn child_bases(base_dir: &Path, properties: &Properties) -> Result<Vec<PathBuf>> {
	let Some(list) = properties.get(CHILD_BASES_PROP) else {
		return Ok(Vec::new());
	};
	let mut bases = Vec::new();
	for entry in list.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
		let path = normalize(&base_dir.join(entry))?;
		if path == base_dir {
			tracing::warn!(base = %base_dir.display(), entry, "ignoring child base naming the runbase itself");
			continue;
		}
		if !bases.contains(&path) {
			bases.push(path);
		}
	}
	Ok(bases)
}
