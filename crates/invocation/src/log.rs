//! The de-duplicating action log.

use anvil_primitives::{ColumnText, MASK, is_sensitive_key};
use anvil_registry::ComponentKey;
use indexmap::IndexMap;

use crate::action::{Action, ActionKind, ActionSource};

/// Ordered, source-tagged list of actions driving component configuration.
///
/// [`add`](Self::add) enforces the slot rules:
/// - at most one `Instantiate` per component; re-adding is a no-op,
/// - at most one `SetAttribute` per (component, attribute); a later one replaces
///   the earlier in place, keeping its position,
/// - `InvokeOperation` entries are always appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLog {
	actions: Vec<Action>,
}

impl ActionLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, action: Action) {
		match action.kind {
			ActionKind::InvokeOperation => self.actions.push(action),
			ActionKind::Instantiate => {
				if !self.actions.iter().any(|a| a.same_slot(&action)) {
					self.actions.push(action);
				}
			}
			ActionKind::SetAttribute => match self.actions.iter().position(|a| a.same_slot(&action)) {
				Some(idx) => self.actions[idx] = action,
				None => self.actions.push(action),
			},
		}
	}

	pub fn add_all(&mut self, actions: impl IntoIterator<Item = Action>) {
		for action in actions {
			self.add(action);
		}
	}

	pub fn actions(&self) -> &[Action] {
		&self.actions
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Action> {
		self.actions.iter()
	}

	pub fn len(&self) -> usize {
		self.actions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.actions.is_empty()
	}

	/// Attribute assignments targeting `component`, in log order.
	pub fn find_set_attributes(&self, component: ComponentKey) -> Vec<&Action> {
		self.actions
			.iter()
			.filter(|a| a.kind == ActionKind::SetAttribute && a.component == component)
			.collect()
	}

	/// Operation invocations, in log order.
	pub fn find_invokes(&self) -> Vec<&Action> {
		self.actions.iter().filter(|a| a.kind == ActionKind::InvokeOperation).collect()
	}

	/// Components mentioned by any action, in order of first appearance.
	pub fn involved_components(&self) -> Vec<ComponentKey> {
		let mut components = Vec::new();
		for action in &self.actions {
			if !components.contains(&action.component) {
				components.push(action.component);
			}
		}
		components
	}

	/// Derived log whose first entry instantiates `component`.
	///
	/// Any existing instantiation of `component` is removed first, so it is
	/// activated ahead of everything else. The synthesized entry is tagged
	/// [`ActionSource::Defaults`].
	pub fn with_initialization(&self, component: ComponentKey) -> Self {
		let mut actions = self.actions.clone();
		actions.retain(|a| !(a.kind == ActionKind::Instantiate && a.component == component));
		actions.insert(0, Action::instantiate(component, ActionSource::Defaults));
		Self { actions }
	}

	/// Derived log keeping only actions on the given components.
	pub fn retain_components(&self, components: &[ComponentKey]) -> Self {
		self.filtered(|a| components.contains(&a.component))
	}

	/// Derived log dropping actions on the given components.
	pub fn without_components(&self, components: &[ComponentKey]) -> Self {
		self.filtered(|a| !components.contains(&a.component))
	}

	fn filtered(&self, keep: impl Fn(&Action) -> bool) -> Self {
		let mut log = Self::new();
		log.add_all(self.actions.iter().filter(|a| keep(a)).cloned());
		log
	}

	/// One sub-log per component, in order of first appearance.
	pub fn split_by_component(&self) -> IndexMap<ComponentKey, ActionLog> {
		let mut split: IndexMap<ComponentKey, ActionLog> = IndexMap::new();
		for action in &self.actions {
			split.entry(action.component).or_default().add(action.clone());
		}
		split
	}

	/// Orders each component's actions as instantiate, assignments, invocations.
	///
	/// Components keep the log positions they occupy; only the actions within a
	/// component's own positions are reordered, stably.
	pub fn sorted(&self) -> Self {
		let mut actions = self.actions.clone();
		for component in self.involved_components() {
			let slots: Vec<usize> =
				self.actions.iter().enumerate().filter(|(_, a)| a.component == component).map(|(idx, _)| idx).collect();
			let mut group: Vec<Action> = slots.iter().map(|&idx| self.actions[idx].clone()).collect();
			group.sort_by_key(|a| a.kind.rank());
			for (slot, action) in slots.into_iter().zip(group) {
				actions[slot] = action;
			}
		}
		Self { actions }
	}

	/// Invocations rendered as command-line tokens (`project: pack git: tag`).
	pub fn to_cmd_line_run(&self) -> String {
		let mut tokens: Vec<String> = Vec::new();
		let mut current: Option<ComponentKey> = None;
		for action in self.sorted().actions.iter().filter(|a| a.kind == ActionKind::InvokeOperation) {
			if current != Some(action.component) {
				tokens.push(format!("{}:", action.component));
				current = Some(action.component);
			}
			tokens.push(action.member().to_string());
		}
		tokens.join(" ")
	}

	/// Table of the sorted log: component, member and source columns.
	///
	/// Sensitive values are masked. Null assignments only appear when `verbose`.
	pub fn to_column_text(&self, verbose: bool) -> ColumnText {
		let mut text = ColumnText::new().column(1, 30).column(1, 50).column(1, 16);
		for action in self.sorted().actions {
			if action.kind == ActionKind::SetAttribute && action.value.is_none() && !verbose {
				continue;
			}
			let member = match action.kind {
				ActionKind::Instantiate => String::from("init"),
				ActionKind::InvokeOperation => format!("{}()", action.member()),
				ActionKind::SetAttribute => {
					let value = match action.value.as_deref() {
						Some(_) if is_sensitive_key(action.member()) => MASK,
						Some(value) => value,
						None => "null",
					};
					format!("{}={value}", action.member())
				}
			};
			text.add_row([action.component.type_name().to_string(), member, action.source.to_string()]);
		}
		text
	}
}

impl Extend<Action> for ActionLog {
	fn extend<I: IntoIterator<Item = Action>>(&mut self, iter: I) {
		self.add_all(iter);
	}
}

impl FromIterator<Action> for ActionLog {
	fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
		let mut log = Self::new();
		log.add_all(iter);
		log
	}
}

impl<'a> IntoIterator for &'a ActionLog {
	type Item = &'a Action;
	type IntoIter = std::slice::Iter<'a, Action>;

	fn into_iter(self) -> Self::IntoIter {
		self.actions.iter()
	}
}
