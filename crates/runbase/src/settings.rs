/// Behaviour switches shared by every runbase of an invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
	/// Downgrade component init failures to warnings.
	pub force_mode: bool,
	/// Log activation order, initializer contributions and effective actions.
	pub inspect: bool,
	/// Show null assignments in action tables.
	pub verbose: bool,
	/// Run registered clean actions before the first operation.
	pub clean: bool,
}
