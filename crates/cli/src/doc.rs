//! Plain-text rendering of component documentation and discovery results.

use anvil_primitives::ColumnText;
use anvil_registry::ComponentDescription;
use anvil_runbase::Runbase;

/// Documentation of one component with its attribute defaults.
pub fn describe(description: &ComponentDescription) -> String {
	let mut out = format!("{} - {}\n", description.key.name(), description.header);
	if !description.detail.is_empty() {
		out.push_str(&description.detail);
		out.push('\n');
	}

	if !description.attributes.is_empty() {
		out.push_str("\nAttributes\n");
		let mut table = ColumnText::new().margin(2).column(8, 32).column(4, 20).column(0, 24).column(10, 60);
		for attribute in &description.attributes {
			let default = attribute.default_value.as_deref().map(|value| format!("default: {value}")).unwrap_or_default();
			let doc = match attribute.binding {
				Some(property) => format!("{} (property '{property}')", attribute.doc),
				None => attribute.doc.to_string(),
			};
			table.add_row([attribute.name.clone(), attribute.value_type.to_string(), default, doc]);
		}
		out.push_str(&table.render());
	}

	if !description.operations.is_empty() {
		out.push_str("\nOperations\n");
		let mut table = ColumnText::new().margin(2).column(8, 32).column(10, 80);
		for operation in &description.operations {
			table.add_row([operation.name, operation.doc]);
		}
		out.push_str(&table.render());
	}
	out
}

/// Components a runbase discovered, flagging local and default ones.
pub fn discovered(runbase: &Runbase) -> ColumnText {
	let discovery = runbase.discovery();
	let mut table = ColumnText::new().column(8, 24).column(5, 16).column(10, 60);
	for &key in discovery.all() {
		let origin = match (discovery.default_component() == Some(key), discovery.local().contains(&key)) {
			(true, _) => "default",
			(false, true) => "local",
			(false, false) => "",
		};
		let header = key.def().description.lines().next().unwrap_or_default();
		table.add_row([key.name(), origin, header]);
	}
	table
}
