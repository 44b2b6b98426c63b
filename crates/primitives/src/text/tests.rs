use pretty_assertions::assert_eq;

use super::*;

#[test]
fn sensitive_suffixes() {
	assert!(is_sensitive_key("repo.publish.password"));
	assert!(is_sensitive_key("apiToken"));
	assert!(is_sensitive_key("db.PWD"));
	assert!(is_sensitive_key("clientSecret"));
	assert!(!is_sensitive_key("version"));
	assert!(!is_sensitive_key("tokenizer"));
}

#[test]
fn mask_only_sensitive_values() {
	assert_eq!(mask_if_sensitive("ossrh.password", "hunter2"), MASK);
	assert_eq!(mask_if_sensitive("version", "1.0"), "1.0");
}

#[test]
fn columns_align_to_widest_cell() {
	let mut table = ColumnText::new().column(1, 20).column(1, 20).column(1, 20);
	table.add_row(["set-attr", "project", "version=1.0"]);
	table.add_row(["init", "git", ""]);

	assert_eq!(table.render(), "set-attr  project  version=1.0\ninit      git\n");
}

#[test]
fn minimum_width_pads_narrow_columns() {
	let mut table = ColumnText::new().column(6, 10).column(1, 10).separator("|");
	table.add_row(["a", "b"]);
	assert_eq!(table.render(), "a     |b\n");
}

#[test]
fn long_cells_wrap_on_whitespace() {
	let mut table = ColumnText::new().column(1, 4).column(1, 9).margin(2);
	table.add_row(["key", "alpha beta gamma"]);

	assert_eq!(table.render(), "  key  alpha\n       beta\n       gamma\n");
}

#[test]
fn overlong_words_are_split() {
	let mut table = ColumnText::new().column(1, 3);
	table.add_row(["abcdefg"]);
	assert_eq!(table.render(), "abc\ndef\ng\n");
}

#[test]
fn missing_cells_render_empty() {
	let mut table = ColumnText::new().column(1, 5).column(1, 5);
	table.add_row(["x"]);
	assert_eq!(table.row_count(), 1);
	assert_eq!(table.render(), "x\n");
}
