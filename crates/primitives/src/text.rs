use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Replacement shown instead of sensitive values.
pub const MASK: &str = "***";

const SENSITIVE_SUFFIXES: [&str; 4] = ["password", "secret", "token", "pwd"];

/// Whether a property or attribute name designates a credential.
///
/// Matches case-insensitively on the last dotted segment's suffix, so
/// `repo.publish.password`, `apiToken` and `db.PWD` all qualify.
pub fn is_sensitive_key(name: &str) -> bool {
	let lower = name.to_ascii_lowercase();
	SENSITIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Returns `value`, or [`MASK`] when `name` is sensitive.
pub fn mask_if_sensitive<'a>(name: &str, value: &'a str) -> &'a str {
	if is_sensitive_key(name) { MASK } else { value }
}

#[derive(Debug, Clone, Copy)]
struct Column {
	min: usize,
	max: usize,
}

/// Column-aligned plain text table.
///
/// Each column has a minimum and maximum display width. A column is as wide as its
/// widest cell within those bounds; longer cells wrap onto continuation lines,
/// breaking on whitespace when possible.
#[derive(Debug, Clone)]
pub struct ColumnText {
	columns: Vec<Column>,
	rows: Vec<Vec<String>>,
	separator: String,
	margin: usize,
}

impl Default for ColumnText {
	fn default() -> Self {
		Self { columns: Vec::new(), rows: Vec::new(), separator: String::from("  "), margin: 0 }
	}
}

impl ColumnText {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn column(mut self, min: usize, max: usize) -> Self {
		self.columns.push(Column { min, max: max.max(min).max(1) });
		self
	}

	pub fn separator(mut self, separator: impl Into<String>) -> Self {
		self.separator = separator.into();
		self
	}

	/// Indents every rendered line by `margin` spaces.
	pub fn margin(mut self, margin: usize) -> Self {
		self.margin = margin;
		self
	}

	/// Appends a row. Missing trailing cells render empty; extra cells are ignored.
	pub fn add_row<I, S>(&mut self, cells: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut row: Vec<String> = cells.into_iter().take(self.columns.len()).map(Into::into).collect();
		row.resize(self.columns.len(), String::new());
		self.rows.push(row);
	}

	pub fn row_count(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	fn widths(&self) -> Vec<usize> {
		self.columns
			.iter()
			.enumerate()
			.map(|(idx, col)| {
				let widest = self.rows.iter().map(|row| row[idx].width()).max().unwrap_or(0);
				widest.clamp(col.min, col.max)
			})
			.collect()
	}

	pub fn render(&self) -> String {
		let widths = self.widths();
		let indent = " ".repeat(self.margin);
		let mut out = String::new();

		for row in &self.rows {
			let wrapped: Vec<Vec<String>> = row.iter().zip(&widths).map(|(cell, &w)| wrap(cell, w)).collect();
			let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

			for line_idx in 0..height {
				let mut line = indent.clone();
				for (col_idx, lines) in wrapped.iter().enumerate() {
					if col_idx > 0 {
						line.push_str(&self.separator);
					}
					let text = lines.get(line_idx).map(String::as_str).unwrap_or("");
					line.push_str(text);
					line.push_str(&" ".repeat(widths[col_idx].saturating_sub(text.width())));
				}
				out.push_str(line.trim_end());
				out.push('\n');
			}
		}
		out
	}
}

fn wrap(text: &str, width: usize) -> Vec<String> {
	let mut lines = Vec::new();
	for paragraph in text.split('\n') {
		let mut current = String::new();
		for word in paragraph.split(' ') {
			let sep = usize::from(!current.is_empty());
			if current.width() + sep + word.width() <= width {
				if sep == 1 {
					current.push(' ');
				}
				current.push_str(word);
				continue;
			}
			if !current.is_empty() {
				lines.push(std::mem::take(&mut current));
			}
			for ch in word.chars() {
				if current.width() + ch.width().unwrap_or(0) > width && !current.is_empty() {
					lines.push(std::mem::take(&mut current));
				}
				current.push(ch);
			}
		}
		lines.push(current);
	}
	lines
}

#[cfg(test)]
mod tests;
