//! Text conversions for terminal attribute values.

use std::path::PathBuf;

/// A type assignable from configuration text.
pub trait AttributeValue: Sized + Default {
	fn parse_attr(raw: &str) -> Result<Self, String>;

	fn render_attr(&self) -> Option<String>;

	/// Parses `raw`, or yields the type default for a null assignment.
	fn from_raw(raw: Option<&str>) -> Result<Self, String> {
		raw.map(Self::parse_attr).transpose().map(Option::unwrap_or_default)
	}
}

/// Parse a boolean value from common string representations.
///
/// An empty string counts as `true`, so a bare flag switches the attribute on.
pub fn parse_bool(value: &str) -> Result<bool, String> {
	match value.to_lowercase().as_str() {
		"" | "true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		_ => Err(format!("invalid boolean: '{value}' (expected true/false, yes/no, on/off, 1/0)")),
	}
}

impl AttributeValue for String {
	fn parse_attr(raw: &str) -> Result<Self, String> {
		Ok(raw.to_string())
	}

	fn render_attr(&self) -> Option<String> {
		Some(self.clone())
	}
}

impl AttributeValue for bool {
	fn parse_attr(raw: &str) -> Result<Self, String> {
		parse_bool(raw)
	}

	fn render_attr(&self) -> Option<String> {
		Some(self.to_string())
	}
}

impl AttributeValue for PathBuf {
	fn parse_attr(raw: &str) -> Result<Self, String> {
		Ok(PathBuf::from(raw))
	}

	fn render_attr(&self) -> Option<String> {
		Some(self.display().to_string())
	}
}

macro_rules! numeric_attribute_value {
	($($ty:ty),*) => {
		$(
			impl AttributeValue for $ty {
				fn parse_attr(raw: &str) -> Result<Self, String> {
					raw.trim()
						.parse::<$ty>()
						.map_err(|e| format!("invalid {}: '{raw}' ({e})", stringify!($ty)))
				}

				fn render_attr(&self) -> Option<String> {
					Some(self.to_string())
				}
			}
		)*
	};
}

numeric_attribute_value!(i32, i64, u16, u32, u64, usize, f64);

impl<T: AttributeValue> AttributeValue for Option<T> {
	fn parse_attr(raw: &str) -> Result<Self, String> {
		T::parse_attr(raw).map(Some)
	}

	fn render_attr(&self) -> Option<String> {
		self.as_ref().and_then(T::render_attr)
	}
}

/// Comma-separated list; blank items are dropped.
impl AttributeValue for Vec<String> {
	fn parse_attr(raw: &str) -> Result<Self, String> {
		Ok(raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
	}

	fn render_attr(&self) -> Option<String> {
		Some(self.join(","))
	}
}
