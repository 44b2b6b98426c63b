//! Building blocks shared by the anvil crates: numeric-aware multi-value maps,
//! dotted property-name matching and column text rendering.

/// Ordered, string-keyed containers for dynamically-sized configured collections.
pub mod multi_value;
/// Column-aligned text tables and sensitive value masking.
pub mod text;

pub use multi_value::{KEY_PLACEHOLDER, MultiValueKey, MultiValueMap, compare_keys, prop_name_matches, split_head};
pub use text::{ColumnText, MASK, is_sensitive_key, mask_if_sensitive};
