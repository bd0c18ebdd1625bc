//! Business-entity metadata consumed by convention lookups.
//!
//! # Role
//!
//! The registry never owns the entity model. It asks [`EntityMetadata`] two questions:
//! whether a name is a known entity type, and which original type an extended type
//! replaces. [`EntityCatalog`] is the in-process implementation.
//!
//! # Invariants
//!
//! - [`EntityMetadata::original_of`] returns `Some` only for extensions, and always
//!   the root of the extension chain.

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

/// Entity model questions asked by the registry.
pub trait EntityMetadata: Send + Sync {
	/// Returns true if `name` is a registered entity type.
	fn contains(&self, name: &str) -> bool;

	/// Returns the original (non-extended) type replaced by `name`, if `name` is an extension.
	fn original_of(&self, name: &str) -> Option<String>;
}

/// Returns the original type of `name`, or `name` itself when it extends nothing.
pub fn original_or_self(meta: &dyn EntityMetadata, name: &str) -> String {
	meta.original_of(name).unwrap_or_else(|| name.to_string())
}

/// A value that knows its entity type, e.g. a loaded business object.
pub trait EntityInstance {
	/// Entity type name of this instance.
	fn entity_type(&self) -> &str;
}

impl EntityInstance for str {
	fn entity_type(&self) -> &str {
		self
	}
}

impl EntityInstance for String {
	fn entity_type(&self) -> &str {
		self
	}
}

/// In-memory entity model with extension tracking.
#[derive(Default)]
pub struct EntityCatalog {
	inner: RwLock<CatalogInner>,
}

#[derive(Default)]
struct CatalogInner {
	known: FxHashSet<String>,
	/// extension -> directly replaced type
	replaces: FxHashMap<String, String>,
}

impl EntityCatalog {
	/// Creates an empty catalog.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an entity type.
	pub fn register(&self, name: impl Into<String>) -> &Self {
		self.inner.write().known.insert(name.into());
		self
	}

	/// Registers `extension` as replacing `original`. Both become known types.
	pub fn extend(&self, original: impl Into<String>, extension: impl Into<String>) -> &Self {
		let original = original.into();
		let extension = extension.into();
		let mut inner = self.inner.write();
		inner.known.insert(original.clone());
		inner.known.insert(extension.clone());
		inner.replaces.insert(extension, original);
		self
	}
}

impl EntityMetadata for EntityCatalog {
	fn contains(&self, name: &str) -> bool {
		self.inner.read().known.contains(name)
	}

	fn original_of(&self, name: &str) -> Option<String> {
		let inner = self.inner.read();
		let mut current = inner.replaces.get(name)?;
		// A chain longer than the map means a loop; stop at whatever we reached.
		for _ in 0..inner.replaces.len() {
			match inner.replaces.get(current.as_str()) {
				Some(next) if next != name => current = next,
				_ => break,
			}
		}
		Some(current.clone())
	}
}

/// Conventional screen id suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenSuffix {
	/// Entity editor, `.edit`.
	Edit,
	/// Entity lookup (picker), `.lookup`.
	Lookup,
	/// Entity browser (list), `.browse`.
	Browse,
}

impl ScreenSuffix {
	/// The suffix text including its leading dot.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Edit => ".edit",
			Self::Lookup => ".lookup",
			Self::Browse => ".browse",
		}
	}
}

impl fmt::Display for ScreenSuffix {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A screen id split into entity type and suffix, e.g. `sales$Order` + `.edit`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScreenKey {
	pub entity: String,
	/// Suffix including its leading dot.
	pub suffix: String,
}

impl ScreenKey {
	/// Builds the key for an entity type and a conventional suffix.
	pub fn new(entity: impl Into<String>, suffix: ScreenSuffix) -> Self {
		Self {
			entity: entity.into(),
			suffix: suffix.as_str().to_string(),
		}
	}

	/// Splits `id` at its first dot. Both halves must be non-empty.
	pub fn parse(id: &str) -> Option<Self> {
		let dot = id.find('.')?;
		let (entity, suffix) = id.split_at(dot);
		if entity.is_empty() || suffix.len() < 2 {
			return None;
		}
		Some(Self {
			entity: entity.to_string(),
			suffix: suffix.to_string(),
		})
	}

	/// Returns the same key with a different entity type.
	pub fn with_entity(&self, entity: impl Into<String>) -> Self {
		Self {
			entity: entity.into(),
			suffix: self.suffix.clone(),
		}
	}

	/// Renders the key back into a screen id.
	pub fn to_id(&self) -> String {
		format!("{}{}", self.entity, self.suffix)
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn original_of_follows_extension_chain() {
		let catalog = EntityCatalog::new();
		catalog.extend("sales$Order", "ext$Order").extend("ext$Order", "ext2$Order");
		catalog.register("sales$Customer");

		assert_eq!(catalog.original_of("ext2$Order").as_deref(), Some("sales$Order"));
		assert_eq!(catalog.original_of("ext$Order").as_deref(), Some("sales$Order"));
		assert_eq!(catalog.original_of("sales$Order"), None);
		assert_eq!(catalog.original_of("sales$Customer"), None);
		assert_eq!(original_or_self(&catalog, "sales$Customer"), "sales$Customer");
		assert!(catalog.contains("ext2$Order"));
		assert!(!catalog.contains("sales$Invoice"));
	}

	#[test]
	fn original_of_terminates_on_loops() {
		let catalog = EntityCatalog::new();
		catalog.extend("A", "B").extend("B", "A");
		assert!(catalog.original_of("A").is_some());
		assert!(catalog.original_of("B").is_some());
	}

	#[rstest]
	#[case("sales$Order.edit", Some(("sales$Order", ".edit")))]
	#[case("ExtOrder.lookup", Some(("ExtOrder", ".lookup")))]
	#[case("Order.edit.custom", Some(("Order", ".edit.custom")))]
	#[case("login", None)]
	#[case(".edit", None)]
	#[case("Order.", None)]
	fn screen_key_parse(#[case] id: &str, #[case] expected: Option<(&str, &str)>) {
		let parsed = ScreenKey::parse(id);
		assert_eq!(
			parsed.as_ref().map(|k| (k.entity.as_str(), k.suffix.as_str())),
			expected
		);
		if let Some(key) = parsed {
			assert_eq!(key.to_id(), id);
		}
	}

	#[test]
	fn screen_key_substitutes_entity() {
		let key = ScreenKey::new("ExtOrder", ScreenSuffix::Edit);
		assert_eq!(key.with_entity("Order").to_id(), "Order.edit");
	}
}
