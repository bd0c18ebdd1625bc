//! Metadata reader: controller definitions, templates and screen documents.
//!
//! # Role
//!
//! Resolution and document sources never touch the filesystem or the controller
//! catalog directly. They go through [`MetadataReader`], which answers three kinds of
//! questions: what a controller declares, what kind of controller it is, and what a
//! template or document resource contains.
//!
//! Templates are KDL documents whose first node is the root element:
//!
//! ```kdl
//! window class="app.order.OrderEdit" caption="Order" {
//!     layout expand="lines"
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kdl::{KdlDocument, KdlNode, KdlValue};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::controller::{ControllerCatalog, ControllerDef};
use crate::entry::ScreenKind;
use crate::error::{RegistryError, ResourceError, Result};

/// A parsed element: node name, string attributes and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
	pub name: String,
	pub attributes: BTreeMap<String, String>,
	pub children: Vec<Descriptor>,
}

impl Descriptor {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// Adds an attribute, replacing any previous value.
	pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}

	/// Returns an attribute value.
	pub fn attr(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).map(String::as_str)
	}

	/// Parses a KDL document and returns its first node as the root element.
	///
	/// Returns `Ok(None)` for a document without nodes.
	pub fn parse_kdl(text: &str) -> std::result::Result<Option<Self>, kdl::KdlError> {
		let doc: KdlDocument = text.parse()?;
		Ok(doc.nodes().first().map(Self::from_node))
	}

	/// Converts a KDL node. Properties become attributes; positional arguments are ignored.
	pub fn from_node(node: &KdlNode) -> Self {
		let attributes = node
			.entries()
			.iter()
			.filter_map(|e| Some((e.name()?.value().to_string(), value_text(e.value())?)))
			.collect();
		let children = node
			.children()
			.map(|doc| doc.nodes().iter().map(Self::from_node).collect())
			.unwrap_or_default();

		Self {
			name: node.name().value().to_string(),
			attributes,
			children,
		}
	}
}

fn value_text(value: &KdlValue) -> Option<String> {
	if let Some(s) = value.as_string() {
		Some(s.to_string())
	} else if let Some(i) = value.as_integer() {
		Some(i.to_string())
	} else if let Some(b) = value.as_bool() {
		Some(b.to_string())
	} else {
		value.as_float().map(|f| f.to_string())
	}
}

/// Source of raw resource text, addressed by slash-separated paths.
pub trait ResourceLoader: Send + Sync {
	fn load(&self, path: &str) -> std::result::Result<String, ResourceError>;
}

/// Resources read from a directory. A leading `/` in a path is relative to the root.
#[derive(Debug, Clone)]
pub struct FsResources {
	root: PathBuf,
}

impl FsResources {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn resolve(&self, path: &str) -> PathBuf {
		self.root.join(path.trim_start_matches('/'))
	}
}

impl ResourceLoader for FsResources {
	fn load(&self, path: &str) -> std::result::Result<String, ResourceError> {
		let full = self.resolve(path);
		std::fs::read_to_string(&full).map_err(|error| ResourceError::Io { path: full, error })
	}
}

/// In-memory resources, keyed by path without a leading `/`.
#[derive(Debug, Default)]
pub struct MemoryResources {
	files: RwLock<FxHashMap<String, String>>,
}

impl MemoryResources {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a resource.
	pub fn insert(&self, path: impl AsRef<str>, text: impl Into<String>) -> &Self {
		let key = path.as_ref().trim_start_matches('/').to_string();
		self.files.write().insert(key, text.into());
		self
	}
}

impl ResourceLoader for MemoryResources {
	fn load(&self, path: &str) -> std::result::Result<String, ResourceError> {
		self.files
			.read()
			.get(path.trim_start_matches('/'))
			.cloned()
			.ok_or_else(|| ResourceError::Missing { path: path.to_string() })
	}
}

/// Questions the registry asks about controllers and resources.
pub trait MetadataReader: Send + Sync {
	/// Returns the definition of a controller.
	fn controller(&self, name: &str) -> Result<&'static ControllerDef>;

	/// Controllers registered before startup, sorted by name. Hot-loaded ones are excluded.
	fn controllers(&self) -> Vec<&'static ControllerDef>;

	/// Classifies a controller as screen or fragment.
	fn classify(&self, name: &str) -> Result<ScreenKind>;

	/// Loads a template and returns its root element.
	fn template(&self, path: &str) -> Result<Descriptor>;

	/// Loads a screen document as text.
	fn document(&self, path: &str) -> Result<String>;
}

/// [`MetadataReader`] backed by a controller catalog and a resource loader.
#[derive(Clone)]
pub struct CatalogMetadata {
	controllers: Arc<ControllerCatalog>,
	resources: Arc<dyn ResourceLoader>,
}

impl CatalogMetadata {
	pub fn new(controllers: Arc<ControllerCatalog>, resources: Arc<dyn ResourceLoader>) -> Self {
		Self { controllers, resources }
	}

	pub fn catalog(&self) -> &Arc<ControllerCatalog> {
		&self.controllers
	}
}

impl MetadataReader for CatalogMetadata {
	fn controller(&self, name: &str) -> Result<&'static ControllerDef> {
		self.controllers.get(name).ok_or_else(|| RegistryError::UnknownController {
			controller: name.to_string(),
		})
	}

	fn controllers(&self) -> Vec<&'static ControllerDef> {
		self.controllers.scanned()
	}

	fn classify(&self, name: &str) -> Result<ScreenKind> {
		self.controllers.classify(name)
	}

	fn template(&self, path: &str) -> Result<Descriptor> {
		let text = self.document(path)?;
		Descriptor::parse_kdl(&text)
			.map_err(|e| RegistryError::resource(path, e.into()))?
			.ok_or_else(|| RegistryError::resource(path, ResourceError::Empty { path: path.to_string() }))
	}

	fn document(&self, path: &str) -> Result<String> {
		self.resources.load(path).map_err(|e| RegistryError::resource(path, e))
	}
}

impl std::fmt::Debug for CatalogMetadata {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CatalogMetadata").field("controllers", &self.controllers).finish_non_exhaustive()
	}
}
