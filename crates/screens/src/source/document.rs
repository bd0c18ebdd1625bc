//! Declarations read from KDL screen documents.
//!
//! ```kdl
//! include file="base/screens.kdl"
//!
//! screen id="login" class="app.Login" route="/login" root-route=#true
//! screen id="sales$Order.edit" template="/app/order/order-edit.kdl"
//! screen id="help" class="app.Help" route="help" route-parent-prefix="docs"
//! ```
//!
//! Included documents are registered before the including document, each as its own
//! batch, so a document may override ids declared by its includes. A document reached
//! twice through different includes is registered once.

use kdl::KdlDocument;
use rustc_hash::FxHashSet;

use super::{Declaration, DeclarationBatch, ScreenSource};
use crate::entry::{Origin, RouteInfo};
use crate::error::{RegistryError, Result};
use crate::metadata::{Descriptor, MetadataReader};

/// A root screen document and everything it includes.
#[derive(Debug, Clone)]
pub struct DocumentSource {
	root: String,
}

impl DocumentSource {
	pub fn new(root: impl Into<String>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &str {
		&self.root
	}
}

impl ScreenSource for DocumentSource {
	fn name(&self) -> &str {
		&self.root
	}

	fn collect(&self, meta: &dyn MetadataReader) -> Result<Vec<DeclarationBatch>> {
		let mut walk = Walk {
			meta,
			stack: Vec::new(),
			done: FxHashSet::default(),
			batches: Vec::new(),
		};
		walk.visit(&self.root)?;
		Ok(walk.batches)
	}
}

struct Walk<'a> {
	meta: &'a dyn MetadataReader,
	/// Documents currently being expanded, outermost first.
	stack: Vec<String>,
	done: FxHashSet<String>,
	batches: Vec<DeclarationBatch>,
}

impl Walk<'_> {
	fn visit(&mut self, path: &str) -> Result<()> {
		let key = normalize(path);
		if self.stack.contains(&key) {
			return Err(RegistryError::IncludeCycle { path: path.to_string() });
		}
		if self.done.contains(&key) {
			tracing::debug!(document = path, "document already registered, skipping include");
			return Ok(());
		}

		let text = self.meta.document(path)?;
		let doc: KdlDocument = text.parse().map_err(|e: kdl::KdlError| RegistryError::resource(path, e.into()))?;

		self.stack.push(key.clone());
		for node in doc.nodes().iter().filter(|n| n.name().value() == "include") {
			let file = Descriptor::from_node(node)
				.attr("file")
				.map(str::to_string)
				.ok_or_else(|| invalid(path, "include without a file property"))?;
			self.visit(&file)?;
		}
		self.stack.pop();

		let mut batch = DeclarationBatch::new(path);
		for node in doc.nodes() {
			match node.name().value() {
				"include" => {}
				"screen" => batch.push(declaration(path, Descriptor::from_node(node))?),
				other => tracing::warn!(document = path, node = other, "unknown node in screen document ignored"),
			}
		}
		tracing::debug!(document = path, screens = batch.len(), "screen document read");

		self.done.insert(key);
		self.batches.push(batch);
		Ok(())
	}
}

fn declaration(path: &str, descriptor: Descriptor) -> Result<Declaration> {
	let id = descriptor
		.attr("id")
		.map(str::to_string)
		.ok_or_else(|| invalid(path, "screen without an id"))?;
	if descriptor.attr("class").is_none() && descriptor.attr("template").is_none() {
		return Err(invalid(path, &format!("screen '{id}' names neither a class nor a template")));
	}

	let route = descriptor.attr("route").map(|route| RouteInfo {
		path: route.to_string(),
		parent_prefix: descriptor.attr("route-parent-prefix").map(str::to_string),
		root: descriptor.attr("root-route") == Some("true"),
	});

	let mut declaration = Declaration::new(id, Origin::descriptor(descriptor));
	declaration.route = route;
	Ok(declaration)
}

fn invalid(path: &str, message: &str) -> RegistryError {
	RegistryError::InvalidDeclaration {
		batch: path.to_string(),
		message: message.to_string(),
	}
}

fn normalize(path: &str) -> String {
	path.trim_start_matches('/').to_string()
}
