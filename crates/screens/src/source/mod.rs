//! Screen definition sources.
//!
//! # Role
//!
//! A source turns one kind of declaration (controller markers, KDL documents, runtime
//! hot loads) into [`DeclarationBatch`]es. The registry builder consumes sources in
//! order; a later source overrides ids declared by an earlier one.
//!
//! # Invariants
//!
//! - A batch is the unit of duplicate detection: one id declared twice with different
//!   controllers inside a batch is a configuration error. Across batches the later
//!   declaration wins.
//! - Batches are returned in the order their declarations must be registered.

mod controllers;
mod document;
mod dynamic;

pub use controllers::ControllerSource;
pub use document::DocumentSource;
pub use dynamic::DynamicSource;

use crate::controller::ControllerDef;
use crate::entry::{Origin, RouteInfo};
use crate::error::Result;
use crate::metadata::MetadataReader;

/// One declared screen, before registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
	pub id: String,
	pub origin: Origin,
	pub route: Option<RouteInfo>,
}

impl Declaration {
	pub fn new(id: impl Into<String>, origin: Origin) -> Self {
		Self {
			id: id.into(),
			origin,
			route: None,
		}
	}

	pub fn with_route(mut self, route: RouteInfo) -> Self {
		self.route = Some(route);
		self
	}

	/// Declaration made by a controller's own markers. The id defaults to the
	/// controller name when the controller declares no screen.
	pub fn from_controller(def: &ControllerDef) -> Self {
		let route = def.screen.and_then(|decl| {
			decl.route.map(|path| RouteInfo {
				path: path.to_string(),
				parent_prefix: decl.route_parent_prefix.map(str::to_string),
				root: decl.root_route,
			})
		});
		Self {
			id: def.screen_id().unwrap_or(def.name).to_string(),
			origin: Origin::controller(def.name),
			route,
		}
	}
}

/// Declarations sharing one duplicate-detection scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBatch {
	/// Where the declarations came from, e.g. a document path.
	pub label: String,
	pub declarations: Vec<Declaration>,
}

impl DeclarationBatch {
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			declarations: Vec::new(),
		}
	}

	pub fn push(&mut self, declaration: Declaration) {
		self.declarations.push(declaration);
	}

	pub fn len(&self) -> usize {
		self.declarations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.declarations.is_empty()
	}
}

/// A provider of screen declarations.
pub trait ScreenSource: Send + Sync {
	/// Name used in logs.
	fn name(&self) -> &str;

	/// Collects this source's declarations, in registration order.
	fn collect(&self, meta: &dyn MetadataReader) -> Result<Vec<DeclarationBatch>>;
}
