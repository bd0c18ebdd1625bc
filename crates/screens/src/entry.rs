//! Registry entries and their resolved form.

use std::sync::Arc;

use crate::metadata::Descriptor;

/// Whether a controller is a top-level screen or an embeddable fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenKind {
	Screen,
	Fragment,
}

/// Navigation route of a screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteInfo {
	pub path: String,
	/// Prefix of the parent route this route nests under.
	pub parent_prefix: Option<String>,
	/// Root routes are not nested under any parent.
	pub root: bool,
}

impl RouteInfo {
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			parent_prefix: None,
			root: false,
		}
	}

	pub fn with_parent_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.parent_prefix = Some(prefix.into());
		self
	}

	pub fn with_root(mut self, root: bool) -> Self {
		self.root = root;
		self
	}
}

/// Where an entry's controller comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
	/// A controller named directly.
	Controller(Arc<str>),
	/// A declarative element carrying a `class` or a `template` attribute.
	Descriptor(Arc<Descriptor>),
}

impl Origin {
	pub fn controller(name: impl AsRef<str>) -> Self {
		Self::Controller(Arc::from(name.as_ref()))
	}

	pub fn descriptor(descriptor: Descriptor) -> Self {
		Self::Descriptor(Arc::new(descriptor))
	}

	/// Reference used to tell declarations apart: the controller name, else the
	/// descriptor's `class`, else its `template`.
	pub fn reference(&self) -> &str {
		match self {
			Self::Controller(name) => name.as_ref(),
			Self::Descriptor(d) => d.attr("class").or_else(|| d.attr("template")).unwrap_or_default(),
		}
	}
}

/// A registered screen. Immutable; cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
	pub id: Arc<str>,
	pub origin: Origin,
	pub route: Option<RouteInfo>,
}

impl Entry {
	pub fn new(id: impl AsRef<str>, origin: Origin) -> Self {
		Self {
			id: Arc::from(id.as_ref()),
			origin,
			route: None,
		}
	}

	pub fn with_route(mut self, route: Option<RouteInfo>) -> Self {
		self.route = route;
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}
}

/// An entry with its controller, kind and template determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
	pub entry: Entry,
	pub controller: Arc<str>,
	pub kind: ScreenKind,
	pub template: Option<String>,
}

impl ResolvedEntry {
	pub fn id(&self) -> &str {
		self.entry.id()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reference_prefers_class_over_template() {
		let both = Origin::descriptor(
			Descriptor::new("screen")
				.with_attr("class", "app.Edit")
				.with_attr("template", "edit.kdl"),
		);
		let template_only = Origin::descriptor(Descriptor::new("screen").with_attr("template", "edit.kdl"));

		assert_eq!(both.reference(), "app.Edit");
		assert_eq!(template_only.reference(), "edit.kdl");
		assert_eq!(Origin::controller("app.Main").reference(), "app.Main");
		assert_eq!(Origin::descriptor(Descriptor::new("screen")).reference(), "");
	}
}
