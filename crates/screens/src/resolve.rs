//! Entry resolution: controller, kind and template from an entry's origin.
//!
//! # Invariants
//!
//! - Resolution is a pure function of the entry and the metadata reader. Resolving the
//!   same entry twice yields equal values. Caching, when wanted, is the caller's job.

use std::sync::Arc;

use crate::controller::ControllerDef;
use crate::entry::{Entry, Origin, ResolvedEntry};
use crate::error::{RegistryError, Result};
use crate::metadata::MetadataReader;

/// Resolves entries against a [`MetadataReader`].
#[derive(Clone, Copy)]
pub struct EntryResolver<'a> {
	meta: &'a dyn MetadataReader,
}

impl<'a> EntryResolver<'a> {
	pub fn new(meta: &'a dyn MetadataReader) -> Self {
		Self { meta }
	}

	/// Determines the controller, kind and template of `entry`.
	///
	/// - A descriptor with a `class` attribute names its controller and has no template.
	/// - A descriptor without one names a template; the template's root element names
	///   the controller.
	/// - A controller reference takes its template from the controller definition.
	pub fn resolve(&self, entry: &Entry) -> Result<ResolvedEntry> {
		let (controller, template) = match &entry.origin {
			Origin::Controller(name) => {
				let def = self.meta.controller(name)?;
				(name.clone(), def.template.map(|t| template_path(def, t)))
			}
			Origin::Descriptor(descriptor) => match descriptor.attr("class") {
				Some(class) => (Arc::from(class), None),
				None => {
					let template = descriptor.attr("template").ok_or_else(|| RegistryError::InvalidDeclaration {
						batch: format!("screen '{}'", entry.id),
						message: "descriptor names neither a class nor a template".to_string(),
					})?;
					let root = self.meta.template(template)?;
					let class = root.attr("class").ok_or_else(|| RegistryError::MissingControllerClass {
						template: template.to_string(),
					})?;
					(Arc::from(class), Some(template.to_string()))
				}
			},
		};

		let kind = self.meta.classify(&controller)?;

		Ok(ResolvedEntry {
			entry: entry.clone(),
			controller,
			kind,
			template,
		})
	}
}

/// Template path of a controller: absolute paths are kept, relative ones are placed
/// under the controller's package.
pub fn template_path(def: &ControllerDef, template: &str) -> String {
	if template.starts_with('/') {
		return template.to_string();
	}
	match def.package_path() {
		Some(package) => format!("/{package}/{template}"),
		None => format!("/{template}"),
	}
}
