//! Declarations made by controller markers.

use super::{Declaration, DeclarationBatch, ScreenSource};
use crate::config::in_namespaces;
use crate::error::Result;
use crate::metadata::MetadataReader;

/// Every catalog controller that declares a screen, in name order.
#[derive(Debug, Clone, Default)]
pub struct ControllerSource {
	namespaces: Vec<String>,
}

impl ControllerSource {
	/// Scans every controller.
	pub fn new() -> Self {
		Self::default()
	}

	/// Scans only controllers under the given dotted namespaces.
	pub fn with_namespaces(namespaces: Vec<String>) -> Self {
		Self { namespaces }
	}
}

impl ScreenSource for ControllerSource {
	fn name(&self) -> &str {
		"controllers"
	}

	fn collect(&self, meta: &dyn MetadataReader) -> Result<Vec<DeclarationBatch>> {
		let mut batch = DeclarationBatch::new("controllers");
		for def in meta.controllers() {
			if def.screen.is_none() || !in_namespaces(&self.namespaces, def.name) {
				continue;
			}
			batch.push(Declaration::from_controller(def));
		}
		Ok(vec![batch])
	}
}
