//! Declarations registered at runtime by hot loads.

use parking_lot::RwLock;

use super::{Declaration, DeclarationBatch, ScreenSource};
use crate::controller::ControllerDef;
use crate::error::Result;
use crate::metadata::MetadataReader;

/// Controllers loaded after startup. Always registered after every other source.
#[derive(Debug, Default)]
pub struct DynamicSource {
	loaded: RwLock<Vec<&'static ControllerDef>>,
}

impl DynamicSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a controller. A later load declaring the same screen id replaces the earlier one.
	pub fn push(&self, def: &'static ControllerDef) {
		let id = Declaration::from_controller(def).id;
		let mut loaded = self.loaded.write();
		loaded.retain(|existing| Declaration::from_controller(existing).id != id);
		loaded.push(def);
	}

	pub fn len(&self) -> usize {
		self.loaded.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl ScreenSource for DynamicSource {
	fn name(&self) -> &str {
		"dynamic"
	}

	fn collect(&self, _meta: &dyn MetadataReader) -> Result<Vec<DeclarationBatch>> {
		let loaded = self.loaded.read();
		if loaded.is_empty() {
			return Ok(Vec::new());
		}
		let mut batch = DeclarationBatch::new("dynamic");
		for def in loaded.iter() {
			batch.push(Declaration::from_controller(def));
		}
		Ok(vec![batch])
	}
}
