//! Registry construction from ordered sources.
//!
//! # Role
//!
//! [`RegistryBuilder`] drains every source in order and registers each declaration
//! into a fresh [`Snapshot`]. It never edits a published snapshot.
//!
//! # Invariants
//!
//! - Registration order is source order, then batch order, then declaration order.
//! - Inside one batch an id declared with two different controller references fails the
//!   build. Across batches the later declaration replaces the earlier one.
//! - A redeclaration without a route keeps the route the id currently owns. A new route
//!   without a parent prefix inherits the previous one.
//! - A published entry's `route` is the one the final route table gives its id.
//! - Primary editor/lookup markers are keyed by the original entity type.
//! - Controllers known at build time must classify as a screen or a fragment.

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::config::RegistryConfig;
use crate::controller::ControllerDef;
use crate::entity::{EntityMetadata, original_or_self};
use crate::entry::{Entry, Origin};
use crate::error::{RegistryError, Result};
use crate::metadata::MetadataReader;
use crate::routes::{RouteArbiter, RouteDecision, RouteTable};
use crate::snapshot::{BuildReport, OverrideRecord, RouteConflict, Slot, Snapshot};
use crate::source::{Declaration, DeclarationBatch, ScreenSource};

/// Builds snapshots from sources.
#[derive(Clone, Copy)]
pub struct RegistryBuilder<'a> {
	meta: &'a dyn MetadataReader,
	entities: &'a dyn EntityMetadata,
	config: &'a RegistryConfig,
}

impl<'a> RegistryBuilder<'a> {
	pub fn new(meta: &'a dyn MetadataReader, entities: &'a dyn EntityMetadata, config: &'a RegistryConfig) -> Self {
		Self { meta, entities, config }
	}

	/// Collects and registers every source, in order.
	pub fn build(&self, sources: &[Arc<dyn ScreenSource>], generation: u64) -> Result<Snapshot> {
		let started = Instant::now();
		let mut state = BuildState::new(self);

		for source in sources {
			let batches = source.collect(self.meta)?;
			tracing::debug!(source = source.name(), batches = batches.len(), "collected screen declarations");
			for batch in batches {
				state.register_batch(batch)?;
			}
		}

		let snapshot = state.finish(generation);
		tracing::info!(
			generation,
			screens = snapshot.len(),
			routes = snapshot.routes.len(),
			overrides = snapshot.report.overrides.len(),
			route_conflicts = snapshot.report.route_conflicts.len(),
			elapsed = ?started.elapsed(),
			"screen registry built"
		);
		Ok(snapshot)
	}

	/// The controller an origin names, if it is known without loading resources.
	fn known_controller(&self, origin: &Origin) -> Option<&'static ControllerDef> {
		let name = match origin {
			Origin::Controller(name) => &**name,
			Origin::Descriptor(descriptor) => descriptor.attr("class")?,
		};
		self.meta.controller(name).ok()
	}
}

struct BuildState<'b, 'a> {
	builder: &'b RegistryBuilder<'a>,
	arbiter: RouteArbiter<'a>,
	order: Vec<Arc<str>>,
	slots: FxHashMap<Arc<str>, Slot>,
	/// Batch that registered each id's current entry.
	owners: FxHashMap<Arc<str>, String>,
	routes: RouteTable,
	primary_editors: FxHashMap<String, Entry>,
	primary_lookups: FxHashMap<String, Entry>,
	report: BuildReport,
}

impl<'b, 'a> BuildState<'b, 'a> {
	fn new(builder: &'b RegistryBuilder<'a>) -> Self {
		Self {
			builder,
			arbiter: RouteArbiter::new(builder.config),
			order: Vec::new(),
			slots: FxHashMap::default(),
			owners: FxHashMap::default(),
			routes: RouteTable::new(),
			primary_editors: FxHashMap::default(),
			primary_lookups: FxHashMap::default(),
			report: BuildReport::default(),
		}
	}

	fn register_batch(&mut self, batch: DeclarationBatch) -> Result<()> {
		let DeclarationBatch { label, declarations } = batch;
		let mut seen: FxHashMap<String, String> = FxHashMap::default();

		for declaration in declarations {
			let reference = declaration.origin.reference().to_string();
			if let Some(existing) = seen.get(&declaration.id).filter(|existing| **existing != reference) {
				return Err(RegistryError::DuplicateId {
					batch: label,
					id: declaration.id,
					existing: existing.clone(),
					incoming: reference,
				});
			}
			seen.insert(declaration.id.clone(), reference);
			self.register(declaration, &label)?;
		}
		Ok(())
	}

	fn register(&mut self, declaration: Declaration, batch: &str) -> Result<()> {
		let Declaration { id, origin, route } = declaration;
		let id: Arc<str> = Arc::from(id);

		let controller = self.builder.known_controller(&origin);
		if let Some(def) = controller {
			self.builder.meta.classify(def.name)?;
		}

		let previous = self.slots.get(&id).map(|slot| &slot.entry);
		match previous {
			Some(previous) => {
				let previous_ref = previous.origin.reference();
				if previous_ref != origin.reference() {
					let previous_batch = self.owners.get(&id).cloned().unwrap_or_default();
					tracing::debug!(
						id = %id,
						previous = previous_ref,
						previous_batch = %previous_batch,
						incoming = origin.reference(),
						incoming_batch = batch,
						"screen overridden"
					);
					self.report.overrides.push(OverrideRecord {
						id: id.clone(),
						previous: previous_ref.to_string(),
						previous_batch,
						incoming: origin.reference().to_string(),
						incoming_batch: batch.to_string(),
					});
				}
			}
			None => self.order.push(id.clone()),
		}

		if let Some(mut route) = route {
			if route.parent_prefix.is_none() {
				route.parent_prefix = self.routes.route_of(&id).and_then(|r| r.parent_prefix.clone());
			}
			let path = route.path.clone();
			let decision = self.arbiter.register(&mut self.routes, &id, route);
			if decision != RouteDecision::Installed {
				self.report.route_conflicts.push(RouteConflict {
					route: path,
					incoming: id.clone(),
					decision,
				});
			}
		}

		let entry = Entry::new(&*id, origin).with_route(self.routes.route_of(&id).cloned());
		tracing::debug!(id = %id, controller = entry.origin.reference(), batch, "screen registered");

		if let Some(def) = controller {
			if let Some(entity) = def.primary_editor {
				let key = original_or_self(self.builder.entities, entity);
				tracing::debug!(id = %id, entity = %key, "primary editor registered");
				self.primary_editors.insert(key, entry.clone());
			}
			if let Some(entity) = def.primary_lookup {
				let key = original_or_self(self.builder.entities, entity);
				tracing::debug!(id = %id, entity = %key, "primary lookup registered");
				self.primary_lookups.insert(key, entry.clone());
			}
		}

		self.owners.insert(id.clone(), batch.to_string());
		self.slots.insert(id, Slot::new(entry));
		Ok(())
	}

	fn finish(mut self, generation: u64) -> Snapshot {
		let routes = &self.routes;
		let entries = self
			.slots
			.values_mut()
			.map(|slot| &mut slot.entry)
			.chain(self.primary_editors.values_mut())
			.chain(self.primary_lookups.values_mut());
		for entry in entries {
			entry.route = routes.route_of(&entry.id).cloned();
		}

		Snapshot {
			generation,
			order: self.order,
			slots: self.slots,
			routes: self.routes,
			primary_editors: self.primary_editors,
			primary_lookups: self.primary_lookups,
			report: Arc::new(self.report),
		}
	}
}

#[cfg(test)]
mod tests;
