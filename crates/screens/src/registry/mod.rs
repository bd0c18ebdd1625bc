//! The screen registry facade.
//!
//! # Role
//!
//! [`ScreenRegistry`] is constructed once by the application and shared by handle.
//! Every read goes through the lazy snapshot, so the first read builds the registry
//! and later reads are lock-free until [`ScreenRegistry::reset`] or
//! [`ScreenRegistry::load_dynamic`] invalidates it.
//!
//! Sources are registered in this order, later ones overriding earlier ones:
//!
//! 1. controllers declaring a screen (filtered by `controller-namespaces`),
//! 2. configured screen documents, in module order,
//! 3. sources added with [`ScreenRegistryBuilder::source`],
//! 4. controllers hot-loaded with [`ScreenRegistry::load_dynamic`].
//!
//! # Invariants
//!
//! - Reads return owned values or `Arc`s of immutable data, never a view into state
//!   that a rebuild could change.
//! - A rebuild always starts from every source; nothing from the previous snapshot is
//!   carried over.

use std::sync::Arc;

use crate::build::RegistryBuilder;
use crate::config::RegistryConfig;
use crate::controller::{ControllerCatalog, ControllerDef};
use crate::entity::{EntityCatalog, EntityInstance, EntityMetadata, ScreenSuffix};
use crate::entry::{Entry, ResolvedEntry, RouteInfo};
use crate::error::{RegistryError, Result};
use crate::fallback::{FallbackChain, substitute_original};
use crate::lazy::LazySnapshot;
use crate::metadata::{CatalogMetadata, FsResources, MetadataReader, ResourceLoader};
use crate::resolve::EntryResolver;
use crate::snapshot::{BuildReport, Snapshot};
use crate::source::{ControllerSource, DocumentSource, DynamicSource, ScreenSource};

/// Resolves screen ids, routes and entity conventions to registered screens.
pub struct ScreenRegistry {
	config: RegistryConfig,
	meta: CatalogMetadata,
	entities: Arc<dyn EntityMetadata>,
	/// Every source in registration order; `dynamic` is the last one.
	sources: Vec<Arc<dyn ScreenSource>>,
	dynamic: Arc<DynamicSource>,
	fallback: FallbackChain,
	state: LazySnapshot<Snapshot>,
}

impl ScreenRegistry {
	pub fn builder() -> ScreenRegistryBuilder {
		ScreenRegistryBuilder::default()
	}

	/// The current snapshot, building it if needed.
	pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
		self.state.get_or_build(|generation| {
			RegistryBuilder::new(&self.meta, &*self.entities, &self.config).build(&self.sources, generation)
		})
	}

	/// Builds the registry now, surfacing configuration errors.
	pub fn initialize(&self) -> Result<()> {
		self.snapshot().map(|_| ())
	}

	/// The entry registered under `id`.
	///
	/// An id naming an extended entity type (`ExtOrder.edit`) that is not registered
	/// itself is retried once with the original type (`Order.edit`).
	pub fn find_by_id(&self, id: &str) -> Result<Option<Entry>> {
		let snapshot = self.snapshot()?;
		Ok(find_in(&snapshot, &*self.entities, id).cloned())
	}

	/// Like [`find_by_id`](Self::find_by_id), failing with [`RegistryError::NotFound`].
	pub fn get_by_id(&self, id: &str) -> Result<Entry> {
		self.find_by_id(id)?
			.ok_or_else(|| RegistryError::NotFound { id: id.to_string() })
	}

	/// The entry owning `route`.
	pub fn find_by_route(&self, route: &str) -> Result<Option<Entry>> {
		Ok(self.snapshot()?.by_route(route).cloned())
	}

	/// The route path owned by `id`.
	pub fn find_route_by_id(&self, id: &str) -> Result<Option<String>> {
		Ok(self.snapshot()?.route_of(id).map(|route| route.path.clone()))
	}

	/// The full route owned by `id`.
	pub fn route_info(&self, id: &str) -> Result<Option<RouteInfo>> {
		Ok(self.snapshot()?.route_of(id).cloned())
	}

	pub fn exists(&self, id: &str) -> Result<bool> {
		Ok(self.find_by_id(id)?.is_some())
	}

	/// Every entry, in registration order.
	pub fn all(&self) -> Result<Vec<Entry>> {
		Ok(self.snapshot()?.all())
	}

	/// Resolves `id` afresh, bypassing the per-build cache.
	pub fn resolve(&self, id: &str) -> Result<ResolvedEntry> {
		let entry = self.get_by_id(id)?;
		EntryResolver::new(&self.meta).resolve(&entry)
	}

	/// Resolves `id`, caching the result until the next rebuild.
	pub fn resolved(&self, id: &str) -> Result<Arc<ResolvedEntry>> {
		let snapshot = self.snapshot()?;
		let entry = find_in(&snapshot, &*self.entities, id).ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
		let slot = snapshot
			.slot(entry.id())
			.ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
		slot.resolved_with(|entry| EntryResolver::new(&self.meta).resolve(entry))
	}

	/// Browser screen id of an entity type.
	pub fn browse_id(&self, entity: &str) -> Result<String> {
		self.entity_screen_id(entity, ScreenSuffix::Browse)
	}

	/// Lookup screen id of an entity type, falling back to its browser.
	pub fn lookup_id(&self, entity: &str) -> Result<String> {
		self.entity_screen_id(entity, ScreenSuffix::Lookup)
	}

	/// Editor screen id of an entity type.
	pub fn editor_id(&self, entity: &str) -> Result<String> {
		self.entity_screen_id(entity, ScreenSuffix::Edit)
	}

	/// Editor entry for an entity instance.
	pub fn editor_entry_for<E: EntityInstance + ?Sized>(&self, instance: &E) -> Result<Entry> {
		let id = self.editor_id(instance.entity_type())?;
		self.get_by_id(&id)
	}

	/// Lookup entry for an entity type.
	pub fn lookup_entry_for(&self, entity: &str) -> Result<Entry> {
		let id = self.lookup_id(entity)?;
		self.get_by_id(&id)
	}

	fn entity_screen_id(&self, entity: &str, suffix: ScreenSuffix) -> Result<String> {
		let snapshot = self.snapshot()?;
		Ok(self.fallback.screen_id(&snapshot, &*self.entities, entity, suffix))
	}

	/// Registers a controller loaded at runtime and invalidates the registry.
	///
	/// The controller's parent chain must already be known. Its screen id, or its name
	/// when it declares none, overrides any earlier registration.
	pub fn load_dynamic(&self, def: &'static ControllerDef) -> Result<()> {
		let kind = self.meta.catalog().classify_def(def)?;
		self.state.invalidate_with(|| {
			self.meta.catalog().load(def);
			self.dynamic.push(def);
		});
		tracing::info!(controller = def.name, ?kind, "controller loaded dynamically");
		Ok(())
	}

	/// Discards the current snapshot. The next read rebuilds from every source.
	pub fn reset(&self) {
		self.state.invalidate();
		tracing::info!(generation = self.state.generation(), "screen registry reset");
	}

	/// Diagnostics of the current build.
	pub fn report(&self) -> Result<Arc<BuildReport>> {
		Ok(self.snapshot()?.report().clone())
	}

	/// Number of invalidations so far.
	pub fn generation(&self) -> u64 {
		self.state.generation()
	}

	/// Number of builds run so far.
	pub fn builds(&self) -> u64 {
		self.state.builds()
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.config
	}

	pub fn metadata(&self) -> &dyn MetadataReader {
		&self.meta
	}

	pub fn catalog(&self) -> &Arc<ControllerCatalog> {
		self.meta.catalog()
	}

	pub fn entities(&self) -> &Arc<dyn EntityMetadata> {
		&self.entities
	}
}

impl std::fmt::Debug for ScreenRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ScreenRegistry")
			.field("sources", &self.sources.iter().map(|s| s.name().to_string()).collect::<Vec<_>>())
			.field("state", &self.state)
			.finish_non_exhaustive()
	}
}

fn find_in<'s>(snapshot: &'s Snapshot, entities: &dyn EntityMetadata, id: &str) -> Option<&'s Entry> {
	if let Some(entry) = snapshot.get(id) {
		return Some(entry);
	}
	let substituted = substitute_original(entities, id)?;
	let entry = snapshot.get(&substituted)?;
	tracing::debug!(id, substituted = %substituted, "screen found through original entity type");
	Some(entry)
}

/// Assembles a [`ScreenRegistry`].
pub struct ScreenRegistryBuilder {
	config: RegistryConfig,
	catalog: Option<Arc<ControllerCatalog>>,
	resources: Option<Arc<dyn ResourceLoader>>,
	entities: Option<Arc<dyn EntityMetadata>>,
	scan_controllers: bool,
	extra: Vec<Arc<dyn ScreenSource>>,
}

impl Default for ScreenRegistryBuilder {
	fn default() -> Self {
		Self {
			config: RegistryConfig::default(),
			catalog: None,
			resources: None,
			entities: None,
			scan_controllers: true,
			extra: Vec::new(),
		}
	}
}

impl ScreenRegistryBuilder {
	pub fn config(mut self, config: RegistryConfig) -> Self {
		self.config = config;
		self
	}

	/// Controller catalog. Defaults to every controller submitted with [`controller!`](crate::controller!).
	pub fn catalog(mut self, catalog: Arc<ControllerCatalog>) -> Self {
		self.catalog = Some(catalog);
		self
	}

	/// Loader for templates and documents. Defaults to the working directory.
	pub fn resources(mut self, resources: Arc<dyn ResourceLoader>) -> Self {
		self.resources = Some(resources);
		self
	}

	/// Entity model. Defaults to an empty [`EntityCatalog`].
	pub fn entities(mut self, entities: Arc<dyn EntityMetadata>) -> Self {
		self.entities = Some(entities);
		self
	}

	/// Skips class-based declarations; only documents and extra sources are used.
	pub fn without_controller_scan(mut self) -> Self {
		self.scan_controllers = false;
		self
	}

	/// Adds a source after the configured documents.
	pub fn source(mut self, source: Arc<dyn ScreenSource>) -> Self {
		self.extra.push(source);
		self
	}

	pub fn build(self) -> ScreenRegistry {
		let catalog = self.catalog.unwrap_or_else(|| Arc::new(ControllerCatalog::from_inventory()));
		let resources = self.resources.unwrap_or_else(|| Arc::new(FsResources::new(".")));
		let entities = self.entities.unwrap_or_else(|| Arc::new(EntityCatalog::new()));
		let dynamic = Arc::new(DynamicSource::new());

		let mut sources: Vec<Arc<dyn ScreenSource>> = Vec::new();
		if self.scan_controllers {
			sources.push(Arc::new(ControllerSource::with_namespaces(
				self.config.controller_namespaces.clone(),
			)));
		}
		for document in &self.config.documents {
			sources.push(Arc::new(DocumentSource::new(document.clone())));
		}
		sources.extend(self.extra);
		sources.push(dynamic.clone());

		ScreenRegistry {
			config: self.config,
			meta: CatalogMetadata::new(catalog, resources),
			entities,
			sources,
			dynamic,
			fallback: FallbackChain::default(),
			state: LazySnapshot::new(),
		}
	}
}

#[cfg(test)]
mod tests;
