//! Entity-type screen resolution.
//!
//! # Role
//!
//! Finds the editor, lookup or browser screen of an entity type. A chain of steps is
//! tried in order until one finds a registered screen:
//!
//! 1. [`PrimaryStep`]: a controller marked primary for the entity's original type.
//! 2. [`ConventionStep`]: the conventional id `<entity><suffix>`.
//! 3. [`OriginalTypeStep`]: the conventional id of the original type, for extended entities.
//!
//! [`substitute_original`] is the same substitution applied to a raw screen id.

use std::sync::Arc;

use crate::entity::{EntityMetadata, ScreenKey, ScreenSuffix, original_or_self};
use crate::snapshot::Snapshot;

/// What is being looked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
	pub entity: String,
	/// Original type of `entity`, or `entity` itself.
	pub original: String,
	pub suffix: ScreenSuffix,
}

impl EntityQuery {
	pub fn new(entities: &dyn EntityMetadata, entity: &str, suffix: ScreenSuffix) -> Self {
		Self {
			entity: entity.to_string(),
			original: original_or_self(entities, entity),
			suffix,
		}
	}

	/// The conventional id for the queried entity itself.
	pub fn conventional_id(&self) -> String {
		ScreenKey::new(&self.entity, self.suffix).to_id()
	}
}

/// One step of the fallback chain.
pub trait FallbackStep: Send + Sync {
	fn find(&self, snapshot: &Snapshot, query: &EntityQuery) -> Option<Arc<str>>;
}

/// Screens explicitly marked as primary editor or lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryStep;

impl FallbackStep for PrimaryStep {
	fn find(&self, snapshot: &Snapshot, query: &EntityQuery) -> Option<Arc<str>> {
		let entry = match query.suffix {
			ScreenSuffix::Edit => snapshot.primary_editor(&query.original),
			ScreenSuffix::Lookup => snapshot.primary_lookup(&query.original),
			ScreenSuffix::Browse => None,
		}?;
		Some(entry.id.clone())
	}
}

/// `<entity><suffix>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionStep;

impl FallbackStep for ConventionStep {
	fn find(&self, snapshot: &Snapshot, query: &EntityQuery) -> Option<Arc<str>> {
		registered(snapshot, &query.conventional_id())
	}
}

/// `<original><suffix>` for extended entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalTypeStep;

impl FallbackStep for OriginalTypeStep {
	fn find(&self, snapshot: &Snapshot, query: &EntityQuery) -> Option<Arc<str>> {
		if query.original == query.entity {
			return None;
		}
		registered(snapshot, &ScreenKey::new(&query.original, query.suffix).to_id())
	}
}

fn registered(snapshot: &Snapshot, id: &str) -> Option<Arc<str>> {
	snapshot.get(id).map(|entry| entry.id.clone())
}

/// Ordered fallback steps.
pub struct FallbackChain {
	steps: Vec<Box<dyn FallbackStep>>,
}

impl Default for FallbackChain {
	fn default() -> Self {
		Self::new(vec![Box::new(PrimaryStep), Box::new(ConventionStep), Box::new(OriginalTypeStep)])
	}
}

impl FallbackChain {
	pub fn new(steps: Vec<Box<dyn FallbackStep>>) -> Self {
		Self { steps }
	}

	/// First registered screen any step finds.
	pub fn find(&self, snapshot: &Snapshot, query: &EntityQuery) -> Option<Arc<str>> {
		self.steps.iter().find_map(|step| step.find(snapshot, query))
	}

	/// Screen id for an entity type.
	///
	/// A lookup with no lookup screen falls back to the browser. When nothing is
	/// registered the conventional id is returned, so callers report a useful name.
	pub fn screen_id(
		&self,
		snapshot: &Snapshot,
		entities: &dyn EntityMetadata,
		entity: &str,
		suffix: ScreenSuffix,
	) -> String {
		let query = EntityQuery::new(entities, entity, suffix);
		if let Some(id) = self.find(snapshot, &query) {
			return id.to_string();
		}
		if suffix == ScreenSuffix::Lookup {
			let browse = EntityQuery::new(entities, entity, ScreenSuffix::Browse);
			if let Some(id) = self.find(snapshot, &browse) {
				tracing::debug!(entity, browse = %id, "no lookup screen, using browser");
				return id.to_string();
			}
		}
		query.conventional_id()
	}
}

impl std::fmt::Debug for FallbackChain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FallbackChain").field("steps", &self.steps.len()).finish()
	}
}

/// Rewrites `<extended>.<suffix>` into `<original>.<suffix>`.
///
/// Returns `None` unless the entity segment is a known, extended entity type.
pub fn substitute_original(entities: &dyn EntityMetadata, id: &str) -> Option<String> {
	let key = ScreenKey::parse(id)?;
	if !entities.contains(&key.entity) {
		return None;
	}
	let original = entities.original_of(&key.entity)?;
	Some(key.with_entity(original).to_id())
}
