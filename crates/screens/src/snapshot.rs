//! Published registry state.
//!
//! # Role
//!
//! A [`Snapshot`] is the complete registry as of one build: entries by id, the route
//! table, primary editor/lookup mappings and the build report. It contains no mutation
//! logic; the builder produces a new snapshot instead of editing a published one.
//!
//! # Invariants
//!
//! - Every registered id maps to exactly one entry, the last one registered.
//! - A slot's resolution cache belongs to its snapshot and dies with it.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use rustc_hash::FxHashMap;

use crate::entry::{Entry, ResolvedEntry, RouteInfo};
use crate::error::Result;
use crate::routes::{RouteDecision, RouteTable};

/// An entry plus its lazily filled resolution.
#[derive(Debug)]
pub struct Slot {
	pub entry: Entry,
	resolved: ArcSwapOption<ResolvedEntry>,
}

impl Slot {
	pub(crate) fn new(entry: Entry) -> Self {
		Self {
			entry,
			resolved: ArcSwapOption::empty(),
		}
	}

	/// Returns the cached resolution, computing it with `resolve` on first use.
	///
	/// Concurrent first calls may both compute; the values are equal.
	pub fn resolved_with(&self, resolve: impl FnOnce(&Entry) -> Result<ResolvedEntry>) -> Result<Arc<ResolvedEntry>> {
		if let Some(cached) = self.resolved.load_full() {
			return Ok(cached);
		}
		let resolved = Arc::new(resolve(&self.entry)?);
		self.resolved.store(Some(resolved.clone()));
		Ok(resolved)
	}
}

/// A cross-batch redefinition of an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRecord {
	pub id: Arc<str>,
	/// Controller reference of the replaced entry.
	pub previous: String,
	pub previous_batch: String,
	/// Controller reference of the winning entry.
	pub incoming: String,
	pub incoming_batch: String,
}

/// A route claimed by a second id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
	pub route: String,
	pub incoming: Arc<str>,
	pub decision: RouteDecision,
}

/// Diagnostics collected while building a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
	pub overrides: Vec<OverrideRecord>,
	pub route_conflicts: Vec<RouteConflict>,
}

impl BuildReport {
	pub fn is_clean(&self) -> bool {
		self.overrides.is_empty() && self.route_conflicts.is_empty()
	}
}

/// Immutable registry state produced by one build.
#[derive(Debug)]
pub struct Snapshot {
	pub(crate) generation: u64,
	/// Ids in first-registration order.
	pub(crate) order: Vec<Arc<str>>,
	pub(crate) slots: FxHashMap<Arc<str>, Slot>,
	pub(crate) routes: RouteTable,
	/// Original entity type -> primary editor entry.
	pub(crate) primary_editors: FxHashMap<String, Entry>,
	/// Original entity type -> primary lookup entry.
	pub(crate) primary_lookups: FxHashMap<String, Entry>,
	pub(crate) report: Arc<BuildReport>,
}

impl Snapshot {
	/// Generation this snapshot was built for.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn slot(&self, id: &str) -> Option<&Slot> {
		self.slots.get(id)
	}

	pub fn get(&self, id: &str) -> Option<&Entry> {
		self.slots.get(id).map(|slot| &slot.entry)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.slots.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// All entries, in first-registration order.
	pub fn all(&self) -> Vec<Entry> {
		self.order.iter().filter_map(|id| self.get(id)).cloned().collect()
	}

	pub fn routes(&self) -> &RouteTable {
		&self.routes
	}

	/// The entry owning `route`.
	pub fn by_route(&self, route: &str) -> Option<&Entry> {
		self.routes.owner(route).and_then(|id| self.get(id))
	}

	pub fn route_of(&self, id: &str) -> Option<&RouteInfo> {
		self.routes.route_of(id)
	}

	/// Primary editor for an original entity type.
	pub fn primary_editor(&self, original: &str) -> Option<&Entry> {
		self.primary_editors.get(original)
	}

	/// Primary lookup for an original entity type.
	pub fn primary_lookup(&self, original: &str) -> Option<&Entry> {
		self.primary_lookups.get(original)
	}

	pub fn report(&self) -> &Arc<BuildReport> {
		&self.report
	}
}
