//! Route table and route arbitration.
//!
//! # Role
//!
//! [`RouteTable`] keeps routes and screen ids in a bijection. [`RouteArbiter`] decides
//! whether a newly declared route may take a path from its current owner.
//!
//! # Invariants
//!
//! - At most one id per route and at most one route per id.
//! - A route owned by a protected login or main id only moves to the configured
//!   login or main screen id. Any other claimant is skipped.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::RegistryConfig;
use crate::entry::RouteInfo;

/// Bijective route <-> id map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
	by_route: FxHashMap<String, Arc<str>>,
	by_id: FxHashMap<Arc<str>, RouteInfo>,
}

impl RouteTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// The id owning `route`.
	pub fn owner(&self, route: &str) -> Option<&Arc<str>> {
		self.by_route.get(route)
	}

	/// The route owned by `id`.
	pub fn route_of(&self, id: &str) -> Option<&RouteInfo> {
		self.by_id.get(id)
	}

	pub fn len(&self) -> usize {
		self.by_route.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_route.is_empty()
	}

	/// Iterates `(route, id)` pairs in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.by_route.iter().map(|(route, id)| (route.as_str(), &**id))
	}

	/// Removes the route owned by `id`, returning it.
	pub fn remove_id(&mut self, id: &str) -> Option<RouteInfo> {
		let info = self.by_id.remove(id)?;
		if self.by_route.get(&info.path).is_some_and(|owner| &**owner == id) {
			self.by_route.remove(&info.path);
		}
		Some(info)
	}

	/// Installs `route` for `id`, evicting any previous mappings on either side.
	fn install(&mut self, id: Arc<str>, route: RouteInfo) {
		self.remove_id(&id);
		if let Some(previous) = self.by_route.insert(route.path.clone(), id.clone()) {
			self.by_id.remove(&previous);
		}
		self.by_id.insert(id, route);
	}
}

/// Outcome of a route registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
	/// The route was free or already owned by the same id.
	Installed,
	/// The route was taken from `previous`, which no longer has a route.
	Overrode { previous: Arc<str> },
	/// The route stays with its protected `owner`; the registration was dropped.
	Skipped { owner: Arc<str> },
}

/// Applies route registrations under the login/main protection rules.
#[derive(Debug, Clone, Copy)]
pub struct RouteArbiter<'a> {
	config: &'a RegistryConfig,
}

impl<'a> RouteArbiter<'a> {
	pub fn new(config: &'a RegistryConfig) -> Self {
		Self { config }
	}

	/// Registers `route` for `id`.
	pub fn register(&self, table: &mut RouteTable, id: &Arc<str>, route: RouteInfo) -> RouteDecision {
		let decision = match table.owner(&route.path) {
			Some(owner) if owner != id => {
				let owner = owner.clone();
				if self.is_protected_from(&owner, id) {
					tracing::warn!(
						route = %route.path,
						owner = %owner,
						id = %id,
						"route of protected screen kept, registration skipped"
					);
					return RouteDecision::Skipped { owner };
				}
				tracing::debug!(route = %route.path, previous = %owner, id = %id, "route overridden");
				RouteDecision::Overrode { previous: owner }
			}
			_ => RouteDecision::Installed,
		};

		table.install(id.clone(), route);
		decision
	}

	/// True if `owner` is a protected login/main id that `claimant` may not displace.
	fn is_protected_from(&self, owner: &str, claimant: &str) -> bool {
		if self.config.is_login_alias(owner) {
			return claimant != self.config.login_screen_id;
		}
		if self.config.is_main_alias(owner) {
			return claimant != self.config.main_screen_id;
		}
		false
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	fn id(s: &str) -> Arc<str> {
		Arc::from(s)
	}

	#[test]
	fn later_claimant_takes_the_route() {
		let config = RegistryConfig::default();
		let arbiter = RouteArbiter::new(&config);
		let mut table = RouteTable::new();

		assert_eq!(arbiter.register(&mut table, &id("a"), RouteInfo::new("/a")), RouteDecision::Installed);
		assert_eq!(
			arbiter.register(&mut table, &id("b"), RouteInfo::new("/a")),
			RouteDecision::Overrode { previous: id("a") }
		);
		assert_eq!(table.owner("/a").map(|o| &**o), Some("b"));
		assert_eq!(table.route_of("a"), None);
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn moving_a_route_drops_the_stale_one() {
		let config = RegistryConfig::default();
		let arbiter = RouteArbiter::new(&config);
		let mut table = RouteTable::new();

		arbiter.register(&mut table, &id("a"), RouteInfo::new("/old"));
		assert_eq!(arbiter.register(&mut table, &id("a"), RouteInfo::new("/new")), RouteDecision::Installed);
		assert_eq!(table.owner("/old"), None);
		assert_eq!(table.route_of("a").map(|r| r.path.as_str()), Some("/new"));
		assert_eq!(table.iter().collect::<Vec<_>>(), vec![("/new", "a")]);
	}

	#[rstest]
	#[case::legacy_login_alias("login", "legacyLogin", false)]
	#[case::configured_login("login", "appLogin", true)]
	#[case::legacy_main_alias("mainWindow", "oldMain", false)]
	#[case::configured_main("mainWindow", "appMain", true)]
	#[case::unprotected_owner("orders", "legacyLogin", true)]
	fn protected_owners(#[case] owner: &str, #[case] claimant: &str, #[case] takes_route: bool) {
		let config = RegistryConfig {
			login_screen_id: "appLogin".to_string(),
			main_screen_id: "appMain".to_string(),
			..RegistryConfig::default()
		};
		let arbiter = RouteArbiter::new(&config);
		let mut table = RouteTable::new();
		arbiter.register(&mut table, &id(owner), RouteInfo::new("/entry"));

		let decision = arbiter.register(&mut table, &id(claimant), RouteInfo::new("/entry"));
		let expected_owner = if takes_route { claimant } else { owner };

		assert_eq!(table.owner("/entry").map(|o| &**o), Some(expected_owner));
		assert_eq!(matches!(decision, RouteDecision::Skipped { .. }), !takes_route);
		assert_eq!(table.route_of(owner).is_some(), !takes_route);
	}

	#[test]
	fn skipped_claimant_keeps_its_previous_route() {
		let config = RegistryConfig::default();
		let arbiter = RouteArbiter::new(&config);
		let mut table = RouteTable::new();

		arbiter.register(&mut table, &id("login"), RouteInfo::new("/login"));
		arbiter.register(&mut table, &id("myLogin"), RouteInfo::new("/my-login"));
		let decision = arbiter.register(&mut table, &id("myLogin"), RouteInfo::new("/login"));

		assert_eq!(decision, RouteDecision::Skipped { owner: id("login") });
		assert_eq!(table.route_of("myLogin").map(|r| r.path.as_str()), Some("/my-login"));
	}
}
