//! Controller definitions and their self-registration.
//!
//! # Role
//!
//! A controller type describes itself with a static [`ControllerDef`]: its dotted name,
//! its parent type, and the declarative markers the registry reads (screen id and
//! route, template, primary editor/lookup entity). Definitions are collected at link
//! time through `inventory` via the [`controller!`](crate::controller!) macro, and hot-loaded
//! definitions are loaded into a [`ControllerCatalog`] at runtime.
//!
//! # Invariants
//!
//! - [`ControllerCatalog::scanned`] never yields a definition added through
//!   [`ControllerCatalog::load`]. Hot-loaded screens are declared by the dynamic source only.
//! - Classification walks `extends` until it reaches [`SCREEN_BASE`] or [`FRAGMENT_BASE`].
//!   A chain ending anywhere else is an illegal state, never a default.

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::entry::ScreenKind;
use crate::error::{RegistryError, Result};

/// Root type every screen controller derives from.
pub const SCREEN_BASE: &str = "Screen";

/// Root type every fragment controller derives from.
pub const FRAGMENT_BASE: &str = "Fragment";

/// Screen declaration marker on a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenDecl {
	/// Explicit screen id; the controller name is used when absent.
	pub id: Option<&'static str>,
	pub route: Option<&'static str>,
	pub route_parent_prefix: Option<&'static str>,
	pub root_route: bool,
}

/// Static description of a controller type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerDef {
	/// Dotted name, e.g. `app.order.OrderEdit`.
	pub name: &'static str,
	/// Parent controller name or a builtin base.
	pub extends: &'static str,
	pub screen: Option<ScreenDecl>,
	/// Template path, relative to the controller's package unless it starts with `/`.
	pub template: Option<&'static str>,
	/// Entity type this controller is the primary editor for.
	pub primary_editor: Option<&'static str>,
	/// Entity type this controller is the primary lookup for.
	pub primary_lookup: Option<&'static str>,
}

impl ControllerDef {
	/// Creates a definition with no markers.
	pub const fn new(name: &'static str, extends: &'static str) -> Self {
		Self {
			name,
			extends,
			screen: None,
			template: None,
			primary_editor: None,
			primary_lookup: None,
		}
	}

	/// Declares a screen under `id`.
	pub const fn screen(mut self, id: &'static str) -> Self {
		self.screen = Some(ScreenDecl {
			id: Some(id),
			route: None,
			route_parent_prefix: None,
			root_route: false,
		});
		self
	}

	/// Declares a screen whose id is the controller name.
	pub const fn anonymous_screen(mut self) -> Self {
		self.screen = Some(ScreenDecl {
			id: None,
			route: None,
			route_parent_prefix: None,
			root_route: false,
		});
		self
	}

	/// Sets the route of the declared screen. Has no effect without a screen marker.
	pub const fn route(mut self, path: &'static str) -> Self {
		if let Some(decl) = &mut self.screen {
			decl.route = Some(path);
		}
		self
	}

	/// Sets the route parent prefix of the declared screen.
	pub const fn route_parent_prefix(mut self, prefix: &'static str) -> Self {
		if let Some(decl) = &mut self.screen {
			decl.route_parent_prefix = Some(prefix);
		}
		self
	}

	/// Marks the declared screen's route as a root route.
	pub const fn root_route(mut self) -> Self {
		if let Some(decl) = &mut self.screen {
			decl.root_route = true;
		}
		self
	}

	pub const fn template(mut self, path: &'static str) -> Self {
		self.template = Some(path);
		self
	}

	pub const fn primary_editor(mut self, entity: &'static str) -> Self {
		self.primary_editor = Some(entity);
		self
	}

	pub const fn primary_lookup(mut self, entity: &'static str) -> Self {
		self.primary_lookup = Some(entity);
		self
	}

	/// The screen id this controller declares, if it declares a screen.
	pub fn screen_id(&self) -> Option<&'static str> {
		self.screen.map(|decl| decl.id.unwrap_or(self.name))
	}

	/// Package part of the dotted name as a slash path: `a.b.C` gives `a/b`.
	pub fn package_path(&self) -> Option<String> {
		let (package, _) = self.name.rsplit_once('.')?;
		Some(package.replace('.', "/"))
	}
}

/// Link-time registration entry collected via `inventory`.
pub struct ControllerReg(pub &'static ControllerDef);

inventory::collect!(ControllerReg);

/// Concurrent name -> definition map.
///
/// Seeded from `inventory` at startup and extended by hot loads.
#[derive(Default)]
pub struct ControllerCatalog {
	defs: RwLock<FxHashMap<&'static str, &'static ControllerDef>>,
	loaded: RwLock<FxHashSet<&'static str>>,
}

impl ControllerCatalog {
	/// Creates an empty catalog.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a catalog holding every controller submitted with [`controller!`](crate::controller!).
	pub fn from_inventory() -> Self {
		let catalog = Self::new();
		for reg in inventory::iter::<ControllerReg> {
			catalog.insert(reg.0);
		}
		catalog
	}

	/// Creates a catalog from explicit definitions.
	pub fn with_defs<I: IntoIterator<Item = &'static ControllerDef>>(defs: I) -> Self {
		let catalog = Self::new();
		for def in defs {
			catalog.insert(def);
		}
		catalog
	}

	/// Inserts or replaces a definition by name.
	pub fn insert(&self, def: &'static ControllerDef) {
		let previous = self.defs.write().insert(def.name, def);
		if previous.is_some_and(|previous| !std::ptr::eq(previous, def)) {
			tracing::debug!(controller = def.name, "controller definition replaced");
		}
	}

	/// Inserts a definition loaded at runtime. It stays available to lookups and
	/// classification but is left out of [`scanned`](Self::scanned).
	pub fn load(&self, def: &'static ControllerDef) {
		self.insert(def);
		self.loaded.write().insert(def.name);
	}

	/// Whether `name` was added through [`load`](Self::load).
	pub fn is_loaded(&self, name: &str) -> bool {
		self.loaded.read().contains(name)
	}

	/// Looks up a definition by name.
	pub fn get(&self, name: &str) -> Option<&'static ControllerDef> {
		self.defs.read().get(name).copied()
	}

	/// Returns every definition, sorted by name.
	pub fn all(&self) -> Vec<&'static ControllerDef> {
		let mut defs: Vec<_> = self.defs.read().values().copied().collect();
		defs.sort_by(|a, b| a.name.cmp(b.name));
		defs
	}

	/// Definitions registered before startup, sorted by name.
	pub fn scanned(&self) -> Vec<&'static ControllerDef> {
		let loaded = self.loaded.read();
		let mut defs = self.all();
		defs.retain(|def| !loaded.contains(def.name));
		defs
	}

	pub fn len(&self) -> usize {
		self.defs.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Classifies a controller as screen or fragment by walking its `extends` chain.
	pub fn classify(&self, name: &str) -> Result<ScreenKind> {
		let defs = self.defs.read();
		let mut current = defs.get(name).copied().ok_or_else(|| RegistryError::UnknownController {
			controller: name.to_string(),
		})?;
		let mut seen: FxHashSet<&'static str> = FxHashSet::default();

		loop {
			if !seen.insert(current.name) {
				return Err(RegistryError::ControllerCycle {
					controller: current.name.to_string(),
				});
			}
			match current.extends {
				SCREEN_BASE => return Ok(ScreenKind::Screen),
				FRAGMENT_BASE => return Ok(ScreenKind::Fragment),
				parent => match defs.get(parent) {
					Some(def) => current = def,
					None if parent.is_empty() => {
						return Err(RegistryError::Unclassifiable {
							controller: name.to_string(),
						});
					}
					None => {
						return Err(RegistryError::UnknownController {
							controller: parent.to_string(),
						});
					}
				},
			}
		}
	}
}

impl ControllerCatalog {
	/// Classifies a definition that may not be in the catalog yet. Its parent chain must be.
	pub fn classify_def(&self, def: &ControllerDef) -> Result<ScreenKind> {
		match def.extends {
			SCREEN_BASE => Ok(ScreenKind::Screen),
			FRAGMENT_BASE => Ok(ScreenKind::Fragment),
			"" => Err(RegistryError::Unclassifiable {
				controller: def.name.to_string(),
			}),
			parent if parent == def.name => Err(RegistryError::ControllerCycle {
				controller: def.name.to_string(),
			}),
			parent => self.classify(parent),
		}
	}
}

impl std::fmt::Debug for ControllerCatalog {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ControllerCatalog").field("len", &self.len()).finish()
	}
}

/// Declares a static [`ControllerDef`] and submits it to the link-time catalog.
///
/// ```ignore
/// vitrine_screens::controller! {
///     pub static ORDER_EDIT = ControllerDef::new("app.order.OrderEdit", SCREEN_BASE)
///         .screen("sales$Order.edit")
///         .template("order-edit.kdl")
///         .primary_editor("sales$Order");
/// }
/// ```
#[macro_export]
macro_rules! controller {
	($(#[$meta:meta])* $vis:vis static $name:ident = $def:expr;) => {
		$(#[$meta])*
		$vis static $name: $crate::controller::ControllerDef = $def;

		$crate::__private::inventory::submit! { $crate::controller::ControllerReg(&$name) }
	};
}
