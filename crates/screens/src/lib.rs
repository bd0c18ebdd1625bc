//! Screen registry for Vitrine.
//!
//! Resolves logical screen ids into controller metadata (controller, kind, template),
//! keeps a bijective route table for URL navigation, and finds editor, lookup and
//! browser screens of business-entity types by convention.
//!
//! # Declaring screens
//!
//! Controllers describe themselves statically and self-register at link time:
//!
//! ```ignore
//! use vitrine_screens::{ControllerDef, SCREEN_BASE};
//!
//! vitrine_screens::controller! {
//!     pub static ORDER_EDIT = ControllerDef::new("app.order.OrderEdit", SCREEN_BASE)
//!         .screen("sales$Order.edit")
//!         .route("orders/edit")
//!         .template("order-edit.kdl")
//!         .primary_editor("sales$Order");
//! }
//! ```
//!
//! Screen documents listed in the `screens { documents ... }` config block add or
//! override declarations:
//!
//! ```kdl
//! include file="base/screens.kdl"
//! screen id="login" class="app.Login" route="/login" root-route=#true
//! ```
//!
//! # Modules
//!
//! - [`registry`] - The [`ScreenRegistry`] facade and its builder
//! - [`build`] - Merging sources into a snapshot
//! - [`lazy`] - Build-once publication with invalidation
//! - [`routes`] - Route table and arbitration
//! - [`resolve`] - Entry resolution
//! - [`fallback`] - Entity-type conventions
//! - [`source`] - Declaration sources

pub mod build;
pub mod config;
pub mod controller;
pub mod entity;
pub mod entry;
pub mod error;
pub mod fallback;
pub mod lazy;
pub mod metadata;
pub mod registry;
pub mod resolve;
pub mod routes;
pub mod snapshot;
pub mod source;

pub use config::{ConfigError, ConfigLayer, ConfigWarning, RegistryConfig};
pub use controller::{ControllerCatalog, ControllerDef, ControllerReg, FRAGMENT_BASE, SCREEN_BASE, ScreenDecl};
pub use entity::{EntityCatalog, EntityInstance, EntityMetadata, ScreenKey, ScreenSuffix, original_or_self};
pub use entry::{Entry, Origin, ResolvedEntry, RouteInfo, ScreenKind};
pub use error::{RegistryError, ResourceError, Result};
pub use metadata::{CatalogMetadata, Descriptor, FsResources, MemoryResources, MetadataReader, ResourceLoader};
pub use registry::{ScreenRegistry, ScreenRegistryBuilder};
pub use routes::{RouteArbiter, RouteDecision, RouteTable};
pub use snapshot::{BuildReport, OverrideRecord, RouteConflict, Snapshot};
pub use source::{Declaration, DeclarationBatch, ScreenSource};

#[doc(hidden)]
pub mod __private {
	pub use inventory;
}
