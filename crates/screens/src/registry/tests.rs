use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::controller::{FRAGMENT_BASE, SCREEN_BASE};
use crate::entry::ScreenKind;
use crate::metadata::MemoryResources;

fn leak(def: ControllerDef) -> &'static ControllerDef {
	Box::leak(Box::new(def))
}

fn registry() -> ScreenRegistry {
	let catalog = ControllerCatalog::with_defs([
		leak(ControllerDef::new("app.Main", SCREEN_BASE).screen("main").route("/main")),
		leak(
			ControllerDef::new("app.order.OrderEdit", SCREEN_BASE)
				.screen("Order.edit")
				.template("order-edit.kdl"),
		),
		leak(ControllerDef::new("app.order.OrderLines", FRAGMENT_BASE)),
		leak(ControllerDef::new("app.customer.CustomerBrowse", SCREEN_BASE)),
	]);
	let resources = MemoryResources::new();
	resources.insert(
		"screens.kdl",
		r#"
		screen id="Customer.browse" class="app.customer.CustomerBrowse" route="customers"
		screen id="orderLines" class="app.order.OrderLines"
		"#,
	);
	let entities = EntityCatalog::new();
	entities.extend("Order", "ExtOrder").register("Customer");

	ScreenRegistry::builder()
		.config(RegistryConfig {
			documents: vec!["screens.kdl".to_string()],
			..RegistryConfig::default()
		})
		.catalog(Arc::new(catalog))
		.resources(Arc::new(resources))
		.entities(Arc::new(entities))
		.build()
}

#[test]
fn nothing_is_built_until_first_read() {
	let registry = registry();
	assert_eq!(registry.builds(), 0);
	assert!(registry.exists("main").unwrap());
	assert!(registry.exists("Customer.browse").unwrap());
	assert_eq!(registry.builds(), 1);
	assert_eq!(registry.all().unwrap().len(), 4);
	assert_eq!(registry.builds(), 1);
}

#[test]
fn get_by_id_reports_missing_screens() {
	let registry = registry();
	assert!(registry.find_by_id("nope").unwrap().is_none());
	assert!(matches!(registry.get_by_id("nope"), Err(RegistryError::NotFound { id }) if id == "nope"));
}

#[test]
fn routes_resolve_both_ways() {
	let registry = registry();
	assert_eq!(registry.find_by_route("customers").unwrap().map(|e| e.id().to_string()).as_deref(), Some("Customer.browse"));
	assert_eq!(registry.find_route_by_id("main").unwrap().as_deref(), Some("/main"));
	assert_eq!(registry.route_info("main").unwrap(), Some(RouteInfo::new("/main")));
	assert_eq!(registry.find_route_by_id("orderLines").unwrap(), None);
}

#[test]
fn extended_type_ids_fall_back_to_original() {
	let registry = registry();
	let entry = registry.get_by_id("ExtOrder.edit").unwrap();
	assert_eq!(entry.id(), "Order.edit");
	assert_eq!(registry.editor_id("ExtOrder").unwrap(), "Order.edit");
	assert_eq!(registry.editor_entry_for("ExtOrder").unwrap().id(), "Order.edit");
}

#[test]
fn lookup_uses_browser_when_no_lookup_exists() {
	let registry = registry();
	assert_eq!(registry.lookup_id("Customer").unwrap(), "Customer.browse");
	assert_eq!(registry.browse_id("Customer").unwrap(), "Customer.browse");
	assert_eq!(registry.lookup_entry_for("Customer").unwrap().id(), "Customer.browse");
	assert!(matches!(
		registry.lookup_entry_for("Order"),
		Err(RegistryError::NotFound { id }) if id == "Order.lookup"
	));
}

#[test]
fn resolved_entries_are_cached_per_build() {
	let registry = registry();
	let first = registry.resolved("Order.edit").unwrap();
	let second = registry.resolved("ExtOrder.edit").unwrap();
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(first.template.as_deref(), Some("/app/order/order-edit.kdl"));
	assert_eq!(*first, registry.resolve("Order.edit").unwrap());

	registry.reset();
	let rebuilt = registry.resolved("Order.edit").unwrap();
	assert!(!Arc::ptr_eq(&first, &rebuilt));
	assert_eq!(first, rebuilt);
	assert_eq!(registry.resolve("orderLines").unwrap().kind, ScreenKind::Fragment);
}

#[test]
fn load_dynamic_rejects_unclassifiable_controllers() {
	let registry = registry();
	registry.initialize().unwrap();
	let err = registry
		.load_dynamic(leak(ControllerDef::new("hot.Orphan", "hot.Missing").screen("orphan")))
		.unwrap_err();

	assert!(matches!(err, RegistryError::UnknownController { .. }));
	assert_eq!(registry.generation(), 0);
	assert!(!registry.exists("orphan").unwrap());
	assert!(registry.catalog().get("hot.Orphan").is_none());
}

#[test]
fn configuration_errors_surface_on_initialize() {
	let resources = MemoryResources::new();
	resources.insert(
		"screens.kdl",
		r#"
		screen id="dup" class="app.A"
		screen id="dup" class="app.B"
		"#,
	);
	let registry = ScreenRegistry::builder()
		.config(RegistryConfig {
			documents: vec!["screens.kdl".to_string()],
			..RegistryConfig::default()
		})
		.catalog(Arc::new(ControllerCatalog::new()))
		.resources(Arc::new(resources))
		.build();

	assert!(matches!(registry.initialize(), Err(RegistryError::DuplicateId { .. })));
	assert!(matches!(registry.all(), Err(RegistryError::DuplicateId { .. })));
	assert_eq!(registry.builds(), 2);
}
