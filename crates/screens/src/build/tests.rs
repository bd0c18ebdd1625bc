use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::controller::{ControllerCatalog, SCREEN_BASE};
use crate::entity::EntityCatalog;
use crate::entry::RouteInfo;
use crate::metadata::{CatalogMetadata, Descriptor, MemoryResources};

struct Batches(Vec<DeclarationBatch>);

impl ScreenSource for Batches {
	fn name(&self) -> &str {
		"batches"
	}

	fn collect(&self, _meta: &dyn MetadataReader) -> Result<Vec<DeclarationBatch>> {
		Ok(self.0.clone())
	}
}

fn leak(def: ControllerDef) -> &'static ControllerDef {
	Box::leak(Box::new(def))
}

struct Fixture {
	meta: CatalogMetadata,
	entities: EntityCatalog,
	config: RegistryConfig,
}

impl Fixture {
	fn new() -> Self {
		let controllers = ControllerCatalog::with_defs([
			leak(ControllerDef::new("app.X", SCREEN_BASE)),
			leak(ControllerDef::new("app.Y", SCREEN_BASE)),
			leak(ControllerDef::new("app.Login", SCREEN_BASE)),
			leak(ControllerDef::new("app.OrderEditor", SCREEN_BASE).primary_editor("ext$Order")),
			leak(ControllerDef::new("app.OrderPicker", SCREEN_BASE).primary_lookup("sales$Order")),
			leak(ControllerDef::new("app.Rogue", "")),
		]);
		let entities = EntityCatalog::new();
		entities.extend("sales$Order", "ext$Order");
		Self {
			meta: CatalogMetadata::new(Arc::new(controllers), Arc::new(MemoryResources::new())),
			entities,
			config: RegistryConfig::default(),
		}
	}

	fn build(&self, batches: Vec<DeclarationBatch>) -> Result<Snapshot> {
		let sources: Vec<Arc<dyn ScreenSource>> = vec![Arc::new(Batches(batches))];
		RegistryBuilder::new(&self.meta, &self.entities, &self.config).build(&sources, 1)
	}
}

fn batch(label: &str, declarations: Vec<Declaration>) -> DeclarationBatch {
	DeclarationBatch {
		label: label.to_string(),
		declarations,
	}
}

fn decl(id: &str, controller: &str) -> Declaration {
	Declaration::new(id, Origin::controller(controller))
}

fn controller_of(snapshot: &Snapshot, id: &str) -> Option<String> {
	snapshot.get(id).map(|e| e.origin.reference().to_string())
}

#[test]
fn same_batch_duplicate_is_fatal() {
	let fixture = Fixture::new();
	let err = fixture
		.build(vec![batch("base", vec![decl("customer.edit", "app.X"), decl("customer.edit", "app.Y")])])
		.unwrap_err();

	match err {
		RegistryError::DuplicateId {
			batch,
			id,
			existing,
			incoming,
		} => {
			assert_eq!(batch, "base");
			assert_eq!(id, "customer.edit");
			assert_eq!(existing, "app.X");
			assert_eq!(incoming, "app.Y");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn same_batch_repeat_of_same_controller_is_allowed() {
	let fixture = Fixture::new();
	let snapshot = fixture
		.build(vec![batch("base", vec![decl("customer.edit", "app.X"), decl("customer.edit", "app.X")])])
		.unwrap();
	assert_eq!(snapshot.len(), 1);
	assert!(snapshot.report().is_clean());
}

#[test]
fn later_batch_overrides_and_keeps_position() {
	let fixture = Fixture::new();
	let snapshot = fixture
		.build(vec![
			batch("framework", vec![decl("customer.edit", "app.X"), decl("login", "app.Login")]),
			batch("addon", vec![decl("customer.edit", "app.Y")]),
		])
		.unwrap();

	assert_eq!(controller_of(&snapshot, "customer.edit").as_deref(), Some("app.Y"));
	let ids: Vec<_> = snapshot.all().iter().map(|e| e.id().to_string()).collect();
	assert_eq!(ids, vec!["customer.edit", "login"]);
	assert_eq!(
		snapshot.report().overrides,
		vec![OverrideRecord {
			id: Arc::from("customer.edit"),
			previous: "app.X".to_string(),
			previous_batch: "framework".to_string(),
			incoming: "app.Y".to_string(),
			incoming_batch: "addon".to_string(),
		}]
	);
}

#[test]
fn redeclaration_inherits_route() {
	let fixture = Fixture::new();
	let snapshot = fixture
		.build(vec![
			batch(
				"framework",
				vec![
					decl("orders", "app.X").with_route(RouteInfo::new("/orders").with_parent_prefix("sales")),
					decl("customers", "app.X").with_route(RouteInfo::new("/customers")),
				],
			),
			batch(
				"addon",
				vec![
					decl("orders", "app.Y"),
					decl("customers", "app.Y").with_route(RouteInfo::new("/clients")),
				],
			),
		])
		.unwrap();

	let orders = snapshot.get("orders").unwrap();
	assert_eq!(orders.route, Some(RouteInfo::new("/orders").with_parent_prefix("sales")));
	assert_eq!(snapshot.by_route("/orders").map(|e| e.id()), Some("orders"));

	assert_eq!(snapshot.by_route("/customers"), None);
	assert_eq!(snapshot.route_of("customers").map(|r| r.path.as_str()), Some("/clients"));
	assert_eq!(snapshot.routes().len(), 2);
}

#[test]
fn new_route_inherits_parent_prefix() {
	let fixture = Fixture::new();
	let snapshot = fixture
		.build(vec![
			batch(
				"framework",
				vec![decl("orders", "app.X").with_route(RouteInfo::new("/orders").with_parent_prefix("sales"))],
			),
			batch("addon", vec![decl("orders", "app.Y").with_route(RouteInfo::new("/all-orders"))]),
		])
		.unwrap();

	assert_eq!(
		snapshot.route_of("orders"),
		Some(&RouteInfo::new("/all-orders").with_parent_prefix("sales"))
	);
}

#[test]
fn route_conflicts_are_reported() {
	let fixture = Fixture::new();
	let snapshot = fixture
		.build(vec![batch(
			"base",
			vec![
				decl("a", "app.X").with_route(RouteInfo::new("/a")),
				decl("b", "app.Y").with_route(RouteInfo::new("/a")),
				decl("login", "app.Login").with_route(RouteInfo::new("/login")),
				decl("legacyLogin", "app.X").with_route(RouteInfo::new("/login")),
			],
		)])
		.unwrap();

	assert_eq!(snapshot.by_route("/a").map(|e| e.id()), Some("b"));
	assert_eq!(snapshot.route_of("a"), None);
	assert_eq!(snapshot.by_route("/login").map(|e| e.id()), Some("login"));
	assert_eq!(snapshot.get("legacyLogin").unwrap().route, None);

	let decisions: Vec<_> = snapshot
		.report()
		.route_conflicts
		.iter()
		.map(|c| (c.route.as_str(), &*c.incoming, c.decision.clone()))
		.collect();
	assert_eq!(
		decisions,
		vec![
			("/a", "b", RouteDecision::Overrode { previous: Arc::from("a") }),
			("/login", "legacyLogin", RouteDecision::Skipped { owner: Arc::from("login") }),
		]
	);
}

#[test]
fn displaced_entries_drop_their_route() {
	let fixture = Fixture::new();
	let snapshot = fixture
		.build(vec![
			batch(
				"base",
				vec![
					decl("a", "app.X").with_route(RouteInfo::new("/a")),
					decl("b", "app.Y").with_route(RouteInfo::new("/a")),
				],
			),
			batch("addon", vec![decl("c", "app.OrderEditor").with_route(RouteInfo::new("/b"))]),
			batch("late", vec![decl("d", "app.X").with_route(RouteInfo::new("/b"))]),
		])
		.unwrap();

	assert_eq!(snapshot.get("a").unwrap().route, None);
	assert_eq!(snapshot.get("c").unwrap().route, None);
	assert_eq!(snapshot.primary_editor("sales$Order").unwrap().route, None);
	for entry in snapshot.all() {
		assert_eq!(entry.route.as_ref(), snapshot.route_of(entry.id()), "{}", entry.id());
	}

	let mut claimed: Vec<_> = snapshot.all().into_iter().filter_map(|e| e.route.map(|r| r.path)).collect();
	claimed.sort();
	assert_eq!(claimed, vec!["/a".to_string(), "/b".to_string()]);
}

#[test]
fn primary_markers_are_keyed_by_original_type() {
	let fixture = Fixture::new();
	let snapshot = fixture
		.build(vec![batch(
			"controllers",
			vec![decl("customOrderEditor", "app.OrderEditor"), decl("orderPicker", "app.OrderPicker")],
		)])
		.unwrap();

	assert_eq!(snapshot.primary_editor("sales$Order").map(|e| e.id()), Some("customOrderEditor"));
	assert_eq!(snapshot.primary_editor("ext$Order"), None);
	assert_eq!(snapshot.primary_lookup("sales$Order").map(|e| e.id()), Some("orderPicker"));
}

#[test]
fn unclassifiable_controller_fails_the_build() {
	let fixture = Fixture::new();
	let err = fixture.build(vec![batch("base", vec![decl("rogue", "app.Rogue")])]).unwrap_err();
	assert!(matches!(err, RegistryError::Unclassifiable { controller } if controller == "app.Rogue"));
}

#[test]
fn descriptors_with_unknown_classes_are_resolved_later() {
	let fixture = Fixture::new();
	let descriptor = Descriptor::new("screen").with_attr("class", "plugin.Late");
	let snapshot = fixture
		.build(vec![batch("doc", vec![Declaration::new("late", Origin::descriptor(descriptor))])])
		.unwrap();
	assert!(snapshot.contains("late"));
	assert_eq!(snapshot.generation(), 1);
}

#[test]
fn source_errors_abort_the_build() {
	struct Failing;

	impl ScreenSource for Failing {
		fn name(&self) -> &str {
			"failing"
		}

		fn collect(&self, _meta: &dyn MetadataReader) -> Result<Vec<DeclarationBatch>> {
			Err(RegistryError::IncludeCycle { path: "a.kdl".to_string() })
		}
	}

	let fixture = Fixture::new();
	let sources: Vec<Arc<dyn ScreenSource>> = vec![Arc::new(Failing)];
	let result = RegistryBuilder::new(&fixture.meta, &fixture.entities, &fixture.config).build(&sources, 1);
	assert!(matches!(result, Err(RegistryError::IncludeCycle { .. })));
}
