//! Integration tests for mapping sessions.
//!
//! These tests drive whole sessions through the public API and check the
//! resulting graph, including persisted snapshots written with tempfile.

use std::sync::Arc;

use tempfile::TempDir;

use modelgraph::core::config::Config;
use modelgraph::core::labels::{CONTAINER, CONTENTS, INSTANCE_OF};
use modelgraph::core::metamodel::Metamodel;
use modelgraph::core::types::{Direction, NodeId, Value};
use modelgraph::mapping::{
    Diagnostic, MappingOptions, ModelMapping, Operation, OperationStats,
};
use modelgraph::store::{GraphStore, MemoryGraph};

// =============================================================================
// Test Helpers
// =============================================================================

const JAVA_NS: &str = "http://www.eclipse.org/MoDisco/Java/0.2.incubation/java";

fn java() -> Metamodel {
    Metamodel::new("java", JAVA_NS)
        .with_class("ASTNode", true, &[])
        .with_class("NamedElement", true, &["ASTNode"])
        .with_class("Package", false, &["NamedElement"])
        .with_class("AbstractTypeDeclaration", true, &["NamedElement"])
        .with_class("ClassDeclaration", false, &["AbstractTypeDeclaration"])
        .with_class("InterfaceDeclaration", false, &["AbstractTypeDeclaration"])
        .with_class("Model", false, &[])
}

fn java_session() -> ModelMapping<MemoryGraph> {
    ModelMapping::with_options(MemoryGraph::new(), MappingOptions::default().with_metamodel(java()))
}

fn root_contents(graph: &MemoryGraph, resource: &str) -> Vec<NodeId> {
    let root = NodeId::new(resource).unwrap();
    graph.neighbors(&root, Direction::Out, CONTENTS).unwrap()
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn unrooted_instance_is_attached_on_close() {
    let mut mapping = ModelMapping::new(MemoryGraph::new());
    let a = mapping.create_instance("Foo", Some("ns1"), "res1").unwrap();
    let b = mapping.create_instance("Bar", Some("ns1"), "res1").unwrap();

    mapping.set_reference(&a, "children", None, &b, false).unwrap();
    assert!(mapping.is_pending(&a));
    assert!(mapping.is_pending(&b));

    let graph = mapping.close().unwrap();
    assert_eq!(root_contents(&graph, "res1"), vec![a.clone(), b]);

    let mapping = ModelMapping::new(graph);
    assert_eq!(mapping.all_instances_of_type("Foo").unwrap(), vec![a]);
}

#[test]
fn every_instance_rooted_exactly_once() {
    let mut mapping = java_session();
    let model = mapping.create_instance("Model", Some(JAVA_NS), "app.xmi").unwrap();
    let pkg = mapping.create_instance("Package", Some(JAVA_NS), "app.xmi").unwrap();
    let class = mapping
        .create_instance("ClassDeclaration", Some(JAVA_NS), "app.xmi")
        .unwrap();
    let loose = mapping
        .create_instance("InterfaceDeclaration", Some(JAVA_NS), "app.xmi")
        .unwrap();

    mapping.set_reference(&model, "ownedElements", None, &pkg, true).unwrap();
    mapping
        .set_reference(&pkg, "ownedElements", Some("package"), &class, true)
        .unwrap();

    let graph = mapping.close().unwrap();

    assert_eq!(root_contents(&graph, "app.xmi"), vec![model.clone(), loose.clone()]);
    for node in [&model, &pkg, &class, &loose] {
        let containers = graph.edges(node, Direction::Out, CONTAINER).unwrap().len();
        let roots = graph.edges(node, Direction::In, CONTENTS).unwrap().len();
        assert_eq!(containers + roots, 1, "{node} must be rooted once");
    }
}

// =============================================================================
// Containment
// =============================================================================

#[test]
fn failed_containment_still_roots_child_on_close() {
    let mut mapping = java_session();
    let pkg = mapping.create_instance("Package", Some(JAVA_NS), "r").unwrap();
    let class = mapping
        .create_instance("ClassDeclaration", Some(JAVA_NS), "r")
        .unwrap();
    let ghost = NodeId::new("ghost").unwrap();

    assert!(mapping
        .set_reference(&ghost, "ownedElements", None, &class, true)
        .is_err());
    assert!(mapping.is_pending(&class));

    let graph = mapping.close().unwrap();
    assert_eq!(root_contents(&graph, "r"), vec![pkg, class.clone()]);
    assert!(graph.edges(&class, Direction::Out, CONTAINER).unwrap().is_empty());
}


#[test]
fn moving_between_containers_keeps_both_lists_contiguous() {
    let mut mapping = java_session();
    let p1 = mapping.create_instance("Package", Some(JAVA_NS), "r").unwrap();
    let p2 = mapping.create_instance("Package", Some(JAVA_NS), "r").unwrap();
    let classes: Vec<NodeId> = (0..4)
        .map(|_| {
            mapping
                .create_instance("ClassDeclaration", Some(JAVA_NS), "r")
                .unwrap()
        })
        .collect();
    for class in &classes {
        mapping.set_reference(&p1, "ownedElements", None, class, true).unwrap();
    }

    mapping.set_reference(&p2, "ownedElements", None, &classes[2], true).unwrap();
    mapping.set_reference(&p2, "ownedElements", None, &classes[0], true).unwrap();

    assert_eq!(
        mapping.get_reference(&p1, "ownedElements", None, false).unwrap(),
        vec![classes[1].clone(), classes[3].clone()]
    );
    assert_eq!(
        mapping.get_reference(&p2, "ownedElements", None, false).unwrap(),
        vec![classes[2].clone(), classes[0].clone()]
    );
    assert_eq!(mapping.size(&p1, "ownedElements").unwrap(), 2);
    assert_eq!(mapping.size(&p2, "ownedElements").unwrap(), 2);
    assert_eq!(mapping.get_parent(&classes[0]).unwrap(), Some(p2.clone()));
    assert_eq!(mapping.get_parent(&classes[1]).unwrap(), Some(p1));
}

#[test]
fn container_side_is_navigated_through_opposite() {
    let mut mapping = java_session();
    let pkg = mapping.create_instance("Package", Some(JAVA_NS), "r").unwrap();
    let class = mapping
        .create_instance("ClassDeclaration", Some(JAVA_NS), "r")
        .unwrap();
    mapping
        .set_reference(&pkg, "ownedElements", Some("package"), &class, true)
        .unwrap();

    assert_eq!(
        mapping
            .get_reference(&class, "package", Some("ownedElements"), true)
            .unwrap(),
        vec![pkg]
    );
}

#[test]
fn failed_close_returns_intact_store() {
    let mut graph = MemoryGraph::new();
    graph.add_node(Some(NodeId::new("app.xmi").unwrap())).unwrap();
    let mut mapping = ModelMapping::new(graph);
    let first = mapping.create_instance("Foo", Some("ns1"), "other.xmi").unwrap();
    let second = mapping.create_instance("Foo", Some("ns1"), "app.xmi").unwrap();

    let err = mapping.close().unwrap_err();
    assert!(err.to_string().contains("app.xmi"));

    let graph = err.into_store();
    assert_eq!(graph.count_edges_labeled(CONTENTS), 0);
    assert!(!graph.contains_node(&NodeId::new("other.xmi").unwrap()));
    assert!(graph.contains_node(&first));
    assert!(graph.contains_node(&second));
}

// =============================================================================
// Types
// =============================================================================

#[test]
fn kind_queries_follow_the_metamodel() {
    let mut mapping = java_session();
    let pkg = mapping.create_instance("Package", Some(JAVA_NS), "r").unwrap();
    let class = mapping
        .create_instance("ClassDeclaration", Some(JAVA_NS), "r")
        .unwrap();
    let iface = mapping
        .create_instance("InterfaceDeclaration", Some(JAVA_NS), "r")
        .unwrap();

    let mut types = mapping.all_instances_of_kind("AbstractTypeDeclaration").unwrap();
    types.sort();
    let mut expected = vec![class.clone(), iface];
    expected.sort();
    assert_eq!(types, expected);

    assert!(mapping.is_kind_of(&class, "NamedElement").unwrap());
    assert!(!mapping.is_kind_of(&pkg, "AbstractTypeDeclaration").unwrap());
    assert_eq!(mapping.all_instances_of_kind("NamedElement").unwrap().len(), 3);
    assert!(mapping.diagnostics().is_empty());
}

#[test]
fn kind_queries_without_metamodel_record_diagnostics() {
    let mut mapping = ModelMapping::new(MemoryGraph::new());
    let class = mapping
        .create_instance("ClassDeclaration", Some(JAVA_NS), "r")
        .unwrap();

    assert!(mapping.all_instances_of_kind("NamedElement").unwrap().is_empty());
    assert!(mapping.is_kind_of(&class, "ClassDeclaration").unwrap());

    let diagnostics = mapping.take_diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics
        .iter()
        .all(|d| matches!(d, Diagnostic::UnsupportedOperation { .. })));
    assert!(mapping.diagnostics().is_empty());
}

// =============================================================================
// Attributes
// =============================================================================

#[test]
fn absent_is_abstract_is_stored_as_false() {
    let mut mapping = ModelMapping::new(MemoryGraph::new());
    let a = mapping.create_instance("Foo", Some("ns1"), "res1").unwrap();

    mapping.set_attribute(&a, "isAbstract", None).unwrap();

    assert_eq!(
        mapping.store().node_property(&a, "isAbstract").unwrap(),
        Some(Value::Bool(false))
    );
    assert_eq!(mapping.get_attribute(&a, "isAbstract").unwrap(), vec![Value::Bool(false)]);
}

// =============================================================================
// Configuration and persistence
// =============================================================================

#[test]
fn session_configured_from_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("shapes.toml"),
        r#"
        name = "shapes"
        ns_uri = "urn:shapes"

        [classes.Shape]
        abstract = true

        [classes.Circle]
        supertypes = ["Shape"]
        "#,
    )
    .unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
        root_type = "Resource"
        root_namespace = "urn:resources"
        metamodel = "shapes.toml"

        [attributes.absent_write]
        radius = 0
        "#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    let options = MappingOptions::from_config(&config).unwrap();
    let mut mapping = ModelMapping::with_options(MemoryGraph::new(), options);

    let circle = mapping.create_instance("Circle", Some("urn:shapes"), "drawing").unwrap();
    mapping.set_attribute(&circle, "radius", None).unwrap();
    assert_eq!(mapping.get_attribute(&circle, "radius").unwrap(), vec![Value::Int(0)]);
    assert_eq!(mapping.all_instances_of_kind("Shape").unwrap(), vec![circle.clone()]);

    let graph = mapping.close().unwrap();
    let mapping = ModelMapping::new(graph);
    let root = NodeId::new("drawing").unwrap();
    assert_eq!(mapping.get_type(&root).unwrap(), "Resource");
}

#[test]
fn snapshot_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");

    let mut mapping = ModelMapping::new(MemoryGraph::new());
    let parent = mapping.create_instance("P", Some("ns1"), "res1").unwrap();
    let kids: Vec<NodeId> = (0..3)
        .map(|_| mapping.create_instance("C", Some("ns1"), "res1").unwrap())
        .collect();
    for kid in &kids {
        mapping.set_reference(&parent, "children", None, kid, true).unwrap();
    }
    mapping.set_attribute(&parent, "name", Some(Value::from("root"))).unwrap();
    mapping.close().unwrap().save_json(&path).unwrap();

    let graph = MemoryGraph::load_json(&path).unwrap();
    let mut mapping = ModelMapping::new(graph);

    assert_eq!(mapping.get_reference(&parent, "children", None, false).unwrap(), kids);
    assert_eq!(mapping.get_attribute(&parent, "name").unwrap(), vec![Value::from("root")]);

    // The reloaded session keeps appending after the persisted counter.
    let extra = mapping.create_instance("C", Some("ns1"), "res1").unwrap();
    mapping.set_reference(&parent, "children", None, &extra, true).unwrap();
    assert_eq!(mapping.size(&parent, "children").unwrap(), 4);
    assert_eq!(
        mapping.metaclass_of(&extra).unwrap(),
        mapping.metaclass_of(&kids[0]).unwrap()
    );
}

// =============================================================================
// Observer
// =============================================================================

#[test]
fn observer_counts_operations() {
    let stats = Arc::new(OperationStats::new());
    let options = MappingOptions::default().with_observer(stats.clone());
    let mut mapping = ModelMapping::with_options(MemoryGraph::new(), options);

    let a = mapping.create_instance("Foo", Some("ns1"), "r").unwrap();
    let b = mapping.create_instance("Foo", Some("ns1"), "r").unwrap();
    mapping.set_reference(&a, "children", None, &b, true).unwrap();
    mapping.remove_reference(&a, "children", &b, true).unwrap();
    mapping.set_attribute(&a, "name", Some(Value::from("a"))).unwrap();
    mapping.close().unwrap();

    assert_eq!(stats.get(Operation::CreateInstance).count, 2);
    assert_eq!(stats.get(Operation::SetReference).count, 1);
    assert_eq!(stats.get(Operation::UpdateContainment).count, 1);
    assert_eq!(stats.get(Operation::RemoveReference).count, 1);
    assert_eq!(stats.get(Operation::SetAttribute).count, 1);
    assert_eq!(stats.get(Operation::Close).count, 1);
}

#[test]
fn each_instance_has_one_metaclass_edge() {
    let mut mapping = ModelMapping::new(MemoryGraph::new());
    for i in 0..5 {
        let ty = if i % 2 == 0 { "Even" } else { "Odd" };
        mapping.create_instance(ty, Some("ns1"), "r").unwrap();
    }
    let graph = mapping.close().unwrap();
    // Five instances and the resource root; three metaclasses.
    assert_eq!(graph.count_edges_labeled(INSTANCE_OF), 6);
    assert_eq!(graph.node_count(), 9);
}
