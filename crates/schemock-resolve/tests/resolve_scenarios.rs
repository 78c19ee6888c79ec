use std::path::{Path, PathBuf};

use schemock_core::{
    Cycle, CycleKind, CycleStrength, DependencyGraph, Entity, EntitySet, Field, ForeignKeyLink,
    RelationKind,
};
use schemock_ingest::ParserRegistry;
use schemock_resolve::{
    BreakAction, DependencyResolver, ResolutionOutput, ResolutionPlan, ResolutionWarning,
    ResolveError, ResolveOptions,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn parse_fixture(name: &str) -> EntitySet {
    ParserRegistry::default()
        .without_cache()
        .parse(&fixture(name), None)
        .unwrap_or_else(|err| panic!("parse {name}: {err}"))
}

fn set(entities: Vec<Entity>) -> EntitySet {
    EntitySet::from_entities(entities).expect("entity set")
}

fn position(output: &ResolutionOutput, entity: &str) -> usize {
    output
        .generation_order
        .iter()
        .position(|name| name == entity)
        .unwrap_or_else(|| panic!("{entity} missing from order"))
}

fn blog_entities() -> EntitySet {
    set(vec![
        Entity::new("User")
            .with_field(Field::scalar("id", "Int").identifier())
            .with_field(Field::relation("posts", "Post").array()),
        Entity::new("Post")
            .with_field(Field::scalar("id", "Int").identifier())
            .with_field(Field::scalar("authorId", "Int"))
            .with_field(Field::relation("author", "User").with_foreign_key(ForeignKeyLink {
                target_entity: Some("User".to_string()),
                fields: vec!["authorId".to_string()],
                references: vec!["id".to_string()],
                relation_name: None,
            })),
    ])
}

#[test]
fn entities_without_relations_have_no_cycles() {
    let entities = set(vec![
        Entity::new("Tag").with_field(Field::scalar("label", "String")),
        Entity::new("Setting").with_field(Field::scalar("key", "String")),
        Entity::new("Audit").with_field(Field::scalar("message", "String")),
    ]);
    let output = DependencyResolver::new().resolve_dependencies(&entities);

    assert!(output.cycles.is_empty());
    assert!(output.resolution_plan.is_none());
    let mut order = output.generation_order.clone();
    order.sort();
    assert_eq!(order, vec!["Audit", "Setting", "Tag"]);
}

#[test]
fn acyclic_order_puts_dependencies_first() {
    let entities = set(vec![
        Entity::new("Comment")
            .with_field(Field::relation("post", "Post"))
            .with_field(Field::relation("author", "User")),
        Entity::new("Post").with_field(Field::relation("author", "User")),
        Entity::new("User").with_field(Field::scalar("id", "Int").identifier()),
        Entity::new("Like")
            .with_field(Field::relation("comment", "Comment"))
            .with_field(Field::relation("user", "User")),
    ]);
    let output = DependencyResolver::new().resolve_dependencies(&entities);

    assert!(output.is_acyclic());
    for relation in output.relations.iter().filter(|r| !r.informational) {
        assert!(
            position(&output, &relation.to_entity) < position(&output, &relation.from_entity),
            "{} must precede {}",
            relation.to_entity,
            relation.from_entity
        );
    }
}

#[test]
fn user_post_cycle_is_strong_and_force_broken() {
    let output = DependencyResolver::new().resolve_dependencies(&blog_entities());

    assert_eq!(output.cycles.len(), 1);
    let cycle = &output.cycles[0];
    assert_eq!(cycle.len(), 2);
    assert_eq!(cycle.kind, CycleKind::Simple);
    assert_eq!(cycle.strength, CycleStrength::Strong);

    let plan = output.resolution_plan.as_ref().expect("plan");
    assert_eq!(plan.strategy, "smart-break");
    assert_eq!(plan.break_points.len(), 1);
    let point = &plan.break_points[0];
    assert_eq!(point.action, BreakAction::Break);
    assert_eq!((point.from_entity.as_str(), point.to_entity.as_str()), ("Post", "User"));
    assert_eq!(point.field, "author");

    assert_eq!(output.generation_order, vec!["Post", "User"]);
    assert_eq!(plan.generation_order, output.generation_order);
    assert!(output.warnings.is_empty());
}

#[test]
fn prisma_fixture_resolves_like_the_hand_built_model() {
    let output = DependencyResolver::new().resolve_dependencies(&parse_fixture("blog.prisma"));
    assert_eq!(output.cycles.len(), 1);
    assert_eq!(output.cycles[0].strength, CycleStrength::Strong);
    assert_eq!(output.generation_order, vec!["Post", "User"]);
    assert_eq!(output.summary.nodes, 2);
    assert_eq!(output.summary.edges, 2);
}

#[test]
fn self_reference_yields_exactly_one_cycle() {
    let output = DependencyResolver::new().resolve_dependencies(&parse_fixture("catalog.graphql"));

    let self_references: Vec<&Cycle> = output
        .cycles
        .iter()
        .filter(|cycle| cycle.kind == CycleKind::SelfReference)
        .collect();
    assert_eq!(self_references.len(), 1);
    assert_eq!(self_references[0].path, vec!["Category", "Category"]);
    assert!(self_references[0].is_weak());

    let plan = output.resolution_plan.as_ref().expect("plan");
    assert_eq!(plan.break_points[0].action, BreakAction::Defer);
    assert_eq!(plan.deferred_relations[0].field, "parent");
    assert_eq!(output.generation_order, vec!["Category", "Product"]);
}

#[test]
fn strength_tracks_optional_edges() {
    let weak = set(vec![
        Entity::new("A").with_field(Field::relation("b", "B")),
        Entity::new("B").with_field(Field::relation("a", "A").optional()),
    ]);
    let strong = set(vec![
        Entity::new("A").with_field(Field::relation("b", "B")),
        Entity::new("B").with_field(Field::relation("a", "A")),
    ]);
    let resolver = DependencyResolver::new();

    assert_eq!(
        resolver.resolve_dependencies(&weak).cycles[0].strength,
        CycleStrength::Weak
    );
    assert_eq!(
        resolver.resolve_dependencies(&strong).cycles[0].strength,
        CycleStrength::Strong
    );
}

#[test]
fn smart_break_prefers_deferring_optional_edges() {
    let output = DependencyResolver::new().resolve_dependencies(&parse_fixture("shop.sql"));

    assert_eq!(output.cycles.len(), 1);
    assert!(output.cycles[0].is_weak());

    let plan = output.resolution_plan.as_ref().expect("plan");
    assert!(plan.break_points.iter().all(|p| p.action == BreakAction::Defer));
    assert_eq!(plan.break_points[0].field, "default_address_id");
    assert_eq!(plan.deferred_relations[0].target_entity, "addresses");
    assert_eq!(output.generation_order, vec!["customers", "addresses", "orders"]);
}

#[test]
fn disjoint_cycles_are_all_resolved() {
    let entities = set(vec![
        Entity::new("A").with_field(Field::relation("b", "B")),
        Entity::new("B").with_field(Field::relation("a", "A")),
        Entity::new("X").with_field(Field::relation("y", "Y")),
        Entity::new("Y").with_field(Field::relation("z", "Z")),
        Entity::new("Z").with_field(Field::relation("x", "X").optional()),
    ]);
    let output = DependencyResolver::new().resolve_dependencies(&entities);

    assert_eq!(output.cycles.len(), 2);
    let plan = output.resolution_plan.as_ref().expect("plan");
    assert_eq!(plan.break_points.len(), 2);
    assert!(output.warnings.is_empty());
    assert_eq!(output.generation_order.len(), 5);
    assert!(position(&output, "Z") < position(&output, "Y"));
    assert!(position(&output, "Y") < position(&output, "X"));
}

#[test]
fn resolution_is_deterministic() {
    let resolver = DependencyResolver::new();
    let first = resolver.resolve_dependencies(&blog_entities());
    for _ in 0..5 {
        let again = resolver.resolve_dependencies(&blog_entities());
        assert_eq!(again.cycles, first.cycles);
        assert_eq!(again.resolution_plan, first.resolution_plan);
        assert_eq!(again.generation_order, first.generation_order);
    }
}

#[test]
fn alternative_strategies_mark_every_cycle_edge() {
    let mut resolver = DependencyResolver::new();

    resolver.set_preferred_strategy("lazy-loading").expect("builtin");
    let lazy = resolver.resolve_dependencies(&blog_entities());
    let plan = lazy.resolution_plan.expect("plan");
    assert_eq!(plan.strategy, "lazy-loading");
    assert_eq!(plan.break_points.len(), 2);
    assert!(plan.break_points.iter().all(|p| p.action == BreakAction::Lazy));
    assert_eq!(plan.deferred_relations.len(), 2);

    resolver
        .set_preferred_strategy("partial-references")
        .expect("builtin");
    let partial = resolver.resolve_dependencies(&blog_entities());
    let plan = partial.resolution_plan.expect("plan");
    assert!(plan.break_points.iter().all(|p| p.action == BreakAction::Partial));
    assert!(plan.deferred_relations.is_empty());
    assert_eq!(partial.generation_order.len(), 2);
}

#[test]
fn unknown_strategies_are_rejected() {
    let mut resolver = DependencyResolver::new();
    let err = resolver.set_preferred_strategy("topological-magic").unwrap_err();
    assert!(matches!(err, ResolveError::UnknownStrategy(ref name) if name == "topological-magic"));
    assert_eq!(resolver.preferred_strategy(), "smart-break");

    let err = DependencyResolver::with_options(ResolveOptions {
        strategy: "nope".to_string(),
        ..ResolveOptions::default()
    })
    .err()
    .expect("unknown strategy");
    assert!(matches!(err, ResolveError::UnknownStrategy(_)));
}

#[test]
fn custom_strategy_that_breaks_nothing_leaves_entities_unplaced() {
    let mut resolver = DependencyResolver::new();
    resolver.register_strategy("keep-everything", |_: &Cycle, _: &DependencyGraph| {
        ResolutionPlan::new("keep-everything")
    });
    resolver
        .set_preferred_strategy("keep-everything")
        .expect("registered");

    let output = resolver.resolve_dependencies(&blog_entities());
    assert_eq!(output.generation_order, vec!["User", "Post"]);
    assert_eq!(
        output.warnings,
        vec![
            ResolutionWarning::UnplacedEntity {
                entity: "User".to_string()
            },
            ResolutionWarning::UnplacedEntity {
                entity: "Post".to_string()
            },
        ]
    );
}

#[test]
fn low_confidence_relations_are_informational() {
    let entities = set(vec![
        Entity::new("Category").with_field(Field::scalar("id", "Int").identifier()),
        Entity::new("Product").with_field(Field::scalar("parentCategoryId", "Int")),
        Entity::new("Owner").with_field(Field::scalar("posts", "json").array()),
        Entity::new("Post").with_field(Field::scalar("userId", "Int")),
        Entity::new("User").with_field(Field::scalar("id", "Int").identifier()),
    ]);
    let output = DependencyResolver::new().resolve_dependencies(&entities);

    let parent = output
        .relations
        .iter()
        .find(|r| r.via_field == "parentCategoryId")
        .expect("relation");
    assert!(parent.informational);

    let user_id = output
        .relations
        .iter()
        .find(|r| r.via_field == "userId")
        .expect("relation");
    assert_eq!(user_id.kind, RelationKind::FkPattern);
    assert!((0.6..=0.9).contains(&user_id.confidence));

    let posts = output
        .relations
        .iter()
        .find(|r| r.via_field == "posts")
        .expect("relation");
    assert!((0.6..=0.8).contains(&posts.confidence));

    assert_eq!(
        output.warnings,
        vec![ResolutionWarning::RelationsBelowThreshold {
            count: 1,
            threshold: 0.7
        }]
    );
    assert_eq!(output.summary.edges, 2);
}
