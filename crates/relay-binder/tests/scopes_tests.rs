//! Name conflicts and scoping, driven through the full parse-then-analyze
//! pipeline.

use relay_binder::{Analysis, BindError, DeclKind, StructuralTypeResolver, analyze};
use relay_parser::{NodeArena, parse_source};

fn analyze_sources(sources: &[&str]) -> Result<Analysis, BindError> {
    let mut arena = NodeArena::new();
    let mut programs = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        let root = parse_source(&mut arena, format!("file{i}.rly"), *source).expect("parse failed");
        programs.push(root);
    }
    let mut resolver = StructuralTypeResolver;
    analyze(&arena, &programs, &mut resolver)
}

fn expect_duplicate(sources: &[&str], name: &str) {
    match analyze_sources(sources) {
        Err(BindError::DuplicateDeclaration { name: found, .. }) => assert_eq!(found, name),
        other => panic!("expected duplicate declaration of `{name}`, got {other:?}"),
    }
}

#[test]
fn machine_name_conflicts_with_type_definition() {
    expect_duplicate(&["type X = int; machine X { start state S { } }"], "X");
}

#[test]
fn event_conflicts_with_enum_constant() {
    expect_duplicate(&["enum C { A } event A;"], "A");
}

#[test]
fn machine_conflicts_with_interface() {
    expect_duplicate(
        &["event e; interface M = { e }; machine M { start state S { } }"],
        "M",
    );
}

#[test]
fn machine_coexists_with_machine_prototype() {
    let analysis = analyze_sources(&["machine M; machine M { start state S { } }"]).unwrap();
    assert!(analysis.lookup_top(DeclKind::Machine, "M").is_some());
    assert!(analysis.lookup_top(DeclKind::MachineProto, "M").is_some());
}

#[test]
fn event_set_shares_a_name_with_a_machine() {
    let analysis = analyze_sources(&[
        "event e; eventset M = { e }; machine M { start state S { } }",
    ])
    .unwrap();
    assert!(analysis.lookup_top(DeclKind::EventSet, "M").is_some());
    assert!(analysis.lookup_top(DeclKind::Machine, "M").is_some());
}

#[test]
fn duplicate_events_across_files_conflict() {
    expect_duplicate(&["event tick;", "event tick;"], "tick");
}

#[test]
fn declarations_are_visible_across_files_in_both_directions() {
    // Two-pass resolution: the machine in file0 uses an event declared in
    // file1, and the machine in file1 uses an event from file0.
    let analysis = analyze_sources(&[
        "event ping; machine A { start state S { ignore pong; } }",
        "event pong; machine B { start state S { ignore ping; } }",
    ])
    .unwrap();
    assert!(analysis.lookup_top(DeclKind::Event, "ping").is_some());
    assert!(analysis.lookup_top(DeclKind::Event, "pong").is_some());
}

#[test]
fn local_variable_shadows_machine_field() {
    let analysis = analyze_sources(&[
        "machine M { var x: int; fun f() { var x: bool; } start state S { } }",
    ])
    .unwrap();
    let machine = analysis.lookup_top(DeclKind::Machine, "M").unwrap();
    let machine_scope = analysis.decls.machine(machine).scope.unwrap();
    let field = analysis
        .scopes
        .get(machine_scope, DeclKind::Variable, "x")
        .unwrap();

    let function = analysis
        .scopes
        .get(machine_scope, DeclKind::Function, "f")
        .unwrap();
    let fun_scope = analysis.decls.function(function).scope.unwrap();
    let local = analysis
        .scopes
        .get(fun_scope, DeclKind::Variable, "x")
        .unwrap();

    assert_ne!(field, local);
    assert_eq!(
        analysis.scopes.lookup(fun_scope, DeclKind::Variable, "x"),
        Some(local)
    );
}

#[test]
fn duplicate_state_names_in_one_machine_conflict() {
    expect_duplicate(&["machine M { start state S { } state S { } }"], "S");
}

#[test]
fn same_state_name_in_sibling_groups_is_fine() {
    let analysis = analyze_sources(&[
        "machine M { start state Init { } group G1 { state S { } } group G2 { state S { } } }",
    ])
    .unwrap();
    let machine = analysis.lookup_top(DeclKind::Machine, "M").unwrap();
    assert_eq!(analysis.decls.machine(machine).groups.len(), 2);
}

#[test]
fn duplicate_parameters_conflict() {
    expect_duplicate(
        &["machine M { fun f(a: int, a: bool) { } start state S { } }"],
        "a",
    );
}
