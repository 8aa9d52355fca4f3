//! Whole-unit properties: built-ins, determinism, file isolation, and the
//! node/declaration maps.

use relay_binder::{
    Analysis, BindError, DeclKind, StructuralTypeResolver, analyze, validate::validate,
};
use relay_parser::{NodeArena, NodeIndex, parse_source};

fn parse_all(arena: &mut NodeArena, sources: &[&str]) -> Vec<NodeIndex> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            parse_source(arena, format!("file{i}.rly"), *source).expect("parse failed")
        })
        .collect()
}

fn analyze_sources(sources: &[&str]) -> Result<(Vec<NodeIndex>, Analysis), BindError> {
    let mut arena = NodeArena::new();
    let programs = parse_all(&mut arena, sources);
    let mut resolver = StructuralTypeResolver;
    let analysis = analyze(&arena, &programs, &mut resolver)?;
    Ok((programs, analysis))
}

#[test]
fn empty_unit_contains_only_builtin_events() {
    let (_, analysis) = analyze_sources(&[]).unwrap();
    let top = analysis.top_scope;
    assert_eq!(analysis.scopes.all_decls(top).len(), 2);

    for name in ["halt", "null"] {
        let event = analysis.lookup_top(DeclKind::Event, name).unwrap();
        assert_eq!(analysis.decls[event].name, name);
        assert!(analysis.decls[event].node.is_none());
        assert_eq!(analysis.decls.event(event).assume, -1);
        assert_eq!(analysis.decls.event(event).assert, -1);
    }
}

#[test]
fn node_and_declaration_maps_agree_bidirectionally() {
    let (_, analysis) = analyze_sources(&[
        "event e: int; enum C { A, B } machine M { var f: bool; fun act() { } start state S { entry { } on e goto S; } }",
    ])
    .unwrap();

    let mut with_nodes = 0;
    for (id, decl) in analysis.decls.iter() {
        if let Some(node) = decl.node {
            assert_eq!(analysis.node_decl(node), Some(id));
            with_nodes += 1;
        }
    }
    assert_eq!(analysis.node_decls.len(), with_nodes);
}

#[test]
fn program_declarations_are_recorded_in_creation_order() {
    let (programs, analysis) =
        analyze_sources(&["event a; event b;", "machine M { start state S { } }"]).unwrap();

    let first = &analysis.program_decls[&programs[0]];
    let names: Vec<&String> = first.iter().map(|&d| &analysis.decls[d].name).collect();
    assert_eq!(names, ["a", "b"]);

    let second = &analysis.program_decls[&programs[1]];
    let names: Vec<&String> = second.iter().map(|&d| &analysis.decls[d].name).collect();
    assert_eq!(names, ["M", "S"]);
}

#[test]
fn analysis_is_deterministic_across_runs() {
    let sources = [
        "event ping: int; eventset ES = { ping }; interface I = ES;",
        "machine M : I { var x: int; fun f(y: int): bool { return true; } start state S { entry { } on ping goto S; } }",
    ];
    let (_, first) = analyze_sources(&sources).unwrap();
    let (_, second) = analyze_sources(&sources).unwrap();

    assert_eq!(first.decls.len(), second.decls.len());
    for ((id_a, a), (id_b, b)) in first.decls.iter().zip(second.decls.iter()) {
        assert_eq!(id_a, id_b);
        assert_eq!(a, b);
    }
}

#[test]
fn later_unrelated_file_leaves_earlier_declarations_untouched() {
    let base = "event e; machine M { start state S { on e goto S; } }";
    let (programs_a, alone) = analyze_sources(&[base]).unwrap();
    let (programs_b, combined) =
        analyze_sources(&[base, "event extra; machine Other { start state T { } }"]).unwrap();

    let first_ids = &alone.program_decls[&programs_a[0]];
    let combined_ids = &combined.program_decls[&programs_b[0]];
    assert_eq!(first_ids, combined_ids);
    for &id in first_ids {
        assert_eq!(alone.decls[id], combined.decls[id]);
    }
}

#[test]
fn validator_accepts_a_successful_analysis() {
    let (_, analysis) = analyze_sources(&[
        "event tick; enum Mode { Off, On = 4 } \
         machine Clock { var mode: Mode; fun beat(): int { return 0; } \
         start state Run { entry beat; on tick goto Paused.Deep; } \
         group Paused { state Deep { exit { } } } }",
        "spec Sane observes tick { start state Watch { } }",
    ])
    .unwrap();
    validate(&analysis);
}

#[test]
fn failed_analysis_reports_the_first_error() {
    // The stub pass fails on the duplicate event before the binding pass
    // would have reported the unknown goto target.
    let err = analyze_sources(&[
        "event dup; event dup; machine M { start state S { on dup goto Ghost; } }",
    ])
    .unwrap_err();
    assert!(matches!(err, BindError::DuplicateDeclaration { ref name, .. } if name == "dup"));
}

#[test]
fn scope_tree_mirrors_the_nesting_structure() {
    let (programs, analysis) = analyze_sources(&[
        "machine M { fun f() { } start state S { } group G { state T { } } }",
    ])
    .unwrap();

    let top = analysis.top_scope;
    let program_scope = analysis.node_scopes[&programs[0]];
    assert_eq!(program_scope, top);

    let machine = analysis.lookup_top(DeclKind::Machine, "M").unwrap();
    let machine_scope = analysis.decls.machine(machine).scope.unwrap();
    assert_eq!(analysis.scopes.parent(machine_scope), Some(top));
    assert!(analysis.scopes.children(top).contains(&machine_scope));

    let function = analysis
        .scopes
        .get(machine_scope, DeclKind::Function, "f")
        .unwrap();
    let fun_scope = analysis.decls.function(function).scope.unwrap();
    assert_eq!(analysis.scopes.parent(fun_scope), Some(machine_scope));

    let group = analysis
        .scopes
        .get(machine_scope, DeclKind::StateGroup, "G")
        .unwrap();
    let group_scope = analysis.decls.group(group).scope.unwrap();
    assert_eq!(analysis.scopes.parent(group_scope), Some(machine_scope));
    assert!(
        analysis
            .scopes
            .get(group_scope, DeclKind::State, "T")
            .is_some()
    );
}

#[test]
fn states_in_groups_are_not_machine_top_level_states() {
    let (_, analysis) = analyze_sources(&[
        "machine M { start state S { } group G { state T { } group H { state U { } } } }",
    ])
    .unwrap();
    let machine = analysis.lookup_top(DeclKind::Machine, "M").unwrap();
    let data = analysis.decls.machine(machine);
    assert_eq!(data.states.len(), 1);
    assert_eq!(data.groups.len(), 1);

    let g = data.groups[0];
    assert_eq!(analysis.decls.group(g).states.len(), 1);
    assert_eq!(analysis.decls.group(g).groups.len(), 1);
}
