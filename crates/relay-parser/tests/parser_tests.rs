use relay_parser::parser::node::{EventsRef, HandlerRef, NodeArena, OnAction, Temperature};
use relay_parser::{NodeIndex, parse_source, walk};
use relay_scanner::SyntaxKind;

fn parse(source: &str) -> (NodeArena, NodeIndex) {
    let mut arena = NodeArena::new();
    let root = parse_source(&mut arena, "test.rly", source).expect("parse failed");
    (arena, root)
}

#[test]
fn parse_event_declaration() {
    let (arena, root) = parse("event ping assert 1 : machine;");
    let program = arena.get_program_at(root).unwrap();
    assert_eq!(program.file_name, "test.rly");
    assert_eq!(program.declarations.len(), 1);

    let event = arena
        .get_event_decl_at(program.declarations.nodes[0])
        .unwrap();
    assert_eq!(event.name.text, "ping");
    let cardinality = event.cardinality.unwrap();
    assert_eq!(cardinality.bound, 1);
    let payload = arena.get_builtin_type_at(event.payload_type.unwrap()).unwrap();
    assert_eq!(
        payload.builtin,
        relay_parser::parser::node::BuiltinType::Machine
    );
}

#[test]
fn parse_event_without_payload() {
    let (arena, root) = parse("event done;");
    let program = arena.get_program_at(root).unwrap();
    let event = arena
        .get_event_decl_at(program.declarations.nodes[0])
        .unwrap();
    assert_eq!(event.name.text, "done");
    assert!(event.cardinality.is_none());
    assert!(event.payload_type.is_none());
}

#[test]
fn parse_enum_with_numbered_elements() {
    let (arena, root) = parse("enum E { X = 3, Y, Z = 10 }");
    let program = arena.get_program_at(root).unwrap();
    let decl = arena.get_enum_decl_at(program.declarations.nodes[0]).unwrap();
    assert_eq!(decl.name.text, "E");
    assert_eq!(decl.elements.len(), 3);

    let x = arena.get_enum_element_at(decl.elements.nodes[0]).unwrap();
    assert_eq!((x.name.text.as_str(), x.value), ("X", Some(3)));
    let y = arena.get_enum_element_at(decl.elements.nodes[1]).unwrap();
    assert_eq!((y.name.text.as_str(), y.value), ("Y", None));
    let z = arena.get_enum_element_at(decl.elements.nodes[2]).unwrap();
    assert_eq!((z.name.text.as_str(), z.value), ("Z", Some(10)));
}

#[test]
fn parse_machine_with_start_state() {
    let (arena, root) = parse("machine M { start state S { entry { } } }");
    let program = arena.get_program_at(root).unwrap();
    let machine = arena
        .get_machine_decl_at(program.declarations.nodes[0])
        .unwrap();
    assert_eq!(machine.name.text, "M");
    assert!(!machine.is_spec);
    assert_eq!(machine.items.len(), 1);

    let state = arena.get_state_decl_at(machine.items.nodes[0]).unwrap();
    assert_eq!(state.name.text, "S");
    assert!(state.is_start);
    assert_eq!(state.temperature, Temperature::Warm);

    let slot = arena.get_handler_slot_at(state.items.nodes[0]).unwrap();
    assert!(matches!(slot.handler, HandlerRef::Anonymous(_)));
}

#[test]
fn parse_machine_prototype() {
    let (arena, root) = parse("machine Worker(int);");
    let program = arena.get_program_at(root).unwrap();
    let proto = arena
        .get_machine_proto_decl_at(program.declarations.nodes[0])
        .unwrap();
    assert_eq!(proto.name.text, "Worker");
    assert!(proto.payload_type.is_some());

    let (arena, root) = parse("machine Bare;");
    let program = arena.get_program_at(root).unwrap();
    let proto = arena
        .get_machine_proto_decl_at(program.declarations.nodes[0])
        .unwrap();
    assert_eq!(proto.name.text, "Bare");
    assert!(proto.payload_type.is_none());
}

#[test]
fn parse_spec_machine_observes() {
    let (arena, root) = parse("spec Watch observes ping, pong { start state Idle { } }");
    let program = arena.get_program_at(root).unwrap();
    let spec = arena
        .get_machine_decl_at(program.declarations.nodes[0])
        .unwrap();
    assert!(spec.is_spec);
    let observed: Vec<_> = spec.observes.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(observed, ["ping", "pong"]);
}

#[test]
fn parse_interface_with_named_and_literal_events() {
    let (arena, root) = parse("interface I(int) = ES;");
    let program = arena.get_program_at(root).unwrap();
    let iface = arena
        .get_interface_decl_at(program.declarations.nodes[0])
        .unwrap();
    assert!(matches!(&iface.events, EventsRef::Named(name) if name.text == "ES"));

    let (arena, root) = parse("interface J = { a, b };");
    let program = arena.get_program_at(root).unwrap();
    let iface = arena
        .get_interface_decl_at(program.declarations.nodes[0])
        .unwrap();
    match &iface.events {
        EventsRef::Literal(events) => {
            let names: Vec<_> = events.iter().map(|n| n.text.as_str()).collect();
            assert_eq!(names, ["a", "b"]);
        }
        EventsRef::Named(_) => panic!("expected literal event list"),
    }
}

#[test]
fn parse_goto_with_qualified_target() {
    let (arena, root) = parse(
        "machine M { start state A { on e goto G1.G2.T; } group G1 { group G2 { state T { } } } }",
    );
    let program = arena.get_program_at(root).unwrap();
    let machine = arena
        .get_machine_decl_at(program.declarations.nodes[0])
        .unwrap();
    let state = arena.get_state_decl_at(machine.items.nodes[0]).unwrap();
    let on = arena.get_on_decl_at(state.items.nodes[0]).unwrap();
    assert_eq!(on.events[0].text, "e");
    match &on.action {
        OnAction::Goto { target, with } => {
            assert!(with.is_none());
            let path = arena.get_qualified_name_at(*target).unwrap();
            let parts: Vec<_> = path.parts.iter().map(|n| n.text.as_str()).collect();
            assert_eq!(parts, ["G1", "G2", "T"]);
        }
        _ => panic!("expected goto action"),
    }
}

#[test]
fn parse_defer_ignore_do_push() {
    let (arena, root) = parse(
        "machine M { start state S { defer a, b; ignore c; on d do f; on e push T; } state T { } fun f() { } }",
    );
    let program = arena.get_program_at(root).unwrap();
    let machine = arena
        .get_machine_decl_at(program.declarations.nodes[0])
        .unwrap();
    let state = arena.get_state_decl_at(machine.items.nodes[0]).unwrap();

    let defer = arena.get_event_list_at(state.items.nodes[0]).unwrap();
    assert_eq!(defer.events.len(), 2);
    assert_eq!(
        arena.kind(state.items.nodes[0]),
        Some(SyntaxKind::DeferDeclaration)
    );
    assert_eq!(
        arena.kind(state.items.nodes[1]),
        Some(SyntaxKind::IgnoreDeclaration)
    );

    let on_do = arena.get_on_decl_at(state.items.nodes[2]).unwrap();
    assert!(matches!(&on_do.action, OnAction::Do(HandlerRef::Named(n)) if n.text == "f"));
    let on_push = arena.get_on_decl_at(state.items.nodes[3]).unwrap();
    assert!(matches!(&on_push.action, OnAction::Push { .. }));
}

#[test]
fn parse_function_with_locals_and_statements() {
    let (arena, root) = parse(
        "machine M { var count: int; fun step(delta: int): int { var next: int; next = count + delta; if (next > 10) { return 10; } return next; } start state S { } }",
    );
    let program = arena.get_program_at(root).unwrap();
    let machine = arena
        .get_machine_decl_at(program.declarations.nodes[0])
        .unwrap();

    assert_eq!(
        arena.kind(machine.items.nodes[0]),
        Some(SyntaxKind::VariableDeclaration)
    );
    let fun = arena.get_function_decl_at(machine.items.nodes[1]).unwrap();
    assert_eq!(fun.name.text, "step");
    assert_eq!(fun.parameters.len(), 1);
    assert!(fun.return_type.is_some());

    let body = arena.get_block_at(fun.body.unwrap()).unwrap();
    assert_eq!(body.statements.len(), 4);
}

#[test]
fn var_list_splits_into_one_node_per_name() {
    let (arena, root) = parse("machine M { var a, b: int; start state S { } }");
    let program = arena.get_program_at(root).unwrap();
    let machine = arena
        .get_machine_decl_at(program.declarations.nodes[0])
        .unwrap();
    let a = arena.get_variable_decl_at(machine.items.nodes[0]).unwrap();
    let b = arena.get_variable_decl_at(machine.items.nodes[1]).unwrap();
    assert_eq!(a.name.text, "a");
    assert_eq!(b.name.text, "b");
    // The declared names share the one parsed type node.
    assert_eq!(a.ty, b.ty);
}

#[test]
fn parse_foreign_declarations() {
    let (arena, root) = parse("type Opaque; fun external(x: int);");
    let program = arena.get_program_at(root).unwrap();
    let ty = arena
        .get_type_def_decl_at(program.declarations.nodes[0])
        .unwrap();
    assert!(ty.ty.is_none());
    let fun = arena
        .get_function_decl_at(program.declarations.nodes[1])
        .unwrap();
    assert!(fun.body.is_none());
}

#[test]
fn parse_annotation_set() {
    let (arena, root) = parse("[main, bound = 4] machine M { start state S { } }");
    let program = arena.get_program_at(root).unwrap();
    assert_eq!(program.declarations.len(), 2);
    let annotations = arena
        .get_annotation_set_at(program.declarations.nodes[0])
        .unwrap();
    let names: Vec<_> = annotations.names.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(names, ["main", "bound"]);
}

#[test]
fn parse_complex_types() {
    let (arena, root) = parse("type Table = map[string, seq[(int, bool)]];");
    let program = arena.get_program_at(root).unwrap();
    let def = arena
        .get_type_def_decl_at(program.declarations.nodes[0])
        .unwrap();
    let map = arena.get_map_type_at(def.ty.unwrap()).unwrap();
    let seq = arena.get_seq_type_at(map.value).unwrap();
    let tuple = arena.get_tuple_type_at(seq.element).unwrap();
    assert_eq!(tuple.elements.len(), 2);
}

#[test]
fn syntax_error_reports_file_and_location() {
    let mut arena = NodeArena::new();
    let err = parse_source(&mut arena, "bad.rly", "machine { }").unwrap_err();
    assert_eq!(err.file, "bad.rly");
    assert!(err.message.contains("identifier"));
}

#[test]
fn walk_visits_nodes_in_document_order() {
    struct Collect {
        entered: Vec<SyntaxKind>,
        exited: Vec<SyntaxKind>,
    }
    impl relay_parser::Visitor for Collect {
        type Error = std::convert::Infallible;
        fn enter(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error> {
            self.entered.push(arena.kind(idx).unwrap());
            Ok(())
        }
        fn exit(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error> {
            self.exited.push(arena.kind(idx).unwrap());
            Ok(())
        }
    }

    let (arena, root) = parse("event e; machine M { start state S { entry { } } }");
    let mut collect = Collect {
        entered: Vec::new(),
        exited: Vec::new(),
    };
    walk(&arena, root, &mut collect).unwrap();

    assert_eq!(collect.entered[0], SyntaxKind::Program);
    assert_eq!(collect.entered[1], SyntaxKind::EventDeclaration);
    assert_eq!(*collect.exited.last().unwrap(), SyntaxKind::Program);
    // Every enter has a matching exit.
    assert_eq!(collect.entered.len(), collect.exited.len());

    let machine_pos = collect
        .entered
        .iter()
        .position(|&k| k == SyntaxKind::MachineDeclaration)
        .unwrap();
    let state_pos = collect
        .entered
        .iter()
        .position(|&k| k == SyntaxKind::StateDeclaration)
        .unwrap();
    let handler_pos = collect
        .entered
        .iter()
        .position(|&k| k == SyntaxKind::AnonymousHandler)
        .unwrap();
    assert!(machine_pos < state_pos && state_pos < handler_pos);
}

#[test]
fn walk_aborts_on_visitor_error() {
    struct FailOnState;
    impl relay_parser::Visitor for FailOnState {
        type Error = &'static str;
        fn enter(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error> {
            if arena.kind(idx) == Some(SyntaxKind::StateDeclaration) {
                Err("stop")
            } else {
                Ok(())
            }
        }
        fn exit(&mut self, _arena: &NodeArena, _idx: NodeIndex) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    let (arena, root) = parse("machine M { start state S { } }");
    assert_eq!(walk(&arena, root, &mut FailOnState), Err("stop"));
}
