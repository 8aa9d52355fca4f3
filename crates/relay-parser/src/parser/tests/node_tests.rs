use super::*;
use relay_common::Span;
use relay_scanner::SyntaxKind;

#[test]
fn add_and_get_nodes() {
    let mut arena = NodeArena::new();

    let elem = arena.add(
        SyntaxKind::EnumElement,
        Span::new(7, 10),
        NodeData::EnumElement(EnumElementData {
            name: NameRef::new("Red", Span::new(7, 10)),
            value: None,
        }),
    );
    assert_eq!(elem.0, 0);

    let node = arena.get(elem).unwrap();
    assert_eq!(node.kind, SyntaxKind::EnumElement);
    assert_eq!(node.span, Span::new(7, 10));
    assert!(node.has_data());

    let data = arena.get_enum_element(node).unwrap();
    assert_eq!(data.name.text, "Red");
    assert_eq!(data.value, None);
}

#[test]
fn typed_accessor_rejects_other_kinds() {
    let mut arena = NodeArena::new();
    let idx = arena.add(SyntaxKind::EmptyStatement, Span::at(0), NodeData::None);
    assert!(arena.get_enum_element_at(idx).is_none());
    assert!(arena.get_machine_decl_at(idx).is_none());
    assert!(!arena.get(idx).unwrap().has_data());
}

#[test]
fn none_index_resolves_to_nothing() {
    let arena = NodeArena::new();
    assert!(arena.get(NodeIndex::NONE).is_none());
    assert!(NodeIndex::NONE.is_none());
}

#[test]
fn indices_are_sequential() {
    let mut arena = NodeArena::new();
    let a = arena.add(SyntaxKind::EmptyStatement, Span::at(0), NodeData::None);
    let b = arena.add(SyntaxKind::EmptyStatement, Span::at(1), NodeData::None);
    assert_eq!(a.0 + 1, b.0);
    assert_eq!(arena.len(), 2);
}
