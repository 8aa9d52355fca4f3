use super::*;

#[test]
fn new_and_len() {
    let span = Span::new(3, 9);
    assert_eq!(span.len(), 6);
    assert!(!span.is_empty());
    assert!(span.contains(3));
    assert!(span.contains(8));
    assert!(!span.contains(9));
}

#[test]
fn empty_span_at_position() {
    let span = Span::at(5);
    assert!(span.is_empty());
    assert_eq!(span.len(), 0);
    assert!(!span.contains(5));
}

#[test]
fn dummy_span_is_recognized() {
    assert!(Span::dummy().is_dummy());
    assert!(!Span::new(0, 1).is_dummy());
}

#[test]
fn merge_covers_both() {
    let a = Span::new(2, 5);
    let b = Span::new(8, 12);
    assert_eq!(a.merge(b), Span::new(2, 12));
    assert_eq!(b.merge(a), Span::new(2, 12));
}

#[test]
fn slice_is_clamped() {
    let text = "machine M";
    assert_eq!(Span::new(0, 7).slice(text), "machine");
    assert_eq!(Span::new(8, 9).slice(text), "M");
    assert_eq!(Span::new(8, 100).slice(text), "M");
    assert_eq!(Span::dummy().slice(text), "");
}

#[test]
fn spanned_accessors() {
    let span = Span::new(4, 10);
    assert_eq!(Spanned::start(&span), 4);
    assert_eq!(Spanned::end(&span), 10);
}
