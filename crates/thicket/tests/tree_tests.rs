//! Node store tests

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use thicket::*;

fn sample() -> ParseTree {
    // msg(add(@a, 1), concat(@b, @a))
    ParseTree::call(
        "msg",
        vec![
            ParseTree::call("add", vec![ParseTree::variable("@a"), ParseTree::int(1)]),
            ParseTree::call(
                "concat",
                vec![ParseTree::variable("@b"), ParseTree::variable("@a")],
            ),
        ],
    )
}

// ═══════════════════════════════════════════════════════════════════════
// Derived Facts
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_symbols_in_first_seen_order() {
    let tree = sample();
    assert_eq!(tree.callable_symbols(), vec!["msg", "add", "concat"]);
    assert_eq!(tree.referenced_variables(), vec!["@a", "@b"]);
    assert!(tree.is_cached(FactKind::Functions));
    assert!(tree.is_cached(FactKind::Variables));
}

#[test]
fn test_returned_list_is_a_copy() {
    let tree = sample();
    let mut symbols = tree.callable_symbols();
    symbols.clear();
    symbols.push("bogus".to_string());
    assert_eq!(tree.callable_symbols(), vec!["msg", "add", "concat"]);
}

#[test]
fn test_adding_a_child_refreshes_facts() {
    let mut tree = sample();
    assert_eq!(tree.callable_symbols().len(), 3);

    tree.add_child(ParseTree::call("dyn", vec![ParseTree::variable("@c")]));
    assert!(!tree.is_cached(FactKind::Functions));
    assert_eq!(tree.callable_symbols(), vec!["msg", "add", "concat", "dyn"]);
    assert_eq!(tree.referenced_variables(), vec!["@a", "@b", "@c"]);
}

#[test]
fn test_deep_edit_refreshes_root() {
    let mut tree = sample();
    let _ = tree.referenced_variables();

    tree.child_mut(0)
        .unwrap()
        .set_children(vec![ParseTree::variable("@z")]);
    assert_eq!(tree.referenced_variables(), vec!["@z", "@b", "@a"]);
}

#[test]
fn test_concurrent_readers_agree() {
    let tree = Arc::new(sample());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || tree.callable_symbols())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec!["msg", "add", "concat"]);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Child Editing
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_insert_and_remove_children() {
    let mut tree = ParseTree::call("array", vec![ParseTree::int(1), ParseTree::int(3)]);
    tree.add_child_at(1, ParseTree::int(2)).unwrap();
    assert_eq!(tree.to_text(), "array(1,2,3)");

    let removed = tree.remove_child_at(0).unwrap();
    assert_eq!(removed.value(), Some(&Value::Int(1)));
    assert_eq!(tree.to_text(), "array(2,3)");

    assert_eq!(
        tree.add_child_at(5, ParseTree::int(9)),
        Err(TreeError::IndexOutOfBounds { index: 5, len: 2 })
    );

    tree.remove_all_children();
    assert!(!tree.has_children());
}

// ═══════════════════════════════════════════════════════════════════════
// Rendering and Positions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_to_text_escapes_strings() {
    let tree = ParseTree::call(
        "msg",
        vec![ParseTree::string("tab\there\nquote'back\\slash")],
    );
    assert_eq!(tree.to_text(), "msg('tab\\there\\nquote\\'back\\\\slash')");
}

#[test]
fn test_literal_kinds_render() {
    let tree = ParseTree::call(
        "array",
        vec![
            ParseTree::null(),
            ParseTree::boolean(true),
            ParseTree::literal(1.5),
            ParseTree::variable("@v"),
        ],
    );
    assert_eq!(tree.to_text(), "array(null,true,1.5,@v)");
}

#[test]
fn test_target_display_and_file() {
    let target = Target::new(3, 14, Some(PathBuf::from("main.ms")));
    assert_eq!(target.file(), Some(PathBuf::from("main.ms").as_path()));
    assert!(!target.is_unknown());
    assert!(Target::unknown().is_unknown());

    let node = ParseTree::int(1).at(target.clone());
    assert_eq!(node.target(), &target);
}
