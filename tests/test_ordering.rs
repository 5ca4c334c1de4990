mod fixtures;

use fixtures::*;

use pretty_assertions::assert_eq;
use yang_json::order::{ChildQuery, find, insert_position, insert_sorted, linear_match, sort_tree, verify_sorted_tree};
use yang_json::{CodecSettings, Document, NodeId, Schema, parse_str, parse_xml_str};

fn users(schema: &Schema, names: &[(&str, &str)]) -> (Document, NodeId) {
    let members: Vec<String> = names
        .iter()
        .map(|(first, last)| format!(r#"{{"first": "{first}", "last": "{last}", "uid": 1}}"#))
        .collect();
    let text = format!(r#"{{"example:user": [{}]}}"#, members.join(","));
    let parsed = parse_str(&text, Some(schema), &CodecSettings::new()).expect("well-formed");
    assert!(parsed.outcome.is_valid(), "{:?}", parsed.outcome);
    let root = parsed.tree.root();
    (parsed.tree, root)
}

#[test]
fn test_decoded_tree_is_sorted() {
    ensure_env_logger_initialized();
    let schema = example_schema();
    let parsed = parse_xml_str(&read_sample(unsorted_xml()), Some(&schema), &CodecSettings::new()).expect("xml");
    let tree = &parsed.tree;
    assert!(verify_sorted_tree(tree, &schema, tree.root()));
    let order: Vec<_> = tree
        .element_children(parsed.top[0])
        .map(|c| format!("{}={}", tree.name(c), tree.body(c).unwrap_or_default()))
        .collect();
    assert_eq!(order, vec!["hostname=r1", "mtu=1500", "priority=9", "priority=10"]);
}

#[test]
fn test_sort_is_idempotent() {
    ensure_env_logger_initialized();
    let schema = example_schema();
    let (mut doc, root) = users(&schema, &[("c", "x"), ("a", "y"), ("b", "z"), ("a", "a")]);
    let once = doc.children(root).to_vec();
    sort_tree(&mut doc, &schema, root);
    assert_eq!(doc.children(root), once.as_slice());
    assert!(verify_sorted_tree(&doc, &schema, root));
}

#[test]
fn test_binary_search_matches_linear_scan() {
    ensure_env_logger_initialized();
    let schema = example_schema();
    let names = [("ann", "lee"), ("bob", "kim"), ("ann", "ray"), ("eve", "fox"), ("dan", "ng")];
    let (doc, root) = users(&schema, &names);
    let user = doc.schema(doc.child(root, 0).expect("user")).expect("bound");

    let mut queries: Vec<(&str, &str)> = names.to_vec();
    queries.extend([("ann", "zed"), ("aaa", "lee"), ("zzz", "zzz")]);
    for (first, last) in queries {
        let q = ChildQuery::list("user", user, vec![("first", first), ("last", last)]);
        let found = find(&doc, &schema, root, &q);
        assert_eq!(found, linear_match(&doc, &schema, root, &q), "{first} {last}");
        assert_eq!(found.is_some(), names.contains(&(first, last)), "{first} {last}");
    }
}

#[test]
fn test_binary_search_on_empty_and_single_child() {
    ensure_env_logger_initialized();
    let schema = example_schema();
    let (doc, root) = users(&schema, &[("ann", "lee")]);
    let user = doc.schema(doc.child(root, 0).expect("user")).expect("bound");
    let hit = ChildQuery::list("user", user, vec![("first", "ann"), ("last", "lee")]);
    let miss = ChildQuery::list("user", user, vec![("first", "bob"), ("last", "lee")]);
    assert_eq!(find(&doc, &schema, root, &hit), doc.child(root, 0));
    assert_eq!(find(&doc, &schema, root, &miss), None);
    assert_eq!(linear_match(&doc, &schema, root, &miss), None);

    let empty = Document::new("top");
    assert_eq!(find(&empty, &schema, empty.root(), &hit), None);
    assert_eq!(linear_match(&empty, &schema, empty.root(), &hit), None);
    assert_eq!(insert_position(&empty, &schema, empty.root(), &hit, 0, 0), 0);
}

#[test]
fn test_insert_sorted_keeps_order() {
    ensure_env_logger_initialized();
    let schema = example_schema();
    let (mut doc, root) = users(&schema, &[("ann", "lee"), ("eve", "fox")]);
    let (extra, _) = users(&schema, &[("bob", "kim")]);
    let copy = doc.copy_subtree(root, &extra, extra.child(extra.root(), 0).expect("user"));
    let at = insert_sorted(&mut doc, &schema, root, copy);
    assert_eq!(at, 1);
    assert!(verify_sorted_tree(&doc, &schema, root));
    let firsts: Vec<_> = doc
        .element_children(root)
        .map(|u| doc.find_body(u, "first").unwrap_or_default())
        .collect();
    assert_eq!(firsts, vec!["ann", "bob", "eve"]);
}
