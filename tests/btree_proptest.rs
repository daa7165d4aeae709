//! Property tests: the tree against an in-memory model.

use bplusdb::{BPlusTree, Error, TreeConfig};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tempfile::tempdir;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8, i32),
    Delete(u8, i32),
}

fn key_text(k: u8) -> String {
    // Mix lengths and shared prefixes
    match k % 3 {
        0 => format!("k{}", k),
        1 => format!("k{}x", k / 3),
        _ => "k".repeat(usize::from(k % 5) + 1),
    }
}

fn insert_strategy() -> impl Strategy<Value = Op> {
    (0u8..24, -50i32..50).prop_map(|(k, v)| Op::Insert(k, v))
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => insert_strategy(),
        1 => (0u8..24, -50i32..50).prop_map(|(k, v)| Op::Delete(k, v)),
    ]
}

fn small_tree() -> (BPlusTree, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let config = TreeConfig::new()
        .with_max_key_len(8)
        .with_leaf_capacity(4)
        .with_internal_fanout(4);
    let tree = BPlusTree::create(dir.path().join("prop.db"), config).unwrap();
    (tree, dir)
}

/// Apply `ops` to both the tree and the model, checking each outcome.
fn apply(tree: &mut BPlusTree, model: &mut BTreeMap<String, BTreeSet<i32>>, ops: &[Op]) {
    for op in ops {
        match *op {
            Op::Insert(k, v) => {
                let text = key_text(k);
                let fresh = model.entry(text.clone()).or_default().insert(v);
                match tree.insert(&text, v) {
                    Ok(()) => assert!(fresh, "insert of existing ({text}, {v}) succeeded"),
                    Err(Error::DuplicateEntry { .. }) => {
                        assert!(!fresh, "fresh ({text}, {v}) reported duplicate")
                    }
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            Op::Delete(k, v) => {
                let text = key_text(k);
                let present = model.get_mut(&text).is_some_and(|set| set.remove(&v));
                match tree.delete(&text, v) {
                    Ok(()) => assert!(present, "delete of absent ({text}, {v}) succeeded"),
                    Err(Error::NotFound { .. }) => {
                        assert!(!present, "present ({text}, {v}) reported not found")
                    }
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Without deletions, `find` returns exactly the model's values.
    #[test]
    fn find_matches_model_for_inserts(ops in prop::collection::vec(insert_strategy(), 1..300)) {
        let (mut tree, _dir) = small_tree();
        let mut model = BTreeMap::new();
        apply(&mut tree, &mut model, &ops);

        let shape = tree.check().unwrap();
        let total: usize = model.values().map(BTreeSet::len).sum();
        prop_assert_eq!(shape.entries, total as u64);

        for k in 0u8..24 {
            let text = key_text(k);
            let expected: Vec<i32> = model
                .get(&text)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();
            prop_assert_eq!(tree.find(&text).unwrap(), expected);
        }
    }

    /// With deletions, exact membership always agrees with the model and
    /// `find` never reports a value that is not stored.
    #[test]
    fn mixed_operations_stay_consistent(ops in prop::collection::vec(op_strategy(), 1..400)) {
        let (mut tree, _dir) = small_tree();
        let mut model = BTreeMap::new();
        apply(&mut tree, &mut model, &ops);

        let shape = tree.check().unwrap();
        let total: usize = model.values().map(BTreeSet::len).sum();
        prop_assert_eq!(shape.entries, total as u64);

        for k in 0u8..24 {
            let text = key_text(k);
            let stored = model.get(&text).cloned().unwrap_or_default();
            for v in -50..50 {
                prop_assert_eq!(tree.contains(&text, v).unwrap(), stored.contains(&v));
            }

            let found = tree.find(&text).unwrap();
            prop_assert!(found.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(found.iter().all(|v| stored.contains(v)));
        }
    }

    /// Reopening reproduces the same contents.
    #[test]
    fn reopen_preserves_contents(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prop.db");
        let config = TreeConfig::new()
            .with_max_key_len(8)
            .with_leaf_capacity(3)
            .with_internal_fanout(4);

        let mut model = BTreeMap::new();
        let before: Vec<Vec<i32>>;
        {
            let mut tree = BPlusTree::create(&path, config).unwrap();
            apply(&mut tree, &mut model, &ops);
            before = (0u8..24).map(|k| tree.find(&key_text(k)).unwrap()).collect();
            tree.close().unwrap();
        }

        let mut tree = BPlusTree::open(&path, config).unwrap();
        tree.check().unwrap();
        let after: Vec<Vec<i32>> = (0u8..24).map(|k| tree.find(&key_text(k)).unwrap()).collect();
        prop_assert_eq!(before, after);
    }
}
