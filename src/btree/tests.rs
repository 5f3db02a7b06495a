//! Scenario and property tests for the multiway tree

#[cfg(test)]
mod tests {
    use crate::btree::{DEFAULT_DEGREE, InsertOutcome, MultiwayTree, Node, TreeError, TreeKey};

    fn scenario_tree() -> MultiwayTree {
        let values = [3, 31, 20, 13, 16, 28, 44, 11];
        let mut tree = MultiwayTree::new(values[0], 3).unwrap();
        tree.insert_many(values[1..].iter().copied()).unwrap();
        tree
    }

    fn build(keys: &[TreeKey], degree: usize) -> MultiwayTree {
        let mut tree = MultiwayTree::new(keys[0], degree).unwrap();
        tree.insert_many(keys[1..].iter().copied()).unwrap();
        tree
    }

    #[test]
    fn test_new_tree() {
        let tree = MultiwayTree::new(42, 4).unwrap();
        assert!(!tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.degree(), 4);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.root().is_leaf());
        assert!(tree.contains(42).unwrap());
    }

    #[test]
    fn test_default_degree() {
        let tree = MultiwayTree::with_default_degree(1);
        assert_eq!(tree.degree(), DEFAULT_DEGREE);
        tree.validate().unwrap();
    }

    #[test]
    fn test_invalid_degree() {
        assert_eq!(
            MultiwayTree::new(1, 2).unwrap_err(),
            TreeError::InvalidDegree(2)
        );
        assert!(MultiwayTree::new(1, 1).is_err());
        assert!(MultiwayTree::new(1, 0).is_err());
        assert!(MultiwayTree::new(1, 3).is_ok());
    }

    #[test]
    fn test_scenario_degree_3() {
        let tree = scenario_tree();

        assert_eq!(tree.root().key_count(), 1);
        assert_eq!(tree.root().keys, vec![20]);
        assert_eq!(
            tree.iter().collect::<Vec<_>>(),
            vec![3, 11, 13, 16, 20, 28, 31, 44]
        );
        assert_eq!(
            tree.dump(),
            "|[K]20[K]|\n|[K]13[K]||[K]31[K]|\n|[N]3[N]11[N]||[N]16[N]||[N]28[N]||[N]44[N]|"
        );
        assert_eq!(tree.height(), 3);
        tree.validate().unwrap();
    }

    #[test]
    fn test_scenario_search() {
        let tree = scenario_tree();

        assert!(tree.contains(16).unwrap());
        assert!(!tree.contains(17).unwrap());
        for key in [3, 11, 13, 16, 20, 28, 31, 44] {
            assert!(tree.contains(key).unwrap(), "missing {}", key);
        }
        for key in [-1, 0, 12, 21, 45, 100] {
            assert!(!tree.contains(key).unwrap(), "unexpected {}", key);
        }
    }

    #[test]
    fn test_search_reports_insertion_point() {
        let tree = scenario_tree();

        let hit = tree.search(20).unwrap();
        assert!(hit.found);
        assert_eq!(hit.node, tree.root_id());
        assert_eq!(hit.index, 0);

        let miss = tree.search(12).unwrap();
        assert!(!miss.found);
        let leaf = tree.node(miss.node).unwrap();
        assert!(leaf.is_leaf());
        assert_eq!(leaf.keys, vec![3, 11]);
        assert_eq!(miss.index, 2);

        let miss = tree.search(50).unwrap();
        assert_eq!(tree.node(miss.node).unwrap().keys, vec![44]);
        assert_eq!(miss.index, 1);
    }

    #[test]
    fn test_first_split_creates_two_levels() {
        let mut tree = MultiwayTree::new(1, 3).unwrap();

        tree.insert_many([2, 3]).unwrap();

        assert_eq!(tree.height(), 2);
        assert_eq!(tree.levels(), vec![vec![vec![2]], vec![vec![1], vec![3]]]);
        let root = tree.root();
        assert!(root.is_root());
        for &child in &root.children {
            assert_eq!(tree.node(child).unwrap().parent, Some(tree.root_id()));
        }
        tree.validate().unwrap();
    }

    #[test]
    fn test_no_split_below_degree() {
        let mut tree = MultiwayTree::new(10, 4).unwrap();

        tree.insert_many([20, 30]).unwrap();

        assert_eq!(tree.height(), 1);
        assert_eq!(tree.root().keys, vec![10, 20, 30]);
    }

    #[test]
    fn test_split_median_even_degree() {
        let tree = build(&[1, 2, 3, 4], 4);
        assert_eq!(tree.levels(), vec![vec![vec![3]], vec![vec![1, 2], vec![4]]]);
    }

    #[test]
    fn test_split_propagates_to_new_root() {
        let tree = build(&(1..=15).collect::<Vec<TreeKey>>(), 3);

        assert_eq!(tree.height(), 4);
        assert_eq!(
            tree.dump().lines().collect::<Vec<_>>(),
            vec![
                "|[K]8[K]|",
                "|[K]4[K]||[K]12[K]|",
                "|[K]2[K]||[K]6[K]||[K]10[K]||[K]14[K]|",
                "|[N]1[N]||[N]3[N]||[N]5[N]||[N]7[N]||[N]9[N]||[N]11[N]||[N]13[N]||[N]15[N]|",
            ]
        );
        tree.validate().unwrap();
    }

    #[test]
    fn test_split_propagates_degree_5() {
        let tree = build(&(1..=20).collect::<Vec<TreeKey>>(), 5);

        assert_eq!(
            tree.levels(),
            vec![
                vec![vec![9]],
                vec![vec![3, 6], vec![12, 15, 18]],
                vec![
                    vec![1, 2],
                    vec![4, 5],
                    vec![7, 8],
                    vec![10, 11],
                    vec![13, 14],
                    vec![16, 17],
                    vec![19, 20],
                ],
            ]
        );
        tree.validate().unwrap();
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let mut tree = scenario_tree();
        let before = tree.dump();
        let nodes_before = tree.node_count();

        assert_eq!(tree.insert(16).unwrap(), InsertOutcome::DuplicateIgnored);
        assert_eq!(tree.insert_many([3, 20, 44]).unwrap(), 0);

        assert_eq!(tree.dump(), before);
        assert_eq!(tree.node_count(), nodes_before);
        assert_eq!(tree.len(), 8);
    }

    #[test]
    fn test_insert_many_counts_new_keys() {
        let mut tree = MultiwayTree::new(5, 3).unwrap();
        assert_eq!(tree.insert_many([1, 5, 9, 1, 7]).unwrap(), 3);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_negative_keys() {
        let tree = build(&[0, -5, 10, -20, 15, -1, 3, i64::MIN, i64::MAX], 3);

        assert_eq!(
            tree.iter().collect::<Vec<_>>(),
            vec![i64::MIN, -20, -5, -1, 0, 3, 10, 15, i64::MAX]
        );
        assert!(tree.contains(i64::MIN).unwrap());
        tree.validate().unwrap();
    }

    #[test]
    fn test_insertion_order_changes_shape_but_not_keys() {
        let ascending = build(&[1, 2, 3, 4], 3);
        let descending = build(&[4, 3, 2, 1], 3);

        assert_eq!(ascending.levels(), vec![vec![vec![2]], vec![vec![1], vec![3, 4]]]);
        assert_eq!(descending.levels(), vec![vec![vec![3]], vec![vec![1, 2], vec![4]]]);
        assert!(ascending.iter().eq(descending.iter()));
    }

    #[test]
    fn test_same_shape_for_three_keys() {
        let orders: [[TreeKey; 3]; 6] = [[1, 2, 3], [3, 2, 1], [2, 1, 3], [2, 3, 1], [1, 3, 2], [3, 1, 2]];
        let expected = build(&orders[0], 3).dump();
        for order in &orders[1..] {
            assert_eq!(build(order, 3).dump(), expected, "order {:?}", order);
        }
    }

    #[test]
    fn test_large_tree() {
        let mut tree = MultiwayTree::new(0, 4).unwrap();

        // Permutation of 1..1000; 7919 is coprime with 1000
        let keys: Vec<TreeKey> = (1..1000).map(|i| (i * 7919) % 1000).collect();
        tree.insert_many(keys).unwrap();

        assert_eq!(tree.len(), 1000);
        assert!(tree.iter().eq(0..1000));
        tree.validate().unwrap();
        assert!(tree.height() <= 10);
    }

    #[test]
    fn test_into_iterator() {
        let tree = scenario_tree();
        let mut sum = 0;
        for key in &tree {
            sum += key;
        }
        assert_eq!(sum, 3 + 11 + 13 + 16 + 20 + 28 + 31 + 44);
    }

    #[test]
    fn test_display_matches_dump() {
        let tree = scenario_tree();
        assert_eq!(format!("{}", tree), tree.dump());
    }

    #[test]
    fn test_contains_reports_dangling_child() {
        let nodes = vec![
            Node::with_entries(3, vec![10], vec![1, 7], None),
            Node::with_entries(3, vec![5], Vec::new(), Some(0)),
        ];
        let tree = MultiwayTree::from_raw_parts(0, 3, nodes);

        assert!(tree.contains(5).unwrap());
        assert_eq!(tree.contains(20).unwrap_err(), TreeError::NodeNotFound(7));
    }

    #[test]
    fn test_failed_split_keeps_len() {
        let nodes = vec![Node::with_entries(3, vec![1, 2], Vec::new(), Some(9))];
        let mut tree = MultiwayTree::from_raw_parts(0, 3, nodes);
        assert_eq!(tree.len(), 2);

        assert_eq!(tree.insert(3).unwrap_err(), TreeError::NodeNotFound(9));
        assert_eq!(tree.len(), 2);
    }

    mod proptest_tree {
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        use crate::btree::{MultiwayTree, TreeKey};

        fn arb_keys(max_count: usize) -> impl Strategy<Value = Vec<TreeKey>> {
            proptest::collection::vec(-500i64..500, 1..max_count)
        }

        fn build(keys: &[TreeKey], degree: usize) -> MultiwayTree {
            let mut tree = MultiwayTree::new(keys[0], degree).unwrap();
            tree.insert_many(keys[1..].iter().copied()).unwrap();
            tree
        }

        fn leaf_depths(tree: &MultiwayTree) -> BTreeSet<usize> {
            let mut depths = BTreeSet::new();
            for (depth, level) in tree.level_ids().iter().enumerate() {
                for &id in level {
                    if tree.node(id).unwrap().is_leaf() {
                        depths.insert(depth);
                    }
                }
            }
            depths
        }

        proptest! {
            /// In-order traversal yields the distinct inserted keys in ascending order.
            #[test]
            fn prop_in_order_is_sorted_distinct(keys in arb_keys(300), degree in 3usize..9) {
                let tree = build(&keys, degree);
                let expected: Vec<TreeKey> = keys.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

                prop_assert_eq!(tree.iter().collect::<Vec<_>>(), expected.clone());
                prop_assert_eq!(tree.len(), expected.len());
                tree.validate().unwrap();
            }

            /// No node ever holds degree or more keys.
            #[test]
            fn prop_degree_bound(keys in arb_keys(300), degree in 3usize..9) {
                let tree = build(&keys, degree);
                for level in tree.level_ids() {
                    for id in level {
                        prop_assert!(tree.node(id).unwrap().key_count() < degree);
                    }
                }
            }

            /// Every leaf sits at the same depth.
            #[test]
            fn prop_height_uniform(keys in arb_keys(300), degree in 3usize..9) {
                let tree = build(&keys, degree);
                let depths = leaf_depths(&tree);
                prop_assert_eq!(depths.len(), 1);
                prop_assert_eq!(depths.into_iter().next(), Some(tree.height() - 1));
            }

            /// Re-inserting present keys leaves the tree untouched.
            #[test]
            fn prop_duplicate_insert_idempotent(keys in arb_keys(200), degree in 3usize..9) {
                let mut tree = build(&keys, degree);
                let dump = tree.dump();
                let nodes = tree.node_count();

                prop_assert_eq!(tree.insert_many(keys.iter().copied()).unwrap(), 0);
                prop_assert_eq!(tree.dump(), dump);
                prop_assert_eq!(tree.node_count(), nodes);
            }

            /// Any insertion order produces the same key sequence.
            #[test]
            fn prop_order_independent_keys(keys in arb_keys(200), degree in 3usize..9) {
                let forward = build(&keys, degree);
                let reversed: Vec<TreeKey> = keys.iter().rev().copied().collect();
                let backward = build(&reversed, degree);

                prop_assert!(forward.iter().eq(backward.iter()));
            }

            /// Every inserted key is found and absent keys are not.
            #[test]
            fn prop_contains(keys in arb_keys(200), needle in -600i64..600, degree in 3usize..9) {
                let tree = build(&keys, degree);
                prop_assert_eq!(tree.contains(needle).unwrap(), keys.contains(&needle));
            }
        }
    }
}
