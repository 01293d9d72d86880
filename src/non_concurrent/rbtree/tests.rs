use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

use quickcheck_macros::quickcheck;

use super::*;
use crate::logging::init_test_logging;


fn values<T: Clone>(tree: &RBTree<T>) -> Vec<T> {
    tree.iter().cloned().collect()
}

/// Inserts one by one with uniqueness on, checking every invariant after each step.
fn build_checked(input: &[i32]) -> RBTree<i32> {
    let mut tree = RBTree::new();
    for &v in input {
        tree.insert(v, true).unwrap();
        tree.verify().unwrap();
    }
    tree
}

#[test]
fn seven_values_come_out_sorted() {
    init_test_logging();
    let tree = build_checked(&[10, 5, 15, 3, 7, 12, 18]);

    assert_eq!(values(&tree), [3, 5, 7, 10, 12, 15, 18]);
    assert_eq!(tree.len(), 7);
    assert_eq!(tree.verify_red_black(), Ok(()));
    assert_eq!(unsafe { Node::color(tree.root) }, node::Color::Black);
}

#[test]
fn ascending_input_stays_balanced() {
    let tree = build_checked(&[1, 2, 3, 4, 5]);

    let bound = 2.0 * (tree.len() as f64 + 1.0).log2();
    assert!((tree.height() as f64) <= bound, "height {} exceeds {bound}", tree.height());
    assert!(tree.height() < 5, "the tree degenerated into a list");
}

#[test]
fn long_ascending_run_stays_balanced() {
    let tree = RBTree::from_iter(0..10_000);
    tree.verify().unwrap();
    let bound = 2.0 * (tree.len() as f64 + 1.0).log2();
    assert!((tree.height() as f64) <= bound);
}

#[test]
fn erasing_the_root_returns_its_successor() {
    let mut tree = build_checked(&[10, 5, 15, 3, 7, 12, 18]);
    let root_value = unsafe { *Node::value(tree.root.unwrap()) };
    let expected = values(&tree).into_iter().find(|&v| v > root_value);

    let root = tree.root;
    let mut cursor = CursorMut::new(&mut tree, root);
    assert_eq!(cursor.erase(), Some(root_value));
    assert_eq!(cursor.get().copied(), expected);

    assert_eq!(tree.len(), 6);
    tree.verify().unwrap();
    assert!(!tree.contains(&root_value));
}

#[test]
fn erasing_begin_until_empty() {
    let mut tree = build_checked(&[8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15]);
    let mut cursor = tree.begin_mut();
    let mut expected = 1;
    while let Some(v) = cursor.erase() {
        assert_eq!(v, expected);
        expected += 1;
    }
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert!(tree.begin().is_end());
}

#[test]
fn every_erase_case_keeps_invariants() {
    // erase each value of a fixed tree in isolation, which hits leaves, single-child nodes and
    // two-child nodes in both colors
    let input: Vec<i32> = (1..=31).map(|i| (i * 17) % 32).collect();
    let reference = build_checked(&input);

    for &target in &input {
        let mut tree = reference.clone();
        let next = values(&tree).into_iter().find(|&v| v > target);

        let mut cursor = tree.find_mut(&target);
        assert_eq!(cursor.erase(), Some(target));
        assert_eq!(cursor.get().copied(), next);

        tree.verify().unwrap();
        assert_eq!(tree.len(), input.len() - 1);
        assert!(!tree.contains(&target));
    }
}

#[test]
fn unique_insert_returns_the_existing_value() {
    let mut tree = RBTree::new();
    let (cursor, inserted) = tree.insert(String::from("a"), true).unwrap();
    assert!(inserted);
    assert_eq!(cursor.get().map(String::as_str), Some("a"));

    let node = cursor.node;

    let (cursor, inserted) = tree.insert(String::from("a"), true).unwrap();
    assert!(!inserted);
    assert_eq!(cursor.node, node);
    assert_eq!(tree.find("a").node, node);
    assert_eq!(tree.len(), 1);
}

#[test]
fn duplicates_are_kept_in_insertion_order() {
    #[derive(Debug, Clone)]
    struct Tagged(i32, usize);
    impl PartialEq for Tagged { fn eq(&self, o: &Self) -> bool { self.0 == o.0 } }
    impl Eq for Tagged {}
    impl PartialOrd for Tagged { fn partial_cmp(&self, o: &Self) -> Option<Ordering> { Some(self.cmp(o)) } }
    impl Ord for Tagged { fn cmp(&self, o: &Self) -> Ordering { self.0.cmp(&o.0) } }

    let mut tree = RBTree::new();
    for (i, v) in [5, 3, 5, 5, 1, 3, 5].into_iter().enumerate() {
        let (_, inserted) = tree.insert(Tagged(v, i), false).unwrap();
        assert!(inserted);
        tree.verify().unwrap();
    }

    assert_eq!(tree.len(), 7);
    let order: Vec<_> = tree.iter().map(|t| (t.0, t.1)).collect();
    assert_eq!(order, [(1, 4), (3, 1), (3, 5), (5, 0), (5, 2), (5, 3), (5, 6)]);
}

#[test]
fn find_misses_return_end() {
    let tree = RBTree::from([2, 4, 6]);
    assert!(tree.find(&3).is_end());
    assert_eq!(tree.find(&4).get(), Some(&4));
    assert!(RBTree::<i32>::new().find(&1).is_end());
}

#[test]
fn failed_allocation_leaves_the_tree_alone() {
    init_test_logging();
    let mut tree = build_checked(&[4, 2, 6]);
    let before = values(&tree);

    alloc_failure::fail_next_allocation();
    let err = tree.insert(5, false).map(|_| ()).unwrap_err();
    assert!(matches!(err, RBTreeError::OutOfMemory(_)));
    assert_eq!(values(&tree), before);
    tree.verify().unwrap();

    // a unique collision never allocates, so the armed failure is still pending for the next one
    alloc_failure::fail_next_allocation();
    let (_, inserted) = tree.insert(4, true).unwrap();
    assert!(!inserted);
    assert!(tree.insert(5, false).is_err());
    assert!(tree.insert(5, false).is_ok());
    assert_eq!(values(&tree), [2, 4, 5, 6]);
}

#[test]
fn failed_clone_frees_the_partial_copy() {
    thread_local! { static LIVE: Cell<usize> = const { Cell::new(0) }; }

    #[derive(PartialEq, Eq, PartialOrd, Ord)]
    struct Counted(i32);
    impl Counted {
        fn new(v: i32) -> Self {
            LIVE.with(|l| l.set(l.get() + 1));
            Counted(v)
        }
    }
    impl Clone for Counted {
        fn clone(&self) -> Self { Counted::new(self.0) }
    }
    impl Drop for Counted {
        fn drop(&mut self) { LIVE.with(|l| l.set(l.get() - 1)) }
    }

    let tree = RBTree::from_iter((0..5).map(Counted::new));
    assert_eq!(LIVE.with(Cell::get), 5);

    // the first two nodes of the copy get built, the third allocation fails
    alloc_failure::fail_after(2);
    let err = tree.try_clone().map(|_| ()).unwrap_err();
    assert!(matches!(err, RBTreeError::OutOfMemory(_)));
    assert_eq!(LIVE.with(Cell::get), 5);

    let copy = tree.try_clone().unwrap();
    assert_eq!(LIVE.with(Cell::get), 10);
    drop(copy);
    drop(tree);
    assert_eq!(LIVE.with(Cell::get), 0);
}

#[test]
fn clone_keeps_shape_and_colors() {
    let tree = build_checked(&[50, 20, 80, 10, 30, 70, 90, 25]);
    let copy = tree.clone();
    copy.verify().unwrap();
    assert_eq!(tree, copy);
    assert_eq!(tree.height(), copy.height());
    assert_eq!(tree.black_height(), copy.black_height());
}

#[test]
fn swap_and_take_move_everything() {
    let mut a = RBTree::from([1, 2, 3]);
    let mut b = RBTree::from([9]);
    a.swap(&mut b);
    assert_eq!(values(&a), [9]);
    assert_eq!(values(&b), [1, 2, 3]);

    let moved = std::mem::take(&mut b);
    assert!(b.is_empty());
    assert_eq!(moved.len(), 3);
    moved.verify().unwrap();
}

#[test]
fn clear_drops_every_value() {
    let marker = Rc::new(());
    let mut tree = RBTree::new();
    for i in 0..100 {
        tree.insert((i, Rc::clone(&marker)), false).unwrap();
    }
    assert_eq!(Rc::strong_count(&marker), 101);
    tree.clear();
    assert_eq!(Rc::strong_count(&marker), 1);
    assert!(tree.is_empty());
    tree.clear();
    assert!(tree.is_empty());
}

#[test]
fn erase_and_reinsert_restores_the_multiset() {
    let mut tree = build_checked(&[7, 3, 11, 1, 5, 9, 13]);
    let before = values(&tree);
    for v in before.clone() {
        assert_eq!(tree.remove(&v), Some(v));
        tree.verify().unwrap();
        tree.insert(v, true).unwrap();
        tree.verify().unwrap();
        assert_eq!(values(&tree), before);
    }
}

#[quickcheck]
fn inserts_keep_every_invariant(input: Vec<i16>, unique: bool) -> bool {
    let mut tree = RBTree::new();
    let mut inserted = 0;
    for v in input.iter().copied() {
        let (cursor, was_inserted) = tree.insert(v, unique).unwrap();
        if cursor.get() != Some(&v) { return false }
        inserted += was_inserted as usize;
        if tree.verify().is_err() { return false }
    }

    let mut expected = input.clone();
    expected.sort();
    if unique { expected.dedup() }

    tree.len() == inserted && values(&tree) == expected
}

#[quickcheck]
fn mixed_operations_match_a_model(ops: Vec<(bool, u8)>) -> bool {
    let mut tree = RBTree::new();
    let mut model = BTreeMap::<u8, usize>::new();

    for (insert, v) in ops {
        if insert {
            tree.insert(v, false).unwrap();
            *model.entry(v).or_default() += 1;
        } else {
            let removed = tree.remove(&v);
            let expected = match model.get_mut(&v) {
                Some(n) => {
                    *n -= 1;
                    if *n == 0 { model.remove(&v); }
                    Some(v)
                }
                None => None,
            };
            if removed != expected { return false }
        }
        if tree.verify().is_err() { return false }
    }

    let expected: Vec<u8> = model.iter().flat_map(|(&v, &n)| std::iter::repeat_n(v, n)).collect();
    values(&tree) == expected
}

#[quickcheck]
fn backward_walk_is_the_reverse(input: Vec<i32>) -> bool {
    let tree = RBTree::from_iter(input);

    let mut backward = vec![];
    let mut cursor = tree.last();
    while let Some(&v) = cursor.get() {
        backward.push(v);
        cursor.move_prev();
    }
    backward.reverse();

    let reversed: Vec<_> = tree.iter().rev().copied().collect();
    backward == values(&tree) && reversed.iter().rev().eq(tree.iter())
}

#[quickcheck]
fn erasing_through_a_cursor_yields_successors(input: Vec<u16>, picks: Vec<usize>) -> bool {
    let mut tree = RBTree::from_iter(input);
    for pick in picks {
        if tree.is_empty() { break }
        let all = values(&tree);
        let index = pick % all.len();
        // step to the `index`th node, so duplicates are told apart by position
        let mut cursor = tree.begin_mut();
        for _ in 0..index { cursor.move_next() }

        if cursor.erase() != Some(all[index]) { return false }
        if cursor.get() != all.get(index + 1) { return false }
        if tree.verify().is_err() { return false }
    }
    true
}

#[test]
fn long_random_mix_matches_a_sorted_vec() {
    init_test_logging();
    // xorshift, so the run is the same every time
    let mut state = 0x2545_f491_4f6c_dd1d_u64;
    let mut next = move |bound: usize| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % bound as u64) as usize
    };

    let mut tree = RBTree::new();
    let mut model: Vec<u16> = vec![];
    for _ in 0..20_000 {
        let v = next(512) as u16;
        match next(4) {
            0 | 1 => {
                let unique = next(2) == 0;
                let (_, inserted) = tree.insert(v, unique).unwrap();
                assert_eq!(inserted, !unique || !model.contains(&v));
                if inserted {
                    let at = model.partition_point(|&m| m <= v);
                    model.insert(at, v);
                }
            }
            2 => {
                let removed = tree.remove(&v);
                match model.iter().position(|&m| m == v) {
                    Some(at) => {
                        model.remove(at);
                        assert_eq!(removed, Some(v));
                    }
                    None => assert_eq!(removed, None),
                }
            }
            _ if !model.is_empty() => {
                let index = next(model.len());
                let mut cursor = tree.begin_mut();
                for _ in 0..index { cursor.move_next() }
                assert_eq!(cursor.erase(), Some(model.remove(index)));
                assert_eq!(cursor.get(), model.get(index));
            }
            _ => {}
        }

        tree.verify().unwrap();
        assert_eq!(values(&tree), model);
        assert!(tree.iter().rev().eq(model.iter().rev()));
        assert_eq!(tree.last().get(), model.last());
    }
}
