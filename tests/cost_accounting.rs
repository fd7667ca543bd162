//! Exact link, cut and heapify accounting
//!
//! The counters are the cost model of the experiments, so these tests pin
//! them down on small hand-traced heaps.

use rust_meldable_heaps::{CostAccounting, CostCounters, HeapVariant, Item, Key, MeldableHeap};

fn filled(
    variant: HeapVariant,
    keys: impl IntoIterator<Item = Key>,
) -> (MeldableHeap<Key>, Vec<Item<Key>>) {
    let mut heap = MeldableHeap::with_variant(variant);
    let items = keys.into_iter().map(|k| heap.insert(k, k).unwrap()).collect();
    (heap, items)
}

#[test]
fn test_delete_min_never_cuts() {
    for variant in HeapVariant::ALL {
        let (mut heap, _) = filled(variant, 1..=32);
        heap.delete_min();
        assert_eq!(heap.total_cuts(), 0, "{variant}");
        assert_eq!(heap.num_marked_nodes(), 0, "{variant}");
    }
}

#[test]
fn test_delete_min_unmarks_promoted_children_without_cutting() {
    let (mut heap, items) = filled(HeapVariant::Fibonacci, 1..=9);
    heap.delete_min();
    // one tree: 2:[3, 4:[5], 6:[7, 8:[9]]]
    let key = |k: Key| &items[k as usize - 1];

    // 9 -> 7 is cut from 8, 7 -> 5 is cut from 6: both parents end up marked
    heap.decrease_key(key(9), 2).unwrap();
    heap.decrease_key(key(7), 2).unwrap();
    assert_eq!((heap.total_cuts(), heap.num_marked_nodes()), (2, 2));
    assert_eq!(heap.find_min(), Some(key(2)));

    // 2 owns the marked 6; the marked 8 stays below 6
    heap.delete_min();
    assert_eq!(heap.total_cuts(), 2);
    assert_eq!(heap.num_marked_nodes(), 1);
    assert_eq!(heap.find_min().map(Item::key), Some(3));
    heap.check_invariants().unwrap();
}

#[test]
fn test_lazy_inserts_link_nothing_until_delete_min() {
    for variant in [HeapVariant::LazyBinomial, HeapVariant::Fibonacci] {
        let (mut heap, _) = filled(variant, 1..=32);
        assert_eq!(heap.total_links(), 0);
        assert_eq!(heap.num_trees(), 32);

        heap.delete_min();
        // 31 singletons end as 5 binomial trees; every link merges two trees
        assert_eq!(heap.num_trees(), 5);
        assert_eq!(heap.total_links(), 26, "{variant}");
    }
}

#[test]
fn test_eager_inserts_count_carries() {
    for variant in [HeapVariant::Binomial, HeapVariant::BinomialWithCuts] {
        let mut heap = MeldableHeap::with_variant(variant);
        let mut costs = Vec::new();
        for key in 1..=8 {
            let (_, cost) = heap.measure(|heap| heap.insert(key, ()).unwrap());
            costs.push(cost);
        }
        // the i-th insert costs as many links as the binary increment carries
        assert_eq!(costs, vec![0, 1, 0, 2, 0, 1, 0, 3], "{variant}");
        assert_eq!(heap.total_links(), 7);
        assert_eq!(heap.num_trees(), 1);
    }
}

#[test]
fn test_swap_up_cost_is_depth() {
    for variant in [HeapVariant::Binomial, HeapVariant::LazyBinomial] {
        // 1:[2, 3:[4], 5:[6, 7:[8]]] for both: lazy heaps get there through
        // the delete-min of a 0 key
        let (mut heap, items) = filled(variant, 1..=8);
        if variant == HeapVariant::LazyBinomial {
            let zero = heap.insert(9, 0).unwrap();
            heap.decrease_key(&zero, 9).unwrap();
            heap.delete_min();
        }
        assert_eq!(heap.num_trees(), 1);
        assert_eq!(heap.check_invariants().unwrap().height, 4);

        let before = heap.counters();
        heap.decrease_key(&items[7], 2).unwrap();
        assert_eq!(heap.counters().cost_since(&before), 1, "{variant}");

        let before = heap.counters();
        heap.decrease_key(&items[7], 6).unwrap();
        assert_eq!(heap.counters().cost_since(&before), 2, "{variant}");
        assert_eq!(heap.find_min(), Some(&items[7]));
        assert_eq!(heap.total_cuts(), 0);
        heap.check_invariants().unwrap();
    }
}

#[test]
fn test_fibonacci_cascading_cuts() {
    let (mut heap, items) = filled(HeapVariant::Fibonacci, 1..=9);
    heap.delete_min();
    // one tree: 2:[3, 4:[5], 6:[7, 8:[9]]]
    assert_eq!(heap.num_trees(), 1);
    let key = |k: Key| &items[k as usize - 1];

    heap.decrease_key(key(9), 9).unwrap();
    assert_eq!((heap.total_cuts(), heap.num_marked_nodes()), (1, 1));

    heap.decrease_key(key(7), 7).unwrap();
    assert_eq!((heap.total_cuts(), heap.num_marked_nodes()), (2, 2));

    // 8 is marked: cutting it cascades into its marked parent 6, whose
    // parent 2 is a root and stays unmarked
    let links = heap.total_links();
    heap.decrease_key(key(8), 9).unwrap();
    assert_eq!(heap.total_cuts(), 4);
    assert_eq!(heap.num_marked_nodes(), 0);
    assert_eq!(heap.num_trees(), 5);
    assert_eq!(heap.total_links(), links);
    assert_eq!(heap.total_heapify_cost(), 0);
    assert_eq!(heap.find_min().map(Item::key), Some(-1));
    heap.check_invariants().unwrap();
}

#[test]
fn test_decrease_within_heap_order_is_free() {
    for variant in HeapVariant::ALL {
        let (mut heap, items) = filled(variant, [10, 20, 30, 40]);
        heap.delete_min();
        let before = heap.counters();
        // wherever 40 ended up, 35 still respects heap order
        heap.decrease_key(&items[3], 5).unwrap();
        assert_eq!(heap.counters(), before, "{variant}");
        assert_eq!(heap.num_marked_nodes(), 0);
    }
}

#[test]
fn test_cuts_consolidate_eagerly() {
    let (mut heap, items) = filled(HeapVariant::BinomialWithCuts, 1..=64);
    for (i, item) in items.iter().enumerate().rev().step_by(3) {
        heap.decrease_key(item, item.key() + i as Key).unwrap();
        let shape = heap.check_invariants().unwrap();
        let mut ranks = shape.root_ranks.clone();
        ranks.sort_unstable();
        ranks.dedup();
        // consolidated after every cut: one tree per rank
        assert_eq!(ranks.len(), shape.root_ranks.len(), "{:?}", shape.root_ranks);
    }
    assert!(heap.total_cuts() > 0);
    assert_eq!(heap.total_heapify_cost(), 0);
}

#[test]
fn test_lazy_meld_adds_counters_exactly() {
    let (mut a, _) = filled(HeapVariant::Fibonacci, 1..=10);
    let (mut b, b_items) = filled(HeapVariant::Fibonacci, 11..=20);
    a.delete_min();
    b.delete_min();
    // 19 hangs below 18
    b.decrease_key(&b_items[8], 15).unwrap();
    let expected = a.counters() + b.counters();
    assert!(b.total_cuts() > 0);

    a.meld(&mut b).unwrap();
    assert_eq!(a.counters(), expected);
    assert_eq!(b.counters(), CostCounters::default());
}

#[test]
fn test_eager_meld_links_on_top() {
    let (mut a, _) = filled(HeapVariant::Binomial, 1..=4);
    let (mut b, _) = filled(HeapVariant::Binomial, 5..=8);
    let sum = a.counters() + b.counters();
    assert_eq!(b.total_links(), 3);

    // the receiver takes over b's history, then two rank-2 trees make one
    // rank-3 tree
    let (_, cost) = a.measure(|a| a.meld(&mut b).unwrap());
    assert_eq!(cost, 3 + 1);
    assert_eq!(a.counters().links, sum.links + 1);
    assert_eq!(a.num_trees(), 1);
}
