use super::*;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Number {
    value: i32,
}

impl Tracked for Number {}

fn number(value: i32) -> Linked<Number> {
    Linked::new(Number { value })
}

#[derive(Debug)]
struct Label(&'static str);

impl Tracked for Label {}

fn forward_values() -> Vec<i32> {
    range::<Number>().iter().map(|n| n.borrow().value).collect()
}

fn backward_values() -> Vec<i32> {
    range::<Number>().rev().map(|n| n.borrow().value).collect()
}

fn assert_chain_invariants() {
    validate::<Number>().expect("chain invariants hold");
    let snapshot = snapshot::<Number>();
    if let Some(first) = snapshot.links.first() {
        assert_eq!(first.prev, None);
        assert_eq!(Some(first.id), head_of::<Number>());
    }
    if let Some(last) = snapshot.links.last() {
        assert_eq!(last.next, None);
        assert_eq!(Some(last.id), tail_of::<Number>());
    }
    for pair in snapshot.links.windows(2) {
        assert_eq!(pair[0].next, Some(pair[1].id));
        assert_eq!(pair[1].prev, Some(pair[0].id));
    }
}

#[test]
fn empty_chain_yields_nothing() {
    assert_eq!(head_of::<Number>(), None);
    assert_eq!(tail_of::<Number>(), None);
    assert_eq!(len_of::<Number>(), 0);
    assert!(range::<Number>().is_empty());
    assert_eq!(range::<Number>().iter().count(), 0);
    assert_eq!(range::<Number>().rev().count(), 0);
    assert!(snapshot::<Number>().is_empty());
}

#[test]
fn construction_order_is_traversal_order() {
    let a = number(1);
    let b = number(2);
    let c = number(3);

    assert_eq!(forward_values(), vec![1, 2, 3]);
    assert_eq!(backward_values(), vec![3, 2, 1]);
    assert_eq!(head_of::<Number>(), Some(a.id()));
    assert_eq!(tail_of::<Number>(), Some(c.id()));
    assert_eq!(b.prev_id(), Some(a.id()));
    assert_eq!(b.next_id(), Some(c.id()));
    assert_chain_invariants();
}

#[test]
fn destroying_middle_relinks_neighbours() {
    let a = number(1);
    let b = number(2);
    let c = number(3);
    drop(b);

    assert_eq!(forward_values(), vec![1, 3]);
    assert_eq!(prev_of::<Number>(c.id()), Ok(Some(a.id())));
    assert_eq!(next_of::<Number>(a.id()), Ok(Some(c.id())));
    assert_chain_invariants();
}

#[test]
fn destroying_tail_and_head_updates_ends() {
    let a = number(1);
    let b = number(2);
    let c = number(3);

    drop(c);
    assert_eq!(tail_of::<Number>(), Some(b.id()));
    assert_chain_invariants();

    drop(a);
    assert_eq!(head_of::<Number>(), Some(b.id()));
    assert_chain_invariants();

    drop(b);
    assert_eq!(head_of::<Number>(), None);
    assert_eq!(tail_of::<Number>(), None);
}

#[test]
fn scoped_instances_appear_only_inside_scope() {
    let _a = number(0);
    let _b = number(1);
    assert_eq!(forward_values(), vec![0, 1]);

    {
        let _scoped: Vec<_> = [2, 3, 4].into_iter().map(number).collect();
        assert_eq!(forward_values(), vec![0, 1, 2, 3, 4]);
        assert_chain_invariants();
    }

    assert_eq!(forward_values(), vec![0, 1]);
    assert_eq!(backward_values(), vec![1, 0]);
    assert_chain_invariants();
}

#[test]
fn iteration_yields_live_mutable_instances() {
    let _numbers: Vec<_> = (0..4).map(number).collect();

    let mut seen = Vec::new();
    for n in range::<Number>() {
        seen.push(n.borrow().value);
        n.borrow_mut().value *= 2;
    }
    assert_eq!(seen, vec![0, 1, 2, 3]);

    let range = range::<Number>();
    let mut doubled = Vec::new();
    let mut cursor = range.cbegin();
    while cursor != range.cend() {
        doubled.push(cursor.get().borrow().value);
        cursor.move_next().expect("cursor is on a live instance");
    }
    assert_eq!(doubled, vec![0, 2, 4, 6]);
}

#[test]
fn end_sentinel_boundaries() {
    let _a = number(1);
    let b = number(2);
    let range = range::<Number>();

    let mut cursor = range.begin();
    cursor.move_next().expect("a is linked");
    assert_eq!(cursor.position(), Some(b.id()));
    cursor.move_next().expect("b is linked");
    assert_eq!(cursor, range.end());

    let mut back = range.end();
    back.move_prev().expect("end retreats to tail");
    assert_eq!(back.position(), Some(b.id()));
    assert_eq!(back.get().borrow().value, 2);
}

#[test]
fn read_only_cursors_compare_with_mutable_ones() {
    let _a = number(1);
    let range = range::<Number>();

    assert_eq!(range.cbegin(), range.begin());
    assert_eq!(range.begin(), range.cbegin());
    assert_eq!(range.cend(), range.end());
    assert_ne!(range.cbegin(), range.end());

    let converted: Cursor<Number> = range.begin().into();
    assert_eq!(converted, range.cbegin());
}

#[test]
fn clone_is_an_independent_instance() {
    let original = number(5);
    let copy = original.clone();

    assert_ne!(original.id(), copy.id());
    assert_eq!(tail_of::<Number>(), Some(copy.id()));
    copy.borrow_mut().value = 6;
    assert_eq!(forward_values(), vec![5, 6]);

    drop(original);
    assert_eq!(forward_values(), vec![6]);
    assert_chain_invariants();
}

#[test]
fn types_have_independent_chains() {
    let _n = number(1);
    let _l = Linked::new(Label("one"));
    let _m = number(2);

    assert_eq!(len_of::<Number>(), 2);
    assert_eq!(len_of::<Label>(), 1);
    let labels: Vec<_> = range::<Label>().iter().map(|l| l.borrow().0).collect();
    assert_eq!(labels, vec!["one"]);
    assert_eq!(forward_values(), vec![1, 2]);
}

#[test]
fn manual_double_destroy_is_detected() {
    let storage = Rc::new(RefCell::new(Number { value: 9 }));
    let id = on_create(Rc::downgrade(&storage));
    let other = number(10);

    on_destroy::<Number>(id).expect("first destroy succeeds");
    let err = on_destroy::<Number>(id).expect_err("second destroy must fail");
    assert!(matches!(err, RegistryError::StaleLink { id: stale, .. } if stale == id));
    assert!(!is_linked::<Number>(id));
    assert_eq!(head_of::<Number>(), Some(other.id()));
    assert_chain_invariants();
}

#[test]
fn leaked_instances_stay_linked() {
    #[derive(Debug)]
    struct Static(u8);
    impl Tracked for Static {}

    let id = Linked::new(Static(1)).leak();
    assert!(is_linked::<Static>(id));
    let instance = instance_of::<Static>(id).expect("leaked instance is still alive");
    assert_eq!(instance.borrow().0, 1);
    assert_eq!(len_of::<Static>(), 1);
}

#[test]
fn insertions_during_iteration_are_observed() {
    let _a = number(1);
    let _b = number(2);
    let mut added = Vec::new();

    let mut seen = Vec::new();
    for n in range::<Number>().iter() {
        let value = n.borrow().value;
        seen.push(value);
        if value == 2 {
            added.push(number(3));
        }
    }
    assert_eq!(seen, vec![1, 2, 3]);
}

#[test]
fn removing_a_later_instance_during_iteration_skips_it() {
    let a = number(1);
    let b = RefCell::new(Some(number(2)));
    let _c = number(3);

    let mut seen = Vec::new();
    for n in range::<Number>().iter() {
        if n.id() == a.id() {
            b.borrow_mut().take();
        }
        seen.push(n.borrow().value);
    }
    assert_eq!(seen, vec![1, 3]);
}

#[test]
fn dropping_the_current_instance_continues_with_its_successor() {
    let mut live: Vec<_> = (1..=4).map(number).collect();

    let mut seen = Vec::new();
    for n in range::<Number>().iter() {
        let value = n.borrow().value;
        seen.push(value);
        if value == 2 {
            live.retain(|l| l.id() != n.id());
        }
    }
    assert_eq!(seen, vec![1, 2, 3, 4]);
    assert_eq!(forward_values(), vec![1, 3, 4]);
}

#[test]
fn dropping_the_tail_after_appending_still_visits_the_new_instance() {
    let mut live: Vec<_> = (1..=2).map(number).collect();

    let mut seen = Vec::new();
    for n in range::<Number>().iter() {
        let value = n.borrow().value;
        seen.push(value);
        if value == 2 {
            live.push(number(3));
            live.retain(|l| l.id() != n.id());
        }
    }
    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(forward_values(), vec![1, 3]);
}

#[test]
fn dropping_the_head_after_appending_still_visits_the_new_instance() {
    let mut live = vec![number(1)];

    let mut seen = Vec::new();
    for n in range::<Number>().iter() {
        let value = n.borrow().value;
        seen.push(value);
        if value == 1 {
            live.push(number(2));
            live.remove(0);
        }
    }
    assert_eq!(seen, vec![1, 2]);
    assert_eq!(forward_values(), vec![2]);
}

#[test]
fn dropping_current_and_successor_resumes_after_predecessor() {
    let mut live: Vec<_> = (1..=4).map(number).collect();

    let mut seen = Vec::new();
    for n in range::<Number>().iter() {
        let value = n.borrow().value;
        seen.push(value);
        if value == 2 {
            live.drain(1..3);
        }
    }
    assert_eq!(seen, vec![1, 2, 4]);
}

#[test]
fn dropping_the_current_instance_during_a_reverse_walk_continues() {
    let mut live: Vec<_> = (1..=3).map(number).collect();

    let mut seen = Vec::new();
    for n in range::<Number>().rev() {
        let value = n.borrow().value;
        seen.push(value);
        if value == 2 {
            live.retain(|l| l.id() != n.id());
        }
    }
    assert_eq!(seen, vec![3, 2, 1]);
    assert_eq!(backward_values(), vec![3, 1]);
}

#[test]
fn appending_then_dropping_the_tail_during_a_reverse_walk_skips_the_new_instance() {
    let mut live: Vec<_> = (1..=2).map(number).collect();

    let mut seen = Vec::new();
    for n in range::<Number>().rev() {
        let value = n.borrow().value;
        seen.push(value);
        if value == 2 {
            live.push(number(3));
            live.retain(|l| l.id() != n.id());
        }
    }
    assert_eq!(seen, vec![2, 1]);
    assert_eq!(forward_values(), vec![1, 3]);
}

#[test]
#[should_panic(expected = "lost position while iterating")]
fn dropping_current_and_both_neighbours_panics() {
    let mut live: Vec<_> = (1..=4).map(number).collect();

    for n in range::<Number>().iter() {
        if n.borrow().value == 2 {
            live.drain(0..3);
        }
    }
}

#[test]
fn reverse_walk_over_subrange() {
    let a = number(1);
    let _b = number(2);
    let c = number(3);

    let sub: Range<Number> =
        Range::new(CursorMut::new(Some(a.id())), CursorMut::new(Some(c.id())));
    let forward: Vec<_> = sub.iter().map(|n| n.borrow().value).collect();
    let backward: Vec<_> = sub.rev_mut().map(|n| n.borrow().value).collect();
    assert_eq!(forward, vec![1, 2]);
    assert_eq!(backward, vec![2, 1]);
    assert_eq!(sub.cbegin().position(), Some(a.id()));
}

#[test]
fn invariants_hold_across_pseudo_random_churn() {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut live: Vec<Linked<Number>> = Vec::new();
    let mut expected: Vec<i32> = Vec::new();
    for step in 0..500 {
        let roll = next();
        if live.is_empty() || roll % 3 != 0 {
            live.push(number(step));
            expected.push(step);
        } else {
            let index = (roll as usize / 3) % live.len();
            live.remove(index);
            expected.remove(index);
        }
        assert_chain_invariants();
        assert_eq!(len_of::<Number>(), live.len());
    }
    assert_eq!(forward_values(), expected);

    live.clear();
    assert_eq!(head_of::<Number>(), None);
    assert_chain_invariants();
}

#[test]
fn thread_local_instances_unlink_cleanly_at_thread_exit() {
    #[derive(Debug)]
    struct Probe;
    impl Tracked for Probe {}

    let joined = std::thread::spawn(|| {
        thread_local! {
            static KEEP: Linked<Probe> = Linked::new(Probe);
        }
        KEEP.with(|probe| assert!(is_linked::<Probe>(probe.id())));
        len_of::<Probe>()
    })
    .join()
    .expect("thread exits without panicking");
    assert_eq!(joined, 1);
    assert_eq!(len_of::<Probe>(), 0);
}

#[test]
fn handles_and_snapshots_agree_with_the_chain() {
    #[derive(Debug, Default)]
    struct Slot(u32);
    impl Tracked for Slot {}

    let first: Linked<Slot> = Linked::default();
    let second = Linked::from(Slot(7));

    let handle = second.handle();
    handle.borrow_mut().0 += 1;
    assert_eq!(second.borrow().0, 8);
    let read_only = handle.to_ref();
    assert_eq!(read_only.id(), second.id());
    assert_eq!(read_only.borrow().0, 8);

    let snapshot = snapshot::<Slot>();
    let ids: Vec<_> = snapshot.ids().collect();
    assert_eq!(ids, vec![first.id(), second.id()]);

    let stale = first.id();
    drop(first);
    let err = instance_of::<Slot>(stale).expect_err("dropped instance is gone");
    assert_eq!(err.type_name(), Slot::type_label());
    assert!(err.to_string().contains("is not a linked instance of"));
}
