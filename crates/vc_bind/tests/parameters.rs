//! Indexers, elements, raw arrays, methods and `$n` slots.

use std::collections::HashMap;

use vc_bind::info::{DescriptorBuilder, MultiArray, TypeDescriptor};
use vc_bind::node::Param;
use vc_bind::{Access, AccessError, Bindable, ResolveError, Resolver, Shared};

#[derive(Bindable, Clone, Default)]
struct Inventory {
    items: Vec<u32>,
    labels: HashMap<String, String>,
    slots: [Option<u32>; 3],
}

/// A board with a two-key indexer and a few methods.
#[derive(Clone)]
struct Board {
    cells: MultiArray<i32>,
    scale: f32,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: MultiArray::new(&[3, 3], 0),
            scale: 1.0,
        }
    }
}

impl Bindable for Board {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .field("cells", |b| &b.cells, |b| &mut b.cells)
            .indexer2::<usize, usize, i32>(
                |b, row, col| b.cells.get(&[row, col]).copied(),
                |b, row, col, v| {
                    *b.cells.get_mut(&[row, col])? = v;
                    Ok(())
                },
            )
            .method_rw::<f32>("Scale", |b| b.scale, |b, v| b.scale = v)
            .method1::<f32, f32>("Scaled", |b, by| b.scale * by)
            .method0::<usize>("Cells", |b| b.cells.len())
            .build()
    }
}

fn resolver() -> Resolver {
    let mut resolver = Resolver::new();
    resolver.register::<Inventory>();
    resolver.register::<Board>();
    resolver
}

fn inventory() -> Inventory {
    Inventory {
        items: vec![10, 20, 30, 40, 50],
        labels: HashMap::from([(String::from("sword"), String::from("Sharp"))]),
        slots: [Some(1), None, Some(3)],
    }
}

#[test]
fn list_index_within_range() {
    let mut resolver = resolver();
    let third = resolver.resolve_of::<Inventory>("items[2]").unwrap();

    let mut inventory = inventory();
    let read = third.get_value(&inventory).unwrap();
    assert_eq!(read.downcast_ref::<u32>(), Some(&30));

    third.set_value(&mut inventory, Box::new(33_u32)).unwrap();
    assert_eq!(inventory.items, [10, 20, 33, 40, 50]);
}

#[test]
fn out_of_range_fails_at_access_time() {
    let mut resolver = resolver();
    let eleventh = resolver.resolve_of::<Inventory>("items[10]").unwrap();

    let mut inventory = inventory();
    assert_eq!(
        eleventh.get_value(&inventory).unwrap_err(),
        AccessError::OutOfRange { index: 10, len: 5 }
    );
    assert!(eleventh.set_value(&mut inventory, Box::new(1_u32)).is_err());
    assert_eq!(inventory.items.len(), 5);
}

#[test]
fn negative_list_index_fails_on_access() {
    let mut resolver = resolver();
    let last = resolver.resolve_of::<Inventory>("items[-1]").unwrap();

    let mut inventory = inventory();
    assert_eq!(
        last.get_value(&inventory).unwrap_err(),
        AccessError::OutOfRange { index: -1, len: 5 }
    );
    assert_eq!(
        last.set_value(&mut inventory, Box::new(9_u32)).unwrap_err(),
        AccessError::OutOfRange { index: -1, len: 5 }
    );
    assert_eq!(inventory.items, [10, 20, 30, 40, 50]);
}

#[test]
fn dictionary_entries() {
    let mut resolver = resolver();
    let sword = resolver.resolve_of::<Inventory>("labels['sword']").unwrap();
    let shield = resolver.resolve_of::<Inventory>("labels[shield]").unwrap();

    let mut inventory = inventory();
    sword
        .set_value(&mut inventory, Box::new(String::from("Blunt")))
        .unwrap();
    assert_eq!(inventory.labels["sword"], "Blunt");

    assert_eq!(
        shield.get_value(&inventory).unwrap_err(),
        AccessError::MissingKey {
            key: String::from("shield")
        }
    );
}

#[test]
fn optional_elements_unwrap_implicitly() {
    let mut resolver = resolver();
    let first = resolver.resolve_of::<Inventory>("slots[0]?").unwrap();
    let second = resolver.resolve_of::<Inventory>("slots[1]?").unwrap();

    let mut inventory = inventory();
    first.set_value(&mut inventory, Box::new(7_u32)).unwrap();
    assert_eq!(inventory.slots[0], Some(7));

    assert!(matches!(
        second.get_value(&inventory).unwrap_err(),
        AccessError::NullValue { .. }
    ));
}

#[test]
fn slots_are_bound_per_duplicate() {
    let mut resolver = resolver();
    let item = resolver.resolve_of::<Inventory>("items[$0]").unwrap();
    let inventory = inventory();

    assert_eq!(
        item.get_value(&inventory).unwrap_err(),
        AccessError::UnboundParameter { slot: 0 }
    );

    // Literals convert to the element key type.
    item.bind_parameter(1, 0, Param::value(3_i64)).unwrap();
    let read = item.get_value(&inventory).unwrap();
    assert_eq!(read.downcast_ref::<u32>(), Some(&40));

    let other = item.duplicate();
    other.bind_parameter(1, 0, Param::value(0_usize)).unwrap();
    let read = item.get_value(&inventory).unwrap();
    assert_eq!(read.downcast_ref::<u32>(), Some(&40));
    let read = other.get_value(&inventory).unwrap();
    assert_eq!(read.downcast_ref::<u32>(), Some(&10));

    assert!(item.bind_parameter(5, 0, Param::value(0_usize)).is_err());
}

#[test]
fn dynamic_parameters_are_queried_on_every_access() {
    let mut resolver = resolver();
    let item = resolver.resolve_of::<Inventory>("items[$0]").unwrap();
    let cursor = Shared::new(1_usize);
    item.bind_parameter(1, 0, Param::provider(cursor.clone()))
        .unwrap();

    let inventory = inventory();
    let read = item.get_value(&inventory).unwrap();
    assert_eq!(read.downcast_ref::<u32>(), Some(&20));

    cursor.set(4);
    let read = item.get_value(&inventory).unwrap();
    assert_eq!(read.downcast_ref::<u32>(), Some(&50));
}

#[test]
fn two_key_indexer_and_raw_array() {
    let mut resolver = resolver();
    let indexed = resolver.resolve_of::<Board>("[1, 2]").unwrap();
    let raw = resolver.resolve_of::<Board>("cells[#1, 2]").unwrap();

    let mut board = Board::default();
    indexed.set_value(&mut board, Box::new(5_i32)).unwrap();
    let read = raw.get_value(&board).unwrap();
    assert_eq!(read.downcast_ref::<i32>(), Some(&5));

    raw.set_value(&mut board, Box::new(6_i32)).unwrap();
    assert_eq!(board.cells.get(&[1, 2]), Ok(&6));

    let wrong_rank = resolver.resolve_of::<Board>("cells[#1]").unwrap();
    assert_eq!(
        wrong_rank.get_value(&board).unwrap_err(),
        AccessError::RankMismatch {
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn methods_with_and_without_parameters() {
    let mut resolver = resolver();
    let scale = resolver.resolve_of::<Board>("Scale()").unwrap();
    let scaled = resolver.resolve_of::<Board>("Scaled(f32)").unwrap();
    let cells = resolver.resolve_of::<Board>("cells()").unwrap();

    let mut board = Board::default();
    scale.set_value(&mut board, Box::new(2.0_f32)).unwrap();
    assert_eq!(board.scale, 2.0);

    assert!(!scaled.can_write());
    assert_eq!(
        scaled.get_value(&board).unwrap_err(),
        AccessError::UnboundParameter { slot: 0 }
    );
    scaled.bind_parameter(0, 0, Param::value(1.5_f32)).unwrap();
    let read = scaled.get_value(&board).unwrap();
    assert_eq!(read.downcast_ref::<f32>(), Some(&3.0));

    let read = cells.get_value(&board).unwrap();
    assert_eq!(read.downcast_ref::<usize>(), Some(&9));
}

#[test]
fn unknown_members_fail_resolution() {
    let mut resolver = resolver();
    let err = resolver.resolve_of::<Inventory>("weight").unwrap_err();
    assert!(matches!(err, ResolveError::UnresolvableSegment { .. }));

    let err = resolver.resolve_of::<Inventory>("items[").unwrap_err();
    assert!(matches!(err, ResolveError::Parse(_)));
}
