//! Sharing accessors between threads.

use std::sync::Arc;
use std::thread;

use vc_bind::{Access, Bindable, Resolver, ResolverConfig, Shared};

#[derive(Bindable, Clone, Default)]
struct Cell {
    hits: u32,
}

#[derive(Bindable, Clone, Default)]
struct Grid {
    cells: Vec<Cell>,
}

#[test]
fn one_accessor_many_threads() {
    let mut resolver = Resolver::new();
    resolver.register::<Grid>();
    let hits = resolver.resolve_of::<Grid>("cells[1].hits").unwrap();
    let hits = Arc::new(hits.make_concurrent());
    assert!(hits.can_read() && hits.can_write());

    let handles: Vec<_> = (0..4_u32)
        .map(|n| {
            let hits = Arc::clone(&hits);
            thread::spawn(move || {
                let mut grid = Grid {
                    cells: vec![Cell::default(); 3],
                };
                for i in 0..100 {
                    hits.set_value(&mut grid, Box::new(n * 1000 + i)).unwrap();
                    let read = hits.get_value(&grid).unwrap();
                    assert_eq!(read.downcast_ref::<u32>(), Some(&(n * 1000 + i)));
                }
                grid.cells[1].hits
            })
        })
        .collect();

    let mut results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort_unstable();
    assert_eq!(results, [99, 1099, 2099, 3099]);
}

#[derive(Bindable, Clone, Default, Debug, PartialEq)]
struct Span {
    start: u32,
    end: u32,
}

#[derive(Bindable, Clone, Default)]
struct Track {
    label: String,
    span: Span,
}

#[test]
fn one_shared_target_many_threads() {
    for fast_path in [true, false] {
        let mut resolver = Resolver::with_config(ResolverConfig::default().with_fast_path(fast_path));
        resolver.register::<Shared<Track>>();
        let span = resolver
            .resolve_of::<Shared<Track>>("span")
            .unwrap()
            .make_concurrent();

        let track = Shared::new(Track {
            label: String::from("drums"),
            span: Span::default(),
        });
        thread::scope(|s| {
            for n in 0..4_u32 {
                let (span, mut handle) = (&span, track.clone());
                s.spawn(move || {
                    for i in 0..100 {
                        let value = n * 1000 + i;
                        let written = Span { start: value, end: value };
                        span.set_value(&mut handle, Box::new(written)).unwrap();

                        let read = span.get_value(&handle).unwrap();
                        let read = read.downcast_ref::<Span>().unwrap();
                        assert_eq!(read.start, read.end);
                    }
                });
            }
        });

        let last = track.read().span.clone();
        assert_eq!(last.start, last.end);
        assert!([99, 1099, 2099, 3099].contains(&last.start));
        assert_eq!(track.read().label, "drums");
    }
}

#[test]
fn shared_target_reads() {
    let mut resolver = Resolver::new();
    resolver.register::<Grid>();
    let hits = resolver
        .resolve_of::<Grid>("cells[0].hits")
        .unwrap()
        .make_concurrent();

    let grid = Grid {
        cells: vec![Cell { hits: 42 }],
    };
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..50 {
                    let read = hits.get_value(&grid).unwrap();
                    assert_eq!(read.downcast_ref::<u32>(), Some(&42));
                }
            });
        }
    });

    let copy = hits.duplicate();
    assert!(copy.value_type().is::<u32>());
}
