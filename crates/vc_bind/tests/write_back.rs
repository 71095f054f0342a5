//! Writes through nested value-semantics hops must reach the root.

use core::any::TypeId;

use vc_bind::info::DescriptorBuilder;
use vc_bind::info::TypeDescriptor;
use vc_bind::{Access, Bindable, Composition, Resolver, ResolverConfig, Shared, Value};

#[derive(Bindable, Clone, Default, Debug, PartialEq)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Bindable, Clone, Default, Debug, PartialEq)]
struct Transform {
    position: Vec3,
    scale: Vec3,
}

#[derive(Bindable, Clone, Default, Debug, PartialEq)]
struct Node {
    name: String,
    transform: Transform,
    children: Vec<Transform>,
}

/// Exposes its position through a property only.
#[derive(Clone, Default, Debug, PartialEq)]
struct Body {
    position: Vec3,
}

impl Bindable for Body {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .property("Position", |b| b.position.clone(), |b, v| b.position = v)
            .build()
    }
}

#[derive(Bindable, Clone, Default)]
struct Light {
    intensity: f32,
}

#[derive(Bindable, Clone)]
struct Scene {
    offset: Vec3,
    sun: Shared<Light>,
}

fn resolver(fast_path: bool) -> Resolver {
    let mut resolver = Resolver::with_config(ResolverConfig::default().with_fast_path(fast_path));
    resolver.register::<Node>();
    resolver.register::<Body>();
    resolver.register::<Scene>();
    resolver
}

#[test]
fn deep_field_write_on_both_compositions() {
    for fast_path in [true, false] {
        let mut resolver = resolver(fast_path);
        let x = resolver.resolve_of::<Node>("transform.position.x").unwrap();

        let mut node = Node::default();
        x.set_value(&mut node, Box::new(4.5_f32)).unwrap();
        assert_eq!(node.transform.position.x, 4.5);
        assert_eq!(node.transform.scale, Vec3::default());

        let read = x.get_value(&node).unwrap();
        assert_eq!(read.downcast_ref::<f32>(), Some(&4.5));
    }
}

#[test]
fn composition_follows_the_fast_path_flag() {
    let id = TypeId::of::<Node>();
    let folded = resolver(true).resolve_chain(id, "transform.position.x").unwrap();
    assert_eq!(folded.composition(), Composition::Folded);

    let walked = resolver(false).resolve_chain(id, "transform.position.x").unwrap();
    assert_eq!(walked.composition(), Composition::Walk);

    let single = resolver(true).resolve_chain(id, "name").unwrap();
    assert_eq!(single.composition(), Composition::Single);
}

#[test]
fn property_copies_are_written_back() {
    let mut resolver = resolver(true);
    let chain = resolver
        .resolve_chain(TypeId::of::<Body>(), "position.y")
        .unwrap();
    // Case-insensitive member lookup, and properties cannot be folded.
    assert_eq!(chain.composition(), Composition::Walk);

    let mut body = Body::default();
    chain.set_value(&mut body, Box::new(2.0_f32)).unwrap();
    assert_eq!(body.position.y, 2.0);
}

#[test]
fn list_elements_are_written_in_place() {
    let mut resolver = resolver(true);
    let z = resolver.resolve_of::<Node>("children[1].scale.z").unwrap();

    let mut node = Node {
        children: vec![Transform::default(); 3],
        ..Default::default()
    };
    z.set_value(&mut node, Box::new(9.0_f32)).unwrap();
    assert_eq!(node.children[1].scale.z, 9.0);
    assert_eq!(node.children[0], Transform::default());
    assert_eq!(node.children[2], Transform::default());
}

#[test]
fn shared_handles_stop_the_write_back() {
    for fast_path in [true, false] {
        let mut resolver = resolver(fast_path);
        let intensity = resolver.resolve_of::<Scene>("sun.intensity").unwrap();

        let sun = Shared::new(Light::default());
        let mut scene = Scene {
            offset: Vec3::default(),
            sun: sun.clone(),
        };
        intensity.set_value(&mut scene, Box::new(0.75_f32)).unwrap();

        // The write lands in the shared value, visible through every handle.
        assert_eq!(sun.read().intensity, 0.75);
        assert!(scene.sun.ptr_eq(&sun));
    }
}

#[test]
fn round_trip_through_the_root() {
    let mut resolver = resolver(true);
    let name = resolver.resolve_of::<Node>("name").unwrap();
    let mut node = Node::default();

    name.set_value(&mut node, Box::new(String::from("root"))).unwrap();
    let read = name.get_value(&node).unwrap();
    assert_eq!(read.downcast_ref::<String>().map(String::as_str), Some("root"));

    // Reads are copies.
    let mut copy = read;
    *copy.downcast_mut::<String>().unwrap() = String::from("changed");
    assert_eq!(node.name, "root");
}

/// Writes back what `access` reads and checks the read is unchanged.
fn assert_round_trip(access: &dyn Access, target: &mut dyn Value) {
    let before = access.get_value(&*target).unwrap();
    access.set_value(target, (*before).clone_value()).unwrap();
    let after = access.get_value(&*target).unwrap();
    assert_eq!(after.downcast_ref::<f32>(), before.downcast_ref::<f32>());
}

#[test]
fn reads_round_trip_on_deep_paths() {
    for fast_path in [true, false] {
        let expected = match fast_path {
            true => Composition::Folded,
            false => Composition::Walk,
        };
        let mut resolver = resolver(fast_path);

        let sun = Shared::new(Light { intensity: 0.5 });
        let mut scene = Scene {
            offset: Vec3::default(),
            sun: sun.clone(),
        };
        let intensity = resolver
            .resolve_chain(TypeId::of::<Scene>(), "sun.intensity")
            .unwrap();
        assert_eq!(intensity.composition(), expected);
        assert_round_trip(&intensity, &mut scene);
        assert_eq!(sun.read().intensity, 0.5);
        assert!(scene.sun.ptr_eq(&sun));

        let mut node = Node {
            name: String::from("root"),
            transform: Transform {
                position: Vec3 { x: 1.0, y: 2.0, z: 3.0 },
                scale: Vec3 { x: 1.0, y: 1.0, z: 1.0 },
            },
            children: vec![
                Transform::default(),
                Transform {
                    position: Vec3::default(),
                    scale: Vec3 { x: 4.0, y: 5.0, z: 6.0 },
                },
            ],
        };
        let snapshot = node.clone();
        for path in ["transform.position.x", "children[1].scale.z"] {
            let chain = resolver.resolve_chain(TypeId::of::<Node>(), path).unwrap();
            assert_eq!(chain.composition(), expected, "{path}");
            assert_round_trip(&chain, &mut node);
        }
        assert_eq!(node, snapshot);
    }
}

#[test]
fn bound_mode_cascades_through_cached_copies() {
    let mut resolver = resolver(true);
    let chain = resolver
        .resolve_chain(TypeId::of::<Node>(), "transform.position.x")
        .unwrap();
    assert_eq!(chain.len(), 3);
    assert_eq!(chain.hops(), ["transform", "position", "x"]);

    chain.bind(&Node::default()).unwrap();
    chain.bound_set(2, Box::new(1.0_f32)).unwrap();

    let position = chain.bound_get(1).unwrap();
    assert_eq!(position.downcast_ref::<Vec3>().unwrap().x, 1.0);

    // Replacing a middle hop invalidates the cached copies below it.
    let moved = Vec3 { x: 5.0, y: 6.0, z: 7.0 };
    chain.bound_set(1, Box::new(moved.clone())).unwrap();
    let x = chain.bound_get(2).unwrap();
    assert_eq!(x.downcast_ref::<f32>(), Some(&5.0));

    let root = chain.bound_root().unwrap();
    assert_eq!(root.downcast_ref::<Node>().unwrap().transform.position, moved);

    chain.unbind();
    assert!(chain.bound_root().is_none());
    assert!(chain.bound_get(0).is_err());
}

#[test]
fn bind_rejects_other_root_types() {
    let mut resolver = resolver(true);
    let chain = resolver.resolve_chain(TypeId::of::<Node>(), "name").unwrap();
    assert!(chain.bind(&Body::default()).is_err());
}

#[test]
fn duplicates_share_the_cached_chain() {
    let mut resolver = resolver(true);
    let id = TypeId::of::<Node>();
    let a = resolver.resolve_chain(id, "transform.scale").unwrap();
    let b = resolver.resolve_chain(id, " transform / scale ").unwrap();
    let c = resolver.resolve_chain(id, "transform.position").unwrap();

    assert!(a.shares_chain_with(&b));
    assert!(!a.shares_chain_with(&c));

    // Scratch state is private to each duplicate.
    a.bind(&Node::default()).unwrap();
    assert!(b.bound_root().is_none());

    let stats = resolver.cache_stats();
    assert_eq!(stats.templates, 2);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 1);
}
