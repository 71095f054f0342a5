//! Provider segments, diagnostics and the material provider.

use std::sync::{Arc, Mutex};

use vc_bind::material::{Material, ShaderValue};
use vc_bind::provider::{Diagnostic, ProviderPolicy};
use vc_bind::{Access, AccessError, Bindable, ResolveError, Resolver, ResolverConfig};

#[derive(Bindable, Clone, Default)]
struct Renderer {
    material: Material,
}

fn glass() -> Material {
    Material::new("glass")
        .with("Tint", ShaderValue::Color([1.0, 0.5, 0.25, 1.0]))
        .with("Offset", ShaderValue::Vector([0.0; 4]))
        .with("Gloss", ShaderValue::Float(0.8))
        .with("Layers", ShaderValue::Int(2))
        .with("Albedo", ShaderValue::Texture(None))
}

#[test]
fn channels_after_member_hops() {
    let mut resolver = Resolver::new();
    resolver.register::<Renderer>();
    let green = resolver
        .resolve_as::<Renderer, f32>("material[@material:Tint/g]")
        .unwrap();
    let layers = resolver
        .resolve_as::<Renderer, f32>("material.[@material:Layers]")
        .unwrap();

    let mut renderer = Renderer { material: glass() };
    assert_eq!(green.get(&renderer).unwrap(), 0.5);
    green.set(&mut renderer, 0.0).unwrap();
    assert_eq!(
        renderer.material.get("Tint"),
        Some(&ShaderValue::Color([1.0, 0.0, 0.25, 1.0]))
    );

    layers.set(&mut renderer, 2.6).unwrap();
    assert_eq!(renderer.material.get("Layers"), Some(&ShaderValue::Int(3)));
}

#[test]
fn available_paths_skip_textures() {
    let resolver = Resolver::new();
    let paths = resolver.provider_paths(&glass());
    assert_eq!(
        paths,
        [
            "[@material:Tint.r]",
            "[@material:Tint.g]",
            "[@material:Tint.b]",
            "[@material:Tint.a]",
            "[@material:Offset.x]",
            "[@material:Offset.y]",
            "[@material:Offset.z]",
            "[@material:Offset.w]",
            "[@material:Gloss]",
            "[@material:Layers]",
        ]
    );
    assert!(resolver.provider_paths(&1_u8).is_empty());
}

#[test]
fn missing_properties_fail_at_access_time() {
    let mut resolver = Resolver::new();
    let missing = resolver.resolve_of::<Material>("[@material:Rim.a]").unwrap();
    let material = glass();
    assert_eq!(
        missing.get_value(&material).unwrap_err(),
        AccessError::MissingKey {
            key: String::from("Rim")
        }
    );

    let err = resolver.resolve_of::<Material>("[@material:Tint.q]").unwrap_err();
    assert!(matches!(err, ResolveError::Provider { .. }));
}

#[test]
fn unregistered_providers_fail_by_default() {
    let mut resolver = Resolver::new();
    let err = resolver.resolve_of::<Material>("[@audio:Volume]").unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnregisteredProvider {
            id: String::from("audio")
        }
    );
}

#[test]
fn diagnose_policy_reports_and_degrades() {
    let config = ResolverConfig::default().with_provider_policy(ProviderPolicy::Diagnose);
    let mut resolver = Resolver::with_config(config);
    let seen: Arc<Mutex<Vec<Diagnostic>>> = Arc::default();
    let sink = Arc::clone(&seen);
    resolver.set_diagnostic_hook(move |d| sink.lock().unwrap().push(d.clone()));

    let volume = resolver.resolve_of::<Material>("[@audio:Volume]").unwrap();
    assert!(!volume.can_read());
    assert!(!volume.can_write());

    let mut material = glass();
    assert!(matches!(
        volume.get_value(&material).unwrap_err(),
        AccessError::Unavailable { .. }
    ));
    assert!(volume.set_value(&mut material, Box::new(1.0_f32)).is_err());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "[@audio:Volume]");
    assert!(seen[0].ty.is::<Material>());
}
