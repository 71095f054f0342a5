//! Typed accessors over values of another type.

use vc_bind::convert::{Converters, WeakConverter};
use vc_bind::material::{Material, ShaderValue};
use vc_bind::{AccessError, Bindable, Resolver, Type, Value};

#[derive(Bindable, Clone, Copy, Debug, Default, PartialEq)]
enum Mode {
    #[default]
    Off,
    Eco,
    Full = 10,
}

#[derive(Bindable, Clone, Default)]
#[bind(default)]
struct Panel {
    brightness: f32,
    ratio: f64,
    enabled: bool,
    mode: Mode,
    title: String,
}

fn resolver() -> Resolver {
    let mut resolver = Resolver::new();
    resolver.register::<Panel>();
    resolver
}

#[test]
fn numeric_widening_and_narrowing() {
    let mut resolver = resolver();
    let wide = resolver.resolve_as::<Panel, f64>("brightness").unwrap();
    let truncated = resolver.resolve_as::<Panel, i32>("ratio").unwrap();

    let mut panel = Panel::default();
    wide.set(&mut panel, 0.5).unwrap();
    assert_eq!(panel.brightness, 0.5);
    assert_eq!(wide.get(&panel).unwrap(), 0.5);

    panel.ratio = 2.9;
    assert_eq!(truncated.get(&panel).unwrap(), 2);
    panel.ratio = -2.9;
    assert_eq!(truncated.get(&panel).unwrap(), -2);

    panel.ratio = 1e12;
    assert!(matches!(
        truncated.get(&panel).unwrap_err(),
        AccessError::ConversionFailure { .. }
    ));
}

#[test]
fn enums_convert_by_name_and_discriminant() {
    let mut resolver = resolver();
    let by_name = resolver.resolve_as::<Panel, String>("mode").unwrap();
    let by_value = resolver.resolve_as::<Panel, i64>("mode").unwrap();

    let mut panel = Panel::default();
    by_name.set(&mut panel, String::from("Eco")).unwrap();
    assert_eq!(panel.mode, Mode::Eco);
    assert_eq!(by_value.get(&panel).unwrap(), 1);

    by_value.set(&mut panel, 10).unwrap();
    assert_eq!(panel.mode, Mode::Full);
    assert_eq!(by_name.get(&panel).unwrap(), "Full");

    assert!(by_name.set(&mut panel, String::from("Turbo")).is_err());
    assert_eq!(panel.mode, Mode::Full);
}

#[test]
fn consumer_converters_come_first() {
    let mut resolver = resolver();
    let converters = Converters::new()
        .typed(|v: &bool| Ok(if *v { 100_u8 } else { 0 }))
        .typed(|v: &u8| Ok(*v >= 50));
    let percent = resolver
        .resolve_as_with::<Panel, u8>("enabled", &converters)
        .unwrap();

    let mut panel = Panel::default();
    percent.set(&mut panel, 70).unwrap();
    assert!(panel.enabled);
    assert_eq!(percent.get(&panel).unwrap(), 100);
}

/// Shows `f32` values as percentages.
struct Percent;

impl WeakConverter for Percent {
    fn can_convert(&self, from: Type, to: Type) -> bool {
        (from.is::<f32>() && to.is::<String>()) || (from.is::<String>() && to.is::<f32>())
    }

    fn convert(&self, value: &dyn Value, _to: Type) -> Result<Box<dyn Value>, AccessError> {
        if let Some(x) = value.downcast_ref::<f32>() {
            return Ok(Box::new(format!("{}%", x * 100.0)));
        }
        let text = value.downcast_ref::<String>().ok_or(AccessError::NotReadable)?;
        let number = text
            .trim_end_matches('%')
            .parse::<f32>()
            .map_err(|e| AccessError::External(e.to_string()))?;
        Ok(Box::new(number / 100.0))
    }
}

#[test]
fn weak_converters_apply_to_matching_pairs() {
    let mut resolver = resolver();
    let converters = Converters::new().weak(Percent);
    let shown = resolver
        .resolve_as_with::<Panel, String>("brightness", &converters)
        .unwrap();

    let mut panel = Panel::default();
    shown.set(&mut panel, String::from("25%")).unwrap();
    assert_eq!(panel.brightness, 0.25);
    assert_eq!(shown.get(&panel).unwrap(), "25%");

    assert!(shown.set(&mut panel, String::from("lots")).is_err());
    assert_eq!(panel.brightness, 0.25);

    // Without it, the textual default applies.
    let plain = resolver.resolve_as::<Panel, String>("brightness").unwrap();
    assert_eq!(plain.get(&panel).unwrap(), "0.25");
}

#[test]
fn missing_conversions_disable_directions() {
    let mut resolver = resolver();
    let accessor = resolver.resolve_as::<Panel, Vec<u8>>("brightness").unwrap();
    assert!(!accessor.can_read());
    assert!(!accessor.can_write());

    let panel = Panel::default();
    assert!(accessor.get(&panel).is_err());
}

#[test]
fn narrowing_and_widening_hops() {
    let mut resolver = resolver();
    let level = resolver.resolve_as::<Material, f32>("[Cutoff]").unwrap();

    let mut material = Material::new("leaf").with("Cutoff", ShaderValue::Float(0.5));
    assert_eq!(level.get(&material).unwrap(), 0.5);
    level.set(&mut material, 0.25).unwrap();
    assert_eq!(material.get("Cutoff"), Some(&ShaderValue::Float(0.25)));

    // Reading another variant fails, writing replaces it.
    let mut material = Material::new("leaf").with("Cutoff", ShaderValue::Int(1));
    assert!(level.get(&material).is_err());
    level.set(&mut material, 0.25).unwrap();
    assert_eq!(material.get("Cutoff"), Some(&ShaderValue::Float(0.25)));

    let wrapped = resolver.resolve_as::<Panel, ShaderValue>("brightness").unwrap();
    let mut panel = Panel::default();
    wrapped.set(&mut panel, ShaderValue::Float(0.75)).unwrap();
    assert_eq!(panel.brightness, 0.75);
    assert_eq!(wrapped.get(&panel).unwrap(), ShaderValue::Float(0.75));
    assert!(wrapped.set(&mut panel, ShaderValue::Int(3)).is_err());
}
