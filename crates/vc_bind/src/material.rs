//! Materials and the `material` path provider.
//!
//! Shader properties live in a list on the [`Material`], not in Rust
//! fields, so the type table cannot describe them. [`MaterialProvider`]
//! makes every numeric channel addressable as a provider segment:
//!
//! | property kind | path ids |
//! |---------------|----------|
//! | `Float`, `Range`, `Int` | `name` |
//! | `Color` | `name.r`, `name.g`, `name.b`, `name.a` |
//! | `Vector` | `name.x`, `name.y`, `name.z`, `name.w` |
//!
//! Every channel is read and written as an `f32`. Textures are not bindable.
//!
//! # Examples
//!
//! ```
//! use vc_bind::Resolver;
//! use vc_bind::material::{Material, ShaderValue};
//!
//! let mut resolver = Resolver::new();
//! let alpha = resolver.resolve_of::<Material>("[@material:Tint.a]").unwrap();
//!
//! let mut material = Material::new("glass").with("Tint", ShaderValue::Color([1.0; 4]));
//! alpha.set_value(&mut material, Box::new(0.25_f32)).unwrap();
//! assert_eq!(material.get("Tint"), Some(&ShaderValue::Color([1.0, 1.0, 1.0, 0.25])));
//! ```

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{AccessError, ResolveError, expect_mut, expect_owned, expect_ref};
use crate::info::{Bindable, DescriptorBuilder, TypeDescriptor};
use crate::node::ExternalAccessor;
use crate::provider::PathProvider;
use crate::value::{Type, Value};

// -----------------------------------------------------------------------------
// Material

/// How a shader declares a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderPropertyKind {
    Float,
    Range,
    Color,
    Vector,
    Int,
    Texture,
}

impl ShaderPropertyKind {
    const VARIANTS: &'static [(&'static str, i64)] = &[
        ("Float", 0),
        ("Range", 1),
        ("Color", 2),
        ("Vector", 3),
        ("Int", 4),
        ("Texture", 5),
    ];

    const ALL: [Self; 6] = [
        Self::Float,
        Self::Range,
        Self::Color,
        Self::Vector,
        Self::Int,
        Self::Texture,
    ];

    /// Returns the channel names of the kind, empty for scalars.
    fn channels(self) -> &'static [&'static str] {
        match self {
            Self::Color => &["r", "g", "b", "a"],
            Self::Vector => &["x", "y", "z", "w"],
            _ => &[],
        }
    }
}

impl Bindable for ShaderPropertyKind {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .enum_variants(Self::VARIANTS, |k| *k as usize, |i| Self::ALL.get(i).copied())
            .build()
    }
}

/// The current value of a shader property.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderValue {
    Float(f32),
    Int(i32),
    Color([f32; 4]),
    Vector([f32; 4]),
    Texture(Option<String>),
}

impl ShaderValue {
    /// Returns the property kind the value fits. Ranges report `Float`.
    pub fn kind(&self) -> ShaderPropertyKind {
        match self {
            Self::Float(_) => ShaderPropertyKind::Float,
            Self::Int(_) => ShaderPropertyKind::Int,
            Self::Color(_) => ShaderPropertyKind::Color,
            Self::Vector(_) => ShaderPropertyKind::Vector,
            Self::Texture(_) => ShaderPropertyKind::Texture,
        }
    }
}

impl Default for ShaderValue {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

impl Bindable for ShaderValue {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .narrow(
                "Float",
                |v| match v {
                    Self::Float(x) => Some(x),
                    _ => None,
                },
                |v| match v {
                    Self::Float(x) => Some(x),
                    _ => None,
                },
                Self::Float,
            )
            .narrow(
                "Int",
                |v| match v {
                    Self::Int(x) => Some(x),
                    _ => None,
                },
                |v| match v {
                    Self::Int(x) => Some(x),
                    _ => None,
                },
                Self::Int,
            )
            .narrow(
                "Color",
                |v| match v {
                    Self::Color(x) => Some(x),
                    _ => None,
                },
                |v| match v {
                    Self::Color(x) => Some(x),
                    _ => None,
                },
                Self::Color,
            )
            .narrow(
                "Texture",
                |v| match v {
                    Self::Texture(x) => Some(x),
                    _ => None,
                },
                |v| match v {
                    Self::Texture(x) => Some(x),
                    _ => None,
                },
                Self::Texture,
            )
            .default()
            .build()
    }
}

/// One named property of a [`Material`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProperty {
    pub name: String,
    pub kind: ShaderPropertyKind,
    pub value: ShaderValue,
}

impl Bindable for ShaderProperty {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .field("name", |p| &p.name, |p| &mut p.name)
            .readonly_field("kind", |p| &p.kind)
            .field("value", |p| &p.value, |p| &mut p.value)
            .build()
    }
}

/// A named set of shader properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub properties: Vec<ShaderProperty>,
}

impl Material {
    /// Creates a material without properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Adds or replaces a property, deriving its kind from `value`.
    pub fn with(mut self, name: impl Into<String>, value: ShaderValue) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value of the property `name`.
    pub fn get(&self, name: &str) -> Option<&ShaderValue> {
        self.property(name).map(|p| &p.value)
    }

    /// Adds or replaces a property, deriving its kind from `value`.
    pub fn set(&mut self, name: impl Into<String>, value: ShaderValue) {
        let name = name.into();
        let kind = value.kind();
        match self.property_mut(&name) {
            Some(p) => {
                // Ranges hold floats.
                if !(p.kind == ShaderPropertyKind::Range && kind == ShaderPropertyKind::Float) {
                    p.kind = kind;
                }
                p.value = value;
            }
            None => self.properties.push(ShaderProperty { name, kind, value }),
        }
    }

    pub fn property(&self, name: &str) -> Option<&ShaderProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut ShaderProperty> {
        self.properties.iter_mut().find(|p| p.name == name)
    }
}

impl Bindable for Material {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .field("name", |m| &m.name, |m| &mut m.name)
            .field("properties", |m| &m.properties, |m| &mut m.properties)
            .indexer::<String, ShaderValue>(
                |m, name| {
                    m.get(&name)
                        .cloned()
                        .ok_or(AccessError::MissingKey { key: name })
                },
                |m, name, value| {
                    if m.property(&name).is_none() {
                        return Err(AccessError::MissingKey { key: name });
                    }
                    m.set(name, value);
                    Ok(())
                },
            )
            .default()
            .build()
    }
}

// -----------------------------------------------------------------------------
// MaterialProvider

/// Resolves `[@material:...]` segments on [`Material`] values.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaterialProvider;

impl MaterialProvider {
    pub const ID: &'static str = "material";
}

impl PathProvider for MaterialProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    /// Accepts `name`, `name.c` and the slash form `name/c`.
    fn try_convert_id_to_path(&self, path_id: &str) -> Option<String> {
        let path_id = path_id.trim();
        if path_id.is_empty() {
            return None;
        }
        Some(path_id.replace('/', "."))
    }

    fn available_paths(&self, source: &dyn Value) -> Vec<String> {
        let Some(material) = source.downcast_ref::<Material>() else {
            return Vec::new();
        };
        let mut paths = Vec::new();
        for p in &material.properties {
            match p.kind {
                ShaderPropertyKind::Texture => {}
                ShaderPropertyKind::Color | ShaderPropertyKind::Vector => paths.extend(
                    p.kind
                        .channels()
                        .iter()
                        .map(|c| format!("{}.{c}", p.name)),
                ),
                _ => paths.push(p.name.clone()),
            }
        }
        paths
    }

    fn accessor(
        &self,
        source_type: Type,
        path_id: &str,
    ) -> Result<Box<dyn ExternalAccessor>, ResolveError> {
        if !source_type.is::<Material>() {
            return Err(ResolveError::Provider {
                id: String::from(Self::ID),
                message: format!("`{source_type}` is not a material"),
            });
        }
        let (property, channel) = match path_id.rsplit_once('.') {
            Some((property, channel)) => {
                let index = ["r", "g", "b", "a", "x", "y", "z", "w"]
                    .iter()
                    .position(|c| *c == channel)
                    .ok_or_else(|| ResolveError::Provider {
                        id: String::from(Self::ID),
                        message: format!("unknown channel `{channel}`"),
                    })?;
                (property, Some(index % 4))
            }
            None => (path_id, None),
        };
        Ok(Box::new(MaterialChannel {
            property: String::from(property),
            channel,
        }))
    }
}

/// One numeric channel of a shader property.
struct MaterialChannel {
    property: String,
    channel: Option<usize>,
}

impl MaterialChannel {
    fn mismatch(&self, value: &ShaderValue) -> AccessError {
        AccessError::External(format!(
            "property `{}` holds a {:?} value",
            self.property,
            value.kind()
        ))
    }

    fn missing(&self) -> AccessError {
        AccessError::MissingKey {
            key: self.property.clone(),
        }
    }
}

impl ExternalAccessor for MaterialChannel {
    fn value_type(&self) -> Type {
        Type::of::<f32>()
    }

    fn get(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError> {
        let material = expect_ref::<Material>(target)?;
        let value = material.get(&self.property).ok_or_else(|| self.missing())?;
        let out = match (value, self.channel) {
            (ShaderValue::Float(x), None) => *x,
            (ShaderValue::Int(x), None) => *x as f32,
            (ShaderValue::Color(v) | ShaderValue::Vector(v), Some(c)) => v[c],
            (value, _) => return Err(self.mismatch(value)),
        };
        Ok(Box::new(out))
    }

    fn set(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError> {
        let input = expect_owned::<f32>(value)?;
        let material = expect_mut::<Material>(target)?;
        let slot = material
            .property_mut(&self.property)
            .ok_or_else(|| self.missing())?;
        match (&mut slot.value, self.channel) {
            (ShaderValue::Float(x), None) => *x = input,
            (ShaderValue::Int(x), None) => *x = input.round() as i32,
            (ShaderValue::Color(v) | ShaderValue::Vector(v), Some(c)) => v[c] = input,
            (value, _) => return Err(self.mismatch(value)),
        }
        Ok(())
    }
}

impl fmt::Debug for MaterialChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel {
            Some(c) => write!(f, "{}[{c}]", self.property),
            None => f.write_str(&self.property),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;

    use super::{Material, MaterialProvider, ShaderPropertyKind, ShaderValue};
    use crate::error::AccessError;
    use crate::provider::PathProvider;
    use crate::value::Type;

    fn sample() -> Material {
        Material::new("brick")
            .with("Roughness", ShaderValue::Float(0.5))
            .with("Layers", ShaderValue::Int(2))
            .with("Tint", ShaderValue::Color([0.1, 0.2, 0.3, 1.0]))
            .with("Albedo", ShaderValue::Texture(None))
    }

    #[test]
    fn channels_are_listed() {
        let paths = MaterialProvider.available_paths(&sample());
        assert_eq!(
            paths,
            vec!["Roughness", "Layers", "Tint.r", "Tint.g", "Tint.b", "Tint.a"]
        );
        assert!(MaterialProvider.available_paths(&3_i32).is_empty());
    }

    #[test]
    fn channel_access() {
        let ty = Type::of::<Material>();
        let mut material = sample();

        let green = MaterialProvider.accessor(ty, "Tint.g").unwrap();
        assert_eq!(green.get(&material).unwrap().downcast_ref::<f32>(), Some(&0.2));
        green.set(&mut material, Box::new(0.75_f32)).unwrap();
        assert_eq!(material.get("Tint"), Some(&ShaderValue::Color([0.1, 0.75, 0.3, 1.0])));

        let layers = MaterialProvider.accessor(ty, "Layers").unwrap();
        layers.set(&mut material, Box::new(3.4_f32)).unwrap();
        assert_eq!(material.get("Layers"), Some(&ShaderValue::Int(3)));

        let missing = MaterialProvider.accessor(ty, "Gloss").unwrap();
        assert!(matches!(missing.get(&material), Err(AccessError::MissingKey { .. })));

        let texture = MaterialProvider.accessor(ty, "Albedo").unwrap();
        assert!(matches!(texture.get(&material), Err(AccessError::External(_))));

        assert!(MaterialProvider.accessor(ty, "Tint.q").is_err());
        assert!(MaterialProvider.accessor(Type::of::<i32>(), "Tint").is_err());
    }

    #[test]
    fn ranges_keep_their_kind() {
        let mut material = Material::new("fog");
        material.set("Density", ShaderValue::Float(0.1));
        if let Some(p) = material.property_mut("Density") {
            p.kind = ShaderPropertyKind::Range;
        }

        material.set("Density", ShaderValue::Float(0.4));
        assert_eq!(material.property("Density").map(|p| p.kind), Some(ShaderPropertyKind::Range));

        material.set("Density", ShaderValue::Int(1));
        assert_eq!(material.property("Density").map(|p| p.kind), Some(ShaderPropertyKind::Int));
    }
}
