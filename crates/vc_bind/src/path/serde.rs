use alloc::format;
use core::fmt;

use serde_core::de::{Error, Visitor};
use serde_core::{Deserialize, Deserializer, Serialize, Serializer};

use super::BindingPath;

impl Serialize for BindingPath {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BindingPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BindingPathVisitor;

        impl Visitor<'_> for BindingPathVisitor {
            type Value = BindingPath;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("string containing a binding path")
            }

            fn visit_str<E: Error>(self, path: &str) -> Result<Self::Value, E> {
                BindingPath::parse(path).map_err(|err| Error::custom(format!("`{path}`: {err}")))
            }
        }

        deserializer.deserialize_str(BindingPathVisitor)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    use crate::path::BindingPath;

    #[test]
    fn json_stores_normalized_text() {
        let path = BindingPath::parse("a / b[ 'k' ]").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""a.b[\"k\"]""#);

        let back: BindingPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);

        let err = serde_json::from_str::<BindingPath>(r#""a[1""#).unwrap_err();
        assert!(err.to_string().contains("`a[1`"));
    }

    #[test]
    fn ron_list_of_paths() {
        let paths: Vec<BindingPath> = ron::from_str(r#"["x", "items[#0]?", "this"]"#).unwrap();
        let text: Vec<String> = paths.iter().map(|p| p.as_str().into()).collect();
        assert_eq!(text, ["x", "items[#0]?", "this"]);
        assert_eq!(ron::to_string(&paths[1]).unwrap(), r#""items[#0]?""#);
    }
}
