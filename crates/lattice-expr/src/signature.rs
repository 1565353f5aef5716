// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Declared shapes of server-side operations.
//!
//! A [`FunctionSignature`] is loaded once per namespace from a metadata
//! source and shared immutably by every invocation node built through it.

use serde::{Deserialize, Serialize};

/// Expected-type tag for a declared parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    /// A numeric scalar.
    Number,
    /// A string scalar.
    String,
    /// A boolean scalar.
    Boolean,
    /// An ordered list of values.
    List,
    /// A string-keyed dictionary of values.
    Dictionary,
    /// A geometry, as a GeoJSON literal or a deferred construction.
    Geometry,
    /// Any value; no shape is enforced.
    Any,
}

impl TypeTag {
    /// Whether a string-keyed map should be read as a literal value for a
    /// parameter of this type, rather than as a named-argument map.
    ///
    /// This is the single positional/named disambiguation rule used by the
    /// argument extractor: `Dictionary` and `Any` accept any map as a
    /// literal; `Geometry` accepts a map carrying the GeoJSON marker key
    /// `type`; every other tag accepts no map, so a lone positional map is
    /// always a named-argument map for them.
    pub fn accepts_map_literal<'a, I>(self, mut keys: I) -> bool
    where
        I: Iterator<Item = &'a str>,
    {
        match self {
            Self::Dictionary | Self::Any => true,
            Self::Geometry => keys.any(|k| k == "type"),
            Self::Number | Self::String | Self::Boolean | Self::List => false,
        }
    }
}

/// One declared parameter of a server-side operation. Immutable once defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name, unique within its signature.
    pub name: String,
    /// Expected type of the bound value.
    pub type_tag: TypeTag,
    /// Whether a call must supply this parameter.
    pub required: bool,
    /// Value bound when an optional parameter is absent from the call.
    pub default: Option<serde_json::Value>,
}

impl ParameterSpec {
    /// Declares a required parameter.
    pub fn required(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
            required: true,
            default: None,
        }
    }

    /// Declares an optional parameter, with `default` bound when absent.
    pub fn optional(
        name: impl Into<String>,
        type_tag: TypeTag,
        default: Option<serde_json::Value>,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag,
            required: false,
            default,
        }
    }
}

/// The declared shape of a server-side operation: ordered parameters, the
/// operation name the evaluator dispatches on, and the return type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Server-side operation name (e.g. `GeometryConstructors.Point`).
    pub name: String,
    /// Declared parameters, in calling order.
    pub params: Vec<ParameterSpec>,
    /// Declared return type.
    pub returns: TypeTag,
}

impl FunctionSignature {
    /// Builds a signature from its parts.
    pub fn new(name: impl Into<String>, params: Vec<ParameterSpec>, returns: TypeTag) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
        }
    }

    /// Looks up a declared parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Declared parameter names, in calling order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_tag_accepts_map_with_type_marker_only() {
        let keys = ["type", "coordinates"];
        assert!(TypeTag::Geometry.accepts_map_literal(keys.iter().copied()));
        let keys = ["coords", "proj"];
        assert!(!TypeTag::Geometry.accepts_map_literal(keys.iter().copied()));
    }

    #[test]
    fn dictionary_and_any_accept_every_map() {
        let keys: [&str; 0] = [];
        assert!(TypeTag::Dictionary.accepts_map_literal(keys.iter().copied()));
        assert!(TypeTag::Any.accepts_map_literal(keys.iter().copied()));
    }

    #[test]
    fn scalar_tags_accept_no_map() {
        let keys = ["type"];
        assert!(!TypeTag::Number.accepts_map_literal(keys.iter().copied()));
        assert!(!TypeTag::List.accepts_map_literal(keys.iter().copied()));
    }
}
