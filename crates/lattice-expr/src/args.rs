// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Argument extraction: resolving a call's actual arguments against a
//! declared parameter list.
//!
//! A call arrives as an ordered value sequence, a named-value map, or the
//! ambiguous case of a sequence whose single element is a map. One rule
//! resolves the ambiguity everywhere (see [`extract`]); there are no
//! per-call-site heuristics.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::graph::NodeId;
use crate::signature::FunctionSignature;

/// A value bound to a parameter: a literal, a reference to a graph node, or
/// a container of either.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A concrete JSON value.
    Literal(serde_json::Value),
    /// A reference to a node in the expression graph.
    Node(NodeId),
    /// An ordered container, serialized element-wise.
    Array(Vec<ArgValue>),
    /// A string-keyed container, serialized entry-wise.
    Object(BTreeMap<String, ArgValue>),
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Literal(value)
    }
}

impl From<NodeId> for ArgValue {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Literal(serde_json::Value::from(value))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Literal(serde_json::Value::Bool(value))
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Literal(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Literal(serde_json::Value::String(value))
    }
}

impl From<Vec<ArgValue>> for ArgValue {
    fn from(items: Vec<ArgValue>) -> Self {
        Self::Array(items)
    }
}

/// Keys of a string-keyed map view of `value`, when it is one.
///
/// Both the container form and a literal JSON object qualify; the extractor
/// needs the keys before deciding how to read the map.
fn map_keys(value: &ArgValue) -> Option<Vec<&str>> {
    match value {
        ArgValue::Object(map) => Some(map.keys().map(String::as_str).collect()),
        ArgValue::Literal(serde_json::Value::Object(map)) => {
            Some(map.keys().map(String::as_str).collect())
        }
        _ => None,
    }
}

/// Converts a map-shaped value into named-argument entries.
fn into_named_map(value: ArgValue) -> Option<BTreeMap<String, ArgValue>> {
    match value {
        ArgValue::Object(map) => Some(map),
        ArgValue::Literal(serde_json::Value::Object(map)) => Some(
            map.into_iter()
                .map(|(k, v)| (k, ArgValue::Literal(v)))
                .collect(),
        ),
        _ => None,
    }
}

/// Arguments bound to declared parameter names.
///
/// Built fresh per call and never mutated after construction; entries
/// iterate in name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments(BTreeMap<String, ArgValue>);

impl BoundArguments {
    /// Creates an empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Binds `value` to `name`, returning any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Option<ArgValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Returns the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    /// Whether `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameter is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates bindings in parameter-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, ArgValue)> for BoundArguments {
    fn from_iter<T: IntoIterator<Item = (String, ArgValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Error raised when a call cannot be bound to a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A required parameter was absent from the call.
    #[error("missing required argument: {0}")]
    MissingArgument(String),
    /// A named-argument key matched no declared parameter.
    #[error("unrecognized argument: {0}")]
    UnrecognizedArgument(String),
    /// The call supplied more positional values than declared parameters.
    #[error("too many positional arguments: expected at most {expected}, got {given}")]
    TooManyArguments {
        /// Number of declared parameters.
        expected: usize,
        /// Number of positional values supplied.
        given: usize,
    },
    /// A parameter was supplied both positionally and by name.
    #[error("argument supplied both positionally and by name: {0}")]
    ConflictingArgument(String),
}

/// Resolves a call against `signature`'s declared parameter list.
///
/// Resolution rule: when `named` is absent and `positional` is a single
/// map-shaped value that the first declared parameter does not accept as a
/// literal ([`crate::TypeTag::accepts_map_literal`]), the map is read as
/// named arguments. Otherwise positional values bind in declared order,
/// then named entries merge in, then defaults fill absent optionals.
///
/// Pure function of its inputs; on error nothing is bound.
///
/// # Errors
///
/// [`BindingError::TooManyArguments`] when positional values outnumber the
/// declared parameters, [`BindingError::UnrecognizedArgument`] for a named
/// key with no declared parameter, [`BindingError::ConflictingArgument`]
/// when a parameter is bound twice, and [`BindingError::MissingArgument`]
/// for a required parameter the call never supplied.
pub fn extract(
    signature: &FunctionSignature,
    positional: Vec<ArgValue>,
    named: Option<BTreeMap<String, ArgValue>>,
) -> Result<BoundArguments, BindingError> {
    let mut positional = positional;
    let mut named = named;

    if named.is_none() && positional.len() == 1 {
        let reads_as_named = match (map_keys(&positional[0]), signature.params.first()) {
            (Some(keys), Some(first)) => !first.type_tag.accepts_map_literal(keys.into_iter()),
            _ => false,
        };
        if reads_as_named {
            named = positional.pop().and_then(into_named_map);
        }
    }

    if positional.len() > signature.params.len() {
        return Err(BindingError::TooManyArguments {
            expected: signature.params.len(),
            given: positional.len(),
        });
    }

    let mut bound = BTreeMap::new();
    for (param, value) in signature.params.iter().zip(positional) {
        bound.insert(param.name.clone(), value);
    }

    if let Some(map) = named {
        for (name, value) in map {
            if signature.param(&name).is_none() {
                return Err(BindingError::UnrecognizedArgument(name));
            }
            if bound.contains_key(&name) {
                return Err(BindingError::ConflictingArgument(name));
            }
            bound.insert(name, value);
        }
    }

    for param in &signature.params {
        if bound.contains_key(&param.name) {
            continue;
        }
        if param.required {
            return Err(BindingError::MissingArgument(param.name.clone()));
        }
        if let Some(default) = &param.default {
            bound.insert(param.name.clone(), ArgValue::Literal(default.clone()));
        }
    }

    Ok(BoundArguments(bound))
}
