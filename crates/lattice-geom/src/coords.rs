// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Coordinate classification, validation, and normalization.
//!
//! Raw constructor input arrives as flat numbers, pre-nested lists, deferred
//! graph references, or already-built geometry handles. The input is
//! classified once ([`classify`]), and literal trees are normalized to the
//! exact nesting depth their geometry kind requires ([`normalize`]).

use thiserror::Error;

use lattice_expr::NodeId;

use crate::geometry::Geometry;

/// Raw coordinate input accepted by geometry constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordSource {
    /// A bare number.
    Number(f64),
    /// A nested list of further input.
    List(Vec<CoordSource>),
    /// A deferred graph reference, resolved by the remote evaluator.
    Node(NodeId),
    /// An already-built geometry handle.
    Geometry(Box<Geometry>),
}

impl From<Vec<f64>> for CoordSource {
    fn from(numbers: Vec<f64>) -> Self {
        Self::List(numbers.into_iter().map(Self::Number).collect())
    }
}

impl From<Vec<[f64; 2]>> for CoordSource {
    fn from(points: Vec<[f64; 2]>) -> Self {
        Self::List(
            points
                .into_iter()
                .map(|[x, y]| Self::List(vec![Self::Number(x), Self::Number(y)]))
                .collect(),
        )
    }
}

impl From<Vec<CoordSource>> for CoordSource {
    fn from(items: Vec<CoordSource>) -> Self {
        Self::List(items)
    }
}

impl From<NodeId> for CoordSource {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<Geometry> for CoordSource {
    fn from(geometry: Geometry) -> Self {
        Self::Geometry(Box::new(geometry))
    }
}

impl TryFrom<&serde_json::Value> for CoordSource {
    type Error = ConstructionError;

    /// Reads a literal JSON coordinate tree. Only numbers and arrays are
    /// coordinate data; anything else is malformed input.
    fn try_from(value: &serde_json::Value) -> Result<Self, ConstructionError> {
        match value {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| ConstructionError::InvalidGeoJson("non-finite coordinate".into())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            other => Err(ConstructionError::InvalidGeoJson(format!(
                "coordinates must be numbers or arrays, got {other}"
            ))),
        }
    }
}

/// Shape of a constructor's coordinate input, resolved once before
/// normalization rather than probed ad hoc at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Every top-level element is a bare number; pairs consecutively into
    /// `[x, y]` points.
    FlatNumbers,
    /// Pre-nested literal coordinate lists.
    NestedCoordinates,
    /// At least one element, at any depth, is a deferred reference or a
    /// geometry handle; the server must construct the geometry.
    GeometryRefs,
}

/// Classifies raw constructor input.
pub fn classify(input: &CoordSource) -> InputKind {
    if has_server_refs(input) {
        return InputKind::GeometryRefs;
    }
    match input {
        CoordSource::List(items)
            if !items.is_empty()
                && items.iter().all(|i| matches!(i, CoordSource::Number(_))) =>
        {
            InputKind::FlatNumbers
        }
        _ => InputKind::NestedCoordinates,
    }
}

/// Whether any element of `input`, at any depth, must be resolved by the
/// server: a deferred graph reference, or a geometry handle (whose
/// projection and geodesic state the server reconciles).
pub fn has_server_refs(input: &CoordSource) -> bool {
    match input {
        CoordSource::Number(_) => false,
        CoordSource::List(items) => items.iter().any(has_server_refs),
        CoordSource::Node(_) | CoordSource::Geometry(_) => true,
    }
}

/// A validated coordinate tree: leaves are exactly `[x, y]` pairs, every
/// sibling subtree has the same depth, and the whole tree sits at the depth
/// its geometry kind requires.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordTree {
    /// A single `[x, y]` position.
    Pair([f64; 2]),
    /// A list of equally deep subtrees. Empty only for a multi-geometry
    /// with zero members.
    List(Vec<CoordTree>),
}

impl CoordTree {
    /// Renders the tree as a GeoJSON coordinates value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Pair([x, y]) => serde_json::json!([x, y]),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }

    /// Whether the tree is the canonical empty form.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::List(items) if items.is_empty())
    }
}

/// Error raised when literal geometry input cannot be validated. Fatal and
/// synchronous; construction either completes or returns nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    /// A deferred reference appeared where only literal numbers are valid.
    #[error("deferred reference in literal coordinates; use server construction")]
    UnresolvedReference,
    /// A flat coordinate list held an odd number of values.
    #[error("invalid number of bare coordinates: {0}")]
    OddCoordinateCount(usize),
    /// A coordinate leaf was not a two-element numeric pair.
    #[error("coordinate leaf must be a two-element numeric pair")]
    BadLeaf,
    /// Sibling subtrees at one level differ in nesting depth.
    #[error("ragged coordinate nesting: sibling subtrees differ in depth")]
    Ragged,
    /// The overall nesting depth does not match the geometry kind.
    #[error("coordinate nesting depth {found} does not match required depth {expected}")]
    BadNesting {
        /// Depth the geometry kind requires.
        expected: usize,
        /// Depth the input actually has.
        found: usize,
    },
    /// Depth outside the supported 1..=4 range.
    #[error("unsupported nesting depth: {0}")]
    UnsupportedDepth(usize),
    /// A Point constructor did not receive exactly one coordinate pair.
    #[error("a Point requires exactly one [x, y] coordinate pair")]
    PointArity,
    /// A Rectangle constructor did not receive exactly two corner points.
    #[error("a Rectangle requires exactly two corner points or four bare coordinates")]
    RectangleArity,
    /// A CRS declaration was not in the named-CRS GeoJSON form.
    #[error("invalid CRS declaration: only {{\"type\": \"name\", \"properties\": {{\"name\": ...}}}} is accepted")]
    InvalidCrs,
    /// The input was not a recognizable GeoJSON geometry.
    #[error("invalid GeoJSON geometry: {0}")]
    InvalidGeoJson(String),
    /// A deferred geometry was asked for its literal GeoJSON value.
    #[error("a deferred geometry has no literal GeoJSON; evaluate it remotely instead")]
    DeferredGeometry,
    /// Building the deferred server call failed.
    #[error(transparent)]
    Graph(#[from] lattice_expr::GraphError),
}

/// Literal-only working tree. Refs were rejected before this point.
enum Raw {
    Num(f64),
    List(Vec<Raw>),
}

impl Raw {
    fn from_source(input: &CoordSource) -> Result<Self, ConstructionError> {
        match input {
            CoordSource::Number(n) => Ok(Self::Num(*n)),
            CoordSource::List(items) => items
                .iter()
                .map(Self::from_source)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            CoordSource::Node(_) | CoordSource::Geometry(_) => {
                Err(ConstructionError::UnresolvedReference)
            }
        }
    }
}

/// Normalizes literal coordinate input to exactly `depth` nesting levels.
///
/// Flat numbers pair into `[x, y]` points (a two-element list is already a
/// point and stays flat); too-shallow input gains minimal singleton
/// wrapping; ragged structures and malformed leaves are rejected; singleton
/// wrappers around an empty list collapse to the canonical empty form.
/// Normalization is idempotent: feeding a normalized tree back through
/// yields the same tree.
///
/// # Errors
///
/// [`ConstructionError`] for refs in literal input, an odd flat count, bad
/// leaves, ragged nesting, or a depth mismatch.
pub fn normalize(depth: usize, input: &CoordSource) -> Result<CoordTree, ConstructionError> {
    if !(1..=4).contains(&depth) {
        return Err(ConstructionError::UnsupportedDepth(depth));
    }
    let mut raw = pair_flat(Raw::from_source(input)?)?;
    let mut have = list_depth(&raw);
    while have < depth {
        raw = Raw::List(vec![raw]);
        have += 1;
    }
    let (tree, found) = build(&raw)?;
    if found != depth {
        return Err(ConstructionError::BadNesting {
            expected: depth,
            found,
        });
    }
    Ok(collapse_if_empty(tree))
}

/// Pairs a flat all-number list into `[x, y]` points. A two-element list is
/// already a single point; an odd count is an error. Everything else passes
/// through untouched.
fn pair_flat(raw: Raw) -> Result<Raw, ConstructionError> {
    let Raw::List(items) = raw else {
        return Ok(raw);
    };
    let all_numbers = !items.is_empty() && items.iter().all(|i| matches!(i, Raw::Num(_)));
    if !all_numbers || items.len() == 2 {
        return Ok(Raw::List(items));
    }
    if items.len() % 2 != 0 {
        return Err(ConstructionError::OddCoordinateCount(items.len()));
    }
    let numbers: Vec<f64> = items
        .iter()
        .filter_map(|i| match i {
            Raw::Num(n) => Some(*n),
            Raw::List(_) => None,
        })
        .collect();
    Ok(Raw::List(
        numbers
            .chunks_exact(2)
            .map(|pair| Raw::List(vec![Raw::Num(pair[0]), Raw::Num(pair[1])]))
            .collect(),
    ))
}

/// Nesting depth along the first-element spine, as the wrap step counts it.
fn list_depth(raw: &Raw) -> usize {
    match raw {
        Raw::Num(_) => 0,
        Raw::List(items) => 1 + items.first().map_or(0, list_depth),
    }
}

/// Validates the whole tree and converts it, returning the uniform depth.
/// An empty list counts as depth 1 wherever it appears.
fn build(raw: &Raw) -> Result<(CoordTree, usize), ConstructionError> {
    match raw {
        Raw::Num(_) => Err(ConstructionError::BadLeaf),
        Raw::List(items) => {
            if items.is_empty() {
                return Ok((CoordTree::List(Vec::new()), 1));
            }
            if items.iter().all(|i| matches!(i, Raw::Num(_))) {
                let [Raw::Num(x), Raw::Num(y)] = items.as_slice() else {
                    return Err(ConstructionError::BadLeaf);
                };
                return Ok((CoordTree::Pair([*x, *y]), 1));
            }
            if items.iter().any(|i| matches!(i, Raw::Num(_))) {
                return Err(ConstructionError::Ragged);
            }
            let mut children = Vec::with_capacity(items.len());
            let mut depth = None;
            for item in items {
                let (tree, d) = build(item)?;
                if *depth.get_or_insert(d) != d {
                    return Err(ConstructionError::Ragged);
                }
                children.push(tree);
            }
            Ok((
                CoordTree::List(children),
                1 + depth.unwrap_or(0),
            ))
        }
    }
}

/// Validates pre-nested literal coordinates without reshaping them: no
/// pairing, no wrapping, no collapse. Used for GeoJSON intake, where the
/// caller asserts the depth is already correct. `allow_empty` admits a
/// top-level empty array (zero-member multi-geometry).
pub(crate) fn validate_exact(
    depth: usize,
    allow_empty: bool,
    input: &CoordSource,
) -> Result<CoordTree, ConstructionError> {
    let raw = Raw::from_source(input)?;
    let (tree, found) = build(&raw)?;
    if tree.is_empty() && allow_empty {
        return Ok(tree);
    }
    if found != depth {
        return Err(ConstructionError::BadNesting {
            expected: depth,
            found,
        });
    }
    Ok(tree)
}

/// When peeling singleton wrappers ends at an empty list, the value is a
/// zero-member multi-geometry and its canonical form is the bare empty list.
fn collapse_if_empty(tree: CoordTree) -> CoordTree {
    let mut probe = &tree;
    let ends_empty = loop {
        match probe {
            CoordTree::List(items) if items.len() == 1 => probe = &items[0],
            CoordTree::List(items) if items.is_empty() => break true,
            _ => break false,
        }
    };
    if ends_empty {
        CoordTree::List(Vec::new())
    } else {
        tree
    }
}
