// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometries: literal GeoJSON values or deferred server constructions.
//!
//! One kind-tagged value type covers every geometry; behavior dispatches on
//! the tag rather than on a subclass chain. Constructors resolve locally
//! when the input is fully literal and defer to the server-side
//! `GeometryConstructors.*` operations otherwise.

use std::fmt;

use serde_json::json;

use lattice_expr::{ArgValue, BoundArguments, ExprGraph, FunctionRegistry, NodeId};

use crate::coords::{
    classify, normalize, validate_exact, ConstructionError, CoordSource, CoordTree, InputKind,
};

/// Geometry type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// A single position.
    Point,
    /// Zero or more positions.
    MultiPoint,
    /// A connected sequence of positions.
    LineString,
    /// A closed line.
    LinearRing,
    /// Zero or more linestrings.
    MultiLineString,
    /// One or more rings, the first being the shell.
    Polygon,
    /// Zero or more polygons.
    MultiPolygon,
    /// A heterogeneous list of member geometries.
    GeometryCollection,
}

impl GeometryKind {
    /// Coordinate nesting depth this kind requires; `None` for
    /// [`GeometryKind::GeometryCollection`], which nests geometries instead.
    #[must_use]
    pub fn required_depth(self) -> Option<usize> {
        match self {
            Self::Point => Some(1),
            Self::MultiPoint | Self::LineString | Self::LinearRing => Some(2),
            Self::MultiLineString | Self::Polygon => Some(3),
            Self::MultiPolygon => Some(4),
            Self::GeometryCollection => None,
        }
    }

    /// Whether an empty coordinate array means a valid zero-member geometry.
    #[must_use]
    pub fn is_multi(self) -> bool {
        matches!(
            self,
            Self::MultiPoint | Self::MultiLineString | Self::MultiPolygon
        )
    }

    /// Parses a GeoJSON `type` name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Point" => Some(Self::Point),
            "MultiPoint" => Some(Self::MultiPoint),
            "LineString" => Some(Self::LineString),
            "LinearRing" => Some(Self::LinearRing),
            "MultiLineString" => Some(Self::MultiLineString),
            "Polygon" => Some(Self::Polygon),
            "MultiPolygon" => Some(Self::MultiPolygon),
            "GeometryCollection" => Some(Self::GeometryCollection),
            _ => None,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::LineString => "LineString",
            Self::LinearRing => "LinearRing",
            Self::MultiLineString => "MultiLineString",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        };
        f.write_str(name)
    }
}

/// A validated literal geometry.
///
/// Coordinates are present for every kind except
/// [`GeometryKind::GeometryCollection`], which holds member geometries
/// instead. Destroyed with its owner; never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryValue {
    kind: GeometryKind,
    coordinates: Option<CoordTree>,
    geometries: Option<Vec<GeometryValue>>,
    proj: Option<String>,
    geodesic: Option<bool>,
    even_odd: Option<bool>,
}

impl GeometryValue {
    /// The geometry's type tag.
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Validated coordinates; `None` for a GeometryCollection.
    pub fn coordinates(&self) -> Option<&CoordTree> {
        self.coordinates.as_ref()
    }

    /// Member geometries; `Some` only for a GeometryCollection.
    pub fn geometries(&self) -> Option<&[GeometryValue]> {
        self.geometries.as_deref()
    }

    /// Declared projection id, when one was supplied.
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Whether line segments are spherical geodesics, when declared.
    #[must_use]
    pub fn geodesic(&self) -> Option<bool> {
        self.geodesic
    }

    /// Whether polygon interiors follow the even/odd rule rather than the
    /// left-inside rule, when declared.
    #[must_use]
    pub fn even_odd(&self) -> Option<bool> {
        self.even_odd
    }

    /// Renders the standard GeoJSON object, with the extension keys
    /// `geodesic`, `evenOdd`, and a named-CRS `crs` when present.
    pub fn to_geojson(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        out.insert("type".into(), json!(self.kind.to_string()));
        if let Some(members) = &self.geometries {
            out.insert(
                "geometries".into(),
                serde_json::Value::Array(members.iter().map(Self::to_geojson).collect()),
            );
        }
        if let Some(coords) = &self.coordinates {
            out.insert("coordinates".into(), coords.to_json());
        }
        if let Some(proj) = &self.proj {
            out.insert(
                "crs".into(),
                json!({"type": "name", "properties": {"name": proj}}),
            );
        }
        if let Some(geodesic) = self.geodesic {
            out.insert("geodesic".into(), json!(geodesic));
        }
        if let Some(even_odd) = self.even_odd {
            out.insert("evenOdd".into(), json!(even_odd));
        }
        serde_json::Value::Object(out)
    }
}

/// A geometry handle: either a literal [`GeometryValue`] or a deferred
/// server construction identified by its graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    repr: Repr,
}

#[derive(Debug, Clone, PartialEq)]
enum Repr {
    Literal(GeometryValue),
    Deferred(NodeId),
}

impl Geometry {
    fn literal(value: GeometryValue) -> Self {
        Self {
            repr: Repr::Literal(value),
        }
    }

    /// Reinterprets an existing graph node as a geometry.
    #[must_use]
    pub fn from_node(id: NodeId) -> Self {
        Self {
            repr: Repr::Deferred(id),
        }
    }

    /// Builds a geometry from a literal GeoJSON object.
    ///
    /// `proj` overrides any CRS the GeoJSON declares (and skips its
    /// validation); `geodesic` and `even_odd` override the corresponding
    /// extension keys.
    ///
    /// # Errors
    ///
    /// [`ConstructionError`] for an unknown type, wrong nesting depth,
    /// malformed coordinates, non-boolean extension keys, or a CRS not in
    /// the named-CRS form.
    pub fn from_geojson(
        value: &serde_json::Value,
        proj: Option<String>,
        geodesic: Option<bool>,
        even_odd: Option<bool>,
    ) -> Result<Self, ConstructionError> {
        value_from_geojson(value, proj, geodesic, even_odd).map(Self::literal)
    }

    /// The literal value, when resolved client-side.
    pub fn value(&self) -> Option<&GeometryValue> {
        match &self.repr {
            Repr::Literal(value) => Some(value),
            Repr::Deferred(_) => None,
        }
    }

    /// The graph node, when construction was deferred to the server.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        match &self.repr {
            Repr::Literal(_) => None,
            Repr::Deferred(id) => Some(*id),
        }
    }

    /// Whether the server must construct this geometry.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self.repr, Repr::Deferred(_))
    }

    /// The GeoJSON object for a literal geometry.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::DeferredGeometry`] when the value is only known
    /// to the remote evaluator.
    pub fn to_geojson(&self) -> Result<serde_json::Value, ConstructionError> {
        match &self.repr {
            Repr::Literal(value) => Ok(value.to_geojson()),
            Repr::Deferred(_) => Err(ConstructionError::DeferredGeometry),
        }
    }

    /// The GeoJSON text for a literal geometry.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::DeferredGeometry`] when the value is only known
    /// to the remote evaluator.
    pub fn to_geojson_string(&self) -> Result<String, ConstructionError> {
        self.to_geojson().map(|v| v.to_string())
    }

    /// The geometry as an argument value: the literal GeoJSON, or the node
    /// reference when deferred.
    pub fn to_arg(&self) -> ArgValue {
        match &self.repr {
            Repr::Literal(value) => ArgValue::Literal(value.to_geojson()),
            Repr::Deferred(id) => ArgValue::Node(*id),
        }
    }

    /// Demotes the geometry to a graph node, allocating a literal node when
    /// it was resolved client-side.
    pub fn to_node(&self, graph: &mut ExprGraph) -> NodeId {
        match &self.repr {
            Repr::Literal(value) => graph.literal(value.to_geojson()),
            Repr::Deferred(id) => *id,
        }
    }
}

/// Optional constructor parameters.
///
/// Supplying `proj`, `geodesic`, or `max_error` forces server construction
/// (the client cannot reproject or resample); `even_odd` alone stays
/// client-side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryOptions {
    /// Projection of the coordinates, e.g. `EPSG:4326`.
    pub proj: Option<String>,
    /// Whether line segments are spherical geodesics.
    pub geodesic: Option<bool>,
    /// Max error for any reprojection the server must perform.
    pub max_error: Option<f64>,
    /// Polygon interior rule: even/odd when true, left-inside when false.
    pub even_odd: Option<bool>,
}

/// Result of the client-or-server construction decision.
enum Built {
    Literal(CoordTree),
    Deferred(NodeId),
}

/// Geometry constructors, bound to the graph the results live in and the
/// registry that resolves server-side constructor signatures.
pub struct GeometryBuilder<'a> {
    graph: &'a mut ExprGraph,
    registry: &'a FunctionRegistry,
}

impl<'a> GeometryBuilder<'a> {
    /// Binds a builder to `graph` and `registry`.
    pub fn new(graph: &'a mut ExprGraph, registry: &'a FunctionRegistry) -> Self {
        Self { graph, registry }
    }

    /// Constructs a Point from one `[x, y]` pair.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::PointArity`] unless exactly one pair is given;
    /// other [`ConstructionError`]s for malformed input.
    pub fn point(
        &mut self,
        coords: impl Into<CoordSource>,
        opts: GeometryOptions,
    ) -> Result<Geometry, ConstructionError> {
        match self.construct("Point", 1, &coords.into(), &opts)? {
            Built::Deferred(id) => Ok(Geometry::from_node(id)),
            Built::Literal(tree @ CoordTree::Pair(_)) => {
                Ok(finish(GeometryKind::Point, tree, &opts, false))
            }
            Built::Literal(_) => Err(ConstructionError::PointArity),
        }
    }

    /// Constructs a MultiPoint from a list of points.
    ///
    /// # Errors
    ///
    /// [`ConstructionError`] for malformed input.
    pub fn multi_point(
        &mut self,
        coords: impl Into<CoordSource>,
        opts: GeometryOptions,
    ) -> Result<Geometry, ConstructionError> {
        self.simple("MultiPoint", GeometryKind::MultiPoint, 2, coords.into(), opts, false)
    }

    /// Constructs a LineString from a list of at least two points.
    ///
    /// # Errors
    ///
    /// [`ConstructionError`] for malformed input.
    pub fn line_string(
        &mut self,
        coords: impl Into<CoordSource>,
        opts: GeometryOptions,
    ) -> Result<Geometry, ConstructionError> {
        self.simple("LineString", GeometryKind::LineString, 2, coords.into(), opts, false)
    }

    /// Constructs a LinearRing from a list of points.
    ///
    /// # Errors
    ///
    /// [`ConstructionError`] for malformed input.
    pub fn linear_ring(
        &mut self,
        coords: impl Into<CoordSource>,
        opts: GeometryOptions,
    ) -> Result<Geometry, ConstructionError> {
        self.simple("LinearRing", GeometryKind::LinearRing, 2, coords.into(), opts, false)
    }

    /// Constructs a MultiLineString from a list of linestrings.
    ///
    /// # Errors
    ///
    /// [`ConstructionError`] for malformed input.
    pub fn multi_line_string(
        &mut self,
        coords: impl Into<CoordSource>,
        opts: GeometryOptions,
    ) -> Result<Geometry, ConstructionError> {
        self.simple(
            "MultiLineString",
            GeometryKind::MultiLineString,
            3,
            coords.into(),
            opts,
            false,
        )
    }

    /// Constructs a Polygon from a list of rings. Defaults `evenOdd` to
    /// true when not supplied.
    ///
    /// # Errors
    ///
    /// [`ConstructionError`] for malformed input.
    pub fn polygon(
        &mut self,
        coords: impl Into<CoordSource>,
        opts: GeometryOptions,
    ) -> Result<Geometry, ConstructionError> {
        self.simple("Polygon", GeometryKind::Polygon, 3, coords.into(), opts, true)
    }

    /// Constructs a MultiPolygon from a list of polygons. Defaults
    /// `evenOdd` to true when not supplied.
    ///
    /// # Errors
    ///
    /// [`ConstructionError`] for malformed input.
    pub fn multi_polygon(
        &mut self,
        coords: impl Into<CoordSource>,
        opts: GeometryOptions,
    ) -> Result<Geometry, ConstructionError> {
        self.simple("MultiPolygon", GeometryKind::MultiPolygon, 4, coords.into(), opts, true)
    }

    /// Constructs a rectangular Polygon from two corner points (or four
    /// bare numbers `x1, y1, x2, y2`).
    ///
    /// GeoJSON has no Rectangle type, so corners `(x1, y1)`, `(x2, y2)`
    /// expand into the closed ring `[[x1,y2],[x1,y1],[x2,y1],[x2,y2]]` and
    /// the result is a Polygon with one ring. The vertex order fixes the
    /// ring's winding direction, which the interior rule depends on.
    /// Defaults `evenOdd` to true when not supplied.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::RectangleArity`] unless exactly two corners are
    /// given; other [`ConstructionError`]s for malformed input.
    pub fn rectangle(
        &mut self,
        coords: impl Into<CoordSource>,
        opts: GeometryOptions,
    ) -> Result<Geometry, ConstructionError> {
        match self.construct("Rectangle", 2, &coords.into(), &opts)? {
            Built::Deferred(id) => Ok(Geometry::from_node(id)),
            Built::Literal(CoordTree::List(points)) => {
                let [CoordTree::Pair([x1, y1]), CoordTree::Pair([x2, y2])] = points.as_slice()
                else {
                    return Err(ConstructionError::RectangleArity);
                };
                let ring = CoordTree::List(vec![CoordTree::List(vec![
                    CoordTree::Pair([*x1, *y2]),
                    CoordTree::Pair([*x1, *y1]),
                    CoordTree::Pair([*x2, *y1]),
                    CoordTree::Pair([*x2, *y2]),
                ])]);
                Ok(finish(GeometryKind::Polygon, ring, &opts, true))
            }
            Built::Literal(CoordTree::Pair(_)) => Err(ConstructionError::RectangleArity),
        }
    }

    fn simple(
        &mut self,
        api_name: &str,
        kind: GeometryKind,
        depth: usize,
        coords: CoordSource,
        opts: GeometryOptions,
        default_even_odd: bool,
    ) -> Result<Geometry, ConstructionError> {
        match self.construct(api_name, depth, &coords, &opts)? {
            Built::Deferred(id) => Ok(Geometry::from_node(id)),
            Built::Literal(tree) => Ok(finish(kind, tree, &opts, default_even_odd)),
        }
    }

    /// The construction decision: fully literal input with no reprojection
    /// options resolves client-side; anything else becomes a deferred call
    /// to the named server constructor with the raw, unnormalized
    /// arguments. No `evenOdd` default is injected on the deferred path —
    /// the server infers one from the projection.
    fn construct(
        &mut self,
        api_name: &str,
        depth: usize,
        coords: &CoordSource,
        opts: &GeometryOptions,
    ) -> Result<Built, ConstructionError> {
        let deferred = matches!(classify(coords), InputKind::GeometryRefs)
            || opts.proj.is_some()
            || opts.geodesic.is_some()
            || opts.max_error.is_some();
        if !deferred {
            return Ok(Built::Literal(normalize(depth, coords)?));
        }
        let mut args = BoundArguments::new();
        args.insert("coordinates", coord_arg(coords));
        if let Some(proj) = &opts.proj {
            args.insert("crs", ArgValue::Literal(json!(proj)));
        }
        if let Some(geodesic) = opts.geodesic {
            args.insert("geodesic", geodesic);
        }
        if let Some(max_error) = opts.max_error {
            args.insert("maxError", max_error);
        }
        if let Some(even_odd) = opts.even_odd {
            args.insert("evenOdd", even_odd);
        }
        let op = format!("GeometryConstructors.{api_name}");
        let id = self.registry.apply_by_name(self.graph, &op, args)?;
        Ok(Built::Deferred(id))
    }
}

fn finish(
    kind: GeometryKind,
    tree: CoordTree,
    opts: &GeometryOptions,
    default_even_odd: bool,
) -> Geometry {
    let even_odd = opts.even_odd.or(default_even_odd.then_some(true));
    Geometry::literal(GeometryValue {
        kind,
        coordinates: Some(tree),
        geometries: None,
        proj: None,
        geodesic: None,
        even_odd,
    })
}

/// Renders raw constructor input as an argument value for the deferred
/// path, preserving its shape exactly.
fn coord_arg(coords: &CoordSource) -> ArgValue {
    match coords {
        CoordSource::Number(n) => ArgValue::Literal(json!(n)),
        CoordSource::List(items) => ArgValue::Array(items.iter().map(coord_arg).collect()),
        CoordSource::Node(id) => ArgValue::Node(*id),
        CoordSource::Geometry(geometry) => geometry.to_arg(),
    }
}

fn value_from_geojson(
    value: &serde_json::Value,
    proj: Option<String>,
    geodesic: Option<bool>,
    even_odd: Option<bool>,
) -> Result<GeometryValue, ConstructionError> {
    let obj = value.as_object().ok_or_else(|| {
        ConstructionError::InvalidGeoJson("geometry must be a JSON object".into())
    })?;
    let type_name = obj
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ConstructionError::InvalidGeoJson("missing type".into()))?;
    let kind = GeometryKind::from_type_name(type_name)
        .ok_or_else(|| ConstructionError::InvalidGeoJson(format!("unknown type {type_name}")))?;

    let (coordinates, geometries) = if kind == GeometryKind::GeometryCollection {
        let members = obj
            .get("geometries")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| {
                ConstructionError::InvalidGeoJson(
                    "GeometryCollection requires a geometries array".into(),
                )
            })?;
        let members = members
            .iter()
            .map(|member| value_from_geojson(member, None, None, None))
            .collect::<Result<Vec<_>, _>>()?;
        (None, Some(members))
    } else {
        let coords = obj
            .get("coordinates")
            .ok_or_else(|| ConstructionError::InvalidGeoJson("missing coordinates".into()))?;
        let source = CoordSource::try_from(coords)?;
        let depth = kind
            .required_depth()
            .unwrap_or(1);
        let tree = validate_exact(depth, kind.is_multi(), &source)?;
        (Some(tree), None)
    };

    let proj = match proj {
        Some(p) => Some(p),
        None => match obj.get("crs") {
            Some(crs) => Some(parse_named_crs(crs)?),
            None => None,
        },
    };
    let geodesic = match geodesic {
        Some(g) => Some(g),
        None => read_bool_key(obj, "geodesic")?,
    };
    let even_odd = match even_odd {
        Some(e) => Some(e),
        None => read_bool_key(obj, "evenOdd")?,
    };

    Ok(GeometryValue {
        kind,
        coordinates,
        geometries,
        proj,
        geodesic,
        even_odd,
    })
}

fn read_bool_key(
    obj: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<Option<bool>, ConstructionError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => value.as_bool().map(Some).ok_or_else(|| {
            ConstructionError::InvalidGeoJson(format!("{key} must be a boolean"))
        }),
    }
}

/// Accepts only the named-CRS GeoJSON form and returns the declared name.
fn parse_named_crs(crs: &serde_json::Value) -> Result<String, ConstructionError> {
    let obj = crs.as_object().ok_or(ConstructionError::InvalidCrs)?;
    if obj.get("type").and_then(serde_json::Value::as_str) != Some("name") {
        return Err(ConstructionError::InvalidCrs);
    }
    obj.get("properties")
        .and_then(serde_json::Value::as_object)
        .and_then(|props| props.get("name"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or(ConstructionError::InvalidCrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_expr::ExprNode;
    use serde_json::json;

    fn scope() -> (ExprGraph, FunctionRegistry) {
        (ExprGraph::new(), FunctionRegistry::new())
    }

    #[test]
    fn rectangle_corners_expand_in_fixed_vertex_order() {
        let (mut graph, registry) = scope();
        let mut builder = GeometryBuilder::new(&mut graph, &registry);
        let rect = builder
            .rectangle(vec![0.0, 0.0, 2.0, 3.0], GeometryOptions::default())
            .unwrap();
        let value = rect.value().unwrap();
        assert_eq!(value.kind(), GeometryKind::Polygon);
        assert_eq!(
            value.coordinates().unwrap().to_json(),
            json!([[[0.0, 3.0], [0.0, 0.0], [2.0, 0.0], [2.0, 3.0]]])
        );
        // Any kind of polygon defaults to the even/odd interior rule.
        assert_eq!(value.even_odd(), Some(true));
    }

    #[test]
    fn rectangle_requires_two_corners() {
        let (mut graph, registry) = scope();
        let mut builder = GeometryBuilder::new(&mut graph, &registry);
        let err = builder
            .rectangle(
                vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]],
                GeometryOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err, ConstructionError::RectangleArity);
    }

    #[test]
    fn point_resolves_client_side_without_options() {
        let (mut graph, registry) = scope();
        let mut builder = GeometryBuilder::new(&mut graph, &registry);
        let point = builder
            .point(vec![1.5, 2.5], GeometryOptions::default())
            .unwrap();
        assert!(!point.is_deferred());
        assert_eq!(
            point.to_geojson().unwrap(),
            json!({"type": "Point", "coordinates": [1.5, 2.5]})
        );
        // No node was allocated for a purely literal geometry.
        assert!(graph.is_empty());
    }

    #[test]
    fn point_requires_a_single_pair() {
        let (mut graph, registry) = scope();
        let mut builder = GeometryBuilder::new(&mut graph, &registry);
        let err = builder
            .point(Vec::<f64>::new(), GeometryOptions::default())
            .unwrap_err();
        assert_eq!(err, ConstructionError::PointArity);
    }

    #[test]
    fn projection_defers_to_the_server_with_raw_arguments() {
        let (mut graph, registry) = scope();
        let mut builder = GeometryBuilder::new(&mut graph, &registry);
        let opts = GeometryOptions {
            proj: Some("EPSG:3857".to_string()),
            ..GeometryOptions::default()
        };
        // Flat numbers stay flat: the server normalizes deferred input.
        let geometry = builder.point(vec![100.0, 200.0], opts).unwrap();
        let id = geometry.node_id().unwrap();
        match graph.node(id) {
            Some(ExprNode::Invocation { op, args, .. }) => {
                assert_eq!(op, "GeometryConstructors.Point");
                assert_eq!(
                    args.get("coordinates"),
                    Some(&ArgValue::Array(vec![
                        ArgValue::Literal(json!(100.0)),
                        ArgValue::Literal(json!(200.0)),
                    ]))
                );
                assert_eq!(args.get("crs"), Some(&ArgValue::Literal(json!("EPSG:3857"))));
                // The server infers the interior rule from the projection.
                assert_eq!(args.get("evenOdd"), None);
            }
            other => panic!("expected invocation, got {other:?}"),
        }
    }

    #[test]
    fn geometry_handles_in_coordinates_defer() {
        let (mut graph, registry) = scope();
        let mut builder = GeometryBuilder::new(&mut graph, &registry);
        let a = builder.point(vec![0.0, 0.0], GeometryOptions::default()).unwrap();
        let b = builder.point(vec![1.0, 1.0], GeometryOptions::default()).unwrap();
        let multi = builder
            .multi_point(
                vec![CoordSource::from(a), CoordSource::from(b)],
                GeometryOptions::default(),
            )
            .unwrap();
        let id = multi.node_id().expect("handles force server construction");
        match graph.node(id) {
            Some(ExprNode::Invocation { op, .. }) => {
                assert_eq!(op, "GeometryConstructors.MultiPoint");
            }
            other => panic!("expected invocation, got {other:?}"),
        }
    }

    #[test]
    fn even_odd_alone_stays_client_side() {
        let (mut graph, registry) = scope();
        let mut builder = GeometryBuilder::new(&mut graph, &registry);
        let opts = GeometryOptions {
            even_odd: Some(false),
            ..GeometryOptions::default()
        };
        let polygon = builder
            .polygon(vec![0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0], opts)
            .unwrap();
        let value = polygon.value().unwrap();
        assert_eq!(value.even_odd(), Some(false));
        assert_eq!(
            value.coordinates().unwrap().to_json(),
            json!([[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]])
        );
    }

    #[test]
    fn geojson_point_round_trips() {
        let geojson = json!({"type": "Point", "coordinates": [10.0, 20.0]});
        let geometry = Geometry::from_geojson(&geojson, None, None, None).unwrap();
        assert_eq!(geometry.to_geojson().unwrap(), geojson);
    }

    #[test]
    fn geojson_collection_validates_every_member() {
        let geojson = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [0.0, 0.0]},
                {"type": "MultiPolygon", "coordinates": []},
            ],
        });
        let geometry = Geometry::from_geojson(&geojson, None, None, None).unwrap();
        let members = geometry.value().unwrap().geometries().unwrap();
        assert_eq!(members.len(), 2);

        let bad = json!({
            "type": "GeometryCollection",
            "geometries": [{"type": "LineString", "coordinates": [[0.0, 0.0], [[0.0, 0.0]]]}],
        });
        assert!(Geometry::from_geojson(&bad, None, None, None).is_err());

        let empty = json!({"type": "GeometryCollection", "geometries": []});
        assert!(Geometry::from_geojson(&empty, None, None, None).is_ok());
    }

    #[test]
    fn named_crs_is_the_only_accepted_form() {
        let named = json!({
            "type": "Point",
            "coordinates": [0.0, 0.0],
            "crs": {"type": "name", "properties": {"name": "EPSG:4326"}},
        });
        let geometry = Geometry::from_geojson(&named, None, None, None).unwrap();
        assert_eq!(geometry.value().unwrap().proj(), Some("EPSG:4326"));

        let linked = json!({
            "type": "Point",
            "coordinates": [0.0, 0.0],
            "crs": {"type": "link", "properties": {"href": "http://example.com"}},
        });
        assert_eq!(
            Geometry::from_geojson(&linked, None, None, None).unwrap_err(),
            ConstructionError::InvalidCrs
        );

        // An explicit projection overrides the declared CRS entirely.
        let overridden =
            Geometry::from_geojson(&linked, Some("EPSG:3857".to_string()), None, None).unwrap();
        assert_eq!(overridden.value().unwrap().proj(), Some("EPSG:3857"));
    }

    #[test]
    fn geojson_extension_keys_are_strict_booleans() {
        let geojson = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
            "geodesic": true,
            "evenOdd": false,
        });
        let geometry = Geometry::from_geojson(&geojson, None, None, None).unwrap();
        let value = geometry.value().unwrap();
        assert_eq!(value.geodesic(), Some(true));
        assert_eq!(value.even_odd(), Some(false));

        let bad = json!({"type": "Point", "coordinates": [0.0, 0.0], "geodesic": "yes"});
        assert!(Geometry::from_geojson(&bad, None, None, None).is_err());
    }

    #[test]
    fn deferred_geometry_has_no_literal_geojson() {
        let (mut graph, registry) = scope();
        let mut builder = GeometryBuilder::new(&mut graph, &registry);
        let opts = GeometryOptions {
            geodesic: Some(true),
            ..GeometryOptions::default()
        };
        let line = builder
            .line_string(vec![0.0, 0.0, 1.0, 1.0], opts)
            .unwrap();
        assert!(line.is_deferred());
        assert_eq!(
            line.to_geojson().unwrap_err(),
            ConstructionError::DeferredGeometry
        );
    }
}
