// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end serialization: geometries and reused sub-expressions.

use lattice_expr::{ArgValue, BoundArguments, ExprGraph, FunctionRegistry};
use lattice_geom::{GeometryBuilder, GeometryOptions};
use lattice_wire::{serialize, serialize_to_string};
use serde_json::json;

#[test]
fn deferred_geometry_serializes_as_a_constructor_call() {
    let mut graph = ExprGraph::new();
    let registry = FunctionRegistry::new();
    let mut builder = GeometryBuilder::new(&mut graph, &registry);
    let opts = GeometryOptions {
        proj: Some("EPSG:3857".to_string()),
        ..GeometryOptions::default()
    };
    let point = builder.point(vec![100.0, 200.0], opts).unwrap();
    let root = point.node_id().unwrap();

    let payload = serialize(&graph, root).unwrap();
    assert_eq!(
        payload,
        json!({
            "op": "GeometryConstructors.Point",
            "args": {"coordinates": [100.0, 200.0], "crs": "EPSG:3857"},
        })
    );
}

#[test]
fn filter_reused_across_branches_is_emitted_once() {
    let mut graph = ExprGraph::new();

    // One filter node reused by two different collection operations.
    let mut filter_args = BoundArguments::new();
    filter_args.insert("name", ArgValue::Literal(json!("size")));
    filter_args.insert("value", ArgValue::Literal(json!(10)));
    let filter = graph.invocation("Filter.eq", None, filter_args).unwrap();

    let mut left_args = BoundArguments::new();
    left_args.insert("collection", ArgValue::Literal(json!("table/a")));
    left_args.insert("filter", ArgValue::Node(filter));
    let left = graph.invocation("Collection.filter", None, left_args).unwrap();

    let mut right_args = BoundArguments::new();
    right_args.insert("collection", ArgValue::Literal(json!("table/b")));
    right_args.insert("filter", ArgValue::Node(filter));
    let right = graph.invocation("Collection.filter", None, right_args).unwrap();

    let mut merge_args = BoundArguments::new();
    merge_args.insert("collection1", ArgValue::Node(left));
    merge_args.insert("collection2", ArgValue::Node(right));
    let root = graph.invocation("Collection.merge", None, merge_args).unwrap();

    let payload = serialize(&graph, root).unwrap();
    let text = payload.to_string();
    // The filter payload appears exactly once; the other edge back-refers.
    assert_eq!(text.matches("Filter.eq").count(), 1);
    assert_eq!(
        payload["args"]["collection1"]["args"]["filter"],
        json!({"args": {"name": "size", "value": 10}, "op": "Filter.eq"})
    );
    assert_eq!(
        payload["args"]["collection2"]["args"]["filter"],
        // Ordinals follow first encounter: root 0, collection1's branch 1,
        // the shared filter 2.
        json!({"ref": 2})
    );

    // Determinism: an unchanged graph re-serializes byte-identically.
    assert_eq!(
        serialize_to_string(&graph, root).unwrap(),
        serialize_to_string(&graph, root).unwrap()
    );
}

#[test]
fn literal_geometry_rides_along_as_plain_geojson() {
    let mut graph = ExprGraph::new();
    let registry = FunctionRegistry::new();
    let mut builder = GeometryBuilder::new(&mut graph, &registry);
    let rect = builder
        .rectangle(vec![0.0, 0.0, 2.0, 3.0], GeometryOptions::default())
        .unwrap();

    let mut args = BoundArguments::new();
    args.insert("geometry", rect.to_arg());
    args.insert("maxError", ArgValue::Literal(json!(1)));
    let root = graph.invocation("Geometry.area", None, args).unwrap();

    let payload = serialize(&graph, root).unwrap();
    assert_eq!(
        payload,
        json!({
            "op": "Geometry.area",
            "args": {
                "geometry": {
                    "coordinates": [[[0.0, 3.0], [0.0, 0.0], [2.0, 0.0], [2.0, 3.0]]],
                    "evenOdd": true,
                    "type": "Polygon",
                },
                "maxError": 1,
            },
        })
    );
}
