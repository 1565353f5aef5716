// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sharing-preserving graph serializer.
//!
//! Depth-first traversal assigns each distinct node an ordinal at its first
//! encounter and emits the full payload there; every later encounter of the
//! same node emits `{"ref": ordinal}` instead. Output grows with the number
//! of distinct nodes, not edges, and an unchanged graph always re-serializes
//! to identical bytes.

use rustc_hash::FxHashMap;
use serde_json::json;
use thiserror::Error;

use lattice_expr::{ArgValue, ExprGraph, ExprNode, NodeId};

/// Envelope key naming the invoked operation. External contract; stable.
pub const KEY_OP: &str = "op";
/// Envelope key holding the invocation's arguments. External contract.
pub const KEY_ARGS: &str = "args";
/// Envelope key naming a bound variable. External contract.
pub const KEY_VAR_REF: &str = "varRef";
/// Envelope key carrying a back-reference ordinal. External contract.
pub const KEY_REF: &str = "ref";

/// Error raised when a graph cannot be serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireError {
    /// The root or an argument referenced a node this graph never
    /// allocated.
    #[error("node {0} is not allocated in the graph being serialized")]
    UnknownNode(NodeId),
}

/// Serializes the graph reachable from `root` into the wire payload.
///
/// An invocation's arguments are visited in declared parameter order when
/// the node carries a signature (any undeclared extras follow in name
/// order); unsigned invocations visit arguments in name order. Containers
/// are visited element-wise. Either a complete payload is produced or an
/// error is raised and nothing is returned.
///
/// # Errors
///
/// [`WireError::UnknownNode`] when a node id does not belong to `graph`.
pub fn serialize(graph: &ExprGraph, root: NodeId) -> Result<serde_json::Value, WireError> {
    let mut state = State {
        graph,
        ordinals: FxHashMap::default(),
    };
    state.encode_node(root)
}

/// Serializes the graph reachable from `root` to its canonical JSON text.
///
/// # Errors
///
/// [`WireError::UnknownNode`] when a node id does not belong to `graph`.
pub fn serialize_to_string(graph: &ExprGraph, root: NodeId) -> Result<String, WireError> {
    serialize(graph, root).map(|payload| payload.to_string())
}

struct State<'g> {
    graph: &'g ExprGraph,
    ordinals: FxHashMap<NodeId, u64>,
}

impl State<'_> {
    fn encode_node(&mut self, id: NodeId) -> Result<serde_json::Value, WireError> {
        if let Some(ordinal) = self.ordinals.get(&id) {
            return Ok(json!({ (KEY_REF): ordinal }));
        }
        let node = self.graph.node(id).ok_or(WireError::UnknownNode(id))?;
        let ordinal = self.ordinals.len() as u64;
        self.ordinals.insert(id, ordinal);
        match node {
            ExprNode::Literal(value) => Ok(value.clone()),
            ExprNode::VarRef(name) => Ok(json!({ (KEY_VAR_REF): name })),
            ExprNode::Invocation {
                op,
                signature,
                args,
            } => {
                let mut encoded = serde_json::Map::new();
                if let Some(signature) = signature {
                    for name in signature.param_names() {
                        if let Some(value) = args.get(name) {
                            encoded.insert(name.to_string(), self.encode_value(value)?);
                        }
                    }
                }
                for (name, value) in args.iter() {
                    if encoded.contains_key(name) {
                        continue;
                    }
                    encoded.insert(name.to_string(), self.encode_value(value)?);
                }
                Ok(json!({ (KEY_OP): op, (KEY_ARGS): encoded }))
            }
        }
    }

    fn encode_value(&mut self, value: &ArgValue) -> Result<serde_json::Value, WireError> {
        match value {
            ArgValue::Literal(literal) => Ok(literal.clone()),
            ArgValue::Node(id) => self.encode_node(*id),
            ArgValue::Array(items) => items
                .iter()
                .map(|item| self.encode_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            ArgValue::Object(map) => {
                let mut encoded = serde_json::Map::new();
                for (name, item) in map {
                    encoded.insert(name.clone(), self.encode_value(item)?);
                }
                Ok(serde_json::Value::Object(encoded))
            }
        }
    }
}
