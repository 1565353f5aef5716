// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arena-backed expression graph.
//!
//! Nodes are immutable once allocated and addressed by index, so reference
//! identity is index equality and a shared sub-expression is simply the same
//! [`NodeId`] held by several parents. Invocation arguments may only point at
//! indices the arena has already allocated, which makes cycles
//! unrepresentable rather than merely checked for.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::args::{ArgValue, BoundArguments};
use crate::signature::FunctionSignature;

/// Index of a node within the [`ExprGraph`] that allocated it.
///
/// Ids are only meaningful for the graph that produced them; handing an id to
/// a different graph yields whatever node occupies that index there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena's allocation order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One lazy computation step.
#[derive(Debug, Clone)]
pub enum ExprNode {
    /// A call to a named server-side operation with bound arguments.
    Invocation {
        /// Server-side operation name the evaluator dispatches on.
        op: String,
        /// Declared signature, when the operation was built through one.
        /// Fixes the argument order on the wire.
        signature: Option<Arc<FunctionSignature>>,
        /// Arguments bound at construction. Never mutated afterwards.
        args: BoundArguments,
    },
    /// A concrete value with nothing left to resolve remotely.
    Literal(serde_json::Value),
    /// A symbolic reference to the formal parameter of a user-supplied
    /// function body, resolved by the remote evaluator.
    VarRef(String),
}

/// Error raised when node construction is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An argument referenced a node index the arena has not allocated.
    /// Allocation order is the only ordering, so such a reference is the
    /// only way a cycle could have been formed.
    #[error("argument references unallocated node {0}; cyclic graphs cannot be constructed")]
    CyclicReference(NodeId),
}

/// Append-only arena of expression nodes.
#[derive(Debug, Clone, Default)]
pub struct ExprGraph {
    nodes: Vec<ExprNode>,
}

impl ExprGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of allocated nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node at `id`, when allocated by this graph.
    pub fn node(&self, id: NodeId) -> Option<&ExprNode> {
        self.nodes.get(id.0)
    }

    /// Allocates a literal node holding `value`.
    pub fn literal(&mut self, value: serde_json::Value) -> NodeId {
        self.push(ExprNode::Literal(value))
    }

    /// Allocates a variable-reference node for the named formal parameter.
    pub fn var_ref(&mut self, name: impl Into<String>) -> NodeId {
        self.push(ExprNode::VarRef(name.into()))
    }

    /// Allocates an invocation node.
    ///
    /// Every [`ArgValue::Node`] reference in `args`, at any container depth,
    /// must already be allocated; otherwise nothing is inserted and
    /// [`GraphError::CyclicReference`] is raised.
    pub fn invocation(
        &mut self,
        op: impl Into<String>,
        signature: Option<Arc<FunctionSignature>>,
        args: BoundArguments,
    ) -> Result<NodeId, GraphError> {
        for (_, value) in args.iter() {
            self.check_allocated(value)?;
        }
        Ok(self.push(ExprNode::Invocation {
            op: op.into(),
            signature,
            args,
        }))
    }

    fn push(&mut self, node: ExprNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn check_allocated(&self, value: &ArgValue) -> Result<(), GraphError> {
        match value {
            ArgValue::Node(id) => {
                if id.0 < self.nodes.len() {
                    Ok(())
                } else {
                    Err(GraphError::CyclicReference(*id))
                }
            }
            ArgValue::Array(items) => items.iter().try_for_each(|v| self.check_allocated(v)),
            ArgValue::Object(map) => map.values().try_for_each(|v| self.check_allocated(v)),
            ArgValue::Literal(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allocation_order_assigns_sequential_ids() {
        let mut graph = ExprGraph::new();
        let a = graph.literal(json!(1));
        let b = graph.var_ref("x");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert!(matches!(graph.node(b), Some(ExprNode::VarRef(name)) if name == "x"));
    }

    #[test]
    fn invocation_accepts_already_allocated_arguments() {
        let mut graph = ExprGraph::new();
        let lit = graph.literal(json!(2));
        let mut args = BoundArguments::new();
        args.insert("value", ArgValue::Node(lit));
        let call = graph
            .invocation("Number.double", None, args)
            .expect("backward reference is valid");
        assert_eq!(call.index(), 1);
    }

    #[test]
    fn forward_reference_is_a_cycle_error() {
        let mut donor = ExprGraph::new();
        donor.literal(json!(0));
        let ahead = donor.literal(json!(1));

        let mut graph = ExprGraph::new();
        graph.literal(json!(0));
        let mut args = BoundArguments::new();
        args.insert("value", ArgValue::Node(ahead));
        let err = graph
            .invocation("Number.double", None, args)
            .expect_err("unallocated reference must be rejected");
        assert_eq!(err, GraphError::CyclicReference(ahead));
        // Nothing was inserted.
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn nested_containers_are_checked() {
        let mut donor = ExprGraph::new();
        let ahead = donor.literal(json!(1));

        let mut graph = ExprGraph::new();
        let mut args = BoundArguments::new();
        args.insert(
            "values",
            ArgValue::Array(vec![ArgValue::Literal(json!(1)), ArgValue::Node(ahead)]),
        );
        assert!(graph.invocation("List.sum", None, args).is_err());
    }
}
