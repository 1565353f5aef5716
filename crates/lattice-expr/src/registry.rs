// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Function signature registry.
//!
//! Signatures are imported once per namespace from a [`MetadataSource`] and
//! shared immutably afterwards. The registry is an explicit handle — nothing
//! here is process-global — so construction stays testable and free of
//! ordering surprises.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use crate::args::{extract, ArgValue, BindingError, BoundArguments};
use crate::graph::{ExprGraph, GraphError, NodeId};
use crate::signature::FunctionSignature;

/// Collaborator that produces the declared signatures for a namespace.
///
/// Fetched once per namespace; retry and transport concerns live behind the
/// implementation, not here.
pub trait MetadataSource {
    /// Loads the full, ordered signature list for `namespace`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Source`] when the metadata cannot be produced.
    fn load(&self, namespace: &str) -> Result<Vec<FunctionSignature>, RegistryError>;
}

/// Error raised by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No imported namespace declares the requested function.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// The metadata source failed to produce a namespace.
    #[error("metadata source failed for namespace {namespace}: {message}")]
    Source {
        /// Namespace whose import failed.
        namespace: String,
        /// Collaborator-reported failure description.
        message: String,
    },
}

impl RegistryError {
    /// Builds a [`RegistryError::Source`] for `namespace`.
    pub fn source(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            namespace: namespace.into(),
            message: message.into(),
        }
    }
}

/// Error raised by the [`FunctionRegistry::call`] convenience path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Signature lookup or import failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Argument extraction failed.
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// Node construction failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Process-local registry of imported function signatures.
///
/// Import is idempotent per namespace and safe to trigger concurrently from
/// independent call sites: the check/fetch/publish sequence runs under one
/// lock, so a namespace is either absent or complete — never partial — and
/// only the first caller performs the fetch.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    namespaces: RwLock<BTreeMap<String, BTreeMap<String, Arc<FunctionSignature>>>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(BTreeMap::new()),
        }
    }

    /// Imports all signatures for `namespace` from `source`.
    ///
    /// Safe to call multiple times or from multiple sites; only the first
    /// call for a namespace performs the fetch/bind.
    ///
    /// # Errors
    ///
    /// Propagates [`RegistryError::Source`] from the metadata source; on
    /// error the namespace stays absent.
    pub fn import(&self, namespace: &str, source: &dyn MetadataSource) -> Result<(), RegistryError> {
        let mut table = self
            .namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if table.contains_key(namespace) {
            return Ok(());
        }
        let signatures = source.load(namespace)?;
        let functions: BTreeMap<String, Arc<FunctionSignature>> = signatures
            .into_iter()
            .map(|sig| (sig.name.clone(), Arc::new(sig)))
            .collect();
        debug!(namespace, functions = functions.len(), "imported signatures");
        table.insert(namespace.to_string(), functions);
        Ok(())
    }

    /// Drops the imported signatures for `namespace`, permitting re-import.
    pub fn reset(&self, namespace: &str) {
        let mut table = self
            .namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if table.remove(namespace).is_some() {
            debug!(namespace, "reset namespace");
        }
    }

    /// Whether `namespace` has been imported.
    #[must_use]
    pub fn is_imported(&self, namespace: &str) -> bool {
        self.namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(namespace)
    }

    /// Looks up a signature by server-side operation name across all
    /// imported namespaces.
    pub fn signature(&self, name: &str) -> Option<Arc<FunctionSignature>> {
        let table = self
            .namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        table
            .values()
            .find_map(|functions| functions.get(name).map(Arc::clone))
    }

    /// Constructs an invocation node for `signature` with `args`.
    /// Evaluates nothing.
    ///
    /// # Errors
    ///
    /// [`GraphError::CyclicReference`] when an argument references an
    /// unallocated node.
    pub fn invoke(
        &self,
        graph: &mut ExprGraph,
        signature: &Arc<FunctionSignature>,
        args: BoundArguments,
    ) -> Result<NodeId, GraphError> {
        graph.invocation(signature.name.clone(), Some(Arc::clone(signature)), args)
    }

    /// Constructs an invocation node for `op` directly from an
    /// already-validated argument map, bypassing extraction.
    ///
    /// This is the escape hatch for synthetic calls (geometry constructors,
    /// collection draws) whose arguments are not exposed as public named
    /// parameters. When `op` resolves to a registered signature the node
    /// carries it, fixing declared argument order on the wire; otherwise the
    /// node is unsigned and serializes its arguments in name order.
    ///
    /// # Errors
    ///
    /// [`GraphError::CyclicReference`] when an argument references an
    /// unallocated node.
    pub fn apply_by_name(
        &self,
        graph: &mut ExprGraph,
        op: &str,
        args: BoundArguments,
    ) -> Result<NodeId, GraphError> {
        graph.invocation(op, self.signature(op), args)
    }

    /// Convenience: look up `name`, extract `positional`/`named` against its
    /// signature, and construct the invocation node.
    ///
    /// # Errors
    ///
    /// [`CallError::Registry`] for an unknown function, [`CallError::Binding`]
    /// for extraction failures, [`CallError::Graph`] for construction
    /// failures.
    pub fn call(
        &self,
        graph: &mut ExprGraph,
        name: &str,
        positional: Vec<ArgValue>,
        named: Option<BTreeMap<String, ArgValue>>,
    ) -> Result<NodeId, CallError> {
        let signature = self
            .signature(name)
            .ok_or_else(|| RegistryError::UnknownFunction(name.to_string()))?;
        let bound = extract(&signature, positional, named)?;
        Ok(self.invoke(graph, &signature, bound)?)
    }
}
