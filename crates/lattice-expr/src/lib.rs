// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! lattice-expr: the lazy computation DAG at the heart of lattice.
//!
//! Callers describe work — a function invocation, a literal, a bound
//! variable — as immutable nodes in an arena-backed expression graph.
//! Nothing here evaluates anything; evaluation belongs to the remote
//! service behind the transport boundary.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod args;
mod graph;
mod registry;
mod signature;

/// Argument values, bindings, and the extraction rule.
pub use args::{extract, ArgValue, BindingError, BoundArguments};
/// Arena-backed expression graph and its node type.
pub use graph::{ExprGraph, ExprNode, GraphError, NodeId};
/// Signature registry, metadata-source seam, and the call convenience path.
pub use registry::{CallError, FunctionRegistry, MetadataSource, RegistryError};
/// Declared operation shapes.
pub use signature::{FunctionSignature, ParameterSpec, TypeTag};
