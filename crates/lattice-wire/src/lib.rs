// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! lattice-wire: the wire form of lattice expression graphs.
//!
//! One deterministic, sharing-preserving encoding: a node's payload appears
//! exactly once, at its first depth-first encounter, and every other edge to
//! it becomes an ordinal back-reference.
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

mod serializer;

/// Serializer entry points, wire envelope keys, and errors.
pub use serializer::{
    serialize, serialize_to_string, WireError, KEY_ARGS, KEY_OP, KEY_REF, KEY_VAR_REF,
};
