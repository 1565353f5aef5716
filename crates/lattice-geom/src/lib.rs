// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! lattice-geom: geometry construction for the lattice expression graph.
//!
//! Coordinates are validated and normalized client-side when the input is
//! fully literal; anything the client cannot resolve — deferred references,
//! geometry handles, reprojection options — becomes a deferred call to the
//! server-side geometry constructors.
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

mod coords;
mod geometry;

/// Coordinate input classification, validation, and normalization.
pub use coords::{
    classify, has_server_refs, normalize, ConstructionError, CoordSource, CoordTree, InputKind,
};
/// Geometry values, handles, and constructors.
pub use geometry::{Geometry, GeometryBuilder, GeometryKind, GeometryOptions, GeometryValue};
