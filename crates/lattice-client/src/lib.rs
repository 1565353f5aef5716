// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! lattice-client: the boundary where serialized graphs leave the process.
//!
//! Everything up to here is synchronous and side-effect-free; this crate
//! hands a payload to the [`Transport`] collaborator and delivers the reply
//! either by blocking or through a one-shot handler on a background thread.
//! Retry policy, auth, and rate limiting belong to the transport, not here.
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

use std::sync::Arc;
use std::thread;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use lattice_expr::{ExprGraph, NodeId};
use lattice_wire::{serialize, WireError};

/// What the caller wants back from a remote evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// The computed value itself.
    Value,
    /// A map-tile id and access token for rendering collaborators.
    TileToken,
    /// A descriptor for a downloadable artifact.
    Download,
}

/// Tile id and access token parsed from a [`ResultKind::TileToken`] reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TileHandle {
    /// Server-issued map id.
    #[serde(rename = "mapid")]
    pub map_id: String,
    /// Access token scoped to the map id.
    pub token: String,
}

/// Download descriptor parsed from a [`ResultKind::Download`] reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadHandle {
    /// URL the artifact can be fetched from.
    pub url: String,
}

/// Failure reported by the transport collaborator. Surfaced verbatim; this
/// layer never retries or masks it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote evaluation failed: {message}")]
pub struct RemoteError {
    /// Failure description exactly as the remote evaluator reported it.
    pub message: String,
}

impl RemoteError {
    /// Wraps a remote failure description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error surfaced by the blocking client entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The graph could not be serialized; nothing was sent.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The transport reported a failure.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// The transport replied, but not in the shape the result kind requires.
    #[error("malformed transport reply: {0}")]
    MalformedReply(String),
}

/// Collaborator that ships a serialized expression to the remote evaluator
/// and returns its parsed JSON reply.
pub trait Transport {
    /// Executes `payload` remotely, requesting `kind`-shaped output.
    ///
    /// # Errors
    ///
    /// [`RemoteError`] exactly as the remote evaluator reported it.
    fn execute(&self, payload: &serde_json::Value, kind: ResultKind)
        -> Result<serde_json::Value, RemoteError>;
}

/// Client facade over a [`Transport`].
///
/// There is no cancellation at this layer: a caller may drop interest in a
/// pending handler, but the in-flight request is not aborted.
#[derive(Debug)]
pub struct EvalClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for EvalClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> EvalClient<T> {
    /// Wraps a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Serializes the graph reachable from `root`, ships it, and blocks
    /// for the computed value.
    ///
    /// # Errors
    ///
    /// [`ClientError::Wire`] when serialization fails (nothing is sent);
    /// [`ClientError::Remote`] verbatim from the transport.
    pub fn evaluate(
        &self,
        graph: &ExprGraph,
        root: NodeId,
    ) -> Result<serde_json::Value, ClientError> {
        let payload = serialize(graph, root)?;
        debug!(kind = "value", "dispatching evaluation");
        Ok(self.transport.execute(&payload, ResultKind::Value)?)
    }

    /// Requests a tile id and token for rendering the expression's result.
    ///
    /// # Errors
    ///
    /// As [`EvalClient::evaluate`], plus [`ClientError::MalformedReply`]
    /// when the reply is not a tile handle.
    pub fn tile(&self, graph: &ExprGraph, root: NodeId) -> Result<TileHandle, ClientError> {
        let payload = serialize(graph, root)?;
        debug!(kind = "tile", "dispatching evaluation");
        let reply = self.transport.execute(&payload, ResultKind::TileToken)?;
        serde_json::from_value(reply).map_err(|e| ClientError::MalformedReply(e.to_string()))
    }

    /// Requests a download descriptor for the expression's result.
    ///
    /// # Errors
    ///
    /// As [`EvalClient::evaluate`], plus [`ClientError::MalformedReply`]
    /// when the reply is not a download descriptor.
    pub fn download(
        &self,
        graph: &ExprGraph,
        root: NodeId,
    ) -> Result<DownloadHandle, ClientError> {
        let payload = serialize(graph, root)?;
        debug!(kind = "download", "dispatching evaluation");
        let reply = self.transport.execute(&payload, ResultKind::Download)?;
        serde_json::from_value(reply).map_err(|e| ClientError::MalformedReply(e.to_string()))
    }
}

impl<T: Transport + Send + Sync + 'static> EvalClient<T> {
    /// Serializes the graph and delivers the reply to a one-shot handler on
    /// a background thread.
    ///
    /// The handler is invoked exactly once, with either the success value
    /// or the transport's error — never both, never more than once.
    /// Serialization failures surface synchronously and the handler is
    /// never registered.
    ///
    /// # Errors
    ///
    /// [`WireError`] when the graph cannot be serialized; nothing is sent.
    pub fn evaluate_with<F>(
        &self,
        graph: &ExprGraph,
        root: NodeId,
        handler: F,
    ) -> Result<(), WireError>
    where
        F: FnOnce(Result<serde_json::Value, RemoteError>) + Send + 'static,
    {
        self.dispatch_with(graph, root, ResultKind::Value, handler)
    }

    /// One-shot dispatch for an arbitrary result kind.
    ///
    /// # Errors
    ///
    /// [`WireError`] when the graph cannot be serialized; nothing is sent.
    pub fn dispatch_with<F>(
        &self,
        graph: &ExprGraph,
        root: NodeId,
        kind: ResultKind,
        handler: F,
    ) -> Result<(), WireError>
    where
        F: FnOnce(Result<serde_json::Value, RemoteError>) + Send + 'static,
    {
        let payload = serialize(graph, root)?;
        let transport = Arc::clone(&self.transport);
        debug!(kind = ?kind, "dispatching one-shot evaluation");
        thread::spawn(move || {
            let result = transport.execute(&payload, kind);
            handler(result);
        });
        Ok(())
    }
}
