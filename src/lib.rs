//! Governance control plane for a permissioned chain.
//!
//! Every mutating action against the two governed entity kinds — admin
//! roles and network nodes — is gated behind a collective vote. The
//! `controller` module orchestrates validation, proposal lifecycle, and
//! cross-entity cascades; `transitions` holds the declarative legality
//! table; `storage` persists records through rocksdb. `node` wires the
//! pieces into a runnable service and `api` exposes the RPC surface.
//!
//! Applications typically depend on [`config::NodeConfig`] to bootstrap the
//! service and [`node::Node`] / [`node::NodeHandle`] to operate it.

pub mod api;
pub mod config;
pub mod controller;
pub mod errors;
pub mod node;
pub mod proposals;
pub mod storage;
pub mod transitions;
pub mod types;
pub mod voting;
