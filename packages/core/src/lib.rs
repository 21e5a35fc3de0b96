//! FragmentForge Core Logic Layer
//!
//! This crate instantiates Fragments from Blueprint subgraphs stored in a
//! graph database. A Blueprint is a tree-shaped template of typed nodes
//! connected by ordered relationships; cloning one produces a structurally
//! identical Fragment with fresh node ids, linked back to its Blueprint,
//! with shared Modifier nodes attached by reference instead of copied.
//!
//! # Architecture
//!
//! - **Recursion as messages**: each recursive step of the clone walk is a
//!   `CloneRequest` submitted through [`bus::RequestBus`] and awaited, not an
//!   in-process call-stack frame
//! - **Ordered traversal**: a node's children are processed strictly in
//!   ascending `node_order`, one at a time
//! - **Idempotent writes**: node and relationship upserts merge by id, so a
//!   redelivered request never duplicates state
//!
//! # Modules
//!
//! - [`models`] - Data structures (NodeRecord, CloneRequest, CloneReply)
//! - [`db`] - Graph store abstraction with SurrealDB integration
//! - [`services`] - FragmentCloner (the clone algorithm) and Dispatcher
//! - [`bus`] - Request/response bus used for recursive fan-out
//! - [`id`] - Unique id generation

pub mod bus;
pub mod db;
pub mod id;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::{GraphStore, GraphStoreError, SurrealStore};
pub use models::{CloneReply, CloneRequest, NodeRecord};
pub use services::{CloneError, Dispatcher, FragmentCloner};
