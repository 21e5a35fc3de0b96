//! Clone Services
//!
//! - `FragmentCloner` - the recursive clone algorithm
//! - `Dispatcher` - validates inbound requests and invokes the cloner
//! - `CloneError` - the failure taxonomy surfaced to requesters

pub mod cloner;
pub mod dispatcher;
pub mod error;

pub use cloner::FragmentCloner;
pub use dispatcher::Dispatcher;
pub use error::CloneError;
