//! Service contracts, wire types, and errors shared across the RPC server crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
pub use protocol::{CallKind, Contract, HashResolverMethod, XudMethod};
