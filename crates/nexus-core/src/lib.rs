//! Domain types shared by every nexus crate: identifiers, principals,
//! tickets, directory records, request inputs, the error taxonomy, and the
//! storage collaborator trait.

pub mod directory;
pub mod errors;
pub mod ids;
pub mod inputs;
pub mod principal;
pub mod seed;
pub mod stats;
pub mod store;
pub mod ticket;

pub use errors::{DeskError, DeskResult};
pub use principal::{Principal, Role};
pub use store::FeedbackStore;
