//! Authorization and lifecycle engine for the feedback desk.
//!
//! [`FeedbackDesk`] is the entry point: each method takes the calling
//! [`Principal`](nexus_core::Principal), consults the [`policy`] table,
//! applies [`lifecycle`] rules, and shapes results through [`visibility`].

pub mod credentials;
pub mod desk;
pub mod directory;
pub mod lifecycle;
pub mod policy;
pub mod seed;
pub mod visibility;

pub use credentials::Credentials;
pub use desk::FeedbackDesk;
pub use policy::{Action, Scope};
pub use visibility::{TicketDetail, TicketView};
