pub mod error;
pub mod extract;
pub mod routes;
pub mod server;
pub mod session;

pub use error::{ApiError, ApiResult};
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
pub use session::{SessionRegistry, SessionToken};
