mod error;
mod extract;
mod listing;
pub mod middleware;
pub mod models;
mod origin;
mod recipes;
mod search;
mod server;
pub mod state;
mod v1;
mod v2;

pub use error::ApiError;
pub use listing::{API_VERSION, ListingOperation, dispatch};
pub use origin::RequestOrigin;
pub use server::{router, run};
pub use state::AppState;
