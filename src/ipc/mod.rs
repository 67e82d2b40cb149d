mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use error::err;
pub use handlers::dashboard::on_tick as dashboard_tick;
pub use router::handle_request;
pub use types::{AppState, Request};
