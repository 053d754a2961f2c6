pub mod models;
pub mod schema;
pub mod state;
pub mod utils;

pub use state::AppState;
pub use utils::{with_conn, DbPool};
