//! curfewd: HTTP front end of the curfew policy engine.

pub mod error;
pub mod routes;

pub use routes::router;
