pub mod handlers;
pub mod interchange;
pub mod models;
pub mod store;
