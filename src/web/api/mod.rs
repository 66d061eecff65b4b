pub mod error;
pub mod geo;
pub mod routes;
pub mod tracker;
