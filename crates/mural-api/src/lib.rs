pub mod auth;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod publications;
pub mod routes;
pub mod security;
pub mod state;
pub mod token;
