pub mod app;
pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod errors;
pub mod holidays;
pub mod models;
pub mod orgs;
pub mod routes;
pub mod tasks;

pub use app::{create_app, AppState};
