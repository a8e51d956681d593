pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod media;
pub mod model;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub mod test_support;
