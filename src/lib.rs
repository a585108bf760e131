#![doc = "The `todolist` library crate."]
#![doc = ""]
#![doc = "Bearer-token authentication, the todo and user models, the HTTP routes and"]
#![doc = "the error type of the todolist service. `main.rs` assembles them into a server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;

pub use crate::config::Config;
pub use crate::error::AppError;
