pub mod app;
pub mod auth;
pub mod bookmarks;
pub mod categories;
pub mod comments;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod memstore;
pub mod posts;
pub mod state;
pub mod users;
