pub mod builder;
pub mod classify;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod records;
pub mod store;
