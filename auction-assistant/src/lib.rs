// Library root: re-exports all modules so integration tests and the console
// binary can access the crate's public API.

pub mod analysis;
pub mod app;
pub mod catalog;
pub mod config;
pub mod console;
pub mod db;
pub mod draft;
pub mod export;
pub mod persistence;
pub mod protocol;
