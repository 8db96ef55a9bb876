pub mod api;
pub mod auth;
pub mod backend;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod events;
pub mod global;
pub mod schedule;
pub mod stats;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;
