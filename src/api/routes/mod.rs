//! API route modules.

pub mod catalog;
pub mod events;
pub mod meetings;
pub mod session;
