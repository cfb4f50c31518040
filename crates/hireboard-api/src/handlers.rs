//! Request handlers.

pub mod applications;
pub mod companies;
pub mod health;
pub mod jobs;
pub mod users;
