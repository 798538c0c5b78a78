pub mod achievement_repo;
pub mod connection;
pub mod migrations;
pub mod plan_repo;
pub mod task_repo;
pub mod term_repo;
pub mod ticket_repo;

pub use connection::*;
