pub mod cli;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod estimate;
pub mod graph;
pub mod models;
pub mod output;
pub mod timer;
pub mod tracker;
