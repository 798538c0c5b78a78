pub mod commands;
pub mod config;
pub mod init;
pub mod task;
pub mod term;
pub mod ticket;
pub mod track;

pub use commands::*;

use crate::error::TasktimeError;
use crate::output;

/// Turn a command result into an exit code, reporting the error in the requested format.
pub fn exit_code(result: Result<(), TasktimeError>, json_output: bool) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            if json_output {
                output::json::print(&output::json::error(&e));
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}
