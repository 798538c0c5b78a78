use serde_json::json;
use tracing::info;

use crate::db::connection;
use crate::error::TasktimeError;
use crate::output;

pub fn run(json_output: bool) -> i32 {
    super::exit_code(run_init(json_output), json_output)
}

fn run_init(json_output: bool) -> Result<(), TasktimeError> {
    let path = connection::init_db()?;
    info!(path = %path.display(), "initialized database");
    if json_output {
        output::json::print(&output::json::success(json!({
            "path": path.to_string_lossy()
        })));
    } else {
        println!("Initialized tasktime at {}", path.display());
    }
    Ok(())
}
