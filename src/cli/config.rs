use serde_json::json;
use tracing::info;

use crate::cli::commands::ConfigCommands;
use crate::config::Config;
use crate::db::connection;
use crate::error::TasktimeError;
use crate::output;

pub fn run(cmd: ConfigCommands, json_output: bool) -> i32 {
    let result = match cmd {
        ConfigCommands::Show => run_show(json_output),
        ConfigCommands::Set { key, value } => run_set(&key, &value, json_output),
    };
    super::exit_code(result, json_output)
}

fn config_json(config: &Config) -> serde_json::Value {
    json!({
        "operating-minutes": config.timer.operating_minutes,
        "rest-minutes": config.timer.rest_minutes
    })
}

fn run_show(json_output: bool) -> Result<(), TasktimeError> {
    let config = Config::load()?;
    if json_output {
        output::json::print(&output::json::success(json!({ "config": config_json(&config) })));
    } else {
        println!("operating-minutes = {}", config.timer.operating_minutes);
        println!("rest-minutes = {}", config.timer.rest_minutes);
    }
    Ok(())
}

fn run_set(key: &str, value: &str, json_output: bool) -> Result<(), TasktimeError> {
    // config lives next to the database, so require init first
    if !connection::db_path()?.exists() {
        return Err(TasktimeError::not_initialized());
    }
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;
    info!(key, value, "config updated");

    if json_output {
        output::json::print(&output::json::success(json!({ "config": config_json(&config) })));
    } else {
        println!("{key} = {value}");
    }
    Ok(())
}
