//! State mutation commands: set, increment
//!
//! Both go through the session orchestrator, so a mutation that changes the
//! level or achieves badges triggers the configured notifier and prints the
//! change.

use anyhow::{bail, Result};
use serde_json::Value;

use kudos::config::Config;
use kudos::profile::{ProfileSession, StateChange};

pub fn set_command(app: &str, variable: &str, raw_value: &str) -> Result<()> {
    let value = parse_scalar(raw_value)?;

    let config = Config::load()?;
    let session = ProfileSession::open(&config)?;
    let change = session.set_variable(app, variable, value)?;
    print_change(&change);
    Ok(())
}

pub fn increment_command(app: &str, variable: &str, delta: f64) -> Result<()> {
    let config = Config::load()?;
    let session = ProfileSession::open(&config)?;
    let change = session.increment_variable(app, variable, delta)?;
    print_change(&change);
    Ok(())
}

/// Parse a command-line value as a JSON scalar; bare words become strings.
fn parse_scalar(raw: &str) -> Result<Value> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw.to_string()),
    };
    if value.is_array() || value.is_object() {
        bail!("state variables hold scalars, not {raw}");
    }
    Ok(value)
}

fn print_change(change: &StateChange) {
    if change.is_empty() {
        println!("Saved (no progression change)");
        return;
    }
    if !change.level_token.is_empty() {
        println!("{}", change.level_token);
    }
    for token in change.item_tokens() {
        println!("achieved {token}");
    }
}
