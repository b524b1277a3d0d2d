use crate::models::SubscriptionId;
use crate::path::StatePath;
use anyhow::{anyhow, Result};
use serde_json::Value;

/// A line typed at the state console
#[derive(Clone, Debug, PartialEq)]
pub enum ConsoleCommand {
    Get(String),
    Set { path: String, value: Value },
    Dispatch { path: String, value: Value },
    Watch(String),
    Unwatch(SubscriptionId),
    Dump,
    Help,
    Quit,
}

/// Usage text printed by `help`
pub const HELP: &str = "\
Commands:
  get <path>               print the value at path
  set <path> <json>        write a value, notifying on change
  dispatch <path> <json>   write a value and always notify
  watch <path>             print changes at path and below
  unwatch <id>             stop a watch
  dump                     print the whole state tree
  help                     show this text
  quit                     exit";

/// Parse one console line; blank lines yield `None`
pub fn parse_command(input: &str) -> Result<Option<ConsoleCommand>> {
    let line = input.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_lowercase().as_str() {
        "get" => ConsoleCommand::Get(parse_path(rest)?),
        "set" => {
            let (path, value) = parse_assignment(rest)?;
            ConsoleCommand::Set { path, value }
        }
        "dispatch" => {
            let (path, value) = parse_assignment(rest)?;
            ConsoleCommand::Dispatch { path, value }
        }
        "watch" | "on" => ConsoleCommand::Watch(parse_path(rest)?),
        "unwatch" | "off" => ConsoleCommand::Unwatch(parse_id(rest)?),
        "dump" => ConsoleCommand::Dump,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(anyhow!("Unknown command: {}", verb)),
    };

    Ok(Some(command))
}

fn parse_path(s: &str) -> Result<String> {
    if s.is_empty() {
        return Err(anyhow!("Missing path"));
    }
    if s.contains(char::is_whitespace) {
        return Err(anyhow!("Unexpected input after path: {}", s));
    }
    Ok(s.parse::<StatePath>()?.to_string())
}

fn parse_assignment(s: &str) -> Result<(String, Value)> {
    let (path, raw) = s
        .split_once(char::is_whitespace)
        .ok_or_else(|| anyhow!("Expected <path> <value>"))?;
    Ok((parse_path(path)?, parse_value(raw.trim())))
}

/// JSON if it parses, otherwise the raw text as a string
fn parse_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

fn parse_id(s: &str) -> Result<SubscriptionId> {
    let digits = s.trim_start_matches('#');
    digits
        .parse::<u64>()
        .map(SubscriptionId)
        .map_err(|_| anyhow!("Invalid subscription id: {}", s))
}
