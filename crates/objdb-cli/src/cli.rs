use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "objdb",
    about = "objdb: named objects with auto-assigned ids in a JSON file",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Database file (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Object type label
    #[arg(short = 't', long = "type", global = true, default_value = "object")]
    pub label: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or update an object
    Save(SaveArgs),
    /// Show one object by id or name
    Get(GetArgs),
    /// List every object of the type
    List,
    /// Delete an object by id
    Delete(DeleteArgs),
    /// Declare the attributes forming a unique key
    Unique(UniqueArgs),
    /// Show the declared unique key
    ShowUnique,
}

#[derive(Args)]
pub struct SaveArgs {
    #[arg(long)]
    pub name: String,
    /// Update this id instead of assigning a new one
    #[arg(long)]
    pub id: Option<u64>,
    /// Extra field as key=value; the value is parsed as JSON when possible
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,
}

#[derive(Args)]
pub struct GetArgs {
    #[arg(long, conflicts_with = "name", required_unless_present = "name")]
    pub id: Option<u64>,
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: u64,
}

#[derive(Args)]
pub struct UniqueArgs {
    #[arg(required = true)]
    pub attributes: Vec<String>,
}

/// Parse `key=value`. Values that are valid JSON keep their type; anything
/// else is stored as a string.
pub fn parse_field(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    if key.is_empty() {
        return Err("field key must not be empty".into());
    }
    if key == "id" || key == "name" {
        return Err(format!("use --{key} instead of --field {key}=..."));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn field_values_keep_json_types() {
        assert_eq!(parse_field("port=8080").unwrap(), ("port".into(), json!(8080)));
        assert_eq!(parse_field("on=true").unwrap(), ("on".into(), json!(true)));
        assert_eq!(parse_field("tags=[\"a\"]").unwrap(), ("tags".into(), json!(["a"])));
        assert_eq!(
            parse_field("email=a@x.io").unwrap(),
            ("email".into(), json!("a@x.io"))
        );
        assert_eq!(parse_field("eq=a=b").unwrap(), ("eq".into(), json!("a=b")));
    }

    #[test]
    fn bad_fields_are_rejected() {
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=1").is_err());
        assert!(parse_field("id=3").is_err());
        assert!(parse_field("name=x").is_err());
    }

    #[test]
    fn parse_save_with_fields() {
        let cli = Cli::try_parse_from([
            "objdb", "-t", "user", "save", "--name", "alice", "-f", "age=30", "-f", "city=Oslo",
        ])
        .unwrap();
        assert_eq!(cli.label, "user");
        match cli.command {
            Command::Save(args) => {
                assert_eq!(args.name, "alice");
                assert!(args.id.is_none());
                assert_eq!(args.fields.len(), 2);
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn get_requires_exactly_one_selector() {
        assert!(Cli::try_parse_from(["objdb", "get"]).is_err());
        assert!(Cli::try_parse_from(["objdb", "get", "--id", "1", "--name", "a"]).is_err());
        assert!(Cli::try_parse_from(["objdb", "get", "--name", "a"]).is_ok());
    }

    #[test]
    fn unique_requires_attributes() {
        assert!(Cli::try_parse_from(["objdb", "unique"]).is_err());
        assert!(Cli::try_parse_from(["objdb", "unique", "email", "org"]).is_ok());
    }
}
