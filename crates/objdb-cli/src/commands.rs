use anyhow::{bail, Context};
use colored::Colorize;
use objdb::{Database, DbConfig, Document, ObjectDb, OpResult};
use objdb_store::FileJsonStore;
use tracing::debug;

use crate::cli::*;

type Documents = ObjectDb<Document, FileJsonStore>;

pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let docs = open(cli)?;
    match &cli.command {
        Command::Save(args) => cmd_save(cli, &docs, args),
        Command::Get(args) => cmd_get(cli, &docs, args),
        Command::List => cmd_list(cli, &docs),
        Command::Delete(args) => {
            let result = docs.delete(args.id)?;
            report(cli.format, "Deleted", &result)
        }
        Command::Unique(args) => {
            docs.set_unique_constraint(args.attributes.as_slice())?;
            println!(
                "{} Unique key for {}: {}",
                "✓".green().bold(),
                docs.label().bold(),
                args.attributes.join(", ").cyan()
            );
            Ok(())
        }
        Command::ShowUnique => cmd_show_unique(cli, &docs),
    }
}

fn open(cli: &Cli) -> anyhow::Result<Documents> {
    let mut config = match &cli.config {
        Some(path) => DbConfig::load(path)?,
        None => DbConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.store.path = db.clone();
    }
    if cli.verbose {
        config.debug = true;
    }
    debug!(path = %config.store.resolved_path().display(), label = %cli.label, "opening database");

    let database = Database::open(config).context("opening database")?;
    Ok(database.with_descriptor(Document::descriptor(&cli.label))?)
}

fn report(format: OutputFormat, verb: &str, result: &OpResult) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(result)?);
    }
    match (&result.message, result.id) {
        (Some(message), _) if !result.is_success() => bail!("{message}"),
        (_, Some(id)) if format == OutputFormat::Text => {
            println!("{} {} id={}", "✓".green().bold(), verb, id.to_string().yellow());
        }
        _ => {}
    }
    Ok(())
}

fn print_document(format: OutputFormat, doc: &Document) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(doc)?),
        OutputFormat::Text => {
            let id = doc.id.map(|id| id.to_string()).unwrap_or_default();
            println!("{}  {}", format!("#{id}").yellow().bold(), doc.name.bold());
            for (key, value) in &doc.fields {
                println!("  {}: {}", key.cyan(), value);
            }
        }
    }
    Ok(())
}

fn cmd_save(cli: &Cli, docs: &Documents, args: &SaveArgs) -> anyhow::Result<()> {
    let mut doc = Document::new(&cli.label).with_name(&args.name);
    if let Some(id) = args.id {
        doc = doc.with_id(id);
    }
    for (key, value) in &args.fields {
        doc = doc.with_field(key.clone(), value.clone());
    }
    let result = docs.save(&mut doc)?;
    report(cli.format, "Saved", &result)
}

fn cmd_get(cli: &Cli, docs: &Documents, args: &GetArgs) -> anyhow::Result<()> {
    let found = match (&args.name, args.id) {
        (Some(name), _) => docs.get_for_name(name)?,
        (None, Some(id)) => docs.get_for_id(id)?,
        (None, None) => bail!("either --id or --name is required"),
    };
    match found {
        Some(doc) => print_document(cli.format, &doc),
        None => bail!("no {} object matches", docs.label()),
    }
}

fn cmd_list(cli: &Cli, docs: &Documents) -> anyhow::Result<()> {
    let Some(mut all) = docs.get_all()? else {
        match cli.format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Text => println!("No {} objects stored.", docs.label().bold()),
        }
        return Ok(());
    };
    all.sort_by_key(|doc| doc.id);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&all)?),
        OutputFormat::Text => {
            println!("{} {} object(s)", all.len().to_string().bold(), docs.label());
            for doc in &all {
                print_document(cli.format, doc)?;
            }
        }
    }
    Ok(())
}

fn cmd_show_unique(cli: &Cli, docs: &Documents) -> anyhow::Result<()> {
    let attributes = docs.unique_constraint()?;
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&attributes)?),
        OutputFormat::Text => match attributes {
            Some(attributes) => println!("Unique key: {}", attributes.join(", ").cyan()),
            None => println!("Unique key: {} (name only)", "none".dimmed()),
        },
    }
    Ok(())
}
