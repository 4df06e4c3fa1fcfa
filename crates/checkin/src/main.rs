//! `checkin` - CLI for training attendance registration
//!
//! This binary registers attendees, lists them and exports the attendance
//! sheet PDF.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use checkin::cli::{AddCommand, Cli, Command, ConfigCommand, ExportCommand};
use checkin::report::format_registration;
use checkin::{
    init_logging, submit, AttendeeForm, AttendeeStore, Config, ImportedSignature, Persisted,
    ReportBuilder, SignaturePad, SignatureSource, Storage,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match cli.command {
        Command::Add(add_cmd) => {
            let (config, mut store) = open_store(cli.config)?;
            handle_add(&config, &mut store, &add_cmd)
        }
        Command::List(list_cmd) => {
            let (_, store) = open_store(cli.config)?;
            handle_list(&store, list_cmd.json)
        }
        Command::Export(export_cmd) => {
            let (config, store) = open_store(cli.config)?;
            handle_export(&config, &store, &export_cmd)
        }
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd),
    }
}

fn open_store(config_path: Option<PathBuf>) -> Result<(Config, AttendeeStore<Storage>)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;

    let db_path = config.database_path();
    let storage = Storage::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?
        .with_quota(config.quota());
    let store = AttendeeStore::load(storage, config.storage.key.clone());
    Ok((config, store))
}

fn handle_add(config: &Config, store: &mut AttendeeStore<Storage>, cmd: &AddCommand) -> Result<()> {
    let signature: Box<dyn SignatureSource> = if let Some(path) = &cmd.signature_png {
        let imported = ImportedSignature::from_file(path)
            .with_context(|| format!("failed to read signature {}", path.display()))?;
        Box::new(imported)
    } else {
        let mut pad = SignaturePad::from_config(&config.capture);
        if let Some(path) = &cmd.strokes {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read strokes {}", path.display()))?;
            pad.load_strokes(&json)
                .with_context(|| format!("failed to parse strokes {}", path.display()))?;
        }
        Box::new(pad)
    };

    let form = AttendeeForm::new(cmd.name.as_str(), cmd.id_number.as_str());
    let submission = submit(&form, signature.as_ref(), store)?;

    let record = &submission.record;
    println!(
        "Registered {} ({}){}",
        record.name,
        record.id_number,
        if record.has_signature() {
            ""
        } else {
            " without signature"
        }
    );
    if submission.persisted == Persisted::No {
        eprintln!("warning: the attendee list could not be saved and will be lost on exit");
    }
    Ok(())
}

fn handle_list(store: &AttendeeStore<Storage>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(store.all())?);
        return Ok(());
    }

    if store.is_empty() {
        println!("No attendees registered.");
        return Ok(());
    }

    println!(
        "{:<4} {:<32} {:<16} {:<22} Signed",
        "#", "Name", "ID number", "Registered"
    );
    for (n, record) in store.all().iter().enumerate() {
        println!(
            "{:<4} {:<32} {:<16} {:<22} {}",
            n + 1,
            record.name,
            record.id_number,
            format_registration(&record.registered_at, &chrono::Local),
            if record.has_signature() { "yes" } else { "no" }
        );
    }
    println!();
    println!("{} attendees", store.len());
    Ok(())
}

fn handle_export(config: &Config, store: &AttendeeStore<Storage>, cmd: &ExportCommand) -> Result<()> {
    let dir = cmd.output.clone().unwrap_or_else(|| config.output_dir());
    let written = ReportBuilder::from_config(&config.report)
        .export(store.all(), &dir)
        .context("failed to export attendance sheet")?;

    match written {
        Some(path) => println!("{}", path.display()),
        None => println!("No attendees registered; nothing to export."),
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!("  Key:            {}", config.storage.key);
                println!(
                    "  Quota:          {}",
                    config
                        .quota()
                        .map_or_else(|| "unlimited".to_string(), |q| format!("{q} bytes"))
                );
                println!();
                println!("[Capture]");
                println!(
                    "  Pad size:       {}x{}",
                    config.capture.width, config.capture.height
                );
                println!("  Pen width:      {}", config.capture.pen_width);
                println!("  Pen color:      {}", config.capture.pen_color);
                println!();
                println!("[Report]");
                println!("  Output dir:     {}", config.output_dir().display());
                println!("  Min row height: {}", config.report.min_row_height);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(config_path);
            let config = Config::load_from(path.clone())?;
            config.validate()?;
            match path {
                Some(p) => println!("Configuration is valid: {}", p.display()),
                None => println!("Configuration is valid"),
            }
        }
    }
    Ok(())
}
