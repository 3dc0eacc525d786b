pub mod cli;
pub mod config;
pub mod filter;
pub mod format;
pub mod logging;
pub mod metadata;
pub mod select;

use crate::config::{FilterDiagnostic, load_config, validate_config};
use crate::metadata::load_messages;
use anyhow::{Context, bail};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::json;
use std::process::ExitCode;

pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use filter::{Filter, FilterError};
pub use metadata::{Field, Message, MetaData};
pub use select::{Selection, select_messages};

fn print_output(format: OutputFormat, text: &str, json: serde_json::Value) {
    match format {
        OutputFormat::Text => print!("{text}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".into())
        ),
    }
}

fn run_check(filter: &Filter, expr: &str, format: OutputFormat) -> ExitCode {
    let (ok, diagnostic) = filter.check_filter(expr);
    let text = match &diagnostic {
        None => format!("{}\n", "OK".green().bold()),
        Some(message) => format!("{} {}\n", "error:".red().bold(), message),
    };
    print_output(format, &text, json!({ "ok": ok, "error": diagnostic }));
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run_eval(
    filter: &mut Filter,
    expr: &str,
    messages: &[Message],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut text = String::new();
    let mut results = Vec::with_capacity(messages.len());

    for message in messages {
        filter.set_meta_data(MetaData::from_message(message));
        let matched = filter
            .exec(expr)
            .with_context(|| format!("Failed to evaluate filter '{}'", expr))?;
        let label = if matched {
            "match".green()
        } else {
            "no match".red()
        };
        text.push_str(&format!("{}\t{}\n", message.id, label));
        results.push(json!({ "id": message.id, "matched": matched }));
    }

    let matched = results.iter().filter(|r| r["matched"] == true).count();
    text.push_str(&format!("\n{} of {} messages match\n", matched, messages.len()));
    print_output(format, &text, json!({ "filter": expr, "results": results }));
    Ok(())
}

fn format_diagnostics(diagnostics: &[FilterDiagnostic], chats: usize) -> String {
    if diagnostics.is_empty() {
        return format!("{} {} chat filter(s) valid\n", "OK".green().bold(), chats);
    }
    let mut text = String::new();
    for diagnostic in diagnostics {
        text.push_str(&format!(
            "{} chat {}: {}\n    {}\n",
            "error:".red().bold(),
            diagnostic.chat_id,
            diagnostic.message,
            diagnostic.filter
        ));
    }
    text
}

fn fields_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["field", "aliases", "type", "nullable"]);
    for field in Field::ALL {
        table.add_row(vec![
            Cell::new(field.name()),
            Cell::new(field.aliases().join(", ")),
            Cell::new(field.field_type().name()),
            Cell::new(if field.is_nullable() { "yes" } else { "no" }),
        ]);
    }
    table
}

fn require_config(cli: &cli::Cli) -> anyhow::Result<()> {
    if cli.config.is_none() {
        bail!("No config file given; pass --config <FILE> or set MEDIA_FILTER_CONFIG");
    }
    Ok(())
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = cli_parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
    let ansi = cli.color != ColorMode::Never && cli.format == OutputFormat::Text;
    logging::init_tracing(cli.verbose, cli.quiet, ansi)?;

    let config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    let debug = config.debug || cli.verbose >= 2;

    let mut filter = Filter::new();
    filter.set_debug(debug);

    match &cli.command {
        Commands::Check { expr } => return Ok(run_check(&filter, expr, cli.format)),
        Commands::Eval { expr, messages } => {
            let messages = load_messages(messages)?;
            run_eval(&mut filter, expr, &messages, cli.format)?;
        }
        Commands::Select { chat, messages } => {
            require_config(&cli)?;
            let chat_config = config
                .chat(*chat)
                .with_context(|| format!("Chat {} is not configured", chat))?;
            let messages = load_messages(messages)?;
            let selection = select_messages(chat_config, &messages, debug);
            match cli.format {
                OutputFormat::Text => print!("{}", select::format_selection_text(&selection)),
                OutputFormat::Json => println!("{}", select::format_selection_json(&selection)),
            }
            if selection.misconfigured.is_some() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::ValidateConfig => {
            require_config(&cli)?;
            let diagnostics = validate_config(&config);
            let text = format_diagnostics(&diagnostics, config.chats.len());
            print_output(cli.format, &text, json!({ "errors": diagnostics }));
            if !diagnostics.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Fields => {
            let fields: Vec<_> = Field::ALL
                .iter()
                .map(|field| {
                    json!({
                        "name": field.name(),
                        "aliases": field.aliases(),
                        "type": field.field_type().name(),
                        "nullable": field.is_nullable(),
                    })
                })
                .collect();
            print_output(cli.format, &format!("{}\n", fields_table()), json!(fields));
        }
    }

    Ok(ExitCode::SUCCESS)
}
