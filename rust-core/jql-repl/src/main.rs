// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! JQL REPL: interactive query editor with context-sensitive completion.
//!
//! Provides a readline-based shell with:
//! - Tab completion for fields, operators and values at the cursor
//! - JQL syntax highlighting
//! - An inline hint naming what the cursor is editing
//! - Table and JSON output
//! - Persistent command history

mod completer;
mod formatter;
mod highlighter;
mod hinter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use jql_assist::detect::detect_with_rule;
use jql_assist::parser::{PositionalParser, QueryParser};
use jql_assist::{
    heading_label, AssistConfig, AssistError, Catalog, SimulatedValueFetcher, SuggestionKind,
    SuggestionResolver,
};
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::validate::MatchingBracketValidator;
use rustyline_derive::{Completer, Helper, Highlighter, Hinter, Validator};
use tracing::debug;

use formatter::{format_candidates, format_context, format_tree, OutputFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

/// jql: interactive JQL editor with context-sensitive completion.
#[derive(Parser, Debug)]
#[command(name = "jql", version = VERSION, about = "Interactive JQL editor")]
struct Cli {
    /// JSON catalog of fields, operators and values (defaults to built-in JQL).
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// JSON engine configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default output format.
    #[arg(long, default_value = "table")]
    format: String,

    /// Answer value lookups without simulated latency.
    #[arg(long)]
    offline: bool,
}

// ---------------------------------------------------------------------------
// Rustyline helper (bundles all traits into one type)
// ---------------------------------------------------------------------------

#[derive(Helper, Highlighter, Completer, Hinter, Validator)]
struct JqlHelper {
    #[rustyline(Highlighter)]
    highlighter: highlighter::JqlHighlighter,
    #[rustyline(Completer)]
    completer: completer::JqlCompleter,
    #[rustyline(Hinter)]
    hinter: hinter::ContextHinter,
    #[rustyline(Validator)]
    validator: MatchingBracketValidator,
}

// ---------------------------------------------------------------------------
// REPL session state
// ---------------------------------------------------------------------------

struct Repl {
    resolver: Arc<SuggestionResolver>,
    parser: PositionalParser,
    format: OutputFormat,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    // Logs go to stderr and default to warnings so they do not fight the prompt.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let format: OutputFormat = cli.format.parse().unwrap_or_else(|e| {
        eprintln!("Warning: {e}. Defaulting to table format.");
        OutputFormat::Table
    });

    let config = load_config(&cli)?;
    let catalog = Arc::new(match &cli.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::default(),
    });
    catalog.validate()?;

    let runtime = Arc::new(
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?,
    );
    let fetcher = Arc::new(SimulatedValueFetcher::from_config(&config));
    let resolver = Arc::new(SuggestionResolver::new(Arc::clone(&catalog), fetcher));

    let mut repl = Repl {
        resolver: Arc::clone(&resolver),
        parser: PositionalParser::new(),
        format,
    };

    print_banner(&repl, &config);

    let helper = JqlHelper {
        highlighter: highlighter::JqlHighlighter::new(&catalog),
        completer: completer::JqlCompleter::new(resolver, runtime, config.max_visible_candidates),
        hinter: hinter::ContextHinter,
        validator: MatchingBracketValidator::new(),
    };

    let mut editor = rustyline::Editor::<JqlHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(helper));
    editor.set_auto_add_history(true);

    // Missing history on first run is not an error.
    let history_path = history_file_path();
    let _ = editor.load_history(&history_path);

    loop {
        let prompt = format!("{} ", "jql>".bright_green().bold());
        match editor.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.starts_with('\\') {
                    if handle_meta_command(&mut repl, trimmed) {
                        break;
                    }
                    continue;
                }
                parse_query(&repl, trimmed);
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use \\quit or Ctrl-D to exit.");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye.");
                break;
            }
            Err(err) => {
                eprintln!("Readline error: {err}");
                break;
            }
        }
    }

    let _ = editor.save_history(&history_path);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AssistConfig, AssistError> {
    let mut config = match &cli.config {
        Some(path) => AssistConfig::from_path(path)?,
        None => AssistConfig::default(),
    };
    if cli.offline {
        config = AssistConfig {
            max_visible_candidates: config.max_visible_candidates,
            blur_grace_ms: config.blur_grace_ms,
            ..AssistConfig::offline()
        };
    }
    config.validate()?;
    debug!(?config, "Loaded configuration");
    Ok(config)
}

// ---------------------------------------------------------------------------
// Query handling
// ---------------------------------------------------------------------------

/// Run the grammar parser on a submitted query and print the result.
fn parse_query(repl: &Repl, query: &str) {
    match repl.parser.parse(query) {
        Ok(tree) => println!("{}", format_tree(&tree, repl.format)),
        Err(failure) => eprintln!("{} {failure}", "Parse error:".red().bold()),
    }
}

/// Handle a meta-command (line starting with '\').
///
/// Returns `true` if the REPL should exit (on \quit or \q).
fn handle_meta_command(repl: &mut Repl, line: &str) -> bool {
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    match cmd {
        "\\quit" | "\\q" => {
            println!("Goodbye.");
            return true;
        }
        "\\help" | "\\h" | "\\?" => print_help(),
        "\\parse" => {
            if arg.is_empty() {
                println!("Usage: \\parse <query>");
            } else {
                parse_query(repl, arg);
            }
        }
        "\\context" => {
            // The caret sits at the end of the argument, trailing space included.
            let query = line.strip_prefix(cmd).map_or("", |rest| rest.trim_start());
            let (context, rule) = detect_with_rule(query, query.len());
            println!("{}", format_context(&context, rule, repl.format));
        }
        "\\fields" => {
            let fields = repl.resolver.field_candidates();
            println!(
                "{}",
                format_candidates(heading_label(SuggestionKind::Field), &fields, repl.format)
            );
        }
        "\\functions" => {
            let functions = repl.resolver.function_candidates();
            println!("{}", format_candidates("Functions", &functions, repl.format));
        }
        "\\operators" => {
            if arg.is_empty() {
                println!("Usage: \\operators <field>");
            } else {
                let operators = repl.resolver.operator_candidates(Some(arg));
                println!(
                    "{}",
                    format_candidates(heading_label(SuggestionKind::Operator), &operators, repl.format)
                );
            }
        }
        "\\format" => {
            if arg.is_empty() {
                println!("Current format: {}", repl.format);
                println!("Usage: \\format <table|json>");
            } else {
                match arg.parse::<OutputFormat>() {
                    Ok(fmt) => {
                        repl.format = fmt;
                        println!("Output format: {}", repl.format);
                    }
                    Err(e) => eprintln!("{} {e}", "Error:".red().bold()),
                }
            }
        }
        _ => {
            eprintln!(
                "{} Unknown command: {}. Type \\help for available commands.",
                "Error:".red().bold(),
                cmd
            );
        }
    }

    false
}

// ---------------------------------------------------------------------------
// History file path
// ---------------------------------------------------------------------------

/// Determine the history file path (~/.jql_history).
fn history_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jql_history")
}

// ---------------------------------------------------------------------------
// Help and banner
// ---------------------------------------------------------------------------

fn print_banner(repl: &Repl, config: &AssistConfig) {
    println!();
    println!("{}", "  JQL Editor".bright_cyan().bold());
    println!("  {} {}", "Version:".dimmed(), VERSION);
    println!(
        "  {} {}",
        "Fields: ".dimmed(),
        repl.resolver.catalog().fields.len()
    );
    println!(
        "  {} {}-{}ms",
        "Latency:".dimmed(),
        config.fetch_latency_min_ms,
        config.fetch_latency_max_ms
    );
    println!("  {} {}", "Format: ".dimmed(), repl.format);
    println!();
    println!(
        "  Press {} to complete, {} for help, {} to exit.",
        "Tab".bright_yellow(),
        "\\help".bright_yellow(),
        "\\quit".bright_yellow()
    );
    println!();
}

fn print_help() {
    let commands = [
        ("\\parse <query>     ", "Parse a query and show its tokens"),
        ("\\context <query>   ", "Show what the end of a query is editing"),
        ("\\fields            ", "List queryable fields"),
        ("\\functions         ", "List query functions"),
        ("\\operators <field> ", "List operators valid for a field"),
        ("\\format <fmt>      ", "Set output format (table|json)"),
        ("\\help              ", "Show this help message"),
        ("\\quit / \\q         ", "Exit the REPL"),
    ];

    println!();
    println!("{}", "  JQL Meta-Commands".bright_cyan().bold());
    println!();
    for (command, description) in commands {
        println!("  {}  {}", command.bright_yellow(), description);
    }
    println!();
    println!("{}", "  Query Input".bright_cyan().bold());
    println!();
    println!("  Type a query; Tab offers the fields, operators or values valid at the cursor.");
    println!("  Press Enter to parse the query.");
    println!();
}
