// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Spanwright diagnostic CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use spanwright::config::{self, ClientFamily, EnrichmentConfig};
use spanwright::instrument::{adapters, AdapterSpec};
use spanwright::resolve::{CallContextResolver, StaticFrames, StaticRegistry};
use spanwright::telemetry::{apply_call_context, init_telemetry, RecordedSpan, TelemetryConfig};
use spanwright::types::{AttributeValue, CallContext, StackFrame};

/// Spanwright version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Spanwright - call-site attribution for database client spans.
#[derive(Parser)]
#[command(name = "spanwright")]
#[command(author, version, about = "Call-site attribution for database client spans", long_about = None)]
struct Cli {
    /// Show debug output
    #[arg(long, env = "SPANWRIGHT_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for spanwright.
#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration
    Config {
        /// Workspace to load configuration for (default: current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve call context for a captured stack
    Resolve {
        /// JSON file holding an array of frames, innermost first
        #[arg(short, long)]
        frames: PathBuf,
        /// Application root (default: from configuration)
        #[arg(short, long)]
        app_root: Option<String>,
        /// Names the domain registry confirms as models
        #[arg(short, long = "model")]
        models: Vec<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List wrapped operations per client family
    Adapters {
        /// Family name or alias (postgres, pg, mysql, mysql2, redis, clickhouse)
        family: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _telemetry = if cli.debug {
        Some(init_telemetry(&TelemetryConfig::development(), None)?)
    } else {
        None
    };

    match cli.command {
        Commands::Config { workspace, json } => {
            let workspace_root = match workspace {
                Some(path) => path,
                None => std::env::current_dir()?,
            };
            let config = config::load_config(&workspace_root)?;
            print_config(&config, json)?;
        }
        Commands::Resolve {
            frames,
            app_root,
            models,
            json,
        } => {
            handle_resolve(&frames, app_root, models, json)?;
        }
        Commands::Adapters { family } => {
            let specs: Vec<&AdapterSpec> = match family {
                Some(name) => vec![AdapterSpec::by_name(&name)?],
                None => adapters::ALL.iter().collect(),
            };
            for spec in specs {
                println!(
                    "{} ({}): {}",
                    spec.family.to_string().bright_cyan(),
                    spec.family.db_system(),
                    spec.operations.join(", ")
                );
            }
        }
        Commands::Version => {
            println!("spanwright {}", VERSION);
        }
    }
    Ok(())
}

fn print_config(config: &EnrichmentConfig, json: bool) -> anyhow::Result<()> {
    if json {
        let view = serde_json::json!({
            "clients": &config.clients,
            "callContextEnabled": config.call_context_enabled,
            "spanNameFormatter": config.span_name_formatter.is_some(),
            "resolver": &config.resolver,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", "Spanwright Configuration".bright_blue().bold());
    println!("App root: {}", display_or_none(&config.resolver.app_root).bright_white());
    println!("Call context: {}", on_off(config.call_context_enabled));
    println!("Vendor markers: {}", config.resolver.vendor_markers.join(", "));
    println!("Model path segment: {}", config.resolver.model_path_segment);
    println!();
    for family in ClientFamily::ALL {
        let settings = config.client(family);
        println!(
            "  {:<11} {}  threshold {} ms",
            family.to_string(),
            on_off(settings.enabled),
            settings.slow_query_ms
        );
    }
    Ok(())
}

fn handle_resolve(
    frames_path: &Path,
    app_root: Option<String>,
    models: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(frames_path)
        .with_context(|| format!("Failed to read {}", frames_path.display()))?;
    let frames: Vec<StackFrame> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse frames from {}", frames_path.display()))?;

    let mut settings = config::load_config(&std::env::current_dir()?)?.resolver;
    if let Some(root) = app_root {
        settings.app_root = root;
    }

    let resolver = CallContextResolver::new(
        Arc::new(StaticFrames::new(frames)),
        Arc::new(StaticRegistry::new(models)),
    );
    let namespace = resolver.resolve_namespace_context(&settings);
    let model = resolver.resolve_model_context(&settings);
    let source = resolver.source_location(&settings);

    let mut span = RecordedSpan::new("resolve");
    if let Some(context) = &namespace {
        apply_call_context(&mut span, context);
    }
    let attributes = span.attributes();

    if json {
        let view = serde_json::json!({
            "appRoot": settings.app_root,
            "namespace": namespace,
            "model": model,
            "source": source,
            "spanStartAttributes": attributes,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", "Call Context".bright_blue().bold());
    println!("App root: {}", display_or_none(&settings.app_root).bright_white());
    print_context("Namespace", namespace.as_ref());
    print_context("Model", model.as_ref());
    match &source {
        Some(location) => println!(
            "Source: {}{}",
            location.filepath.bright_white(),
            location.line.map(|l| format!(":{}", l)).unwrap_or_default()
        ),
        None => println!("Source: {}", "none".dimmed()),
    }

    if !attributes.is_empty() {
        println!("\n{}", "Span-start attributes".bright_cyan());
        for (key, value) in &attributes {
            println!("  {} = {}", key, format_value(value));
        }
    }
    Ok(())
}

fn print_context(title: &str, context: Option<&CallContext>) {
    match context {
        Some(context) => println!(
            "{}: {}{} {}",
            title,
            context.class_name.bright_green(),
            context
                .method_name
                .as_deref()
                .map(|m| format!("#{}", m))
                .unwrap_or_default(),
            format!("({})", context.attribution_kind).dimmed()
        ),
        None => println!("{}: {}", title, "none".dimmed()),
    }
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

fn on_off(enabled: bool) -> colored::ColoredString {
    if enabled {
        "enabled".green()
    } else {
        "disabled".red()
    }
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}
