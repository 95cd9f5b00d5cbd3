//! Kgviz CLI - knowledge graph import, validation, and export

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use kgviz_core::api::ImportData;
use kgviz_core::commands::graph::{self, ImportOutcome};
use kgviz_core::config::Config;
use kgviz_core::domain::graph::normalize_domain;
use kgviz_core::domain::import::{ConflictPolicy, ImportRequest, ImportStrategy};
use kgviz_core::domain::validation::{ValidationReport, validate_fragment};
use kgviz_core::storage::{Database, DatabaseConfig};
use serde_json::Value;
use tracing::debug;

#[derive(Parser)]
#[command(name = "kgviz")]
#[command(author, version, about = "Knowledge graph import and merge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Database file (overrides KGVIZ_DATABASE and the config file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a {nodes, links} JSON file into a domain
    Import {
        /// JSON file to import
        file: PathBuf,
        /// Target domain
        #[arg(short, long)]
        domain: Option<String>,
        /// Edge strategy (merge, skip, overwrite, create_new)
        #[arg(short, long)]
        strategy: Option<ImportStrategy>,
        /// Node conflict policy (auto_id, merge_data, skip)
        #[arg(short, long)]
        conflict_resolution: Option<ConflictPolicy>,
        /// Run the import and discard the changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Check a JSON file before importing it
    Validate {
        /// JSON file to check
        file: PathBuf,
    },

    /// Export a domain as {nodes, links} JSON
    Export {
        /// Domain to export
        #[arg(short, long)]
        domain: Option<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete every entity and relationship of a domain
    Clear {
        /// Domain to clear
        #[arg(short, long)]
        domain: String,
        /// Required to actually delete
        #[arg(long)]
        force: bool,
    },

    /// Show entity and relationship counts for a domain
    Stats {
        /// Domain to inspect
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let directive = if cli.verbose { "kgviz=debug" } else { "kgviz=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Import {
            file,
            domain,
            strategy,
            conflict_resolution,
            dry_run,
        } => {
            let config = Config::load()?;
            let overrides = ImportOverrides {
                domain,
                strategy,
                conflict_resolution,
                dry_run,
            };
            let request = build_request(&file, &config, overrides)?;
            let db = open_database(&config, cli.database).await?;
            cmd_import(&db, request, out).await
        }

        Commands::Validate { file } => cmd_validate(&file, out),

        Commands::Export { domain, output } => {
            let config = Config::load()?;
            let domain = domain.unwrap_or_else(|| config.import.domain.clone());
            let db = open_database(&config, cli.database).await?;
            cmd_export(&db, &domain, output.as_deref(), out).await
        }

        Commands::Clear { domain, force } => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database).await?;
            cmd_clear(&db, &domain, force, out).await
        }

        Commands::Stats { domain } => {
            let config = Config::load()?;
            let domain = domain.unwrap_or_else(|| config.import.domain.clone());
            let db = open_database(&config, cli.database).await?;
            cmd_stats(&db, &domain, out).await
        }

        Commands::Config { action } => cmd_config(action, out),
    }
}

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

async fn open_database(config: &Config, explicit: Option<PathBuf>) -> anyhow::Result<Database> {
    let path = config.database_path(explicit);
    debug!(path = %path.display(), "Opening database");
    Database::new(
        DatabaseConfig::with_path(path).max_connections(config.database.max_connections),
    )
    .await
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command Implementations
// ============================================================================

struct ImportOverrides {
    domain: Option<String>,
    strategy: Option<ImportStrategy>,
    conflict_resolution: Option<ConflictPolicy>,
    dry_run: bool,
}

/// Read an import file and fill in settings: command-line flags win, then
/// the file's own settings, then the configured defaults
fn build_request(
    file: &Path,
    config: &Config,
    overrides: ImportOverrides,
) -> anyhow::Result<ImportRequest> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let mut body: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid JSON in {}", file.display()))?;

    let Value::Object(map) = &mut body else {
        return Err(anyhow!("{} must contain a JSON object", file.display()));
    };

    let mut apply = |field: &str, flag: Option<String>, fallback: String| {
        match flag {
            Some(value) => {
                map.insert(field.to_string(), Value::String(value));
            }
            None => {
                let entry = map.entry(field.to_string()).or_insert(Value::Null);
                if entry.is_null() {
                    *entry = Value::String(fallback);
                }
            }
        }
    };
    apply("domain", overrides.domain, config.import.domain.clone());
    apply(
        "strategy",
        overrides.strategy.map(|s| s.to_string()),
        config.import.strategy.to_string(),
    );
    apply(
        "conflict_resolution",
        overrides.conflict_resolution.map(|p| p.to_string()),
        config.import.conflict_resolution.to_string(),
    );

    let request = ImportRequest::from_value(body)?;
    Ok(if overrides.dry_run {
        request.with_dry_run(true)
    } else {
        request
    })
}

async fn cmd_import(db: &Database, request: ImportRequest, out: Output) -> anyhow::Result<()> {
    let outcome = graph::import_graph(db, request).await?;

    if out.json() {
        return print_json(&ImportData::from(outcome));
    }
    if !out.quiet {
        print_import_summary(&outcome);
    }
    Ok(())
}

fn print_import_summary(outcome: &ImportOutcome) {
    let report = &outcome.report;
    println!(
        "Import into domain '{}' (strategy: {}, conflict resolution: {})",
        outcome.domain, outcome.strategy, outcome.conflict_resolution
    );
    println!(
        "  Entities:      created {}, updated {}, skipped {}, conflicts {}, errors {}",
        report.entities.created,
        report.entities.updated,
        report.entities.skipped,
        report.entities.conflicts,
        report.entities.errors
    );
    println!(
        "  Relationships: created {}, updated {}, skipped {}, errors {}",
        report.relationships.created,
        report.relationships.updated,
        report.relationships.skipped,
        report.relationships.errors
    );

    let renamed: Vec<_> = report
        .id_mapping
        .iter()
        .filter(|(original, resolved)| original != resolved)
        .collect();
    if !renamed.is_empty() {
        println!("\nRenamed entities:");
        for (original, resolved) in renamed {
            println!("  {} -> {}", original, resolved);
        }
    }

    if !report.conflicts.is_empty() {
        println!("\nConflicts ({}):", report.conflicts.len());
        for conflict in &report.conflicts {
            println!("  [{}] {}", conflict.kind, conflict.message);
        }
    }

    if outcome.dry_run {
        println!("\nDry run: no changes were written.");
    }
}

fn cmd_validate(file: &Path, out: Output) -> anyhow::Result<()> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let report = match serde_json::from_str::<Value>(&contents) {
        Ok(data) => validate_fragment(&data),
        Err(e) => ValidationReport {
            errors: vec![format!("Invalid JSON: {}", e)],
            ..Default::default()
        },
    };

    if out.json() {
        print_json(&report)?;
    } else if !out.quiet {
        print_validation_report(file, &report);
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(anyhow!(
            "Validation failed with {} error(s)",
            report.errors.len()
        ))
    }
}

fn print_validation_report(file: &Path, report: &ValidationReport) {
    let stats = &report.stats;
    println!("Validation report for {}", file.display());
    println!(
        "  Nodes: {} total, {} valid, {} invalid",
        stats.nodes.total, stats.nodes.valid, stats.nodes.invalid
    );
    println!(
        "  Links: {} total, {} valid, {} invalid",
        stats.links.total, stats.links.valid, stats.links.invalid
    );

    if !report.errors.is_empty() {
        println!("\nErrors ({}):", report.errors.len());
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    if report.is_valid() {
        if report.warnings.is_empty() {
            println!("\nValid: ready to import.");
        } else {
            println!(
                "\nValid with {} warning(s): safe to import.",
                report.warnings.len()
            );
        }
    }
}

async fn cmd_export(
    db: &Database,
    domain: &str,
    output: Option<&Path>,
    out: Output,
) -> anyhow::Result<()> {
    let domain = normalize_domain(Some(domain));
    let fragment = graph::export_domain(db, &domain).await?;
    let json = serde_json::to_string_pretty(&fragment)?;

    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write export file: {}", path.display()))?;
            if !out.quiet {
                eprintln!(
                    "Exported {} entities and {} relationships from '{}' to {}",
                    fragment.nodes.len(),
                    fragment.links.len(),
                    domain,
                    path.display()
                );
            }
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn cmd_clear(db: &Database, domain: &str, force: bool, out: Output) -> anyhow::Result<()> {
    let domain = normalize_domain(Some(domain));
    if !force {
        return Err(anyhow!(
            "Refusing to clear domain '{}' without --force",
            domain
        ));
    }

    let result = graph::clear_domain(db, &domain).await?;
    if out.json() {
        print_json(&result)?;
    } else if !out.quiet {
        println!(
            "Cleared domain '{}': {} entities, {} relationships deleted.",
            domain, result.entities_deleted, result.relationships_deleted
        );
    }
    Ok(())
}

async fn cmd_stats(db: &Database, domain: &str, out: Output) -> anyhow::Result<()> {
    let domain = normalize_domain(Some(domain));
    let stats = graph::graph_stats(db, &domain).await?;

    if out.json() {
        return print_json(&stats);
    }

    println!("Domain: {}", stats.domain);
    println!("  Entities:      {}", stats.total_entities);
    println!("  Relationships: {}", stats.total_relationships);
    if !out.quiet {
        if !stats.entities_by_type.is_empty() {
            println!("\nEntities by type:");
            for (entity_type, count) in &stats.entities_by_type {
                let label = if entity_type.is_empty() {
                    "(untyped)"
                } else {
                    entity_type
                };
                println!("  {:<20} {}", label, count);
            }
        }
        if !stats.relationships_by_type.is_empty() {
            println!("\nRelationships by type:");
            for (rel_type, count) in &stats.relationships_by_type {
                println!("  {:<20} {}", rel_type, count);
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, out: Output) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !out.quiet {
                println!("Set {} = {}", key, config.get(&key)?);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            if out.json() {
                let map: serde_json::Map<String, Value> = items
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                print_json(&map)?;
            } else {
                for (key, value) in items {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !out.quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_args_parse() {
        let cli = Cli::try_parse_from([
            "kgviz",
            "import",
            "graph.json",
            "--domain",
            "d",
            "--strategy",
            "overwrite",
            "--conflict-resolution",
            "merge_data",
            "--dry-run",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(cli.format == OutputFormat::Json);
        let Commands::Import {
            domain,
            strategy,
            conflict_resolution,
            dry_run,
            ..
        } = cli.command
        else {
            panic!("expected import command");
        };
        assert_eq!(domain.as_deref(), Some("d"));
        assert_eq!(strategy, Some(ImportStrategy::Overwrite));
        assert_eq!(conflict_resolution, Some(ConflictPolicy::MergeData));
        assert!(dry_run);
    }

    #[test]
    fn test_unknown_strategy_rejected_by_parser() {
        assert!(Cli::try_parse_from(["kgviz", "import", "f.json", "--strategy", "replace"]).is_err());
    }

    #[test]
    fn test_build_request_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("graph.json");
        fs::write(
            &file,
            r#"{"nodes": [], "links": [], "strategy": "skip", "domain": "from-file"}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.set("import.conflict_resolution", "merge_data").unwrap();
        config.set("import.strategy", "overwrite").unwrap();

        let request = build_request(
            &file,
            &config,
            ImportOverrides {
                domain: Some("from-flag".into()),
                strategy: None,
                conflict_resolution: None,
                dry_run: true,
            },
        )
        .unwrap();

        assert_eq!(request.domain, "from-flag");
        assert_eq!(request.strategy, ImportStrategy::Skip);
        assert_eq!(request.conflict_resolution, ConflictPolicy::MergeData);
        assert!(request.dry_run);
    }

    #[test]
    fn test_build_request_null_settings_use_config() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("graph.json");
        fs::write(
            &file,
            r#"{"nodes": [], "links": [], "domain": null, "strategy": null, "conflict_resolution": null}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.set("import.domain", "configured").unwrap();
        config.set("import.strategy", "skip").unwrap();
        config.set("import.conflict_resolution", "skip").unwrap();

        let request = build_request(
            &file,
            &config,
            ImportOverrides {
                domain: None,
                strategy: None,
                conflict_resolution: None,
                dry_run: false,
            },
        )
        .unwrap();

        assert_eq!(request.domain, "configured");
        assert_eq!(request.strategy, ImportStrategy::Skip);
        assert_eq!(request.conflict_resolution, ConflictPolicy::Skip);
    }
}
