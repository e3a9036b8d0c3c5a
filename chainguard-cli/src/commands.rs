//! CLI command implementations.

use crate::config::{ChainguardConfig, CONFIG_FILE, SALT_ENV};
use chainguard_core::{load_edges_file, load_risk_records_file, read_batch_ids, RiskLevel};
use chainguard_graph::{
    DatasetBuilder, IdMode, NodeRole, PublicNeighborhood, PublicRecord, QueryService,
};
use chainguard_server::{ChainguardServer, ServerConfig};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Write a default config file into a directory.
pub fn init(path: &Path) -> Result<()> {
    let config_path = path.join(CONFIG_FILE);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    fs::create_dir_all(path)?;
    let config = ChainguardConfig::default();
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("{} Wrote {}", "✓".green(), config_path.display());
    println!(
        "  Set {} before running queries",
        SALT_ENV.cyan()
    );

    Ok(())
}

/// Load both datasets and build the query service.
pub fn build_service(config: &ChainguardConfig) -> Result<QueryService> {
    let salt = config.salt()?;
    let (records, _) = load_risk_records_file(&config.risk_path)?;

    let edges = match &config.edges_path {
        Some(path) if path.exists() => load_edges_file(path)?,
        Some(path) => {
            warn!(
                "Edge list {} not found, graph queries will have no neighbors",
                path.display()
            );
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut builder = DatasetBuilder::new().with_salt(salt);
    builder.add_records(records).add_edges(edges);
    let ctx = builder.build()?;

    Ok(QueryService::with_limits(Arc::new(ctx), config.limits()))
}

fn load_service(config: &ChainguardConfig) -> Result<QueryService> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("Loading datasets...");

    let service = build_service(config);
    spinner.finish_and_clear();
    service
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn level_label(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::Critical => level.as_str().red().bold(),
        RiskLevel::High => level.as_str().red(),
        RiskLevel::Medium => level.as_str().yellow(),
        RiskLevel::Low => level.as_str().green(),
    }
}

fn print_record_line(record: &PublicRecord) {
    let marker = if record.flagged {
        "⚑".red()
    } else {
        " ".normal()
    };
    println!(
        "  {} {} {:>6.2} {} {}",
        marker,
        record.public_id.cyan(),
        record.risk_score,
        level_label(record.risk_level),
        record.alert.dimmed()
    );
}

/// Show configuration and dataset statistics.
pub fn status(config: &ChainguardConfig) -> Result<()> {
    println!("{}", "ChainGuard Status".cyan().bold());
    println!();
    println!("  {} {}", "Risk data:".dimmed(), config.risk_path.display());
    match &config.edges_path {
        Some(path) => println!("  {} {}", "Edges:".dimmed(), path.display()),
        None => println!("  {} none", "Edges:".dimmed()),
    }

    if config.salt().is_err() {
        println!("  {} salt not set", "✗".red());
        println!("  Set {} to load the datasets", SALT_ENV.cyan());
        return Ok(());
    }

    let service = load_service(config)?;
    let stats = service.stats();
    println!("  {} {}", "Records:".dimmed(), stats.record_count);
    println!("  {} {}", "Flagged:".dimmed(), stats.flagged_count);
    println!("  {} {}", "Graph edges:".dimmed(), stats.edge_count);
    println!("  {} {}", "Graph nodes:".dimmed(), stats.graph_node_count);
    println!(
        "  {} {}",
        "Max depth:".dimmed(),
        service.limits().max_graph_depth
    );

    Ok(())
}

/// Look up a single entity by public id.
pub fn lookup(config: &ChainguardConfig, id: &str, json: bool) -> Result<()> {
    let service = load_service(config)?;
    let record = service.lookup(id)?;

    if json {
        return print_json(&record);
    }

    println!("{}", record.public_id.cyan().bold());
    println!("  {} {:.2}", "Risk score:".dimmed(), record.risk_score);
    println!("  {} {}", "Risk level:".dimmed(), level_label(record.risk_level));
    println!("  {} {:.4}", "Fraud prob:".dimmed(), record.fraud_prob);
    println!("  {} {:.4}", "GNN prob:".dimmed(), record.gnn_fraud_prob);
    println!("  {} {:.4}", "Anomaly:".dimmed(), record.anomaly_score);
    println!("  {} {}", "Class:".dimmed(), record.class_label);
    println!("  {} {}", "Alert:".dimmed(), record.alert);
    if record.flagged {
        println!("  {}", "FLAGGED".red().bold());
    }

    Ok(())
}

/// Look up every id listed in a CSV file.
pub fn batch(config: &ChainguardConfig, file: &Path, real: bool, json: bool) -> Result<()> {
    let mode = if real { IdMode::Real } else { IdMode::Public };
    let reader = BufReader::new(File::open(file)?);
    let ids = read_batch_ids(reader, mode.batch_column())?;

    let service = load_service(config)?;
    let result = service.batch_lookup(&ids, mode)?;

    if json {
        return print_json(&result);
    }

    println!(
        "Found {} of {} requested\n",
        result.found.to_string().cyan(),
        result.total_requested
    );
    for record in &result.results {
        print_record_line(record);
    }
    println!();
    println!(
        "  {} {}  {} {}  {} {}",
        "high:".red(),
        result.breakdown.high,
        "medium:".yellow(),
        result.breakdown.medium,
        "low:".green(),
        result.breakdown.low
    );

    Ok(())
}

/// List the riskiest entities.
pub fn top(config: &ChainguardConfig, n: Option<usize>, json: bool) -> Result<()> {
    let k = n.unwrap_or(config.default_top_k);
    let service = load_service(config)?;
    let records = service.top_risky(k);

    if json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No risk records loaded");
        return Ok(());
    }

    println!("Top {} by risk score:\n", records.len());
    for record in &records {
        print_record_line(record);
    }

    Ok(())
}

fn print_neighborhood(view: &PublicNeighborhood) {
    println!(
        "{} {} {}",
        "Neighborhood of".cyan(),
        view.center.cyan().bold(),
        format!("(depth {}, {}ms)", view.max_depth, view.query_time_ms).dimmed()
    );
    println!();

    for node in view.nodes.iter().filter(|n| n.role == NodeRole::Neighbor) {
        let marker = if node.flagged {
            "⚑".red()
        } else {
            " ".normal()
        };
        println!(
            "  {} {} {:>6.2} {}",
            marker,
            node.id,
            node.risk_score,
            format!("hop {}", node.hop_distance).dimmed()
        );
    }

    if view.edges.is_empty() {
        println!("  {}", "No connected entities".dimmed());
        return;
    }

    println!();
    for edge in &view.edges {
        println!(
            "  {} {} {} {}",
            edge.source.dimmed(),
            "→".cyan(),
            edge.target.dimmed(),
            format!("[{}]", edge.direction).yellow()
        );
    }
}

/// Show the neighborhood of an entity.
pub fn graph(config: &ChainguardConfig, id: &str, depth: usize, json: bool) -> Result<()> {
    let service = load_service(config)?;
    let view = service.graph(id, depth)?;

    if json {
        return print_json(&view);
    }

    print_neighborhood(&view);
    Ok(())
}

/// Print a risk report for one entity.
pub fn report(config: &ChainguardConfig, id: &str, json: bool) -> Result<()> {
    let service = load_service(config)?;
    let report = service.report(id)?;

    if json {
        return print_json(&report);
    }

    println!("{}", "ChainGuard Risk Report".cyan().bold());
    println!(
        "  {} {}",
        "Generated:".dimmed(),
        report.generated_at.to_rfc3339()
    );
    println!("  {} {}", "Entity:".dimmed(), report.record.public_id);
    println!(
        "  {} {:.2} ({})",
        "Risk score:".dimmed(),
        report.record.risk_score,
        level_label(report.risk_level)
    );
    match report.triggered_signal {
        Some(signal) => println!("  {} {}", "Flagged by:".dimmed(), signal.to_string().red()),
        None => println!("  {} {}", "Flagged by:".dimmed(), "nothing".green()),
    }
    println!(
        "  {} {}",
        "Recommended action:".dimmed(),
        report.recommended_action.bold()
    );

    Ok(())
}

/// Start the query server.
pub async fn serve(config: &ChainguardConfig, port: Option<u16>, headless: bool) -> Result<()> {
    let host = if headless {
        "0.0.0.0"
    } else {
        config.server.host.as_str()
    };
    let port = port.unwrap_or(config.server.port);

    if headless {
        println!("{}", "Starting ChainGuard server in headless mode...".cyan());
    } else {
        println!("{}", "Starting ChainGuard server...".cyan());
    }

    let service = load_service(config)?;
    let stats = service.stats();
    println!(
        "{} Loaded {} records ({} edges)",
        "✓".green(),
        stats.record_count,
        stats.edge_count
    );

    let addr = format!("{}:{}", host, port).parse()?;
    let server = ChainguardServer::new(
        service,
        ServerConfig {
            addr,
            allow_real_ids: config.server.allow_real_ids,
        },
    );

    println!("{} Listening on ws://{}:{}", "✓".green(), host, port);
    if headless {
        println!("  Headless mode: accepting connections from any host");
    }
    if config.server.allow_real_ids {
        println!("  {} real-id batch requests are enabled", "⚠".yellow());
    }
    println!("  Press {} to stop", "Ctrl+C".cyan());

    server.run().await?;

    Ok(())
}
