use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use payslip::{
    config::Config,
    fetch::GvizClient,
    render::{self, SlipFormat, SlipRenderer},
    SearchError, SearchRequest, SearchSession, SearchSlot,
};
use reqwest::Client;
use std::{env, path::PathBuf, process::ExitCode, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "payslip", version, about = "Look up an employee in a payroll sheet and produce a salary slip")]
struct Cli {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Spreadsheet ID (overrides config and PAYSLIP_SHEET_ID)
    #[arg(long, global = true)]
    sheet_id: Option<String>,

    /// Sheet (tab) name, also used as the month label. Defaults to the current month
    #[arg(short, long, global = true)]
    month: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find one employee, print the preview and save the slip
    Search {
        /// Employee identifier (case and whitespace are ignored)
        #[arg(short, long)]
        employee: String,

        #[arg(short, long, value_enum, default_value_t = SlipFormat::Text)]
        format: SlipFormat,

        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Only print the preview
        #[arg(long)]
        no_save: bool,
    },

    /// Show how the sheet's header and identifier column are detected
    Inspect,

    /// Read employee IDs from stdin, one per line; a new ID cancels a
    /// search still in flight
    Interactive {
        #[arg(short, long, value_enum, default_value_t = SlipFormat::Text)]
        format: SlipFormat,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::WARN.into())),
        )
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) config + source ──────────────────────────────────────────
    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref())?;
    let sheet_id = cli
        .sheet_id
        .or_else(|| cfg.source.sheet_id.clone())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("no sheet id: pass --sheet-id or set PAYSLIP_SHEET_ID"))?;
    let month = cli
        .month
        .unwrap_or_else(|| Local::now().format("%B %Y").to_string());
    let client = GvizClient::new(Client::new(), &cfg.source);
    info!(%sheet_id, %month, "startup");

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match cli.command {
        Command::Search {
            employee,
            format,
            out,
            no_save,
        } => {
            let request = SearchRequest {
                sheet_id,
                sheet_name: month,
                employee_id: employee,
            };
            let outcome = match SearchSession::new(request, &cfg).run(&client).await {
                Ok(o) => o,
                Err(e) => return Ok(report_failure(&e)),
            };

            let slip = outcome.into_slip();
            let renderer = format.renderer();
            println!("{}", renderer.preview(&slip));

            if !no_save {
                let dir = out.unwrap_or_else(|| cfg.output.dir.clone());
                let path = render::write_slip(&dir, &slip, renderer.as_ref()).await?;
                println!("saved {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Inspect => {
            let request = SearchRequest {
                sheet_id,
                sheet_name: month,
                employee_id: String::new(),
            };
            match SearchSession::new(request, &cfg).inspect(&client).await {
                Ok(report) => {
                    println!("header: {:?}", report.decision);
                    println!("data rows: {}", report.data_rows);
                    for (idx, label) in report.labels.iter() {
                        let mark = if idx == report.id_column { " <- identifier" } else { "" };
                        println!("  {:>3} {}: {}{}", report.labels.letter(idx), idx, label, mark);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(report_failure(&e)),
            }
        }

        Command::Interactive { format } => {
            run_interactive(Arc::new(cfg), client, sheet_id, month, format).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One message per failed search; "not found" gets its own exit code.
fn report_failure(e: &SearchError) -> ExitCode {
    error!(error = %e, "search failed");
    eprintln!("{}", e);
    if e.is_not_found() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

async fn run_interactive(
    cfg: Arc<Config>,
    client: GvizClient,
    sheet_id: String,
    month: String,
    format: SlipFormat,
) -> Result<()> {
    let slot = Arc::new(SearchSlot::default());
    let renderer: Arc<dyn SlipRenderer + Send + Sync> = Arc::from(format.renderer());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handles = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let request = SearchRequest {
            sheet_id: sheet_id.clone(),
            sheet_name: month.clone(),
            employee_id: line,
        };
        let employee = request.employee_id.clone();
        let (cfg, client) = (Arc::clone(&cfg), client.clone());
        // register before spawning so a later line always supersedes an earlier one
        let ticket = slot.begin(async move { SearchSession::new(request, &cfg).run(&client).await });
        let (slot, renderer) = (Arc::clone(&slot), Arc::clone(&renderer));

        handles.push(tokio::spawn(async move {
            match slot.finish(ticket).await {
                Ok(outcome) => println!("{}", renderer.preview(&outcome.into_slip())),
                Err(SearchError::Superseded) => debug!(%employee, "superseded"),
                Err(e) => {
                    report_failure(&e);
                }
            }
        }));
    }

    for h in handles {
        let _ = h.await;
    }
    Ok(())
}
