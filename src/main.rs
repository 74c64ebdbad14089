mod commands;
mod core;
mod tracker;

use clap::{Parser, Subcommand};
use commands::issues_cmd::IssueFilter;

/// SprintScope: sprint productivity metrics from your issue tracker.
/// Rebuilds per-issue status timelines from the raw change history and
/// derives effort, idle-day, and overtime reports from them.
#[derive(Parser)]
#[command(name = "sprintscope", version = env!("CARGO_PKG_VERSION"), about = "Sprint productivity metrics from issue-tracker history")]
struct Cli {
    /// Ignore the cache TTL and fetch fresh data from the tracker
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Totals, completion rate, and developer/sprint/status breakdowns
    Overview {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Per-developer productivity table
    Devs {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Sprint performance list
    Sprints {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Detailed view of one sprint: developer effort and over-estimate tasks
    Sprint {
        /// Sprint name (e.g. "Sprint 7")
        name: String,
        /// Show the per-task breakdown for one developer
        #[arg(long)]
        dev: Option<String>,
        /// Only count tasks whose time spent exceeded their estimate
        #[arg(long)]
        exceeded: bool,
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Idle work days per developer for a sprint
    Idle {
        /// Sprint name (defaults to the latest numbered sprint)
        #[arg(long)]
        sprint: Option<String>,
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Overtime days (work on days off) per developer for a sprint
    Overtime {
        /// Sprint name (defaults to the latest numbered sprint)
        #[arg(long)]
        sprint: Option<String>,
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Browse and filter the fetched issues
    Issues {
        /// Filter by sprint name (substring, case-insensitive)
        #[arg(long)]
        sprint: Option<String>,
        /// Filter by assignee (substring, case-insensitive)
        #[arg(long)]
        assignee: Option<String>,
        /// Filter by status (substring, case-insensitive)
        #[arg(long)]
        status: Option<String>,
        /// Open an issue's tracker page in the browser by key
        #[arg(long, value_name = "KEY")]
        open: Option<String>,
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show cache status, or clear it
    Cache {
        /// Delete all cached issues and metadata
        #[arg(long)]
        clear: bool,
    },

    /// Show settings, or set the work-day calendar
    Config {
        /// Comma-separated weekday indices, 0=Sun..6=Sat (e.g. 1,2,3,4,5)
        #[arg(long, value_name = "DAYS")]
        work_days: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Cache { clear } => commands::cache_cmd::run(clear),
        Commands::Config { work_days } => commands::config_cmd::run(work_days.as_deref()),
        command => {
            let settings = crate::core::config::load();
            let data = match commands::data::load(&settings, cli.refresh) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            if data.from_cache {
                if let Some(meta) = &data.metadata {
                    eprintln!(
                        "[SprintScope] Using cached data from {} (--refresh to fetch).",
                        meta.last_fetch.format("%Y-%m-%d %H:%M UTC")
                    );
                }
            }
            if data.skipped > 0 {
                eprintln!(
                    "[SprintScope] Skipped {} issue(s) with malformed history.",
                    data.skipped
                );
            }

            match command {
                Commands::Overview { format } => {
                    commands::overview::run(&data.issues, &settings, &format)
                }
                Commands::Devs { format } => commands::devs::run(&data.issues, &settings, &format),
                Commands::Sprints { format } => {
                    commands::sprints::run_list(&data.issues, &settings, &format)
                }
                Commands::Sprint {
                    name,
                    dev,
                    exceeded,
                    format,
                } => commands::sprints::run_detail(
                    &data.issues,
                    &settings,
                    &name,
                    dev.as_deref(),
                    exceeded,
                    &format,
                ),
                Commands::Idle { sprint, format } => {
                    commands::idle_cmd::run(&data.issues, &settings, sprint.as_deref(), &format)
                }
                Commands::Overtime { sprint, format } => {
                    commands::overtime::run(&data.issues, &settings, sprint.as_deref(), &format)
                }
                Commands::Issues {
                    sprint,
                    assignee,
                    status,
                    open,
                    format,
                } => {
                    let filter = IssueFilter {
                        sprint: sprint.as_deref(),
                        assignee: assignee.as_deref(),
                        status: status.as_deref(),
                    };
                    commands::issues_cmd::run(&data.issues, &filter, open.as_deref(), &format)
                }
                Commands::Cache { .. } | Commands::Config { .. } => unreachable!(),
            }
        }
    }
}
