use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hh_scout::commands::{
    crm, exit_code_for,
    report::{self, ListOptions},
    search::{self, SearchOptions},
    setup, Context, EXIT_OTHER, EXIT_SUCCESS,
};

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a config file with an interactive wizard
    Init,
    /// Store the hh.ru access token in the system keyring
    Token {
        /// Remove the stored token instead
        #[arg(long)]
        clear: bool,
    },
    /// Search hh.ru for a vacancy and rank the résumés found
    Search {
        /// Vacancy name from the config
        vacancy: String,
        /// Maximum résumés to score (overrides the vacancy's max_results)
        #[arg(short, long)]
        max: Option<usize>,
        /// Show only the top N rows
        #[arg(short, long)]
        limit: Option<usize>,
        /// Tab-separated output for scripts
        #[arg(long)]
        tsv: bool,
        /// Don't save candidates, scores or the search session
        #[arg(long)]
        no_save: bool,
    },
    /// Re-score stored candidates with the vacancy's current profile
    Rescore {
        vacancy: String,
        #[arg(long)]
        tsv: bool,
    },
    /// List stored candidates for a vacancy, best first
    List {
        vacancy: String,
        /// Minimum score (inclusive)
        #[arg(long)]
        min: Option<u32>,
        /// Maximum score (inclusive)
        #[arg(long)]
        max: Option<u32>,
        /// Only candidates with this CRM status
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        tsv: bool,
    },
    /// Show a candidate card: contacts, score history, CRM log
    Show {
        /// Résumé id, id prefix or part of the name
        candidate: String,
        /// Fetch the full résumé (with contacts) from hh.ru first
        #[arg(short, long)]
        refresh: bool,
    },
    /// List past search sessions, newest first
    Sessions {
        /// Only sessions for this vacancy
        vacancy: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Move a candidate to a new CRM status
    Status {
        candidate: String,
        /// new, contacted, interview, offer, hired or rejected
        status: String,
    },
    /// Attach a note to a candidate
    Note { candidate: String, text: String },
    /// Tag a candidate
    Tag { candidate: String, tag: String },
    /// Invite a candidate to a published hh.ru vacancy
    Invite {
        candidate: String,
        /// Vacancy name (defaults to the last one the candidate was scored for)
        #[arg(long)]
        vacancy: Option<String>,
        /// Invitation text; {name} and {vacancy} are substituted
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List hh.ru negotiations and update invitation statuses
    Negotiations {
        /// Only negotiations for this vacancy
        vacancy: Option<String>,
    },
    /// Send a message into a negotiation thread
    Message {
        negotiation: String,
        text: String,
        /// Candidate to log the message against
        #[arg(long)]
        candidate: Option<String>,
    },
    /// Export a vacancy's ranking as CSV
    Export {
        vacancy: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        min: Option<u32>,
        #[arg(long)]
        max: Option<u32>,
    },
    /// Open a candidate's résumé in the browser
    Open { candidate: String },
    /// Add a vacancy profile built from a published hh.ru vacancy
    ImportVacancy {
        /// hh.ru vacancy id or link
        vacancy: String,
        /// Profile name (defaults to the vacancy title)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Remove cached hh.ru responses
    ClearCache,
}

#[derive(Parser, Debug)]
#[command(name = "hh-scout")]
#[command(about = "Find, score and track candidates from hh.ru", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/hh-scout/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the candidate store (defaults to ~/.config/hh-scout/store.json)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Bypass the HTTP response cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Logging level from the config file, if one can be read. Config errors
/// are reported later by the command that needs the config.
fn configured_log_level(path: Option<PathBuf>) -> Option<String> {
    hh_scout::config::load_config(path)
        .ok()
        .and_then(|c| c.log_level)
}

async fn run(ctx: &Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => setup::run_init(ctx),
        Commands::Token { clear } => setup::run_token(clear).await,
        Commands::Search {
            vacancy,
            max,
            limit,
            tsv,
            no_save,
        } => {
            let opts = SearchOptions {
                vacancy,
                max_results: max,
                limit,
                tsv,
                no_save,
            };
            search::run_search(ctx, &opts).await
        }
        Commands::Rescore { vacancy, tsv } => search::run_rescore(ctx, &vacancy, tsv),
        Commands::List {
            vacancy,
            min,
            max,
            status,
            limit,
            tsv,
        } => {
            let opts = ListOptions {
                vacancy,
                min_score: min,
                max_score: max,
                status,
                limit,
                tsv,
            };
            report::run_list(ctx, &opts)
        }
        Commands::Show { candidate, refresh } => crm::run_show(ctx, &candidate, refresh).await,
        Commands::Sessions { vacancy, limit } => {
            report::run_sessions(ctx, vacancy.as_deref(), limit)
        }
        Commands::Status { candidate, status } => crm::run_status(ctx, &candidate, &status),
        Commands::Note { candidate, text } => crm::run_note(ctx, &candidate, &text),
        Commands::Tag { candidate, tag } => crm::run_tag(ctx, &candidate, &tag),
        Commands::Invite {
            candidate,
            vacancy,
            message,
        } => crm::run_invite(ctx, &candidate, vacancy.as_deref(), message.as_deref()).await,
        Commands::Negotiations { vacancy } => crm::run_negotiations(ctx, vacancy.as_deref()).await,
        Commands::Message {
            negotiation,
            text,
            candidate,
        } => crm::run_message(ctx, &negotiation, &text, candidate.as_deref()).await,
        Commands::Export {
            vacancy,
            out,
            min,
            max,
        } => report::run_export(ctx, &vacancy, out.as_deref(), min, max),
        Commands::Open { candidate } => crm::run_open(ctx, &candidate),
        Commands::ImportVacancy { vacancy, name } => {
            setup::run_import_vacancy(ctx, &vacancy, name.as_deref()).await
        }
        Commands::ClearCache => setup::run_clear_cache(),
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        std::process::exit(EXIT_OTHER);
    }

    let cli = Cli::parse();

    let log_level = configured_log_level(cli.config.clone());
    if let Err(e) = hh_scout::telemetry::init(cli.verbose, log_level.as_deref()) {
        eprintln!("Warning: {}", e);
    }

    let ctx = Context {
        config_path: cli.config,
        store_path: cli.store,
        no_cache: cli.no_cache,
        verbose: cli.verbose,
    };

    if let Err(e) = run(&ctx, cli.command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code_for(&e));
    }

    std::process::exit(EXIT_SUCCESS);
}
