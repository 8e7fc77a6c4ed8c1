use agora::identity::AccountId;
use agora::ledger::GovernanceLedger;
use agora::store::FileJournal;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub mod close;
pub mod config;
pub mod history;
pub mod init;
pub mod propose;
pub mod query;
pub mod run;
pub mod version;
pub mod vote;

use config::{default_config_path, AgoraConfig};

#[derive(Parser)]
#[command(name = "agora")]
#[command(author = "Agora Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Governance ledger: proposals, votes and closing", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.local/share/agora/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Path to the ledger journal (overrides the config file)
    #[arg(long, global = true)]
    pub journal: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Vote direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Choice {
    #[value(alias = "yes")]
    For,
    #[value(alias = "no")]
    Against,
}

impl Choice {
    pub fn support(self) -> bool {
        matches!(self, Choice::For)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Submit a new proposal
    Propose {
        /// Account submitting the proposal
        #[arg(long = "as", value_name = "ACCOUNT")]
        caller: AccountId,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,
    },

    /// Cast a vote on an open proposal
    Vote {
        proposal_id: u64,

        /// Account casting the vote
        #[arg(long = "as", value_name = "ACCOUNT")]
        caller: AccountId,

        /// for | against
        #[arg(long, value_enum)]
        choice: Choice,
    },

    /// Close a proposal (creator only)
    Close {
        proposal_id: u64,

        /// Account closing the proposal
        #[arg(long = "as", value_name = "ACCOUNT")]
        caller: AccountId,
    },

    /// Show one proposal
    Show { proposal_id: u64 },

    /// List all proposals
    List,

    /// Print the number of proposals
    Count,

    /// Check whether an account has voted on a proposal
    HasVoted { proposal_id: u64, voter: AccountId },

    /// Show committed history, newest first
    History {
        /// Only entries for this proposal
        #[arg(long)]
        proposal: Option<u64>,

        /// Only entries caused by this account
        #[arg(long)]
        actor: Option<AccountId>,

        /// Only entries of this kind (created, voted, closed)
        #[arg(long)]
        kind: Option<agora::history::EntryKind>,

        /// Maximum number of entries
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Serve JSON-lines requests on stdin/stdout
    Run,

    /// Display version information
    Version,
}

/// Resolved settings shared by every command.
pub struct Context {
    pub config_path: PathBuf,
    pub config: AgoraConfig,
    pub journal_path: PathBuf,
}

impl Context {
    pub fn load(
        config_path: Option<String>,
        journal: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path);
        let config = AgoraConfig::load_or_create(&config_path)?;
        let journal_path = journal
            .map(PathBuf::from)
            .unwrap_or_else(|| config.store.journal_path.clone());

        Ok(Self {
            config_path,
            config,
            journal_path,
        })
    }

    /// Open the ledger without an event feed (one-shot commands).
    pub async fn open_ledger(
        &self,
    ) -> Result<GovernanceLedger<FileJournal>, Box<dyn std::error::Error>> {
        let journal = FileJournal::open(&self.journal_path).await?;
        Ok(GovernanceLedger::open_quiet(journal).await?)
    }
}

#[cfg(test)]
pub(crate) fn test_context(dir: &std::path::Path) -> Context {
    let journal_path = dir.join("ledger.journal");
    Context {
        config_path: dir.join("config.toml"),
        config: AgoraConfig::new(journal_path.clone()),
        journal_path,
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the config level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Already installed when commands run back to back in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        config,
        journal,
        command,
    } = cli;

    match command {
        Commands::Version => {
            version::execute();
            return Ok(());
        }
        Commands::Init { force } => return init::execute(config, journal, force),
        _ => {}
    }

    let ctx = Context::load(config, journal)?;
    init_logging(&ctx.config.logging.level);

    match command {
        Commands::Propose {
            caller,
            title,
            description,
        } => propose::execute(&ctx, caller, title, description).await,
        Commands::Vote {
            proposal_id,
            caller,
            choice,
        } => vote::execute(&ctx, proposal_id, caller, choice).await,
        Commands::Close {
            proposal_id,
            caller,
        } => close::execute(&ctx, proposal_id, caller).await,
        Commands::Show { proposal_id } => query::show(&ctx, proposal_id).await,
        Commands::List => query::list(&ctx).await,
        Commands::Count => query::count(&ctx).await,
        Commands::HasVoted { proposal_id, voter } => {
            query::has_voted(&ctx, proposal_id, voter).await
        }
        Commands::History {
            proposal,
            actor,
            kind,
            limit,
        } => history::execute(&ctx, proposal, actor, kind, limit).await,
        Commands::Run => run::execute(&ctx).await,
        Commands::Version | Commands::Init { .. } => Ok(()),
    }
}
