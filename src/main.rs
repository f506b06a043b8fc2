//! reflog-persist - ref-update hook that persists branch reflogs
//!
//! Installed as a hook of the hosting server; invoked once per ref update.
//! The server calls the binary with its own `--flag value` arguments and no
//! subcommand, so the persist flags live at the top level.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Command, CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reflog_persist::config::{Config, RefnamePolicy, RepositoryLocation};
use reflog_persist::hook::{self, RefUpdate};
use reflog_persist::storage::{BranchName, GitRepository};

#[derive(Parser)]
#[command(
    name = "reflog-persist",
    version,
    about = "Persist branch reflogs into the repository",
    args_conflicts_with_subcommands = true,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    persist: PersistArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the reflog of an updated branch (the default)
    Persist(PersistArgs),
    /// Show the persisted captures of a branch
    History(HistoryArgs),
}

#[derive(Args)]
struct PersistArgs {
    /// Full name of the updated ref, e.g. refs/heads/main (required)
    #[arg(long)]
    refname: Option<String>,

    /// Project name, resolved as <base-path>/<project>.git
    #[arg(long)]
    project: Option<String>,

    /// Previous value of the ref
    #[arg(long)]
    oldrev: Option<String>,

    /// New value of the ref
    #[arg(long)]
    newrev: Option<String>,

    /// User who pushed the update
    #[arg(long)]
    uploader: Option<String>,

    /// User who submitted the change
    #[arg(long)]
    submitter: Option<String>,

    /// Git directory of the repository
    #[arg(long, env = "GIT_DIR")]
    git_dir: Option<PathBuf>,

    /// Directory holding <project>.git repositories [default: <exe dir>/../git]
    #[arg(long, env = "REFLOG_PERSIST_BASE_PATH")]
    base_path: Option<PathBuf>,

    /// Commit message of new captures
    #[arg(long, default_value = reflog_persist::reflog::DEFAULT_MESSAGE)]
    message: String,

    /// Treat refnames without a refs/ prefix as branch names
    #[arg(long)]
    short_refnames: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct HistoryArgs {
    /// Branch to show; lists persisted branches when omitted
    #[arg(long)]
    branch: Option<String>,

    /// Git directory of the repository
    #[arg(long, env = "GIT_DIR", default_value = ".")]
    git_dir: PathBuf,

    /// Show at most this many captures
    #[arg(long)]
    limit: Option<NonZeroUsize>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let argv = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let (command, ignored) = match parse_args(argv) {
        Ok(parsed) => parsed,
        Err(e) => e.exit(),
    };
    if !ignored.is_empty() {
        tracing::debug!(?ignored, "ignoring unknown hook arguments");
    }

    let result = match command {
        Commands::Persist(args) => run_persist(args),
        Commands::History(args) => run_history(args),
    };

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "reflog-persist failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Parse the command line, defaulting to `persist` when no subcommand is
/// given. Returns the unknown arguments that were dropped.
fn parse_args(argv: Vec<String>) -> Result<(Commands, Vec<String>), clap::Error> {
    let (known, ignored) = split_known_args(argv);
    let cli = Cli::try_parse_from(known)?;
    let command = cli.command.unwrap_or(Commands::Persist(cli.persist));
    Ok((command, ignored))
}

/// Separate `--flag [value]` arguments the CLI does not define.
///
/// The hosting server adds flags over time; an unknown one and the value
/// following it are dropped wherever they appear.
fn split_known_args(argv: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut cmd = Cli::command();
    cmd.build();

    let mut args = argv.into_iter().peekable();
    let mut known = Vec::new();
    let mut ignored = Vec::new();
    known.extend(args.next());

    let mut flags = long_flags(&cmd);
    if let Some(sub) = args.peek().and_then(|first| cmd.find_subcommand(first)) {
        flags = long_flags(sub);
        known.extend(args.next());
    }

    while let Some(arg) = args.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            known.push(arg);
            continue;
        };
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, _)) => (name.to_string(), true),
            None => (flag.to_string(), false),
        };

        match flags.get(&name) {
            Some(&takes_value) => {
                known.push(arg);
                if takes_value && !inline_value {
                    known.extend(args.next());
                }
            }
            None => {
                ignored.push(arg);
                if !inline_value && args.peek().is_some_and(|next| !next.starts_with("--")) {
                    ignored.extend(args.next());
                }
            }
        }
    }

    (known, ignored)
}

/// long flag name -> whether it takes a value
fn long_flags(cmd: &Command) -> HashMap<String, bool> {
    cmd.get_arguments()
        .filter_map(|arg| {
            let long = arg.get_long()?;
            Some((long.to_string(), arg.get_action().takes_values()))
        })
        .collect()
}

fn run_persist(args: PersistArgs) -> CliResult<Vec<String>> {
    let refname = args
        .refname
        .ok_or("the following required argument was not provided: --refname <REFNAME>")?;

    let location = RepositoryLocation {
        git_dir: args.git_dir,
        project: args.project.clone(),
        base_path: args.base_path,
    };
    let policy = if args.short_refnames {
        RefnamePolicy::AllowShort
    } else {
        RefnamePolicy::HeadsOnly
    };

    let update = RefUpdate {
        refname,
        project: args.project,
        user: args.uploader.or(args.submitter),
        old_rev: args.oldrev,
        new_rev: args.newrev,
    };

    // a non-branch update must not require a resolvable repository
    if policy.branch_for(&update.refname)?.is_none() {
        tracing::debug!(refname = %update.refname, "not a branch, nothing to persist");
        return Ok(Vec::new());
    }

    let config = Config::from_location(&location)?
        .message(args.message)
        .refnames(policy);

    let mut lines = Vec::new();
    if let Some(outcome) = hook::persist(&config, &update)? {
        if args.json {
            lines.push(serde_json::to_string(&outcome)?);
        } else {
            lines.push(outcome.status_line());
        }
    }
    Ok(lines)
}

fn run_history(args: HistoryArgs) -> CliResult<Vec<String>> {
    let repo = GitRepository::open(&args.git_dir)?;

    let Some(name) = args.branch else {
        let branches = hook::persisted_branches(&repo)?;
        if args.json {
            let names: Vec<&str> = branches.iter().map(|b| b.as_str()).collect();
            return Ok(vec![serde_json::to_string(&names)?]);
        }
        return Ok(branches.iter().map(|b| b.to_string()).collect());
    };

    let branch = BranchName::new(name)?;
    let history = hook::history(&repo, &branch, args.limit.map(NonZeroUsize::get))?;

    if args.json {
        return Ok(vec![serde_json::to_string_pretty(&history)?]);
    }

    if history.captures.is_empty() {
        return Ok(vec![format!("no persisted reflog for {}", branch)]);
    }
    Ok(history
        .captures
        .iter()
        .map(|capture| {
            format!(
                "{} {} {} lines",
                capture.commit.short(),
                capture.timestamp.format("%Y-%m-%d %H:%M:%S"),
                capture.entries
            )
        })
        .collect())
}
