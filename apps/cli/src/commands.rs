//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use threadkb_core::{
    Catalog, ChangeContext, ChangeRequest, FsCatalog, FsPublisher, GitCatalog, PublishPlanner,
    Publisher, SourceRef, validate_source_link,
};
use threadkb_shared::{
    AppConfig, MergeResult, ReconcileConfig, init_config, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// threadkb: keep a knowledge base in sync with saved conversations.
#[derive(Parser)]
#[command(
    name = "threadkb",
    version,
    about = "Reconcile generated articles with a version-controlled knowledge base.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.threadkb/threadkb.toml.
    #[arg(long, global = true, env = "THREADKB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Decide create vs. update for a candidate article and build its content.
    Reconcile(ReconcileArgs),

    /// Print the slug for a title.
    Slug {
        /// Title words.
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `threadkb reconcile`.
#[derive(Args)]
pub(crate) struct ReconcileArgs {
    /// Candidate article markdown file, or `-` for stdin.
    #[arg(long, default_value = "-")]
    pub candidate: String,

    /// Link to the originating conversation.
    #[arg(long, conflicts_with_all = ["channel", "ts"])]
    pub source_link: Option<String>,

    /// Channel id, used with --ts to build the source link.
    #[arg(long, requires = "ts")]
    pub channel: Option<String>,

    /// Message timestamp, used with --channel to build the source link.
    #[arg(long, requires = "channel")]
    pub ts: Option<String>,

    /// Workspace id for the source link (overrides config).
    #[arg(long)]
    pub workspace: Option<String>,

    /// Channel name, shown in the pull-request body.
    #[arg(long)]
    pub channel_name: Option<String>,

    /// Corpus root (working tree or git repository).
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Read the catalog from a git revision instead of the working tree.
    /// Without a value, uses `publish.base_ref` from the config.
    #[arg(long, num_args = 0..=1, value_name = "REF")]
    pub rev: Option<Option<String>>,

    /// Article directory inside the corpus (overrides config).
    #[arg(long)]
    pub dir: Option<String>,

    /// Write the result into the corpus working tree.
    #[arg(long)]
    pub write: bool,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so `--json`
/// output on stdout stays machine-readable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "threadkb=info",
        1 => "threadkb=debug",
        _ => "threadkb=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Reconcile(args) => {
            let config = resolve_config(cli.config.as_deref())?;
            cmd_reconcile(args, &config)
        }
        Command::Slug { title } => cmd_slug(&title.join(" ")),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_reconcile(args: ReconcileArgs, config: &AppConfig) -> Result<()> {
    let markdown = read_candidate(&args.candidate)?;
    if markdown.trim().is_empty() {
        return Err(eyre!("candidate article '{}' is empty", args.candidate));
    }

    let source_link = match (&args.source_link, &args.channel, &args.ts) {
        (Some(link), _, _) => {
            validate_source_link(link)?;
            link.trim().to_string()
        }
        (None, Some(channel), Some(ts)) => SourceRef {
            workspace_id: args
                .workspace
                .clone()
                .or_else(|| config.slack.workspace_id.clone()),
            channel_id: channel.clone(),
            message_ts: ts.clone(),
        }
        .link()?
        .to_string(),
        _ => return Err(eyre!("provide --source-link, or both --channel and --ts")),
    };

    let mut reconcile = ReconcileConfig::from(config);
    if let Some(dir) = &args.dir {
        reconcile.kb_dir = dir.clone();
    }

    let rev = args
        .rev
        .as_ref()
        .map(|rev| rev.clone().unwrap_or_else(|| config.publish.base_ref.clone()));
    let catalog: Box<dyn Catalog> = match &rev {
        Some(rev) => Box::new(GitCatalog::new(&args.repo, rev.clone())),
        None => Box::new(FsCatalog::new(&args.repo)),
    };
    reconcile.base_ref = rev;

    info!(
        candidate = %args.candidate,
        repo = %args.repo.display(),
        kb_dir = %reconcile.kb_dir,
        "reconciling candidate article"
    );

    let planner = PublishPlanner::new(catalog.as_ref(), reconcile);
    let result = planner.plan_markdown(&markdown, &source_link);

    let change = ChangeRequest::for_result(
        &result,
        &ChangeContext {
            branch_prefix: config.publish.branch_prefix.clone(),
            message_ts: args.ts.clone(),
            channel_name: args.channel_name.clone(),
        },
    );

    let written = if args.write {
        Some(FsPublisher::new(&args.repo).publish(&result)?)
    } else {
        None
    };

    if args.json {
        let out = serde_json::json!({
            "result": result,
            "change_request": change,
            "written_to": written.as_ref().map(|r| r.path.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_plan(&result, &change);
    match written {
        Some(receipt) => println!(
            "  Written:  {} ({})",
            receipt.path.display(),
            if receipt.created { "created" } else { "updated" }
        ),
        None => {
            println!("  (dry run, pass --write to apply)");
            println!();
            println!("{}", result.final_content);
        }
    }

    Ok(())
}

fn print_plan(result: &MergeResult, change: &ChangeRequest) {
    println!();
    println!(
        "  Action:   {}",
        if result.is_update { "update existing article" } else { "create new article" }
    );
    println!("  File:     {}", result.file_path);
    println!("  Title:    {}", result.title);
    println!("  Keywords: {}", result.keywords.join(", "));
    println!("  Sources:  {}", result.sources.len());
    println!("  Branch:   {}", change.branch);
    println!("  Commit:   {}", change.commit_message);
    println!();
}

/// Read candidate markdown from a file, or stdin for `-`.
fn read_candidate(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| eyre!("failed to read candidate from stdin: {e}"))?;
        return Ok(buf);
    }
    std::fs::read_to_string(source).map_err(|e| eyre!("failed to read candidate '{source}': {e}"))
}

fn cmd_slug(title: &str) -> Result<()> {
    let slug = threadkb_markdown::slugify(title);
    if slug.is_empty() {
        return Err(eyre!("title '{title}' has no slug characters"));
    }
    println!("{slug}");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
