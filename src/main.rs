mod cli;
mod commands;

use std::error::Error;
use std::io;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing::debug;

use cli::{Cli, Commands, IssueCommands, ProjectCommands};
use trackflow::config::Config;
use trackflow::error::Result;
use trackflow::output::Output;
use trackflow::store::{ApiClient, ApiStore, IssueStore, MemoryStore, ProjectStore};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");

        // Show error chain if verbose flag was passed
        if std::env::args().any(|arg| arg == "--verbose" || arg == "-v") {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("Caused by: {cause}");
                source = cause.source();
            }
        }

        std::process::exit(1);
    }
}

/// Logs go to stderr so table and JSON output stay clean. `RUST_LOG` wins
/// over `--verbose`.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let out = Output::new(cli.output_format(), cli.quiet);

    match cli.command {
        // Commands that don't require config/store
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "trackflow", &mut io::stdout());
        }
        Commands::Init => {
            commands::init::run().await?;
        }
        command => {
            let config = Config::load()?;

            match config.resolve_data_file(cli.data) {
                Some(path) => {
                    debug!("Using data file {}", path.display());
                    let store = MemoryStore::load(&path)?;
                    if dispatch(&store, &config, command, out).await? {
                        store.save().await?;
                    }
                }
                None => {
                    let client = ApiClient::new(
                        config.api_url()?,
                        config.api_key()?,
                        config.project_id.clone(),
                    );
                    dispatch(&ApiStore::new(client), &config, command, out).await?;
                }
            }
        }
    }

    Ok(())
}

/// Run a store-backed command. Returns whether it changed any data.
async fn dispatch<S>(store: &S, config: &Config, command: Commands, out: Output) -> Result<bool>
where
    S: IssueStore + ProjectStore,
{
    let mutated = match command {
        Commands::Dashboard(args) => {
            commands::dashboard::show(store, args, out).await?;
            false
        }
        Commands::Issues(args) => {
            commands::issues::list(store, args, out).await?;
            false
        }
        Commands::Projects => {
            commands::projects::list(store, out).await?;
            false
        }
        Commands::Issue { action } => match action {
            IssueCommands::List(args) => {
                commands::issues::list(store, args, out).await?;
                false
            }
            IssueCommands::View { id } => {
                commands::issues::view(store, id, out).await?;
                false
            }
            IssueCommands::Create(args) => {
                commands::issues::create(store, args, out).await?;
                true
            }
            IssueCommands::Update(args) => {
                let author = config.resolve_author(args.author.as_deref());
                commands::issues::update(store, args, author, out).await?;
                true
            }
            IssueCommands::Delete { id } => {
                commands::issues::delete(store, id, out).await?;
                true
            }
            IssueCommands::Comment(args) => {
                let author = config.resolve_author(args.author.as_deref());
                commands::comments::add(store, args, author, out).await?;
                true
            }
            IssueCommands::CommentEdit { id, body } => {
                commands::comments::edit(store, id, body, out).await?;
                true
            }
            IssueCommands::CommentDelete { id } => {
                commands::comments::delete(store, id, out).await?;
                true
            }
        },
        Commands::Project { action } => match action {
            ProjectCommands::List => {
                commands::projects::list(store, out).await?;
                false
            }
            ProjectCommands::View { id } => {
                commands::projects::view(store, id, out).await?;
                false
            }
            ProjectCommands::Create(args) => {
                commands::projects::create(store, args, out).await?;
                true
            }
            ProjectCommands::Update(args) => {
                commands::projects::update(store, args, out).await?;
                true
            }
            ProjectCommands::Delete { id } => {
                commands::projects::delete(store, id, out).await?;
                true
            }
            ProjectCommands::AddMember { id, name } => {
                commands::projects::add_team_member(store, id, &name, out).await?;
                true
            }
            ProjectCommands::RemoveMember { id, name } => {
                commands::projects::remove_team_member(store, id, &name, out).await?;
                true
            }
        },
        Commands::Completions { .. } | Commands::Init => {
            // Already handled in run()
            false
        }
    };

    Ok(mutated)
}
