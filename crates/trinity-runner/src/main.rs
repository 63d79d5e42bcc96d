//! trinity-seed - Seeds a Trinity deployment from fixture files
//!
//! Each subcommand runs one workflow over one fixture file. A failed run logs
//! the actor and row it stopped at; pass them back with `--start-actor` and
//! `--start-row` to resume.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trinity_e2e::{
    Actor, ApiClient, ClientContactWorkflow, ClientWorkflow, ContractWorkflow,
    ContractorWorkflow, CurrencyWorkflow, Error, ExpenseWorkflow, GroupingSpec, PlaywrightUi,
    ProjectWorkflow, ResumePoint, RunConfig, RunSummary, TimecardApiWorkflow,
    TimecardUiWorkflow, UiContext, Workflow, fixtures, transform,
};

/// Seed the Trinity back office through its web UI or API
#[derive(Parser)]
#[command(name = "trinity-seed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// JSON config file layered over the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Key of the first actor to process (username, or the admin account)
    #[arg(long, env = "START_CONTRACTOR", global = true)]
    start_actor: Option<String>,

    /// Item index to start at within the first processed actor
    #[arg(long, env = "START_ROW", default_value_t = 0, global = true)]
    start_row: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FixtureArgs {
    /// CSV or JSON fixture file
    #[arg(long, short)]
    fixture: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange-rate currencies (admin)
    Currencies(FixtureArgs),
    /// Contractor accounts (admin)
    Contractors(FixtureArgs),
    /// Contracts attached to existing contractors (admin)
    Contracts(FixtureArgs),
    /// Client organizations (admin)
    Clients(FixtureArgs),
    /// Contacts attached to existing clients (admin)
    ClientContacts(FixtureArgs),
    /// Projects (admin)
    Projects(FixtureArgs),
    /// Expenses, logged in as each contractor
    Expenses(FixtureArgs),
    /// Timecards, logged in as each contractor
    Timecards {
        #[command(flatten)]
        fixture: FixtureArgs,

        /// Insert through the backend API instead of the calendar UI
        #[arg(long)]
        api: bool,

        /// The fixture is pre-grouped JSON (`[{username, password, entries}]`)
        #[arg(long)]
        grouped: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = RunConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.headed {
        config.headless = false;
    }
    let resume = ResumePoint::new(cli.start_actor.clone(), cli.start_row);

    match run(cli.command, config, &resume).await {
        Ok(summary) => {
            tracing::info!(
                actors = summary.actors_processed,
                items = summary.items_processed,
                skipped = summary.actors_skipped,
                "seeding finished"
            );
            Ok(())
        }
        Err(err) => {
            if let Error::RunHalted { actor, row, source } = &err {
                tracing::error!(
                    %actor,
                    row,
                    error = %source,
                    "run halted; resume with --start-actor '{}' --start-row {}",
                    actor,
                    row
                );
            }
            Err(err.into())
        }
    }
}

/// Builds a UI workflow around the browser context.
type BuildWorkflow = fn(UiContext) -> trinity_e2e::Result<Box<dyn Workflow>>;

fn boxed(workflow: impl Workflow + 'static) -> trinity_e2e::Result<Box<dyn Workflow>> {
    Ok(Box::new(workflow))
}

async fn run(
    command: Commands,
    config: RunConfig,
    resume: &ResumePoint,
) -> trinity_e2e::Result<RunSummary> {
    let (actors, build): (Vec<Actor>, BuildWorkflow) = match command {
        Commands::Currencies(f) => (admin_actors(&config, &f.fixture)?, |ctx| {
            boxed(CurrencyWorkflow::new(ctx))
        }),
        Commands::Contractors(f) => (admin_actors(&config, &f.fixture)?, |ctx| {
            boxed(ContractorWorkflow::new(ctx))
        }),
        Commands::Contracts(f) => (admin_actors(&config, &f.fixture)?, |ctx| {
            boxed(ContractWorkflow::new(ctx))
        }),
        Commands::Clients(f) => (admin_actors(&config, &f.fixture)?, |ctx| {
            boxed(ClientWorkflow::new(ctx))
        }),
        Commands::ClientContacts(f) => (admin_actors(&config, &f.fixture)?, |ctx| {
            boxed(ClientContactWorkflow::new(ctx))
        }),
        Commands::Projects(f) => (admin_actors(&config, &f.fixture)?, |ctx| {
            boxed(ProjectWorkflow::new(ctx)?)
        }),
        Commands::Expenses(f) => (user_actors(&f.fixture, false)?, |ctx| {
            boxed(ExpenseWorkflow::new(ctx))
        }),
        Commands::Timecards {
            fixture,
            api: true,
            grouped,
        } => {
            // API mode needs no browser
            let actors = user_actors(&fixture.fixture, grouped)?;
            let client = ApiClient::new(&config.api_url, &config.frontend_origin)?;
            let mut workflow = TimecardApiWorkflow::new(client);
            return config.orchestrator().run(&mut workflow, &actors, resume).await;
        }
        Commands::Timecards {
            fixture, grouped, ..
        } => (user_actors(&fixture.fixture, grouped)?, |ctx| {
            boxed(TimecardUiWorkflow::new(ctx))
        }),
    };

    run_ui(&config, &actors, resume, build).await
}

/// Launches the browser, runs the workflow, and closes the browser whether or
/// not the run succeeded.
async fn run_ui(
    config: &RunConfig,
    actors: &[Actor],
    resume: &ResumePoint,
    build: BuildWorkflow,
) -> trinity_e2e::Result<RunSummary> {
    let ui = Arc::new(PlaywrightUi::launch(config).await?);
    let ctx = UiContext::new(ui.clone(), Arc::new(config.clone()));

    let result = match build(ctx) {
        Ok(mut workflow) => {
            tracing::info!(workflow = workflow.name(), actors = actors.len(), "seeding");
            config.orchestrator().run(workflow.as_mut(), actors, resume).await
        }
        Err(err) => Err(err),
    };

    // The workflow (and its context) is gone, so this is the last handle
    match Arc::try_unwrap(ui) {
        Ok(ui) => {
            if let Err(err) = ui.close().await {
                tracing::warn!(error = %err, "browser did not close cleanly");
            }
        }
        Err(_) => tracing::warn!("browser still in use; leaving it to exit with the process"),
    }
    result
}

fn load_rows(path: &Path) -> trinity_e2e::Result<Vec<trinity_e2e::Row>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => fixtures::load_json_rows(path),
        _ => fixtures::load_csv_rows(path),
    }
}

/// Every row under the configured admin account.
fn admin_actors(config: &RunConfig, path: &Path) -> trinity_e2e::Result<Vec<Actor>> {
    let rows = load_rows(path)?;
    tracing::info!(rows = rows.len(), fixture = %path.display(), "fixture loaded");
    Ok(vec![Actor::with_credentials(
        config.admin.username.clone(),
        config.admin.password.clone(),
        rows,
    )])
}

/// Rows grouped into one actor per `username`.
fn user_actors(path: &Path, grouped: bool) -> trinity_e2e::Result<Vec<Actor>> {
    let spec = GroupingSpec::by_username();
    let actors = if grouped {
        fixtures::load_json_actors(path, &spec)?
    } else {
        transform(load_rows(path)?, &spec)
    };
    tracing::info!(actors = actors.len(), fixture = %path.display(), "fixture loaded");
    Ok(actors)
}
