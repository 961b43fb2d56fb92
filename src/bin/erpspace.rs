//! erpspace CLI: run workflow notification hooks and inspect their effects.

use clap::{Parser, Subcommand, ValueEnum};
use erpspace_rs::config::secrets::ExposeSecret;
use erpspace_rs::config::{Config, NotifierConfig};
use erpspace_rs::db::Db;
use erpspace_rs::host::Host;
use erpspace_rs::host::fixture::Fixture;
use erpspace_rs::model::{Document, TodoFilter, TodoStatus};
use erpspace_rs::notifier::{HookReport, WorkflowNotifier};
use erpspace_rs::registry::FunctionRegistry;
use erpspace_rs::telemetry::{TelemetryConfig, init_telemetry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "erpspace", about = "Workflow notifications for ERP documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a lifecycle hook against the database
    Hook {
        #[command(subcommand)]
        hook: HookCommand,
    },
    /// To-do operations
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },
    /// Replay a hook against a TOML fixture, in memory
    Simulate {
        /// Fixture with workflows, transitions, users and documents
        fixture: PathBuf,
        doctype: String,
        name: String,
        #[arg(long, value_enum, default_value_t = SimulatedHook::Update)]
        hook: SimulatedHook,
        /// Workflow state before the save (update hook)
        #[arg(long)]
        previous_state: Option<String>,
        /// Status before the save (update hook)
        #[arg(long)]
        previous_status: Option<String>,
        /// Applied action (action hook)
        #[arg(long, default_value = "Approve")]
        action: String,
        /// Run the hook this many times
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Call a registered function with JSON arguments
    Call {
        name: String,
        /// Positional arguments, each parsed as JSON (bare words become strings)
        args: Vec<String>,
    },
}

#[derive(Subcommand)]
enum HookCommand {
    /// After-save hook
    Update {
        doctype: String,
        name: String,
        /// Workflow state before the save
        #[arg(long)]
        previous_state: Option<String>,
        /// Status before the save
        #[arg(long)]
        previous_status: Option<String>,
    },
    /// After-submit hook
    Submit { doctype: String, name: String },
    /// After a workflow action was applied
    Action {
        doctype: String,
        name: String,
        action: String,
    },
}

#[derive(Subcommand)]
enum TodoAction {
    /// List to-dos referencing a document
    List {
        doctype: String,
        name: String,
        /// Include closed and cancelled to-dos
        #[arg(long)]
        all: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SimulatedHook {
    Update,
    Submit,
    Action,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Hook { hook } => {
            let config = Config::from_env()?;
            let _guard = init_telemetry(TelemetryConfig::from(&config))?;
            let db = Db::connect(config.database_url.expose_secret()).await?;
            db.migrate().await?;
            let notifier = WorkflowNotifier::new(db, config.notifier);
            cmd_hook(&notifier, hook).await
        }
        Command::Todo { action } => {
            let config = Config::from_env()?;
            let db = Db::connect(config.database_url.expose_secret()).await?;
            match action {
                TodoAction::List { doctype, name, all } => {
                    cmd_todo_list(&db, &doctype, &name, all).await
                }
            }
        }
        Command::Simulate {
            fixture,
            doctype,
            name,
            hook,
            previous_state,
            previous_status,
            action,
            repeat,
        } => {
            let _guard = init_telemetry(TelemetryConfig::from_env())?;
            let host = Fixture::load(&fixture)?.into_host();
            let notifier = WorkflowNotifier::new(host, NotifierConfig::from_env()?);
            let doc = load_document(notifier.host(), &doctype, &name).await?;
            let previous = previous_snapshot(&doc, previous_state, previous_status);

            for _ in 0..repeat {
                let report = match hook {
                    SimulatedHook::Update => notifier.on_update(previous.as_ref(), &doc).await,
                    SimulatedHook::Submit => notifier.on_submit(&doc).await,
                    SimulatedHook::Action => notifier.on_workflow_action(&doc, &action).await,
                };
                print_report(&report);
            }

            let host = notifier.host();
            let effects = serde_json::json!({
                "shares": host.shares(),
                "todos": host.todos(),
                "mails": host.mails(),
                "notifications": host.notifications(),
                "jobs": host.jobs(),
                "errors": host.errors(),
            });
            println!("{}", serde_json::to_string_pretty(&effects)?);
            Ok(())
        }
        Command::Call { name, args } => cmd_call(&name, &args),
    }
}

async fn cmd_hook(notifier: &WorkflowNotifier<Db>, hook: HookCommand) -> anyhow::Result<()> {
    let report = match hook {
        HookCommand::Update {
            doctype,
            name,
            previous_state,
            previous_status,
        } => {
            let doc = load_document(notifier.host(), &doctype, &name).await?;
            let previous = previous_snapshot(&doc, previous_state, previous_status);
            notifier.on_update(previous.as_ref(), &doc).await
        }
        HookCommand::Submit { doctype, name } => {
            let doc = load_document(notifier.host(), &doctype, &name).await?;
            notifier.on_submit(&doc).await
        }
        HookCommand::Action {
            doctype,
            name,
            action,
        } => {
            let doc = load_document(notifier.host(), &doctype, &name).await?;
            notifier.on_workflow_action(&doc, &action).await
        }
    };
    print_report(&report);
    Ok(())
}

async fn cmd_todo_list(db: &Db, doctype: &str, name: &str, all: bool) -> anyhow::Result<()> {
    let mut filter = TodoFilter::for_document(doctype, name);
    if !all {
        filter = filter.status(TodoStatus::Open);
    }
    let todos = db.list_todos(&filter).await?;

    if todos.is_empty() {
        println!("No to-dos found.");
        return Ok(());
    }

    println!(
        "{:<8}  {:<30}  {:<9}  {:<20}  CREATED",
        "ID", "ALLOCATED_TO", "STATUS", "STATE"
    );
    println!("{}", "-".repeat(90));
    for todo in &todos {
        println!(
            "{:<8}  {:<30}  {:<9}  {:<20}  {}",
            todo.id,
            todo.allocated_to,
            todo.status,
            todo.workflow_state.as_deref().unwrap_or("-"),
            todo.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("\n{} to-do(s)", todos.len());
    Ok(())
}

fn cmd_call(name: &str, args: &[String]) -> anyhow::Result<()> {
    let registry = FunctionRegistry::with_builtins();
    let args: Vec<serde_json::Value> = args
        .iter()
        .map(|raw| {
            serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.clone()))
        })
        .collect();
    let result = registry.call(name, &args)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn load_document(host: &impl Host, doctype: &str, name: &str) -> anyhow::Result<Document> {
    host.get_document(doctype, name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("document {doctype} {name} not found"))
}

/// The pre-save snapshot: the current document with the given fields
/// rolled back. `None` when nothing was rolled back.
fn previous_snapshot(
    doc: &Document,
    previous_state: Option<String>,
    previous_status: Option<String>,
) -> Option<Document> {
    if previous_state.is_none() && previous_status.is_none() {
        return None;
    }
    let mut previous = doc.clone();
    if previous_state.is_some() {
        previous.workflow_state = previous_state;
    }
    if previous_status.is_some() {
        previous.status = previous_status;
    }
    Some(previous)
}

fn print_report(report: &HookReport) {
    if let Some(reason) = report.skipped {
        println!("Skipped:    {reason:?}");
    }
    if let Some(ref pipeline) = report.pipeline {
        println!("Role:       {}", pipeline.role.as_deref().unwrap_or("-"));
        println!("Approvers:  {}", pipeline.approvers.join(", "));
        println!("Shares:     {} new", pipeline.shares_created);
        for upsert in &pipeline.todos {
            println!(
                "To-do:      {} {:?} (closed {})",
                upsert.id, upsert.action, upsert.closed
            );
        }
        println!("Emails:     {}", pipeline.emails_sent);
        println!(
            "Notified:   {} created, {} suppressed",
            pipeline.notifications_created, pipeline.notifications_suppressed
        );
        for failure in &pipeline.failures {
            println!("Failed:     {} ({})", failure.user, failure.error);
        }
        println!(
            "Action job: {}",
            if pipeline.action_job_enqueued {
                "enqueued"
            } else {
                "-"
            }
        );
    }
    println!("Closed:     {}", report.todos_closed);
    if let Some(ref err) = report.error {
        println!("Error:      {err}");
    }
}
