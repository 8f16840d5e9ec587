use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use capdeck::host::{CallbackBridge, HostEvent, LogDispatcher, ScreenResult};
use capdeck::navigation::NavigationController;
use capdeck::permissions::PermissionDecision;
use capdeck::{Action, App, CapabilityCatalog, InvocationOutcome, Payload, Settings};

#[derive(Parser)]
#[command(name = "capdeck")]
#[command(about = "Browse system capabilities and dispatch them through the host")]
#[command(version)]
struct Cli {
    /// Directory holding settings.json (default: <config dir>/capdeck)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Use this YAML/JSON catalog instead of the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the catalog grouped by category
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Invoke one capability by id
    Invoke {
        /// Capability id (see `capdeck list`)
        id: String,
    },
    /// Browse categories and invoke capabilities interactively (default)
    Browse,
    /// Show the effective settings and where they are stored
    Settings {
        /// Write the effective settings back to disk
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = cli.config_dir.unwrap_or_else(Settings::default_dir);
    let mut settings = Settings::load(&config_dir)
        .with_context(|| format!("reading settings from {}", config_dir.display()))?;
    if let Some(path) = cli.catalog {
        settings.catalog_path = Some(path);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log_level))
        .init();

    match cli.command.unwrap_or(Commands::Browse) {
        Commands::List { json } => {
            let catalog = load_catalog(&settings)?;
            print_catalog(&catalog, json)
        }
        Commands::Invoke { id } => {
            let (app, events) = App::build(&settings, Arc::new(LogDispatcher))?;
            let presenter = spawn_presenter(app.bridge.clone(), app.navigation().clone(), events);
            app.navigation().splash_finished();

            let descriptor = app.catalog.require(&id)?;
            report(&descriptor.label, app.invoker.run(descriptor).await?);
            presenter.abort();
            Ok(())
        }
        Commands::Browse => browse(&settings).await,
        Commands::Settings { save } => {
            println!("Settings directory: {}", config_dir.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if save {
                settings.save()?;
                println!("Saved.");
            }
            Ok(())
        }
    }
}

fn load_catalog(settings: &Settings) -> Result<CapabilityCatalog> {
    Ok(match &settings.catalog_path {
        Some(path) => CapabilityCatalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => CapabilityCatalog::builtin(),
    })
}

fn print_catalog(catalog: &CapabilityCatalog, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.categories())?);
        return Ok(());
    }

    for category in catalog.categories() {
        println!("{}", category.name);
        for descriptor in &category.descriptors {
            let marker = match &descriptor.action {
                Action::FireAndForget { .. } => "  ",
                Action::PermissionGated { .. } => "🔒",
                Action::ResultReturning { .. } => "↩ ",
            };
            println!(
                "  {} {:<24} {:<22} {}",
                marker,
                descriptor.id,
                descriptor.label,
                descriptor.action.target()
            );
        }
        println!();
    }
    Ok(())
}

async fn browse(settings: &Settings) -> Result<()> {
    let (app, events) = App::build(settings, Arc::new(LogDispatcher))?;
    let presenter = spawn_presenter(app.bridge.clone(), app.navigation().clone(), events);

    println!("Capability Deck\n");
    app.navigation().splash_finished();

    loop {
        let mut names: Vec<String> = app
            .catalog
            .categories()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        names.push("Quit".to_string());

        let picked = prompt(move || {
            Select::new()
                .with_prompt("Category")
                .items(&names)
                .default(0)
                .interact_opt()
                .map(|choice| choice.filter(|&i| i + 1 < names.len()))
        })
        .await?;
        let Some(category) = picked.map(|i| &app.catalog.categories()[i]) else {
            break;
        };

        let mut labels: Vec<String> = category
            .descriptors
            .iter()
            .map(|d| d.label.clone())
            .collect();
        labels.push("Back".to_string());
        let prompt_title = category.name.clone();

        let picked = prompt(move || {
            Select::new()
                .with_prompt(prompt_title)
                .items(&labels)
                .default(0)
                .interact_opt()
                .map(|choice| choice.filter(|&i| i + 1 < labels.len()))
        })
        .await?;
        let Some(descriptor) = picked.map(|i| &category.descriptors[i]) else {
            continue;
        };

        app.invoker
            .invoke(descriptor, |result| match result {
                Ok(outcome) => report(&descriptor.label, outcome),
                Err(e) => println!("{}: {}", descriptor.label, e),
            })
            .await;
    }

    presenter.abort();
    Ok(())
}

/// Answer prompts and secondary screens on behalf of the host.
fn spawn_presenter(
    bridge: Arc<CallbackBridge>,
    navigation: Arc<NavigationController>,
    mut events: mpsc::UnboundedReceiver<HostEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Err(e) = present(&bridge, &navigation, event).await {
                log::warn!("Presentation failed: {e}");
            }
        }
    })
}

async fn present(
    bridge: &CallbackBridge,
    navigation: &NavigationController,
    event: HostEvent,
) -> Result<()> {
    match event {
        HostEvent::PermissionPrompt {
            request_id,
            permission,
            description,
        } => {
            let question = format!("Allow {} ({})?", description, permission);
            let allowed = prompt(move || {
                Confirm::new()
                    .with_prompt(question)
                    .default(false)
                    .interact()
            })
            .await?;
            let decision = if allowed {
                PermissionDecision::Granted
            } else {
                PermissionDecision::Denied
            };
            bridge.respond_permission(&request_id, decision);
        }
        HostEvent::ScreenPresented {
            token,
            target,
            outbound,
        } => {
            println!("\n── {} ──", target);
            match outbound.get("data") {
                Some(data) => println!("Data received: {}", data),
                None => println!("Data received: None"),
            }

            let choice = prompt(|| {
                Select::new()
                    .items(&["Return Result", "Back"])
                    .default(0)
                    .interact_opt()
            })
            .await?;

            if choice == Some(0) {
                let result: String = prompt(|| {
                    Input::<String>::new()
                        .with_prompt("Result")
                        .default("Hello from the secondary screen!".to_string())
                        .interact_text()
                })
                .await?;
                let inbound = Payload::from([("result".to_string(), result)]);
                bridge.finish_screen(token, ScreenResult::Returned(inbound));
            } else {
                navigation.back();
            }
        }
    }
    Ok(())
}

/// Run a blocking terminal prompt off the async workers.
async fn prompt<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

fn report(label: &str, outcome: InvocationOutcome) {
    match outcome {
        InvocationOutcome::Dispatched => println!("{}: sent", label),
        InvocationOutcome::PermissionRefused => {
            println!("{}: permission refused, nothing was sent", label)
        }
        InvocationOutcome::Completed(inbound) => {
            println!("{}: returned", label);
            for (key, value) in inbound {
                println!("  {} = {}", key, value);
            }
        }
        InvocationOutcome::Cancelled => println!("{}: cancelled", label),
    }
}
