use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, normalize_base_url},
    EditClinicalTestController, HttpClinicalTestsApi, Route, ScreenEvent,
};
use shared::domain::{ClinicalTestId, FormField};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "View and update a clinical test record")]
struct Cli {
    /// Overrides `api_base_url` from clinical.toml and the environment.
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a record and print the edit form.
    Show { clinical_test_id: String },
    /// Load a record, apply edits in order, and submit the update.
    Edit {
        clinical_test_id: String,
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(FormField, String)>,
    },
}

fn parse_assignment(raw: &str) -> Result<(FormField, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))?;
    let field = name.trim().parse::<FormField>().map_err(|e| e.to_string())?;
    Ok((field, value.to_string()))
}

fn spawn_event_printer(mut events: broadcast::Receiver<ScreenEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ScreenEvent::Alert(alert)) => eprintln!("{alert}"),
                Ok(ScreenEvent::Navigate(route)) => println!("-> {route}"),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = normalize_base_url(&url);
    }
    info!(api_base_url = %settings.api_base_url, "using clinical tests api");

    let api = HttpClinicalTestsApi::new(&settings.api_base_url)
        .with_context(|| format!("invalid api base url '{}'", settings.api_base_url))?;

    let (clinical_test_id, edits) = match cli.command {
        Command::Show { clinical_test_id } => (clinical_test_id, None),
        Command::Edit {
            clinical_test_id,
            set,
        } => (clinical_test_id, Some(set)),
    };

    let screen = EditClinicalTestController::new(
        Arc::new(api),
        ClinicalTestId::new(clinical_test_id),
        Route::new(settings.list_route),
    );
    let printer = spawn_event_printer(screen.subscribe_events());

    screen.load().await;
    let submitted = match edits {
        None => {
            print!("{}", screen.render().await);
            None
        }
        Some(edits) => {
            for (field, value) in edits {
                screen.update_field(field, value).await;
            }
            print!("{}", screen.render().await);
            Some(screen.submit().await)
        }
    };

    drop(screen);
    printer.await.context("event printer task failed")?;

    if let Some(Err(err)) = submitted {
        bail!("update failed: {err}");
    }
    Ok(())
}
