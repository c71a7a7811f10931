//! Kodopo command line client
//!
//! Drives the marketplace API through the same session pipeline the web
//! shell uses. Credentials persist between runs in the configured
//! credential file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

use kd_config::{AppConfig, ConfigLoader};
use kd_sdk::navigation::{route_api_error, NavigationDecision};
use kd_sdk::{
    ApiRequest, Client, Config, Decision, FileCredentialStore, Method, Navigator, RouteTable,
    SessionEvent,
};

#[derive(Parser, Debug)]
#[command(name = "kodopo")]
#[command(about = "Kodopo job marketplace command line client")]
struct Args {
    /// Path to a TOML config file
    #[arg(long, env = "KODOPO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login {
        email: String,
        #[arg(long, env = "KODOPO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Revoke the refresh token and clear the stored session
    Logout,
    /// Show what is stored
    Status,
    /// Check whether the stored session may enter a route
    Navigate { path: String },
    /// Job posts
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
    /// Apply to a job
    Apply { job_id: String },
    /// List your applications
    Applications,
    /// List invitations you received
    Invitations,
    /// Answer an invitation
    Respond { id: String, decision: Decision },
    /// Send an arbitrary request through the session pipeline
    Call {
        method: String,
        path: String,
        /// JSON request body
        #[arg(long)]
        json: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
    List,
    Mine,
    Get { id: String },
    Categories,
    Suggestions { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    kd_common::logging::init_logging("kd-cli");

    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let app_config = loader.load().context("Failed to load configuration")?;
    debug!(base_url = %app_config.api.base_url, "Configuration loaded");

    let store = Arc::new(
        FileCredentialStore::open(&app_config.storage.credentials_path)
            .context("Failed to open credential store")?,
    );
    let client = Client::new(sdk_config(&app_config), store.clone())?;
    let mut events = client.subscribe();

    let outcome = run(&client, args.command).await;
    report_session_events(&mut events);

    match outcome {
        Ok(Some(payload)) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            if let Some(sdk_err) = e.downcast_ref::<kd_sdk::Error>() {
                let route = route_api_error(sdk_err);
                eprintln!("{}", route.message);
                if let Some(decision) = route.decision {
                    eprintln!("-> {}", describe(decision));
                }
            }
            Err(e)
        }
    }
}

fn sdk_config(app: &AppConfig) -> Config {
    Config::new(&app.api.base_url)
        .with_asset_origin(&app.api.asset_origin)
        .with_timeout(Duration::from_millis(app.api.timeout_ms))
        .with_user_agent(&app.api.user_agent)
        .with_refresh_path(&app.session.refresh_path)
        .with_login_route(&app.session.login_route)
}

async fn run(client: &Client, command: Command) -> Result<Option<Value>> {
    let payload = match command {
        Command::Login { email, password } => {
            let payload = client.auth().login(&email, &password).await?;
            info!(%email, "Login complete");
            Some(payload)
        }
        Command::Logout => {
            client.auth().logout().await;
            None
        }
        Command::Status => {
            let credentials = client.store().credentials();
            println!("logged in:     {}", credentials.is_authenticated());
            println!("scope:         {}", credentials.scope.as_deref().unwrap_or("-"));
            println!("refresh token: {}", credentials.refresh_token.is_some());
            None
        }
        Command::Navigate { path } => {
            let navigator = Navigator::new(RouteTable::standard(), client.store().clone());
            println!("{}", describe(navigator.navigate(&path)));
            None
        }
        Command::Jobs { command } => {
            let jobs = client.jobs();
            let payload = match command {
                JobsCommand::List => jobs.list().await?,
                JobsCommand::Mine => jobs.mine().await?,
                JobsCommand::Get { id } => jobs.get(&id).await?,
                JobsCommand::Categories => jobs.categories().await?,
                JobsCommand::Suggestions { id } => jobs.candidate_suggestions(&id).await?,
            };
            Some(payload)
        }
        Command::Apply { job_id } => Some(client.student().apply(&job_id).await?),
        Command::Applications => Some(client.student().my_applications().await?),
        Command::Invitations => Some(client.student().my_invitations().await?),
        Command::Respond { id, decision } => {
            Some(client.student().respond_invitation(&id, decision).await?)
        }
        Command::Call { method, path, json } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method: {method}"))?;
            let mut request = ApiRequest::new(method, path);
            if let Some(body) = json {
                let body: Value = serde_json::from_str(&body).context("--json is not valid JSON")?;
                request = request.with_json(&body)?;
            }
            Some(client.send(request).await?)
        }
    };
    Ok(payload)
}

fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Terminated { reason, redirect_to } => {
                eprintln!("Session ended ({reason}); continue at {redirect_to}");
            }
        }
    }
}

fn describe(decision: NavigationDecision) -> String {
    match decision {
        NavigationDecision::Allow => "allowed".to_string(),
        NavigationDecision::RedirectToLogin { unauthorized: true } => {
            "redirect to /login?unauthorized=true".to_string()
        }
        NavigationDecision::RedirectToLogin { unauthorized: false } => {
            "redirect to /login".to_string()
        }
        NavigationDecision::RedirectToHome => "redirect to /".to_string(),
    }
}
