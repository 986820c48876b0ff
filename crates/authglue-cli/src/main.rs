//! authglue - terminal front-end for the authglue helpers.
//!
//! Acts as the "page" that drives the auth flow: it logs in, keeps the
//! profile cookie up to date, sends authenticated requests and logs out.
//! The cookie jar is kept on disk between runs, so one shell session
//! behaves like one long browser session.

mod cli;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use authglue_core::{
    AuthKit, Config, MemoryCookieJar, RecordingNavigator, RequestOptions, UserProfile,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Command, USAGE};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = cli::parse(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load().context("Failed to load configuration")?;
    let jar_path = config.cookie_jar_path()?;
    let jar = Arc::new(MemoryCookieJar::load(&jar_path, &config.base_url)?);
    let navigator = Arc::new(RecordingNavigator::new(config.base_url.clone()));
    let kit = AuthKit::with_jar(config, Arc::clone(&jar), navigator.clone())?;
    info!(base_url = %kit.config().base_url, "authglue starting");

    // Profile listeners, e.g. a header showing the avatar
    kit.store().subscribe(|event| {
        let who = event.new_user_info.username().unwrap_or("(no username)");
        println!("Profile updated: {}", who);
    });

    let result = run(&kit, command).await;

    jar.save(&jar_path)?;
    for target in navigator.visited() {
        println!("-> navigated to {}", target);
    }
    result
}

async fn run(kit: &AuthKit, command: Command) -> Result<()> {
    let store = kit.store();

    match command {
        Command::Login { username } => {
            let password = rpassword::prompt_password("Password: ")?;
            let profile = kit.client().login(&username, &password).await?;
            println!("Logged in as {}", profile.username().unwrap_or(&username));
        }
        Command::WhoAmI => match store.get_user_info() {
            Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
            None => println!("Not logged in"),
        },
        Command::Init => {
            if store.init() {
                println!("Profile is usable");
            } else {
                println!("No usable profile stored");
            }
        }
        Command::Fetch { method, url, body } => {
            let method = method
                .parse()
                .with_context(|| format!("Invalid HTTP method: {}", method))?;
            let mut options = RequestOptions::get().method(method);
            if let Some(body) = body {
                options = options.json(serde_json::from_str(&body).context("Body is not valid JSON")?);
            }
            let response = kit.client().fetch(&url, options).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::UpdateProfile { json } => {
            let update: UserProfile =
                serde_json::from_str(&json).context("Profile update is not valid JSON")?;
            if store.get_user_info().is_none() {
                println!("No stored profile to update");
            }
            store.update_user_info(Some(&update));
        }
        Command::CookieGet { name } => match store.get_cookie(&name) {
            Some(value) => println!("{}", value),
            None => println!("(not set)"),
        },
        Command::CookieSet {
            name,
            value,
            options,
        } => store.set_cookie(&name, &value, &options),
        Command::Logout => {
            kit.client().logout().await;
            println!("Logged out");
        }
        Command::Help => println!("{}", USAGE),
    }
    Ok(())
}
