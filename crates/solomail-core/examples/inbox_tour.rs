//! Example: sign in and page through the inbox.
//!
//! Demonstrates the full token chain the library leaves to its caller:
//! silent acquisition first, interactive sign-in as the fallback, and one
//! silent-refresh retry when the gateway reports the token expired.
//!
//! ## Prerequisites
//!
//! 1. Register an application for the Microsoft identity platform:
//!    - Set the redirect URI to `http://localhost:8845` (or your choice)
//!    - Note the Application (client) ID
//!
//! 2. Set environment variables:
//!    ```bash
//!    export SOLOMAIL_CLIENT_ID="your-client-id"
//!    export SOLOMAIL_ALLOWED_EMAIL="you@outlook.com"
//!    ```
//!
//! ## Running
//!
//! ```bash
//! cargo run --example inbox_tour
//! ```

use std::env;
use std::io::{self, Write};

use solomail_core::{
    AppConfig, AuthOutcome, IdentityGate, InboxController, KeyringStore, PromptResult, SignInPrompt,
};
use solomail_graph::MailGateway;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Prompt that prints the authorization URL and reads the redirect code
/// from stdin. A real UI would open a browser and run a loopback listener.
struct StdinPrompt;

impl SignInPrompt for StdinPrompt {
    async fn obtain_code(&self, auth_url: &Url) -> PromptResult {
        println!("\nVisit this URL to authorize the application:\n\n{auth_url}\n");
        print!("Enter the authorization code from the redirect URL (empty to cancel): ");
        if io::stdout().flush().is_err() {
            return PromptResult::Failed("stdout unavailable".to_string());
        }

        let mut code = String::new();
        match io::stdin().read_line(&mut code) {
            Ok(_) => {
                let code = code.trim();
                if code.is_empty() {
                    PromptResult::Cancelled
                } else {
                    PromptResult::Code(code.to_string())
                }
            }
            Err(e) => PromptResult::Failed(e.to_string()),
        }
    }
}

/// Silent first, interactive as the fallback.
async fn fresh_token(
    gate: &mut IdentityGate<KeyringStore>,
) -> anyhow::Result<solomail_oauth::Token> {
    match gate.acquire_token_silent().await {
        AuthOutcome::Authorized(token) => return Ok(token),
        AuthOutcome::Failed { message } => println!("Silent acquisition failed: {message}"),
        AuthOutcome::Cancelled => anyhow::bail!("authentication cancelled"),
        AuthOutcome::UnauthorizedAccount { message } => anyhow::bail!("{message}"),
    }

    match gate.sign_in_interactive(&StdinPrompt).await {
        AuthOutcome::Authorized(token) => Ok(token),
        AuthOutcome::Cancelled => anyhow::bail!("sign-in cancelled"),
        AuthOutcome::UnauthorizedAccount { message } => anyhow::bail!("{message}"),
        AuthOutcome::Failed { message } => anyhow::bail!("sign-in failed: {message}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solomail_core=debug,solomail_graph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client_id = env::var("SOLOMAIL_CLIENT_ID")?;
    let allowed_email = env::var("SOLOMAIL_ALLOWED_EMAIL")?;

    let config = AppConfig::new(allowed_email, client_id);
    let store = KeyringStore::new();
    let mut gate = IdentityGate::initialize(&config, store)?;

    match gate.current_identity() {
        Some(identity) => println!("Restored session for {}", identity.username),
        None => println!("No session; sign-in required"),
    }

    let gateway = MailGateway::with_base_url(&config.graph_base_url, config.page_size)?;
    let controller = InboxController::new(gateway.clone(), config.max_cached_messages);

    let mut token = fresh_token(&mut gate).await?;

    // One silent-refresh retry when the token turns out to be expired.
    let load = match controller.refresh(&token.access_token).await {
        Err(solomail_graph::Error::Unauthorized) => {
            println!("Token expired; refreshing silently");
            token = fresh_token(&mut gate).await?;
            controller.refresh(&token.access_token).await?
        }
        other => other?,
    };
    println!("\nInbox ({load:?}):");

    for message in controller.messages() {
        let received = message
            .received_date_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        println!(
            "  {:<28} {:<40} {received}",
            message.sender(),
            message.subject.as_deref().unwrap_or("(no subject)"),
        );
    }

    if controller.has_more() {
        let load = controller.load_more(&token.access_token).await?;
        println!("\nLoaded more: {load:?} (cached {})", controller.len());
    }

    let messages = controller.messages();
    if let Some(newest) = messages.first() {
        let full = gateway.get_message(&token.access_token, &newest.id).await?;
        let body = full.body.and_then(|b| b.content).unwrap_or_default();
        println!(
            "\nNewest message ({}):\n{}",
            full.subject.as_deref().unwrap_or("(no subject)"),
            body.chars().take(400).collect::<String>(),
        );
    }

    Ok(())
}
