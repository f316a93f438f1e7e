mod api;
mod chat;
mod config;
mod console;
mod intake;

use anyhow::{Context, Result};
use clap::Parser;
use consultation::{
    AuthProvider, ConsultationIntake, ConsultationStore, FileLocalStore,
    IdentityToolkitAuthProvider, InMemoryAuthProvider, InMemoryConsultationStore,
    LocalFallbackStore, LocalStore, PostgresConsultationStore, SignInFlow,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::HttpRouterApi,
    chat::ChatSession,
    config::ClientConfig,
    console::{Console, render},
    intake::ConsultationWizard,
};

/// Logs go to stderr so they stay out of the chat.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ClientConfig::parse();
    init_tracing();

    let local: Arc<dyn LocalStore> = Arc::new(FileLocalStore::new(&config.local_store_path));

    let (auth, mailbox): (Arc<dyn AuthProvider>, Option<Arc<InMemoryAuthProvider>>) =
        match &config.auth_api_key {
            Some(api_key) => (
                Arc::new(IdentityToolkitAuthProvider::new(api_key.clone())),
                None,
            ),
            None => {
                info!("AUTH_API_KEY not set, sign-in links are printed locally");
                let provider = Arc::new(InMemoryAuthProvider::new());
                (provider.clone(), Some(provider))
            }
        };

    let primary: Arc<dyn ConsultationStore> = match &config.database_url {
        Some(url) => Arc::new(
            PostgresConsultationStore::connect(url)
                .await
                .context("Failed to connect to the document store")?,
        ),
        None => {
            warn!("DATABASE_URL not set, consultation requests are kept in memory");
            Arc::new(InMemoryConsultationStore::new())
        }
    };

    let flow = SignInFlow::new(auth, local.clone(), config.auth_redirect_url.clone());
    let intake = ConsultationIntake::new(
        primary,
        Arc::new(LocalFallbackStore::new(local.clone())),
        local,
    );
    let console = Console::new();
    let mut wizard = ConsultationWizard::new(console.clone(), flow, intake, mailbox);
    let mut chat = ChatSession::new(HttpRouterApi::new(&config.router_url));

    for message in chat.conversation().messages() {
        println!("{}", render(message));
    }
    println!("Commands: /consult to request an expert consultation, /history, /quit");

    while let Some(input) = console.ask("> ").await {
        match input.as_str() {
            "/quit" | "/exit" => break,
            "/history" => {
                for message in chat.conversation().messages() {
                    println!("{}", render(message));
                }
            }
            "/consult" => match chat.offer().cloned() {
                Some(draft) => wizard.run(&draft).await,
                None => println!("Ask a medical or legal question first."),
            },
            _ => {
                if let Some(reply) = chat.send(&input).await {
                    println!("{}", render(reply));
                    let flagged = reply
                        .metadata
                        .as_ref()
                        .is_some_and(|m| m.is_medical_request || m.is_legal_request);
                    if flagged {
                        println!("Need an expert? Type /consult to request a consultation.");
                    }
                }
            }
        }
    }

    Ok(())
}
