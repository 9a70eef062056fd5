use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use landing_core::{
    config::{self, load_settings_from, DEFAULT_SETTINGS_FILE},
    LandingPage, RegistrationView, SubmitError,
};
use shared::domain::{FormField, SubmissionStatus};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Headless pre-registration page: animates the headline, shows the
/// registrant count and optionally submits one registration.
#[derive(Parser, Debug)]
struct Args {
    /// Backend base URL; wins over landing.toml and the environment.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,
    #[arg(long)]
    email: Option<String>,
    #[arg(long, default_value = "")]
    discord_id: String,
    #[arg(long, default_value = "")]
    referral_source: String,
    /// How long to keep the headline animating before unmounting.
    #[arg(long, default_value_t = 5_000)]
    animate_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.settings, |key| std::env::var(key).ok())
        .with_context(|| format!("failed to load settings from {}", args.settings.display()))?;
    if let Some(api_url) = &args.api_url {
        settings.base_url = config::normalize_base_url(api_url)?;
    }
    info!(base_url = %settings.base_url, "landing: settings resolved");

    let mut page = LandingPage::new(&settings)?;
    let initial_refresh = page.mount();
    initial_refresh
        .await
        .context("initial registrant count task failed")?;
    let count = page.counter().snapshot().await;
    println!("Join {} Others Already Pre-Registered!", count.display());

    if let Some(email) = args.email {
        let registration = page.registration();
        registration.update_field(FormField::Email, email).await;
        registration
            .update_field(FormField::DiscordId, args.discord_id)
            .await;
        registration
            .update_field(FormField::ReferralSource, args.referral_source)
            .await;

        match registration.submit().await {
            Ok(_) => print_view(&registration.view().await),
            Err(SubmitError::Invalid(errors)) => {
                for (field, message) in errors.iter() {
                    println!("{}: {message}", field.label());
                }
            }
            Err(err) => println!("{err}"),
        }
    }

    if let Some(mut headline) = page.headline() {
        let deadline = tokio::time::sleep(Duration::from_millis(args.animate_ms));
        tokio::pin!(deadline);
        let mut stdout = io::stdout();
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                changed = headline.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let text = headline.borrow_and_update().clone();
                    write!(stdout, "\r\x1b[2K{text}|")?;
                    stdout.flush()?;
                }
            }
        }
        writeln!(stdout)?;
    }

    page.unmount();
    let count = page.counter().snapshot().await;
    println!("Registrants: {}", count.display());
    Ok(())
}

fn print_view(view: &RegistrationView) {
    match (view.submission.status, &view.record) {
        (SubmissionStatus::Success, Some(record)) => {
            println!("Registration Complete!");
            if let Some(message) = view.visible_message() {
                println!("{message}");
            }
            for (label, value) in record.confirmation_lines() {
                println!("  {label}: {value}");
            }
            println!("Thank you for pre-registering. We'll keep you updated!");
        }
        _ => {
            if let Some(message) = view.visible_message() {
                println!("{message}");
            }
        }
    }
}
