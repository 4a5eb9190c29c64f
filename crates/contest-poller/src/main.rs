use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contest_poller::auth;
use contest_poller::calendar::GoogleCalendarClient;
use contest_poller::codeforces::{CodeforcesClient, Contest};
use contest_poller::config::SyncConfig;
use contest_poller::sync::{Reconciler, RunStats, SyncOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install crypto provider");

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contest_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting contest poller");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = SyncConfig::from_env()?;
    tracing::info!(
        "Syncing into calendar {} ({})",
        config.calendar_id,
        config.timezone.name()
    );

    // Auth failure is terminal: without calendar access there is no work
    let access_token = auth::access_token_from_env().await?;
    let calendar = GoogleCalendarClient::new(access_token);
    let reconciler = Reconciler::new(calendar, config);

    let contests = fetch_upcoming().await;
    if contests.is_empty() {
        tracing::info!("No upcoming contests to sync");
    }

    let mut stats = RunStats::default();
    for contest in &contests {
        let outcome = reconciler.reconcile(contest).await;
        report(contest, &outcome);
        stats.record(&outcome);
    }

    tracing::info!(
        "Sync pass complete: {} added, {} existing, {} restored, {} permission denied, {} failed",
        stats.added,
        stats.existing,
        stats.restored,
        stats.permission_denied,
        stats.failed
    );

    Ok(())
}

/// Fetch the upcoming contest list, degrading a fetch failure to an
/// empty run. The error is logged so an outage stays distinguishable
/// from a quiet week with no scheduled rounds.
async fn fetch_upcoming() -> Vec<Contest> {
    match CodeforcesClient::new().upcoming_contests().await {
        Ok(contests) => {
            tracing::info!("Found {} upcoming contests", contests.len());
            contests
        }
        Err(e) => {
            tracing::error!("Failed to fetch contest list: {:#}", e);
            Vec::new()
        }
    }
}

/// One human-readable status line per contest.
fn report(contest: &Contest, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Added => tracing::info!("ADDED: {}", contest.name),
        SyncOutcome::AlreadyExists => tracing::info!("EXISTS: {}", contest.name),
        SyncOutcome::Restored => tracing::info!("RESTORED: {}", contest.name),
        SyncOutcome::PermissionDenied => {
            tracing::warn!("PERMISSION DENIED: could not inspect event for {}", contest.name)
        }
        SyncOutcome::Failed(e) => tracing::error!("FAILED: {}: {:#}", contest.name, e),
    }
}
