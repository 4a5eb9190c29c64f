use anyhow::Result;
use chrono_tz::Tz;
use clap::Parser;
use contest_poller::codeforces::CodeforcesClient;
use contest_poller::sync::build_event_payload;

#[derive(Parser)]
#[command(name = "list-contests")]
#[command(about = "Preview upcoming contests and the events a sync pass would write")]
struct Cli {
    /// Timezone (default: Asia/Kolkata)
    #[arg(short = 'z', long, default_value = "Asia/Kolkata")]
    timezone: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install crypto provider");
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let tz: Tz = cli
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid timezone: {}", cli.timezone))?;

    let contests = CodeforcesClient::new().upcoming_contests().await?;
    if contests.is_empty() {
        println!("No upcoming contests.");
        return Ok(());
    }

    println!("{} upcoming contests ({}):", contests.len(), tz.name());
    for contest in &contests {
        let payload = build_event_payload(contest, tz)?;
        println!("{}  {}", payload.id, payload.summary);
        println!("  Start: {}", payload.start.date_time);
        println!("  End:   {}", payload.end.date_time);
        println!("  {}", payload.description.as_deref().unwrap_or_default());
    }

    Ok(())
}
