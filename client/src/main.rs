//! Scripted demo session for the study log client.
//!
//! Uses the remote store described by `STUDYLOG_URL` / `STUDYLOG_ACCESS_KEY`
//! when both are usable, otherwise an in-memory store.
//!
//! Run with `RUST_LOG=studylog=debug,studylog_runtime=debug` for a trace of
//! every action and effect.

use std::sync::Arc;
use studylog::{ClientConfig, Notification, Readiness, StudyLog, readiness};
use studylog_testing::InMemoryRemoteStore;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

async fn print_state(client: &StudyLog) {
    let records = client.records().await;
    println!("  {} record(s), {:.2}h total", records.len(), client.total_hours().await);
    for record in &records {
        println!("    #{:<4} {:<24} {:>6.2}h", record.id, record.title, record.time);
    }
    match client.notification().await {
        Notification::None => {},
        notification => println!(
            "  notification: {}",
            notification.message().unwrap_or_default()
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Study Log Demo ===\n");

    let config = ClientConfig::from_env()?;
    let readiness = match readiness::global() {
        Readiness::Ready(store) => {
            println!("Using remote store at {}", config.endpoint.as_deref().unwrap_or_default());
            Readiness::Ready(Arc::clone(store))
        },
        Readiness::NotReady(reason) => {
            println!("Remote store not ready ({reason}); using an in-memory store");
            Readiness::Ready(Arc::new(InMemoryRemoteStore::new()))
        },
    };
    let client = StudyLog::new(readiness, &config);

    println!("\nLoading records...");
    client.appear().await?;
    print_state(&client).await;

    println!("\nSubmitting an empty title...");
    client.set_time("1").await?;
    client.submit().await?;
    print_state(&client).await;

    println!("\nLogging 'Algebra' for 2 hours...");
    client.set_title("Algebra").await?;
    client.set_time("2").await?;
    client.submit().await?;
    print_state(&client).await;

    println!("\nLogging 'History' for 1.5 hours...");
    client.create("History", 1.5).await?;
    print_state(&client).await;

    if let Some(newest) = client.records().await.first() {
        println!("\nRemoving #{}...", newest.id);
        client.remove(newest.id).await?;
        print_state(&client).await;
    }

    println!("\nWaiting for the notification to clear...");
    tokio::time::sleep(config.notification_delay + std::time::Duration::from_millis(100)).await;
    print_state(&client).await;

    client.teardown();
    println!("\n=== Demo Complete ===");
    Ok(())
}
