use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use pvflow::metrics;
use pvflow::type_support::Timestamped;
use pvflow::DecouplerConfig;
use pvflow::DesiredRateEvent;
use pvflow::Error;
use pvflow::ProducerError;
use pvflow::ReadyToken;
use pvflow::Result;
use pvflow::SourceHandle;
use pvflow::SubscriptionBuilder;
use rand::Rng;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEMO_RUN_SECS: u64 = 5;
const SOURCE_PERIOD_MS: u64 = 1;
const SOURCES: usize = 2;

type Sample = Timestamped<f64>;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let config = DecouplerConfig::new()?.validate()?;
    metrics::register_custom_metrics();
    info!("Starting demo with {:?}", config);

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    let listener = Arc::new(|event: DesiredRateEvent<Sample>, ready: ReadyToken| {
        if let Some(latest) = event.latest() {
            info!(
                "cycle {} {:?}: {} samples, latest {:.4} at {}",
                event.cycle(),
                event.types(),
                event.values().len(),
                latest.value,
                latest.timestamp
            );
        } else {
            info!("cycle {} {:?}", event.cycle(), event.types());
        }
        if let Some(e) = event.read_error() {
            warn!("source reported: {}", e);
        }
        if let Err(e) = ready.ready_for_next_event() {
            error!("ready_for_next_event failed: {:?}", e);
        }
    });

    let (subscription, source) = SubscriptionBuilder::<Sample>::from_config(config)
        .name("noise")
        .build(listener)?;

    info!("Application started. Waiting for CTRL+C signal...");
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let producers = (0..SOURCES)
        .map(|n| tokio::spawn(simulate_source(n, source.clone(), graceful_rx.clone())));
    for result in join_all(producers).await {
        if let Err(e) = result {
            error!("source task failed: {:?}", e);
        }
    }

    subscription.close();
    println!("{}", metrics::metrics_text());
    println!("Exiting program.");
    Ok(())
}

/// Random walk sampled every millisecond until shutdown.
async fn simulate_source(
    n: usize,
    source: SourceHandle<Sample>,
    mut shutdown_signal: watch::Receiver<()>,
) {
    let mut level = 0.0_f64;
    let mut ticker = tokio::time::interval(Duration::from_millis(SOURCE_PERIOD_MS));
    source.read_connection(true);

    loop {
        tokio::select! {
            _ = shutdown_signal.changed() => {
                info!("source {} stopping", n);
                source.read_connection(false);
                return;
            }
            _ = ticker.tick() => {}
        }

        let (step, glitch) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(-0.05..0.05), rng.gen_ratio(1, 2_000))
        };
        if glitch {
            source.read_exception(ProducerError::ReadFailed(format!(
                "source {} dropped a sample",
                n
            )));
            continue;
        }
        level += step;
        source.write(Some(Timestamped::now(level)));
    }
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Fatal(format!("cannot listen for SIGINT: {}", e)))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Fatal(format!("cannot listen for SIGTERM: {}", e)))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::time::sleep(Duration::from_secs(DEMO_RUN_SECS)) => {
            info!("Demo period elapsed.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::Fatal(format!("Failed to send shutdown signal: {}", e))
    })?;

    info!("Shutdown completed");
    Ok(())
}

fn init_observability() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
