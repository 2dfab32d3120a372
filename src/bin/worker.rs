//! Demo monitored worker.
//!
//! Runs a simulated unit of work (a random sleep) wrapped with
//! [`Monitor`], publishing `start` and `finished` status events to the
//! gateway's bus ingest endpoint.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use tracing_subscriber::EnvFilter;

use worker_monitor::config::WorkerConfig;
use worker_monitor::monitor::{
    EventPublisher, HttpEventPublisher, InstanceId, InvocationContext, Monitor, MonitorError,
};

/// Result returned by the simulated work.
#[derive(Debug)]
struct WorkResult {
    status_code: u16,
    body: &'static str,
}

/// Sleeps for 1..=`max_secs` seconds, then reports success.
async fn simulated_work(
    max_secs: u64,
    ctx: InvocationContext,
) -> Result<WorkResult, std::convert::Infallible> {
    let secs = random_secs(max_secs);
    tracing::info!(request_id = %ctx.request_id, secs, "processing");
    tokio::time::sleep(Duration::from_secs(secs)).await;
    Ok(WorkResult {
        status_code: 200,
        body: "Work completed!",
    })
}

fn random_secs(max_secs: u64) -> u64 {
    rand::thread_rng().gen_range(1..=max_secs.max(1))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WorkerConfig::from_env();
    let instance_id = InstanceId::generate();
    tracing::info!(%instance_id, bus = %config.bus_endpoint, "worker started");

    let publisher = HttpEventPublisher::new(&config.bus_endpoint, config.publish_timeout)
        .context("building bus client")?;
    let publisher: Arc<dyn EventPublisher> = Arc::new(publisher);
    let monitor = Monitor::new(
        publisher,
        config.event_source.as_str(),
        config.event_bus_name.as_str(),
    );

    let max_secs = config.work_max_secs;
    let handler = monitor.wrap(move |(): (), ctx: InvocationContext| simulated_work(max_secs, ctx));

    for _ in 0..config.invocations {
        let ctx = InvocationContext::fresh(instance_id);
        let request_id = ctx.request_id.clone();
        match handler.call((), ctx).await {
            Ok(result) => {
                tracing::info!(%request_id, body = result.body, status = result.status_code, "invocation finished");
            }
            Err(MonitorError::Publish(e)) => {
                return Err(e).context("publishing status event");
            }
            Err(MonitorError::Work(e)) => match e {},
        }
    }

    Ok(())
}
