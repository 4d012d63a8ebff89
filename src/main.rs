use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use retention_logger::audit::{operation, result};
use retention_logger::{AuditEvent, AuditStore, Config, JsonlAuditStore, LogService};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    let store: Option<Arc<dyn AuditStore>> = match &config.audit_store_path {
        Some(path) => Some(Arc::new(JsonlAuditStore::open(
            shellexpand::tilde(&path.to_string_lossy()).into_owned(),
        )?)),
        None => None,
    };

    // Create the service BEFORE any tracing calls so they land in the log file
    let service = LogService::new(&config, store)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(service.tracing_layer())
        .init();

    tracing::info!("Logging to: {}", service.log_file_path().display());

    service.audit_event(
        AuditEvent::new(operation::SYSTEM_STARTUP, "Retention logger started", result::SUCCESS)
            .component("Main"),
    );

    service.timed("Retention sweep", Some("Main"), || {
        service.debug("Nothing to sweep", Some("Main"));
    });

    service.audit_event(
        AuditEvent::new(operation::SYSTEM_SHUTDOWN, "Retention logger stopped", result::SUCCESS)
            .component("Main"),
    );

    service.audits_settled().await;
    service.shutdown().await;
    Ok(())
}
