//! Firewall rule gateway entry point.
//!
//! # Purpose
//! Loads configuration, installs observability, builds the provider-backed
//! state and serves the API until interrupted.
use firewall_api::app::{build_router, build_state};
use firewall_api::config::FirewallApiConfig;
use firewall_api::observability;
use std::future::Future;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FirewallApiConfig::from_env_or_yaml()?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: FirewallApiConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("firewall-api")?;
    let state = build_state(&config).await?;
    tracing::info!(
        backend = state.catalog.backend_name(),
        naming = ?state.catalog.naming_policy(),
        "provider backend ready"
    );

    let (metrics_stop_tx, metrics_stop_rx) = oneshot::channel::<()>();
    let metrics_addr = config.metrics_bind;
    let metrics_task = tokio::spawn(async move {
        let stop = async move {
            let _ = metrics_stop_rx.await;
        };
        if let Err(err) = observability::serve_metrics(metrics_handle, metrics_addr, stop).await {
            tracing::warn!(error = %err, %metrics_addr, "metrics listener failed");
        }
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "firewall api listening");
    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await;

    let _ = metrics_stop_tx.send(());
    let _ = metrics_task.await;
    served?;
    tracing::info!("firewall api stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_api::catalog::naming::NamingPolicy;
    use firewall_api::config::{GcpConfig, MemorySeed, ProviderBackend};
    use serial_test::serial;

    fn memory_config() -> FirewallApiConfig {
        FirewallApiConfig {
            bind_addr: "127.0.0.1:0".parse().expect("bind"),
            metrics_bind: "127.0.0.1:0".parse().expect("metrics"),
            provider: ProviderBackend::Memory,
            trusted_issuer: firewall_authz::GOOGLE_ISSUER.to_string(),
            owner_role: firewall_authz::OWNER_ROLE.to_string(),
            naming: NamingPolicy::Lenient,
            gcp: GcpConfig::default(),
            memory_seed: MemorySeed::default(),
        }
    }

    #[tokio::test]
    #[serial]
    async fn run_with_shutdown_starts_and_stops() {
        run_with_shutdown(memory_config(), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        })
        .await
        .expect("run should stop cleanly");
    }

    #[tokio::test]
    #[serial]
    async fn run_with_shutdown_fails_when_bind_is_taken() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let mut config = memory_config();
        config.bind_addr = taken.local_addr().expect("addr");
        let result = run_with_shutdown(config, async {}).await;
        assert!(result.is_err());
    }
}
