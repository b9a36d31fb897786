use k8scc_config::shared::{FileServerConfig, SentryConfig};
use k8scc_config::{Environment, load_config};
use k8scc_fileserver::startup::Application;
use k8scc_telemetry::tracing::init_tracing;
use std::env;
use std::sync::Arc;
use tracing::info;

/// Variables of deployments predating the configuration files.
const LEGACY_SHARED_DIR_ENV: &str = "CHAINCODE_SHARED_DIR";
const LEGACY_HTTP_ADDRESS_ENV: &str = "HTTP_ADDRESS";

fn main() -> anyhow::Result<()> {
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    let config = load_file_server_config()?;

    // Initialize Sentry before the async runtime starts
    let _sentry_guard = init_sentry(config.sentry.as_ref())?;

    actix_web::rt::System::new().block_on(async_main(config))?;

    Ok(())
}

async fn async_main(config: FileServerConfig) -> anyhow::Result<()> {
    let application = Application::build(config)?;
    info!(port = application.port(), "exchange store started");
    application.run_until_stopped().await?;

    Ok(())
}

fn load_file_server_config() -> anyhow::Result<FileServerConfig> {
    if let Ok(shared_dir) = env::var(LEGACY_SHARED_DIR_ENV) {
        info!("using legacy environment configuration");
        let http_address = env::var(LEGACY_HTTP_ADDRESS_ENV).ok();

        return Ok(FileServerConfig::from_legacy(
            shared_dir,
            http_address.as_deref(),
        )?);
    }

    Ok(load_config::<FileServerConfig>()?)
}

fn init_sentry(config: Option<&SentryConfig>) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    let Some(config) = config else {
        info!("sentry not configured for the exchange store, skipping initialization");
        return Ok(None);
    };

    info!("initializing sentry with supplied dsn");

    let environment = Environment::load()?;
    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(config.dsn.parse()?),
        environment: Some(environment.to_string().into()),
        integrations: vec![Arc::new(
            sentry::integrations::panic::PanicIntegration::new(),
        )],
        ..Default::default()
    });

    sentry::configure_scope(|scope| {
        scope.set_tag("service", "fileserver");
    });

    Ok(Some(guard))
}
