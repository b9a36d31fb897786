use crate::command::Command;
use crate::config::load_launcher_config;
use crate::core::start_launcher_with_config;
use k8scc::build_id::resolve_build_id;
use k8scc_config::Environment;
use k8scc_config::shared::LauncherConfig;
use k8scc_telemetry::tracing::{init_tracing, set_global_chaincode};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

mod command;
mod config;
mod core;

fn main() -> anyhow::Result<()> {
    let (command, args) = Command::parse(env::args().collect())?;

    // The first path argument of every procedure names the chaincode package.
    if let Some(build_id) = args
        .first()
        .and_then(|path| resolve_build_id(Path::new(path)).ok())
    {
        set_global_chaincode(build_id.to_string());
    }

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    // Release works from the build output alone and must not depend on configuration.
    let config = match command {
        Command::Release => None,
        _ => Some(load_launcher_config()?),
    };

    // Initialize Sentry before the async runtime starts
    let _sentry_guard = init_sentry(config.as_ref())?;

    // We start the runtime.
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(config, command, args))?;

    Ok(())
}

async fn async_main(
    config: Option<LauncherConfig>,
    command: Command,
    args: Vec<String>,
) -> anyhow::Result<()> {
    if let Err(err) = start_launcher_with_config(config, command, args).await {
        let source: &(dyn std::error::Error + 'static) = err.as_ref();
        sentry::capture_error(source);
        error!("an error occurred in the launcher: {err:#}");

        return Err(err);
    }

    Ok(())
}

/// Initializes Sentry when the configuration carries a DSN.
///
/// Events are tagged with the "launcher" service.
fn init_sentry(config: Option<&LauncherConfig>) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    if let Some(sentry_config) = config.and_then(|config| config.sentry.as_ref()) {
        info!("initializing sentry with supplied dsn");

        let environment = Environment::load()?;
        let guard = sentry::init(sentry::ClientOptions {
            dsn: Some(sentry_config.dsn.parse()?),
            environment: Some(environment.to_string().into()),
            integrations: vec![Arc::new(
                sentry::integrations::panic::PanicIntegration::new(),
            )],
            ..Default::default()
        });

        sentry::configure_scope(|scope| {
            scope.set_tag("service", "launcher");
        });

        return Ok(Some(guard));
    }

    info!("sentry not configured for launcher, skipping initialization");

    Ok(None)
}
