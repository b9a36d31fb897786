use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use k8scc_config::shared::FileServerConfig;
use std::net::TcpListener;
use std::path::PathBuf;
use tracing::info;

use crate::routes::files::{get_file, put_file};
use crate::routes::health_check::health_check;

/// Directory every request path is resolved against.
#[derive(Debug, Clone)]
pub struct SharedDir(pub PathBuf);

/// The exchange store server, bound but not started yet.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub fn build(config: FileServerConfig) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        info!(address, shared_dir = %config.shared_dir.display(), "exchange store listening");

        let server = run(listener, config.shared_dir)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Starts serving `shared_dir` on `listener`.
pub fn run(listener: TcpListener, shared_dir: PathBuf) -> Result<Server, std::io::Error> {
    let shared_dir = web::Data::new(SharedDir(shared_dir));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(shared_dir.clone())
            .service(health_check)
            .route("/{path:.*}", web::get().to(get_file))
            .route("/{path:.*}", web::post().to(put_file))
            .route("/{path:.*}", web::put().to(put_file))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
