#![allow(dead_code)]

use k8scc_fileserver::startup::run;
use std::io;
use std::net::TcpListener;
use std::path::Path;
use tempfile::TempDir;

/// Exchange store served from a temporary directory.
pub struct TestExchange {
    pub address: String,
    pub shared_dir: TempDir,
    server_handle: tokio::task::JoinHandle<io::Result<()>>,
}

impl TestExchange {
    pub fn shared_path(&self) -> &Path {
        self.shared_dir.path()
    }
}

impl Drop for TestExchange {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_exchange() -> TestExchange {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let shared_dir = tempfile::tempdir().expect("failed to create shared dir");
    let server = run(listener, shared_dir.path().to_path_buf()).expect("failed to start server");
    let server_handle = tokio::spawn(server);

    TestExchange {
        address: format!("http://127.0.0.1:{port}"),
        shared_dir,
        server_handle,
    }
}
