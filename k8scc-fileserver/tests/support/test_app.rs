#![allow(dead_code)]

use k8scc_fileserver::startup::run;
use std::io;
use std::net::TcpListener;
use std::path::Path;
use tempfile::TempDir;

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub shared_dir: TempDir,
    server_handle: tokio::task::JoinHandle<io::Result<()>>,
}

impl TestApp {
    pub fn shared_path(&self) -> &Path {
        self.shared_dir.path()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}/{path}", self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn post(&self, path: &str, body: Vec<u8>) -> reqwest::Response {
        self.api_client
            .post(format!("{}/{path}", self.address))
            .body(body)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn put(&self, path: &str, body: Vec<u8>) -> reqwest::Response {
        self.api_client
            .put(format!("{}/{path}", self.address))
            .body(body)
            .send()
            .await
            .expect("failed to execute request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_test_app() -> TestApp {
    let base_address = "127.0.0.1";
    let listener =
        TcpListener::bind(format!("{base_address}:0")).expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let shared_dir = tempfile::tempdir().expect("failed to create shared dir");
    let server = run(listener, shared_dir.path().to_path_buf()).expect("failed to bind address");
    let server_handle = tokio::spawn(server);

    TestApp {
        address: format!("http://{base_address}:{port}"),
        api_client: reqwest::Client::new(),
        shared_dir,
        server_handle,
    }
}
