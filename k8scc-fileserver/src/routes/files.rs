use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError, web};
use futures::StreamExt;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::routes::ErrorMessage;
use crate::startup::SharedDir;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("path {0:?} is not inside the shared directory")]
    InvalidPath(String),

    #[error("file {0:?} not found")]
    NotFound(String),

    #[error("failed to read the request body: {0}")]
    Payload(#[from] actix_web::error::PayloadError),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResponseError for FileError {
    fn status_code(&self) -> StatusCode {
        match self {
            FileError::InvalidPath(_) | FileError::Payload(_) => StatusCode::BAD_REQUEST,
            FileError::NotFound(_) => StatusCode::NOT_FOUND,
            FileError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_string(),
        };
        let body = serde_json::to_string(&error_message)
            .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_owned());

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body)
    }
}

/// Serves the file stored at `path`.
pub async fn get_file(
    shared_dir: web::Data<SharedDir>,
    path: web::Path<String>,
) -> Result<HttpResponse, FileError> {
    let path = path.into_inner();
    let file = resolve(&shared_dir.0, &path)?;

    let size = match fs::metadata(&file).await {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        Ok(_) => return Err(FileError::NotFound(path)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(FileError::NotFound(path));
        }
        Err(source) => return Err(FileError::Io { path: file, source }),
    };

    let contents = fs::File::open(&file)
        .await
        .map_err(|source| FileError::Io {
            path: file.clone(),
            source,
        })?;
    debug!(path, size, "serving file");

    Ok(HttpResponse::Ok()
        .insert_header(ContentType::octet_stream())
        .no_chunking(size)
        .streaming(ReaderStream::new(contents)))
}

/// Stores the request body at `path`, replacing any previous content.
pub async fn put_file(
    shared_dir: web::Data<SharedDir>,
    path: web::Path<String>,
    mut body: web::Payload,
) -> Result<HttpResponse, FileError> {
    let path = path.into_inner();
    let file = resolve(&shared_dir.0, &path)?;
    let io_error = |source| FileError::Io {
        path: file.clone(),
        source,
    };

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).await.map_err(io_error)?;
    }

    let mut out = fs::File::create(&file).await.map_err(io_error)?;
    let mut size = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        size += chunk.len();
        out.write_all(&chunk).await.map_err(io_error)?;
    }
    out.flush().await.map_err(io_error)?;
    info!(path, size, "file stored");

    Ok(HttpResponse::Ok().finish())
}

/// Maps a request path onto a file under `root`.
///
/// Only plain components are accepted, so a request can never reach outside `root`.
fn resolve(root: &Path, path: &str) -> Result<PathBuf, FileError> {
    let relative = Path::new(path);
    let is_plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if path.is_empty() || !is_plain {
        return Err(FileError::InvalidPath(path.to_owned()));
    }

    Ok(root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_keeps_nested_paths_under_root() {
        let root = Path::new("/srv/shared");

        assert_eq!(
            resolve(root, "0123456789/chaincode-source.tar").unwrap(),
            PathBuf::from("/srv/shared/0123456789/chaincode-source.tar")
        );
    }

    #[test]
    fn resolve_rejects_escaping_paths() {
        let root = Path::new("/srv/shared");

        assert!(matches!(
            resolve(root, "../etc/passwd"),
            Err(FileError::InvalidPath(_))
        ));
        assert!(matches!(
            resolve(root, "a/../../b"),
            Err(FileError::InvalidPath(_))
        ));
        assert!(matches!(resolve(root, ""), Err(FileError::InvalidPath(_))));
    }
}
