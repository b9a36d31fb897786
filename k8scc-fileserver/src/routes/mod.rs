use serde::{Deserialize, Serialize};

pub mod files;
pub mod health_check;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}
