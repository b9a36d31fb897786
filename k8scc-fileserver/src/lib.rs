//! Exchange store serving chaincode archives over HTTP.
//!
//! `GET /<path>` returns the file stored at `<path>` under the shared
//! directory. `POST` and `PUT` on the same paths store the request body,
//! creating parent directories as needed.

pub mod routes;
pub mod startup;
