//! # Capa de Red
//! src/net/mod.rs
//!
//! Wrappers delgados sobre sockets TCP y Unix: creación de listeners con
//! backlog explícito, accept, conexión como cliente y opciones de socket
//! (nodelay, keep-alive, timeouts). Sin lógica de protocolo: eso vive en
//! `http` y `server`.

pub mod conn;
pub mod socket;

pub use conn::{Conn, Listener};
pub use socket::NetError;
