//! # Módulo Servidor
//! src/server/mod.rs
//!
//! Demonio de archivos construido sobre el pool de workers: un thread de
//! accept que encola conexiones y N workers que las sirven.

pub mod tcp;

pub use tcp::{FileServer, ServeError, ServerStats};
