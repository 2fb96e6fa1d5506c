//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Superficie HTTP/1.0 mínima para el demonio de archivos: parsing de la
//! request line, construcción de responses y códigos de estado. Sin
//! keep-alive de protocolo ni chunked encoding: una conexión, un request,
//! una respuesta.

pub mod request;
pub mod response;
pub mod status;

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
