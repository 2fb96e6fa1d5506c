//! # servkit
//! src/lib.rs
//!
//! Toolkit de red concurrente: un pool de workers con cola FIFO bloqueante,
//! una capa delgada de sockets TCP/Unix y un demonio HTTP/1.0 de archivos
//! estáticos (`catfsd`) que junta las dos cosas.
//!
//! ## Arquitectura
//!
//! ```text
//! accept loop ──▶ TaskQueue (mutex + condvar) ──▶ worker 0..N
//!                                                   │ estado privado
//!                                                   ▼
//!                                             handle_connection
//! ```
//!
//! El pool es genérico: `WorkerPool<T, S>` transporta cualquier tarea `T`
//! hacia workers con estado privado `S`. El demonio lo instancia con
//! conexiones aceptadas como tareas y un buffer de I/O como estado.

pub mod config;
pub mod http;
pub mod net;
pub mod pool;
pub mod process;
pub mod server;
