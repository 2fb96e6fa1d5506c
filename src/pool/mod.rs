//! # Pool de Tareas en Background
//! src/pool/mod.rs
//!
//! El componente central del toolkit: una cola FIFO compartida y un conjunto
//! fijo de worker threads que la drenan. Desacopla al loop de accept (un
//! solo thread) del trabajo bloqueante por conexión.
//!
//! Ciclo de vida: el pool se crea con su cantidad de workers (fija de por
//! vida), recibe tareas mientras corre, y se apaga exactamente una vez
//! eligiendo si drenar o descartar lo pendiente.

pub mod manager;
pub mod queue;

pub use manager::{CreationError, ShutdownError, WorkerPool};
pub use queue::{SubmitError, TaskQueue};
