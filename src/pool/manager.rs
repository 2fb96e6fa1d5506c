//! # Pool de Workers en Background
//! src/pool/manager.rs
//!
//! Administra un conjunto fijo de threads que drenan la cola compartida de
//! tareas. El productor (por ejemplo el loop de accept del servidor) encola
//! tareas con `submit`; cada worker desencola bajo el lock, lo suelta, y
//! recién entonces invoca el callback consumidor. Así un callback lento
//! nunca bloquea a los demás workers ni al productor.
//!
//! Cada worker tiene un estado privado creado por una fábrica al construir
//! el pool y destruido al apagarlo. Ese estado es de un único dueño, así que
//! el consumidor puede usarlo como scratch (buffers, handles) sin locks.

use crate::pool::queue::{SubmitError, TaskQueue};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Error al crear el pool. Ante cualquier falla la creación se revierte por
/// completo: no queda ningún pool a medio arrancar.
#[derive(Debug, Error)]
pub enum CreationError {
    /// El pool necesita al menos un worker
    #[error("worker count must be at least 1")]
    NoWorkers,

    /// La fábrica de estado por worker falló
    #[error("failed to create worker state: {0}")]
    WorkerState(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// El sistema operativo no pudo crear un thread
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Error al apagar el pool.
///
/// Que un worker termine anormalmente es una violación de invariante (el
/// consumidor no debe hacer panic), no una condición recuperable; se reporta
/// para que el proceso que coordina el apagado lo trate como fatal.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("{panicked} worker thread(s) panicked before shutdown completed")]
    WorkerPanicked { panicked: usize },
}

/// Un worker: su índice y el handle del thread, que al terminar devuelve el
/// estado privado para que el pool lo destruya después del join.
struct WorkerHandle<S> {
    id: usize,
    handle: JoinHandle<Option<S>>,
}

/// Slot compartido que transporta el estado privado hacia su thread.
///
/// El estado se deposita antes del spawn y el worker lo retira al arrancar.
/// Si el spawn falla, el closure del thread se descarta sin haber corrido y
/// el estado sigue en el slot, de donde la creación lo recupera para poder
/// destruirlo con el callback de teardown.
struct StateSlot<S> {
    inner: Arc<Mutex<Option<S>>>,
}

impl<S> StateSlot<S> {
    fn new(state: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(state))),
        }
    }

    /// Segunda referencia al slot, para mover al closure del thread.
    fn share(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Retira el estado; `None` si alguien ya lo retiró.
    fn take(&self) -> Option<S> {
        self.inner.lock().unwrap().take()
    }
}

/// Pool de workers con cantidad fija de threads y una cola FIFO compartida.
///
/// `T` es la tarea (un valor que solo se mueve: productor → cola →
/// consumidor) y `S` el estado privado de cada worker.
///
/// # Ejemplo
///
/// ```
/// use servkit::pool::WorkerPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let done = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&done);
///
/// let mut pool = WorkerPool::new(
///     2,
///     |id| Ok::<_, std::convert::Infallible>(id),
///     |_state| {},
///     move |_state: &mut usize, task: u64| {
///         counter.fetch_add(task as usize, Ordering::SeqCst);
///     },
/// )
/// .unwrap();
///
/// for i in 1..=10 {
///     pool.submit(i).unwrap();
/// }
/// pool.shutdown(true).unwrap();
/// assert_eq!(done.load(Ordering::SeqCst), 55);
/// ```
pub struct WorkerPool<T, S>
where
    T: Send + 'static,
    S: Send + 'static,
{
    queue: Arc<TaskQueue<T>>,
    workers: Vec<WorkerHandle<S>>,
    teardown: Box<dyn FnMut(S) + Send + Sync>,
}

impl<T, S> WorkerPool<T, S>
where
    T: Send + 'static,
    S: Send + 'static,
{
    /// Crea el pool: valida la cantidad de workers, invoca la fábrica una
    /// vez por worker y recién después lanza los threads. Cada invocación de
    /// la fábrica sucede-antes de que arranque el thread correspondiente.
    ///
    /// Si la fábrica falla en cualquier worker, los estados ya creados se
    /// destruyen y la creación se reporta como fallida. Si falla el spawn de
    /// un thread, los ya lanzados se apagan y se joinean, y el teardown corre
    /// sobre el estado de cada worker (incluido el del spawn fallido) antes
    /// de devolver el error.
    pub fn new<F, E, D, C>(
        workers: usize,
        mut factory: F,
        teardown: D,
        consumer: C,
    ) -> Result<Self, CreationError>
    where
        F: FnMut(usize) -> Result<S, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
        D: FnMut(S) + Send + Sync + 'static,
        C: Fn(&mut S, T) + Send + Sync + 'static,
    {
        if workers == 0 {
            return Err(CreationError::NoWorkers);
        }

        let mut teardown = teardown;

        // Primero todo el estado por worker, para poder revertir sin
        // threads corriendo a medias
        let mut states = Vec::with_capacity(workers);
        for id in 0..workers {
            match factory(id) {
                Ok(state) => states.push(state),
                Err(err) => {
                    for state in states {
                        teardown(state);
                    }
                    return Err(CreationError::WorkerState(err.into()));
                }
            }
        }

        let queue = Arc::new(TaskQueue::new());
        let consumer = Arc::new(consumer);

        let mut handles: Vec<WorkerHandle<S>> = Vec::with_capacity(workers);
        let mut states = states.into_iter();
        let mut spawn_failure = None;
        for (id, state) in states.by_ref().enumerate().take(workers) {
            let queue = Arc::clone(&queue);
            let consumer = Arc::clone(&consumer);
            // El estado viaja al thread por un slot y no dentro del closure:
            // si el spawn falla, el closure se descarta sin correr y el
            // estado se recupera del slot para destruirlo
            let slot = StateSlot::new(state);
            let thread_slot = slot.share();
            let spawned = thread::Builder::new()
                .name(format!("servkit-worker-{id}"))
                .spawn(move || {
                    thread_slot
                        .take()
                        .map(|state| Self::worker_loop(state, queue, consumer))
                });
            match spawned {
                Ok(handle) => handles.push(WorkerHandle { id, handle }),
                Err(err) => {
                    if let Some(state) = slot.take() {
                        teardown(state);
                    }
                    spawn_failure = Some(err);
                    break;
                }
            }
        }

        if let Some(err) = spawn_failure {
            queue.begin_shutdown(false);
            for worker in handles {
                if let Ok(Some(state)) = worker.handle.join() {
                    teardown(state);
                }
            }
            for state in states {
                teardown(state);
            }
            return Err(CreationError::Spawn(err));
        }

        Ok(Self {
            queue,
            workers: handles,
            teardown: Box::new(teardown),
        })
    }

    /// Loop de un worker: desencola, suelta el lock y consume. Termina
    /// cuando la cola señala el apagado, devolviendo el estado privado para
    /// que el pool lo destruya después del join.
    fn worker_loop<C>(mut state: S, queue: Arc<TaskQueue<T>>, consumer: Arc<C>) -> S
    where
        C: Fn(&mut S, T) + Send + Sync + 'static,
    {
        while let Some(task) = queue.pop_blocking() {
            (*consumer)(&mut state, task);
        }
        state
    }

    /// Encola una tarea, despertando un worker dormido.
    ///
    /// Es seguro llamar desde varios productores a la vez, incluso en
    /// paralelo con `shutdown`. Una vez pedido el apagado las tareas nuevas
    /// se rechazan y vuelven dentro del error.
    pub fn submit(&self, task: T) -> Result<(), SubmitError<T>> {
        self.queue.push(task)
    }

    /// Apaga el pool: marca el apagado, despierta a todos los workers,
    /// joinea cada thread y destruye su estado privado.
    ///
    /// Con `drain = true` los workers procesan todo lo que quedó encolado
    /// antes de salir; con `drain = false` salen en cuanto despiertan y las
    /// tareas pendientes se descartan (pérdida intencional, no un bug).
    ///
    /// Bloquea hasta que el último worker terminó. Una segunda llamada es un
    /// no-op que retorna `Ok`.
    pub fn shutdown(&mut self, drain: bool) -> Result<(), ShutdownError> {
        if self.workers.is_empty() {
            return Ok(());
        }
        self.queue.begin_shutdown(drain);

        let mut panicked = 0;
        for worker in std::mem::take(&mut self.workers) {
            match worker.handle.join() {
                Ok(Some(state)) => (self.teardown)(state),
                // El slot ya estaba vacío al arrancar el thread; no quedó
                // estado que destruir para ese índice
                Ok(None) => {}
                // El estado del worker se perdió en el unwind; no hay nada
                // que destruir para ese índice
                Err(_) => {
                    eprintln!("[!] worker {} terminated abnormally", worker.id);
                    panicked += 1;
                }
            }
        }

        if panicked == 0 {
            Ok(())
        } else {
            Err(ShutdownError::WorkerPanicked { panicked })
        }
    }

    /// Cantidad de workers todavía corriendo (0 después del apagado).
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tareas encoladas y todavía no tomadas por ningún worker.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl<T, S> Drop for WorkerPool<T, S>
where
    T: Send + 'static,
    S: Send + 'static,
{
    /// Red de seguridad: un pool que se suelta sin apagar se apaga sin
    /// drenar. El apagado prolijo es responsabilidad de quien lo creó.
    fn drop(&mut self) {
        let _ = self.shutdown(false);
    }
}
