//! # Cola FIFO de Tareas
//! src/pool/queue.rs
//!
//! Cola compartida entre el productor (loop de accept) y los workers del
//! pool. Un único par mutex/condvar protege tanto la cola como las banderas
//! de apagado; los workers duermen en la condvar cuando no hay trabajo.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};

/// Cola FIFO sin límite de capacidad, protegida por un mutex y una condvar.
///
/// Las tareas entran por la cola (`push`) y salen por la cabeza
/// (`pop_blocking`), así que si la tarea A terminó de encolarse antes de que
/// B empezara a encolarse, A se desencola antes que B.
pub struct TaskQueue<T> {
    inner: Mutex<QueueInner<T>>,
    condvar: Condvar,
}

/// Estado protegido por el mutex: la cola y las banderas de apagado.
/// El mutex no protege nada más; el estado privado de cada worker no
/// necesita lock porque tiene un único dueño.
struct QueueInner<T> {
    tasks: VecDeque<T>,

    /// Pasa de false a true exactamente una vez y nunca vuelve atrás
    shutdown: bool,

    /// Solo tiene sentido si `shutdown` es true: indica si los workers
    /// deben vaciar la cola antes de salir
    drain: bool,
}

impl<T> TaskQueue<T> {
    /// Crea una cola vacía, sin apagado pendiente.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                tasks: VecDeque::new(),
                shutdown: false,
                drain: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Encola una tarea al final y despierta exactamente un worker.
    ///
    /// Si ya se pidió el apagado la tarea no se encola: se devuelve al
    /// productor dentro del error, para que decida qué hacer con ella.
    pub fn push(&self, task: T) -> Result<(), SubmitError<T>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.shutdown {
            return Err(SubmitError(task));
        }
        inner.tasks.push_back(task);
        self.condvar.notify_one();
        Ok(())
    }

    /// Desencola la siguiente tarea, bloqueando si la cola está vacía.
    ///
    /// Retorna `None` cuando el worker debe terminar: se pidió el apagado y
    /// (no hay drenado, o la cola ya quedó vacía). Con drenado activo y cola
    /// no vacía nunca espera: sigue sacando tareas hasta vaciarla.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if inner.shutdown && (!inner.drain || inner.tasks.is_empty()) {
                return None;
            }
            if let Some(task) = inner.tasks.pop_front() {
                return Some(task);
            }
            inner = self.condvar.wait(inner).unwrap();
        }
    }

    /// Marca el apagado con la elección de drenado y despierta a todos los
    /// workers dormidos. Llamadas posteriores no cambian la elección.
    pub fn begin_shutdown(&self, drain: bool) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.shutdown {
            inner.shutdown = true;
            inner.drain = drain;
        }
        self.condvar.notify_all();
    }

    /// Cantidad de tareas encoladas y todavía no desencoladas.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().tasks.len()
    }

    /// Verifica si la cola está vacía.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verifica si ya se pidió el apagado.
    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().unwrap().shutdown
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Error de `push`: la cola ya inició su apagado.
///
/// Contiene la tarea rechazada, porque la tarea es un valor que solo se
/// mueve (productor → cola → consumidor) y perderla aquí sería un leak
/// silencioso. Mismo patrón que `std::sync::mpsc::SendError`.
pub struct SubmitError<T>(pub T);

impl<T> SubmitError<T> {
    /// Recupera la tarea rechazada.
    pub fn into_task(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for SubmitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubmitError(..)")
    }
}

impl<T> fmt::Display for SubmitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("task submitted after shutdown was requested")
    }
}

impl<T> std::error::Error for SubmitError<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_push_pop_fifo() {
        let queue = TaskQueue::new();
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.push(3).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop_blocking(), Some(1));
        assert_eq!(queue.pop_blocking(), Some(2));
        assert_eq!(queue.pop_blocking(), Some(3));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(TaskQueue::new());

        let waiter = thread::spawn({
            let queue = Arc::clone(&queue);
            move || queue.pop_blocking()
        });

        // Dar tiempo a que el waiter llegue a la condvar
        thread::sleep(Duration::from_millis(50));
        queue.push(42usize).unwrap();

        assert_eq!(waiter.join().unwrap(), Some(42));
    }

    #[test]
    fn test_shutdown_wakes_waiters() {
        let queue: Arc<TaskQueue<u32>> = Arc::new(TaskQueue::new());

        let waiter = thread::spawn({
            let queue = Arc::clone(&queue);
            move || queue.pop_blocking()
        });

        thread::sleep(Duration::from_millis(50));
        queue.begin_shutdown(false);

        assert_eq!(waiter.join().unwrap(), None);
    }

    #[test]
    fn test_shutdown_without_drain_discards_pending() {
        let queue = TaskQueue::new();
        queue.push("a").unwrap();
        queue.push("b").unwrap();

        queue.begin_shutdown(false);

        // Sin drenado el worker sale aunque queden tareas
        assert_eq!(queue.pop_blocking(), None);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_shutdown_with_drain_pops_remaining() {
        let queue = TaskQueue::new();
        queue.push("a").unwrap();
        queue.push("b").unwrap();

        queue.begin_shutdown(true);

        assert_eq!(queue.pop_blocking(), Some("a"));
        assert_eq!(queue.pop_blocking(), Some("b"));
        assert_eq!(queue.pop_blocking(), None);
    }

    #[test]
    fn test_push_after_shutdown_returns_task() {
        let queue = TaskQueue::new();
        assert!(!queue.is_shut_down());

        queue.begin_shutdown(true);
        assert!(queue.is_shut_down());

        let err = queue.push(99).unwrap_err();
        assert_eq!(err.into_task(), 99);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shutdown_choice_does_not_revert() {
        let queue = TaskQueue::new();
        queue.push(1).unwrap();

        queue.begin_shutdown(true);
        // Un segundo apagado con otra elección no cambia nada
        queue.begin_shutdown(false);

        assert_eq!(queue.pop_blocking(), Some(1));
        assert_eq!(queue.pop_blocking(), None);
    }
}
