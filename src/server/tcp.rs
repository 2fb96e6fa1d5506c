//! # Demonio de Archivos Concurrente
//! src/server/tcp.rs
//!
//! El loop de accept corre en un único thread y nunca procesa conexiones:
//! envuelve cada conexión aceptada como tarea y la encola en el pool de
//! workers. Cada worker parsea la request line, resuelve la ruta bajo el
//! directorio servido y streamea el archivo usando su buffer privado.

use crate::config::Config;
use crate::http::{Method, Request, Response, StatusCode};
use crate::net::{Conn, Listener, NetError};
use crate::pool::{CreationError, WorkerPool};
use crate::process;
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Error fatal de arranque o ejecución del demonio
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("network error: {0}")]
    Net(#[from] NetError),

    #[error("could not start worker pool: {0}")]
    Pool(#[from] CreationError),

    #[error("privilege drop failed: {0}")]
    Privileges(#[from] crate::process::PrivilegeError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Una conexión aceptada, lista para ser procesada por un worker.
///
/// Es la tarea que viaja por la cola del pool: el loop de accept la crea,
/// la cola la transporta y el worker que la desencola es su dueño final.
struct ConnTask {
    conn: Conn,
    peer: String,
}

/// Estado privado de cada worker: su índice y un buffer reutilizable para
/// leer requests y copiar archivos por chunks. Nunca se comparte.
struct WorkerScratch {
    id: usize,
    buf: Vec<u8>,
}

impl WorkerScratch {
    const BUF_SIZE: usize = 8192;

    fn new(id: usize) -> Self {
        Self {
            id,
            buf: vec![0u8; Self::BUF_SIZE],
        }
    }
}

/// Contadores del servidor, compartidos entre workers vía atomics (el mutex
/// del pool protege solo la cola, no esto).
#[derive(Clone)]
pub struct ServerStats {
    inner: Arc<StatsInner>,
}

struct StatsInner {
    served: AtomicU64,
    errors: AtomicU64,
    workers: usize,
    started_at: Instant,
}

/// Snapshot serializable para el endpoint /status
#[derive(Debug, Serialize)]
struct StatsSnapshot {
    requests_served: u64,
    requests_failed: u64,
    workers: usize,
    uptime_secs: u64,
}

impl ServerStats {
    pub fn new(workers: usize) -> Self {
        Self {
            inner: Arc::new(StatsInner {
                served: AtomicU64::new(0),
                errors: AtomicU64::new(0),
                workers,
                started_at: Instant::now(),
            }),
        }
    }

    fn record_served(&self) {
        self.inner.served.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Total de requests servidos con éxito
    pub fn served(&self) -> u64 {
        self.inner.served.load(Ordering::Relaxed)
    }

    /// Total de requests fallidos
    pub fn errors(&self) -> u64 {
        self.inner.errors.load(Ordering::Relaxed)
    }

    fn to_json(&self) -> String {
        let snapshot = StatsSnapshot {
            requests_served: self.served(),
            requests_failed: self.errors(),
            workers: self.inner.workers,
            uptime_secs: self.inner.started_at.elapsed().as_secs(),
        };
        serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Servidor de archivos sobre el pool de workers
pub struct FileServer {
    config: Config,
}

impl FileServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Arranca el demonio: bind, privilege drop, chdir, pool y loop de
    /// accept. Bloquea para siempre salvo error fatal de arranque.
    pub fn run(&mut self) -> Result<(), ServeError> {
        let config = &self.config;

        let listener = Listener::tcp(&config.host, config.port, config.backlog)?;
        println!("[+] catfsd escuchando en {}", listener.local_string());

        // Primero el bind (puede requerir root), después soltar privilegios
        if let Some(user) = &config.user {
            process::drop_privileges(user)?;
            println!("[*] privilegios cambiados al usuario {}", user);
        }
        process::change_dir(Path::new(&config.dir))?;
        let root = std::env::current_dir()?;
        println!("[*] sirviendo {}", root.display());

        let stats = ServerStats::new(config.workers);
        let pool = WorkerPool::new(
            config.workers,
            |id| Ok::<_, std::convert::Infallible>(WorkerScratch::new(id)),
            |_scratch| {},
            {
                let stats = stats.clone();
                let root = root.clone();
                move |scratch: &mut WorkerScratch, task: ConnTask| {
                    handle_connection(scratch, task, &root, &stats);
                }
            },
        )?;
        println!("[*] pool de {} workers listo\n", config.workers);

        let keep_alive = config.keep_alive_secs;
        loop {
            match listener.accept() {
                Ok(conn) => {
                    if keep_alive > 0 {
                        let _ = conn.set_keep_alive(true, keep_alive);
                    }
                    let peer = conn.peer_string();
                    if let Err(err) = pool.submit(ConnTask { conn, peer }) {
                        // Solo pasa si alguien apagó el pool; la conexión
                        // rechazada se cierra al soltarse
                        eprintln!("   ❌ conexión descartada: {}", err);
                    }
                }
                Err(err) => {
                    eprintln!("   ❌ error al aceptar conexión: {}", err);
                }
            }
        }
    }
}

/// Procesa una conexión de punta a punta dentro de un worker. La tarea es
/// del worker a partir de acá; la conexión se cierra al salir.
fn handle_connection(
    scratch: &mut WorkerScratch,
    mut task: ConnTask,
    root: &Path,
    stats: &ServerStats,
) {
    let bytes_read = match task.conn.read(&mut scratch.buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(err) => {
            eprintln!("   ❌ worker {}: read de {}: {}", scratch.id, task.peer, err);
            stats.record_error();
            return;
        }
    };

    match Request::parse(&scratch.buf[..bytes_read]) {
        Ok(request) => {
            println!(
                "   ✅ worker {}: {} {} ({})",
                scratch.id,
                request.method().as_str(),
                request.path(),
                task.peer
            );
            if request.path() == "/status" {
                let response = Response::json(&stats.to_json());
                if task.conn.write_all(&response.to_bytes()).is_ok() {
                    stats.record_served();
                } else {
                    stats.record_error();
                }
            } else {
                serve_file(scratch, &mut task.conn, root, &request, stats);
            }
        }
        Err(err) => {
            let response = Response::error(StatusCode::BadRequest, &err.to_string());
            let _ = task.conn.write_all(&response.to_bytes());
            stats.record_error();
        }
    }
}

/// Resuelve el path pedido a una ruta bajo `root`.
///
/// Solo se aceptan componentes normales: cualquier `..`, ruta absoluta o
/// prefijo raro rechaza el request en vez de escapar del directorio.
fn resolve_path(root: &Path, raw: &str) -> Option<PathBuf> {
    let relative = raw.trim_start_matches('/');
    let relative = if relative.is_empty() {
        "index.html"
    } else {
        relative
    };

    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            _ => return None,
        }
    }
    Some(resolved)
}

/// Content-Type según la extensión del archivo
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("txt") | Some("md") => "text/plain",
        Some("json") => "application/json",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Streamea un archivo al cliente usando el buffer del worker.
fn serve_file(
    scratch: &mut WorkerScratch,
    conn: &mut Conn,
    root: &Path,
    request: &Request,
    stats: &ServerStats,
) {
    let Some(path) = resolve_path(root, request.path()) else {
        let response = Response::error(StatusCode::NotFound, "no such file");
        let _ = conn.write_all(&response.to_bytes());
        stats.record_error();
        return;
    };

    let mut file = match std::fs::File::open(&path) {
        Ok(file) if file.metadata().map(|meta| meta.is_file()).unwrap_or(false) => file,
        _ => {
            let response = Response::error(StatusCode::NotFound, "no such file");
            let _ = conn.write_all(&response.to_bytes());
            stats.record_error();
            return;
        }
    };

    let head = Response::new(StatusCode::Ok)
        .with_header("Server", "catfsd/0.1.0")
        .with_header("Content-Type", content_type(&path));
    if conn.write_all(&head.head_bytes()).is_err() {
        stats.record_error();
        return;
    }

    if request.method() == Method::HEAD {
        stats.record_served();
        return;
    }

    loop {
        let n = match file.read(&mut scratch.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                // Los headers ya salieron; solo queda cortar la conexión
                eprintln!("   ❌ worker {}: read de archivo: {}", scratch.id, err);
                stats.record_error();
                return;
            }
        };
        if conn.write_all(&scratch.buf[..n]).is_err() {
            stats.record_error();
            return;
        }
    }
    stats.record_served();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::net::TcpStream;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    static TEST_DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

    /// Crea un directorio temporal único para el test
    fn temp_root() -> PathBuf {
        let seq = TEST_DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("catfsd-test-{}-{}", std::process::id(), seq));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Acepta una conexión y la procesa con un worker de mentira
    fn serve_one(listener: Listener, root: PathBuf, stats: ServerStats) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let conn = listener.accept().unwrap();
            let peer = conn.peer_string();
            let mut scratch = WorkerScratch::new(0);
            handle_connection(&mut scratch, ConnTask { conn, peer }, &root, &stats);
        })
    }

    fn send_request(addr: std::net::SocketAddr, raw: &[u8]) -> String {
        let mut client = TcpStream::connect(addr).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(std::net::Shutdown::Write).unwrap();

        let mut response = Vec::new();
        client.read_to_end(&mut response).unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    #[test]
    fn test_serve_existing_file() {
        let root = temp_root();
        fs::write(root.join("saludo.txt"), "hola mundo").unwrap();

        let listener = Listener::tcp("127.0.0.1", 0, 8).unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = ServerStats::new(1);
        let handle = serve_one(listener, root.clone(), stats.clone());

        let response = send_request(addr, b"GET /saludo.txt HTTP/1.0\r\n\r\n");
        handle.join().unwrap();

        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/plain\r\n"));
        assert!(response.ends_with("hola mundo"));
        assert_eq!(stats.served(), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_head_returns_headers_only() {
        let root = temp_root();
        fs::write(root.join("pagina.html"), "<html></html>").unwrap();

        let listener = Listener::tcp("127.0.0.1", 0, 8).unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = serve_one(listener, root.clone(), ServerStats::new(1));

        let response = send_request(addr, b"HEAD /pagina.html HTTP/1.0\r\n\r\n");
        handle.join().unwrap();

        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/html\r\n"));
        assert!(!response.contains("<html>"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_file_is_404() {
        let root = temp_root();
        let listener = Listener::tcp("127.0.0.1", 0, 8).unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = ServerStats::new(1);
        let handle = serve_one(listener, root.clone(), stats.clone());

        let response = send_request(addr, b"GET /nada.txt HTTP/1.0\r\n\r\n");
        handle.join().unwrap();

        assert!(response.contains("404 Not Found"));
        assert_eq!(stats.errors(), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_traversal_is_rejected() {
        let root = temp_root();
        let listener = Listener::tcp("127.0.0.1", 0, 8).unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = serve_one(listener, root.clone(), ServerStats::new(1));

        let response = send_request(addr, b"GET /../../etc/passwd HTTP/1.0\r\n\r\n");
        handle.join().unwrap();

        assert!(response.contains("404 Not Found"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_status_endpoint_returns_json() {
        let root = temp_root();
        let listener = Listener::tcp("127.0.0.1", 0, 8).unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = serve_one(listener, root.clone(), ServerStats::new(4));

        let response = send_request(addr, b"GET /status HTTP/1.0\r\n\r\n");
        handle.join().unwrap();

        assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(response.contains("\"requests_served\""));
        assert!(response.contains("\"workers\":4"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_garbage_request_is_400() {
        let root = temp_root();
        let listener = Listener::tcp("127.0.0.1", 0, 8).unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = ServerStats::new(1);
        let handle = serve_one(listener, root.clone(), stats.clone());

        let response = send_request(addr, b"\x00\x01\x02garbage");
        handle.join().unwrap();

        assert!(response.contains("400 Bad Request"));
        assert_eq!(stats.errors(), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_resolve_path_rules() {
        let root = PathBuf::from("/srv/files");

        assert_eq!(
            resolve_path(&root, "/docs/a.txt"),
            Some(PathBuf::from("/srv/files/docs/a.txt"))
        );
        // Raíz sirve index.html
        assert_eq!(
            resolve_path(&root, "/"),
            Some(PathBuf::from("/srv/files/index.html"))
        );
        assert_eq!(resolve_path(&root, "/../secreto"), None);
        assert_eq!(resolve_path(&root, "/a/../../b"), None);
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type(Path::new("a.html")), "text/html");
        assert_eq!(content_type(Path::new("a.txt")), "text/plain");
        assert_eq!(content_type(Path::new("a.json")), "application/json");
        assert_eq!(content_type(Path::new("a.bin")), "application/octet-stream");
        assert_eq!(content_type(Path::new("sin_extension")), "application/octet-stream");
    }
}
