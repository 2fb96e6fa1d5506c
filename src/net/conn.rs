//! # Conexiones y Listeners
//! src/net/conn.rs
//!
//! Abstracción delgada sobre sockets TCP y Unix: un `Listener` que acepta y
//! una `Conn` establecida que se lee y escribe como cualquier stream. El
//! resto del toolkit nunca mira adentro de una `Conn`: la transporta como
//! payload de tarea y la usa a través de `Read`/`Write`.

use crate::net::socket::{self, NetError};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::time::Duration;

/// Socket de escucha, TCP o Unix.
pub enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

impl Listener {
    /// Crea un listener TCP en `host:port` con el backlog pedido.
    pub fn tcp(host: &str, port: u16, backlog: i32) -> Result<Self, NetError> {
        Ok(Listener::Tcp(socket::tcp_listener(host, port, backlog)?))
    }

    /// Crea un listener Unix en `path` con permisos `perm`.
    pub fn unix(path: &Path, perm: u32, backlog: i32) -> Result<Self, NetError> {
        Ok(Listener::Unix(socket::unix_listener(path, perm, backlog)?))
    }

    /// Bloquea hasta aceptar la próxima conexión entrante.
    pub fn accept(&self) -> Result<Conn, NetError> {
        match self {
            Listener::Tcp(listener) => {
                let (stream, _peer) = listener.accept()?;
                Ok(Conn::Tcp(stream))
            }
            Listener::Unix(listener) => {
                let (stream, _peer) = listener.accept()?;
                Ok(Conn::Unix(stream))
            }
        }
    }

    /// Dirección local de un listener TCP (None para Unix).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Listener::Tcp(listener) => listener.local_addr().ok(),
            Listener::Unix(_) => None,
        }
    }

    /// Dirección local en formato imprimible.
    pub fn local_string(&self) -> String {
        match self {
            Listener::Tcp(listener) => listener
                .local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            Listener::Unix(listener) => match listener.local_addr() {
                Ok(addr) => match addr.as_pathname() {
                    Some(path) => format!("unix:{}", path.display()),
                    None => "unix:?".to_string(),
                },
                Err(_) => "unknown".to_string(),
            },
        }
    }
}

/// Conexión establecida, TCP o Unix.
pub enum Conn {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl Conn {
    /// Conecta como cliente TCP a `host:port`.
    pub fn connect_tcp(host: &str, port: u16) -> Result<Self, NetError> {
        let addr = socket::resolve(host, port)?;
        Ok(Conn::Tcp(TcpStream::connect(addr)?))
    }

    /// Conecta como cliente a un socket Unix.
    pub fn connect_unix(path: &Path) -> Result<Self, NetError> {
        Ok(Conn::Unix(UnixStream::connect(path)?))
    }

    /// Activa o desactiva TCP_NODELAY. En sockets Unix no hace nada.
    pub fn set_nodelay(&self, on: bool) -> Result<(), NetError> {
        match self {
            Conn::Tcp(stream) => Ok(stream.set_nodelay(on)?),
            Conn::Unix(_) => Ok(()),
        }
    }

    /// Configura keep-alive TCP. En sockets Unix no hace nada.
    pub fn set_keep_alive(&self, on: bool, idle_secs: u32) -> Result<(), NetError> {
        match self {
            Conn::Tcp(stream) => socket::set_keep_alive(stream, on, idle_secs),
            Conn::Unix(_) => Ok(()),
        }
    }

    /// Timeout de escritura en milisegundos (0 lo deshabilita).
    pub fn set_send_timeout(&self, ms: u64) -> Result<(), NetError> {
        let timeout = if ms == 0 {
            None
        } else {
            Some(Duration::from_millis(ms))
        };
        match self {
            Conn::Tcp(stream) => Ok(stream.set_write_timeout(timeout)?),
            Conn::Unix(stream) => Ok(stream.set_write_timeout(timeout)?),
        }
    }

    /// Modo no bloqueante.
    pub fn set_nonblocking(&self, on: bool) -> Result<(), NetError> {
        match self {
            Conn::Tcp(stream) => Ok(stream.set_nonblocking(on)?),
            Conn::Unix(stream) => Ok(stream.set_nonblocking(on)?),
        }
    }

    /// Peer en formato imprimible (`ip:puerto` o `unix:ruta`).
    pub fn peer_string(&self) -> String {
        match self {
            Conn::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            Conn::Unix(stream) => match stream.peer_addr() {
                Ok(addr) => match addr.as_pathname() {
                    Some(path) => format!("unix:{}", path.display()),
                    None => "unix:?".to_string(),
                },
                Err(_) => "unknown".to_string(),
            },
        }
    }
}

impl Read for Conn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Conn::Tcp(stream) => stream.read(buf),
            Conn::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Conn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Conn::Tcp(stream) => stream.write(buf),
            Conn::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Conn::Tcp(stream) => stream.flush(),
            Conn::Unix(stream) => stream.flush(),
        }
    }
}
