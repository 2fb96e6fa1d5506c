//! # Sockets de Bajo Nivel
//! src/net/socket.rs
//!
//! Helpers sobre las syscalls de sockets que la librería estándar no
//! expone: backlog explícito, SO_REUSEADDR y el ajuste fino de keep-alive.

use nix::sys::socket::{self, sockopt, AddressFamily, Backlog, SockFlag, SockType};
use nix::sys::socket::{SockaddrIn, SockaddrIn6, UnixAddr};
use std::fs;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixListener;
use std::path::Path;
use thiserror::Error;

/// Error de la capa de red
#[derive(Debug, Error)]
pub enum NetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("system error: {0}")]
    Sys(#[from] nix::errno::Errno),

    #[error("could not resolve address: {0}")]
    Resolve(String),
}

/// Resuelve `host:port` a la primera dirección disponible.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr, NetError> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| NetError::Resolve(format!("{host}:{port}")))
}

/// Crea un listener TCP con SO_REUSEADDR y el backlog pedido.
///
/// Elige IPv4 o IPv6 según a qué resuelva `host`.
pub fn tcp_listener(host: &str, port: u16, backlog: i32) -> Result<TcpListener, NetError> {
    let addr = resolve(host, port)?;
    let family = if addr.is_ipv6() {
        AddressFamily::Inet6
    } else {
        AddressFamily::Inet
    };

    let fd = socket::socket(family, SockType::Stream, SockFlag::empty(), None)?;
    socket::setsockopt(&fd, sockopt::ReuseAddr, &true)?;
    match addr {
        SocketAddr::V4(v4) => socket::bind(fd.as_raw_fd(), &SockaddrIn::from(v4))?,
        SocketAddr::V6(v6) => socket::bind(fd.as_raw_fd(), &SockaddrIn6::from(v6))?,
    }
    socket::listen(&fd, Backlog::new(backlog)?)?;

    Ok(TcpListener::from(fd))
}

/// Crea un listener Unix en `path` con los permisos y backlog pedidos.
///
/// Si quedó un socket viejo en esa ruta se elimina antes del bind.
pub fn unix_listener(path: &Path, perm: u32, backlog: i32) -> Result<UnixListener, NetError> {
    if path.exists() {
        fs::remove_file(path)?;
    }

    let fd = socket::socket(
        AddressFamily::Unix,
        SockType::Stream,
        SockFlag::empty(),
        None,
    )?;
    let addr = UnixAddr::new(path)?;
    socket::bind(fd.as_raw_fd(), &addr)?;
    fs::set_permissions(path, fs::Permissions::from_mode(perm))?;
    socket::listen(&fd, Backlog::new(backlog)?)?;

    Ok(UnixListener::from(fd))
}

/// Activa (o desactiva) keep-alive en un socket TCP.
///
/// Con `idle_secs > 0` en Linux también ajusta el idle, el intervalo entre
/// sondas (un tercio del idle) y la cantidad de sondas.
pub fn set_keep_alive(sock: &impl AsFd, on: bool, idle_secs: u32) -> Result<(), NetError> {
    socket::setsockopt(sock, sockopt::KeepAlive, &on)?;

    #[cfg(any(target_os = "linux", target_os = "android"))]
    if on && idle_secs > 0 {
        let interval = std::cmp::max(idle_secs / 3, 1);
        socket::setsockopt(sock, sockopt::TcpKeepIdle, &idle_secs)?;
        socket::setsockopt(sock, sockopt::TcpKeepInterval, &interval)?;
        socket::setsockopt(sock, sockopt::TcpKeepCount, &3)?;
    }

    Ok(())
}
