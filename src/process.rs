//! # Operaciones de Proceso
//! src/process.rs
//!
//! Cambio de usuario (privilege drop) y de directorio de trabajo para el
//! demonio. El orden importa: primero bind del puerto privilegiado, después
//! setgid/setuid, y recién entonces servir.

use nix::unistd::{setgid, setuid, User};
use std::path::Path;
use thiserror::Error;

/// Error al soltar privilegios
#[derive(Debug, Error)]
pub enum PrivilegeError {
    /// El usuario no existe en el sistema
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("system error: {0}")]
    Sys(#[from] nix::errno::Errno),
}

/// Cambia el proceso al usuario indicado (setgid antes que setuid, porque
/// después de setuid ya no hay permiso para cambiar de grupo).
pub fn drop_privileges(username: &str) -> Result<(), PrivilegeError> {
    let user = User::from_name(username)?
        .ok_or_else(|| PrivilegeError::UnknownUser(username.to_string()))?;

    setgid(user.gid)?;
    setuid(user.uid)?;
    Ok(())
}

/// Cambia el directorio de trabajo del proceso.
pub fn change_dir(dir: &Path) -> std::io::Result<()> {
    std::env::set_current_dir(dir)
}
