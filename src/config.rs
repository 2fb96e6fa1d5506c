//! # Configuración del Demonio
//! src/config.rs
//!
//! Configuración de `catfsd` con soporte para argumentos CLI y variables de
//! entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./catfsd --port 8080 --dir /srv/files --user nobody --workers 8
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! CATFSD_PORT=8080 CATFSD_DIR=/srv/files ./catfsd
//! ```

use clap::Parser;

/// Configuración del demonio de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "catfsd")]
#[command(about = "Demonio concurrente para servir archivos estáticos")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el demonio
    #[arg(short, long, default_value = "8080", env = "CATFSD_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "CATFSD_HOST")]
    pub host: String,

    /// Directorio a servir
    #[arg(short, long, default_value = ".", env = "CATFSD_DIR")]
    pub dir: String,

    /// Usuario sin privilegios al que cambiar después del bind
    #[arg(short, long, env = "CATFSD_USER")]
    pub user: Option<String>,

    /// Número de workers del pool de conexiones
    #[arg(short, long, default_value = "4", env = "CATFSD_WORKERS")]
    pub workers: usize,

    /// Backlog del socket de escucha
    #[arg(long, default_value = "64", env = "CATFSD_BACKLOG")]
    pub backlog: i32,

    /// Segundos de idle para keep-alive TCP (0 = deshabilitado)
    #[arg(long = "keep-alive", default_value = "0", env = "CATFSD_KEEPALIVE")]
    pub keep_alive_secs: u32,
}

impl Config {
    /// Crea la configuración parseando argumentos CLI y entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para el bind (host:port)
    ///
    /// # Ejemplo
    /// ```
    /// use servkit::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración; retorna el primer valor inválido
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be >= 1".to_string());
        }
        if self.backlog <= 0 {
            return Err("backlog must be >= 1".to_string());
        }
        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("⚙️  Configuración:");
        println!("   Dirección:   {}", self.address());
        println!("   Directorio:  {}", self.dir);
        println!(
            "   Usuario:     {}",
            self.user.as_deref().unwrap_or("(sin cambio)")
        );
        println!("   Workers:     {}", self.workers);
        println!("   Backlog:     {}", self.backlog);
        if self.keep_alive_secs > 0 {
            println!("   Keep-alive:  {} s", self.keep_alive_secs);
        } else {
            println!("   Keep-alive:  deshabilitado");
        }
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            dir: ".".to_string(),
            user: None,
            workers: 4,
            backlog: 64,
            keep_alive_secs: 0,
        }
    }
}
