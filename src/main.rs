//! # catfsd
//! src/main.rs
//!
//! Punto de entrada del demonio de archivos.

use servkit::config::Config;
use servkit::server::FileServer;

fn main() {
    println!("📂 catfsd - Demonio de Archivos Estáticos");
    println!("==========================================\n");

    let config = Config::new();
    if let Err(err) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", err);
        std::process::exit(1);
    }
    config.print_summary();

    let mut server = FileServer::new(config);
    if let Err(err) = server.run() {
        eprintln!("💥 Error fatal: {}", err);
        std::process::exit(1);
    }
}
