//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para armar respuestas HTTP/1.0 y convertirlas a bytes. Para cuerpos
//! chicos (errores, JSON de estado) se usa `to_bytes`; para servir archivos
//! el demonio escribe `head_bytes` y después streamea el cuerpo en chunks.

use super::StatusCode;
use std::collections::HashMap;

/// Representa una respuesta HTTP/1.0
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers HTTP; HashMap para evitar duplicados
    headers: HashMap<String, String>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header (estilo builder); si ya existe se sobrescribe
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Agrega un header a una respuesta existente
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el body y calcula `Content-Length`
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self.headers
            .insert("Content-Length".to_string(), self.body.len().to_string());
        self
    }

    /// Respuesta JSON exitosa (200 OK)
    ///
    /// # Ejemplo
    /// ```
    /// use servkit::http::Response;
    ///
    /// let response = Response::json(r#"{"status": "ok"}"#);
    /// assert!(response.to_bytes().starts_with(b"HTTP/1.0 200 OK"));
    /// ```
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Respuesta de error con cuerpo JSON `{"error": "mensaje"}`.
    ///
    /// El mensaje puede venir de bytes del cliente (por ejemplo un método
    /// desconocido), así que se serializa con escapado y no por formateo.
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(&body)
    }

    /// Status line + headers + línea vacía, sin el body.
    ///
    /// Para respuestas que streamean el cuerpo directo al socket (archivos);
    /// al no conocer el tamaño por adelantado no se emite `Content-Length` y
    /// el fin del cuerpo lo marca el cierre de la conexión, como permite
    /// HTTP/1.0.
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        let status_line = format!("HTTP/1.0 {}\r\n", self.status);
        result.extend_from_slice(status_line.as_bytes());

        for (name, value) in &self.headers {
            let header_line = format!("{}: {}\r\n", name, value);
            result.extend_from_slice(header_line.as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result
    }

    /// Respuesta completa lista para enviar por el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    /// Código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers de la respuesta
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Body de la respuesta
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response() {
        let response = Response::new(StatusCode::Ok);
        assert_eq!(response.status(), StatusCode::Ok);
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_with_body_sets_content_length() {
        let response = Response::new(StatusCode::Ok).with_body("Hello World");
        assert_eq!(response.body(), b"Hello World");
        assert_eq!(
            response.headers().get("Content-Length"),
            Some(&"11".to_string())
        );
    }

    #[test]
    fn test_error_response() {
        let response = Response::error(StatusCode::NotFound, "no such file");
        assert_eq!(response.status(), StatusCode::NotFound);

        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(text.contains("no such file"));
    }

    #[test]
    fn test_error_response_escapes_message() {
        // Un método inventado con comillas termina dentro del mensaje; el
        // body tiene que seguir siendo JSON válido
        let message = r#"unsupported HTTP method: G"ET"#;
        let response = Response::error(StatusCode::BadRequest, message);

        let parsed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(parsed["error"], message);
    }

    #[test]
    fn test_head_bytes_has_no_body() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_body("contenido");

        let head = String::from_utf8(response.head_bytes()).unwrap();
        assert!(head.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(head.contains("Content-Type: text/plain\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
        assert!(!head.contains("contenido"));
    }

    #[test]
    fn test_to_bytes_appends_body() {
        let response = Response::new(StatusCode::Ok).with_body("Test");
        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.ends_with("\r\n\r\nTest"));
    }
}
