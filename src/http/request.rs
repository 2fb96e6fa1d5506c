//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser mínimo: al demonio de archivos solo le importa la request line
//! (`GET /ruta HTTP/1.0`). Los headers del cliente se ignoran.

use thiserror::Error;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un archivo
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,
}

impl Method {
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
        }
    }
}

/// Errores de parsing de la request line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request vacío
    #[error("empty request")]
    EmptyRequest,

    /// La request line no es texto válido
    #[error("request line is not valid UTF-8")]
    InvalidEncoding,

    /// Formato inválido de la request line
    #[error("invalid request line format")]
    InvalidRequestLine,

    /// Método HTTP no soportado
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// Request HTTP/1.0 reducido a lo que el demonio usa: método y path.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
}

impl Request {
    /// Parsea la request line desde los bytes recibidos del socket.
    ///
    /// La query string, si la hay, se descarta: el demonio sirve archivos
    /// por ruta.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use servkit::http::Request;
    ///
    /// let request = Request::parse(b"GET /notas.txt HTTP/1.0\r\n\r\n").unwrap();
    /// assert_eq!(request.path(), "/notas.txt");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let line_end = buffer
            .windows(2)
            .position(|pair| pair == b"\r\n")
            .unwrap_or(buffer.len());
        let line =
            std::str::from_utf8(&buffer[..line_end]).map_err(|_| ParseError::InvalidEncoding)?;

        let mut parts = line.split_whitespace();
        let method = parts.next().ok_or(ParseError::InvalidRequestLine)?;
        let target = parts.next().ok_or(ParseError::InvalidRequestLine)?;
        let _version = parts.next().ok_or(ParseError::InvalidRequestLine)?;

        let method = Method::from_str(method)?;
        let path = target.split('?').next().unwrap_or(target).to_string();

        Ok(Self { method, path })
    }

    /// Método de la petición
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path pedido, sin query string
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get() {
        let request = Request::parse(b"GET /index.html HTTP/1.0\r\nHost: x\r\n\r\n").unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/index.html");
    }

    #[test]
    fn test_parse_head() {
        let request = Request::parse(b"HEAD / HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.method(), Method::HEAD);
        assert_eq!(request.path(), "/");
    }

    #[test]
    fn test_query_string_is_dropped() {
        let request = Request::parse(b"GET /datos.json?full=1 HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/datos.json");
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(Request::parse(b"").unwrap_err(), ParseError::EmptyRequest);
    }

    #[test]
    fn test_unsupported_method() {
        let err = Request::parse(b"DELETE /x HTTP/1.0\r\n\r\n").unwrap_err();
        assert_eq!(err, ParseError::UnsupportedMethod("DELETE".to_string()));
    }

    #[test]
    fn test_garbage_request_line() {
        assert!(Request::parse(b"\x00\x01\x02garbage").is_err());
        assert_eq!(
            Request::parse(b"GET\r\n\r\n").unwrap_err(),
            ParseError::InvalidRequestLine
        );
    }
}
