//! HTTP export of named canvases.
//!
//! `GET /` (or `/index.html`) lists the shared canvases, `GET /<name>.png`
//! serves one as PNG. The map is republished wholesale under a single write
//! lock, so a request sees either the old set or the new one.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use image::RgbaImage;
use parking_lot::RwLock;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tokio::net::TcpListener;

use crate::error::ExportError;
use crate::io::encode_png;

pub const NO_CANVASES_PAGE: &str =
    "<html><body><h1>No canvases shared - web export offline.</h1></body></html>";
pub const NOT_FOUND_PAGE: &str = "<html><body><h1>404 - Not Found</h1></body></html>";

/// Characters escaped when a canvas name goes into a link path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Named canvases visible to the export server.
#[derive(Debug, Default)]
pub struct SharedCanvases {
    images: RwLock<HashMap<String, Arc<RgbaImage>>>,
}

impl SharedCanvases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set: clear, then insert, under one write lock.
    pub fn publish<I>(&self, canvases: I)
    where
        I: IntoIterator<Item = (String, RgbaImage)>,
    {
        let mut map = self.images.write();
        map.clear();
        for (name, image) in canvases {
            map.insert(name, Arc::new(image));
        }
        log::info!("export: {} canvas(es) published", map.len());
    }

    pub fn get(&self, name: &str) -> Option<Arc<RgbaImage>> {
        self.images.read().get(name).cloned()
    }

    /// Shared names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.images.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }
}

/// Response for one request path, independent of the HTTP stack.
#[derive(Debug, PartialEq, Eq)]
pub enum ExportResponse {
    Html { status: StatusCode, body: String },
    Png(Vec<u8>),
}

impl ExportResponse {
    fn not_found() -> Self {
        ExportResponse::Html {
            status: StatusCode::NOT_FOUND,
            body: NOT_FOUND_PAGE.to_string(),
        }
    }
}

impl IntoResponse for ExportResponse {
    fn into_response(self) -> Response {
        match self {
            ExportResponse::Html { status, body } => {
                (status, [(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
            }
            ExportResponse::Png(bytes) => {
                (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes).into_response()
            }
        }
    }
}

/// Resolve a request path against the shared map. `path` is the raw
/// request path; percent escapes are decoded before lookup.
pub fn respond(shared: &SharedCanvases, path: &str) -> ExportResponse {
    let path = percent_decode_str(path).decode_utf8_lossy();
    let path = path.as_ref();
    if path == "/" || path == "/index.html" {
        return ExportResponse::Html {
            status: StatusCode::OK,
            body: index_page(&shared.names()),
        };
    }

    let Some(name) = path.strip_prefix('/').and_then(|p| p.strip_suffix(".png")) else {
        return ExportResponse::not_found();
    };
    let Some(image) = shared.get(name) else {
        return ExportResponse::not_found();
    };
    match encode_png(&image) {
        Ok(bytes) => ExportResponse::Png(bytes),
        Err(e) => {
            log::error!("export: could not encode '{}': {}", name, e);
            ExportResponse::Html {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "<html><body><h1>500 - Encoding failed</h1></body></html>".to_string(),
            }
        }
    }
}

fn index_page(names: &[String]) -> String {
    if names.is_empty() {
        return NO_CANVASES_PAGE.to_string();
    }
    let mut html = String::from("<html><body><h1>Shared Canvases</h1><ul>");
    for name in names {
        let href = utf8_percent_encode(name, PATH_SEGMENT);
        let label = escape_html(name);
        html.push_str(&format!("<li><a href=\"/{href}.png\">{label}</a></li>"));
    }
    html.push_str("</ul></body></html>");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

async fn handle(State(shared): State<Arc<SharedCanvases>>, uri: Uri) -> Response {
    log::debug!("export: GET {}", uri.path());
    respond(&shared, uri.path()).into_response()
}

pub fn router(shared: Arc<SharedCanvases>) -> Router {
    Router::new().fallback(handle).with_state(shared)
}

/// Serve on an already bound listener until the server fails.
pub async fn serve_on(listener: TcpListener, shared: Arc<SharedCanvases>) -> Result<(), ExportError> {
    axum::serve(listener, router(shared))
        .await
        .map_err(ExportError::Serve)
}

/// Bind `addr` and serve.
pub async fn serve(shared: Arc<SharedCanvases>, addr: SocketAddr) -> Result<(), ExportError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ExportError::Bind { port: addr.port(), source })?;
    log::info!("export server listening on http://{}", addr);
    serve_on(listener, shared).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_escaped() {
        let page = index_page(&["a<b".to_string()]);
        assert!(page.contains("href=\"/a%3Cb.png\""));
        assert!(page.contains(">a&lt;b</a>"));
    }

    #[test]
    fn links_percent_encode_names() {
        let page = index_page(&["my pic".to_string(), "zürich".to_string()]);
        assert!(page.contains("href=\"/my%20pic.png\">my pic</a>"));
        assert!(page.contains("href=\"/z%C3%BCrich.png\">zürich</a>"));
    }
}
