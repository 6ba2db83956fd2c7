//! Local preview server for the build output.
//!
//! A single-threaded `tiny_http` loop over the output directory:
//!
//! 1. Exact file match → serve the file
//! 2. Directory → serve its `index.html`
//! 3. Anything else → the site's `404.html`, or a small built-in page
//!
//! Request paths containing `..` never leave the output directory.

use maud::{DOCTYPE, html};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot bind {addr}: {message}")]
    Bind { addr: String, message: String },
}

/// Where a request path leads.
#[derive(Debug, PartialEq)]
pub enum Resolution {
    Found(PathBuf),
    /// The site's own 404 page, when it has one.
    NotFound(Option<PathBuf>),
}

/// Map a request URL onto the output directory.
pub fn resolve_request(root: &Path, url: &str) -> Resolution {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let relative = Path::new(path.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if !escapes {
        let local = root.join(relative);
        if local.is_file() {
            return Resolution::Found(local);
        }
        let index = local.join("index.html");
        if local.is_dir() && index.is_file() {
            return Resolution::Found(index);
        }
    }
    let custom = root.join("404.html");
    Resolution::NotFound(custom.is_file().then_some(custom))
}

/// Guess a MIME type from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn not_found_page(url: &str) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head { meta charset="utf-8"; title { "Not found" } }
            body {
                h1 { "404" }
                p { "Nothing is built at " code { (url) } "." }
            }
        }
    }
    .into_string()
}

fn header(value: &str) -> Option<Header> {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).ok()
}

fn respond(request: Request, status: u16, body: Vec<u8>, mime: &str) -> std::io::Result<()> {
    let mut response = Response::from_data(body).with_status_code(StatusCode(status));
    if let Some(h) = header(mime) {
        response = response.with_header(h);
    }
    request.respond(response)
}

fn handle(request: Request, root: &Path) -> std::io::Result<()> {
    let url = request.url().to_string();
    match resolve_request(root, &url) {
        Resolution::Found(path) => {
            let body = fs::read(&path)?;
            tracing::debug!(url = %url, status = 200, "served");
            respond(request, 200, body, content_type(&path))
        }
        Resolution::NotFound(custom) => {
            tracing::debug!(url = %url, status = 404, "served");
            let body = match custom {
                Some(path) => fs::read(path)?,
                None => not_found_page(&url).into_bytes(),
            };
            respond(request, 404, body, "text/html; charset=utf-8")
        }
    }
}

/// Serve `root` on `host:port` until the process is stopped.
pub fn serve(root: &Path, host: &str, port: u16) -> Result<(), ServeError> {
    let addr = format!("{host}:{port}");
    let server = Server::http(&addr).map_err(|e| ServeError::Bind {
        addr: addr.clone(),
        message: e.to_string(),
    })?;
    tracing::info!(url = %format!("http://{addr}/"), root = %root.display(), "serving");
    for request in server.incoming_requests() {
        if let Err(e) = handle(request, root) {
            tracing::warn!(error = %e, "request failed");
        }
    }
    Ok(())
}
