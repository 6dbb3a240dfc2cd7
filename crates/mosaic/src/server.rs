//! Blocking HTTP front end.
//!
//! ```text
//!            ┌──────────────┐
//!  Ctrl+C ──►│ shutdown flag│──► unblock() × workers
//!            └──────────────┘
//!   tiny_http::Server ──recv()──► worker 1..N ──► routes::dispatch ──► App
//! ```
//!
//! Every worker pulls from the same listener, so requests are handled in
//! parallel up to the configured worker count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use tiny_http::{Header, Request, Response, Server, StatusCode};

use crate::app::App;
use crate::routes::{dispatch, fragment_requested, Reply, Route};

/// Serves `app` until Ctrl+C.
pub fn serve(app: &App) -> Result<()> {
    let config = app.config();
    let server = Server::http(&config.bind)
        .map_err(|e| anyhow!("Failed to bind {}: {e}", config.bind))?;
    let server = Arc::new(server);
    let workers = config.workers.max(1);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let server = Arc::clone(&server);
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            tracing::info!("shutting down");
            shutdown.store(true, Ordering::SeqCst);
            for _ in 0..workers {
                server.unblock();
            }
        })
        .context("Failed to set Ctrl+C handler")?;
    }

    let html = Header::from_bytes("Content-Type", "text/html; charset=utf-8")
        .map_err(|()| anyhow!("invalid content type header"))?;

    tracing::info!(bind = %config.bind, workers, "listening on http://{}", config.bind);

    thread::scope(|scope| {
        for worker in 0..workers {
            let server = &server;
            let shutdown = &shutdown;
            let html = &html;
            scope.spawn(move || loop {
                match server.recv() {
                    Ok(request) => handle(app, request, html),
                    Err(_) if shutdown.load(Ordering::SeqCst) => break,
                    Err(e) => tracing::warn!(worker, error = %e, "failed to receive request"),
                }
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
            });
        }
    });

    tracing::info!("server stopped");
    Ok(())
}

fn handle(app: &App, mut request: Request, html: &Header) {
    let method = request.method().to_string();
    let url = request.url().to_string();
    let route = Route::parse(&method, &url);
    let fragment = wants_fragment(&request, &app.config().fragment_header);

    let mut body = String::new();
    let reply = match request.as_reader().read_to_string(&mut body) {
        Ok(_) => dispatch(app, &route, fragment, &body),
        Err(e) => Reply::status(400, format!("unreadable request body: {e}")),
    };
    tracing::debug!(%method, %url, status = reply.status, "handled request");

    let response = Response::from_string(reply.body)
        .with_status_code(StatusCode(reply.status))
        .with_header(html.clone());
    if let Err(e) = request.respond(response) {
        tracing::warn!(%url, error = %e, "failed to send response");
    }
}

fn wants_fragment(request: &Request, header: &str) -> bool {
    fragment_requested(
        request
            .headers()
            .iter()
            .map(|h| (h.field.as_str().as_str(), h.value.as_str())),
        header,
    )
}
