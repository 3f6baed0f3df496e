//! HTTP/1 transport bridging hyper to the application.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request as HyperRequest, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use quill_router::{App, Method, Request, Response};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Accepts connections on `addr` until Ctrl-C.
pub async fn serve(app: App, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    serve_listener(Arc::new(app), listener).await
}

/// Accepts connections on an already bound listener until Ctrl-C.
pub async fn serve_listener(app: Arc<App>, listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
        };

        let io = TokioIo::new(stream);
        let app = Arc::clone(&app);

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let app = Arc::clone(&app);
                async move { Ok::<_, Infallible>(handle_request(req, &app).await) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!(%peer, error = %err, "error serving connection");
            }
        });
    }
}

/// Converts a hyper request, runs it through the app and converts back.
pub async fn handle_request<B>(req: HyperRequest<B>, app: &App) -> HyperResponse<Full<Bytes>>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let Some(method) = Method::parse(req.method().as_str()) else {
        warn!(method = %req.method(), "unsupported method");
        let mut res = Response::new();
        res.set_header("Content-Type", "application/json");
        res.emit_raw(json!({"message": "Method not supported"}).to_string(), 501);
        return into_hyper(res);
    };

    let (parts, body) = req.into_parts();
    let headers: Vec<(String, String)> = parts
        .headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(error = %err, "failed to read request body");
            Bytes::new()
        }
    };

    let request = Request::from_parts(method, parts.uri.path(), parts.uri.query(), headers, &body);
    into_hyper(app.handle(request).await)
}

fn into_hyper(res: Response) -> HyperResponse<Full<Bytes>> {
    let (status, headers, body) = res.into_parts();

    let mut response = HyperResponse::new(Full::new(Bytes::from(body)));
    *response.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (key, value) in headers {
        match (
            hyper::header::HeaderName::from_bytes(key.as_bytes()),
            hyper::header::HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = key, "dropping invalid response header"),
        }
    }
    response
}
