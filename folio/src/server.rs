//! Minimal hyper-based proxy that puts the router in front of the book origin.
//! Feature-gated behind `server`.
//!
//! Every request is mapped onto the configured origin and routed through
//! [`OfflineRouter::handle_fetch`]. Router events are exposed under
//! `/__folio/`.
use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use folio_cache::{CachedResponse, FetchRequest, RequestMode};
use http_body_util::{BodyExt, Full};
use hyper::{
    Method, Request, Response, StatusCode,
    body::Incoming,
    header::{self, HeaderName, HeaderValue},
    service::service_fn,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{debug, info, warn};
use url::Url;

use crate::{ControlMessage, FetchDisposition, OfflineRouter};

pub const CONTROL_PREFIX: &str = "/__folio/";

/// Request headers that belong to the client connection and are not sent on.
/// `accept-encoding` stays local so stored copies are never compressed.
const LOCAL_HEADERS: &[HeaderName] = &[
    header::HOST,
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
    header::ACCEPT_ENCODING,
];

type RespBody = Full<Bytes>;
type ServeResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn build_response(
    status: StatusCode,
    body: impl Into<Bytes>,
) -> Response<RespBody> {
    let mut resp = Response::new(Full::new(body.into()));
    *resp.status_mut() = status;
    resp
}

fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> Response<RespBody> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
    let mut resp = build_response(status, body);
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}

/// Turn a router response into a hyper one. Headers that are not valid HTTP
/// are dropped, the body length is recomputed.
fn to_http_response(response: CachedResponse) -> Response<RespBody> {
    let status = StatusCode::from_u16(response.status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut resp = build_response(status, response.body);
    let headers = resp.headers_mut();
    for (name, value) in &response.headers {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            continue;
        };
        if name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name, value);
    }
    resp
}

/// Why an incoming request could not be mapped onto the book origin.
#[derive(Debug, thiserror::Error)]
enum TargetError {
    #[error("request target leaves the book origin: {0}")]
    ForeignOrigin(Url),
}

/// Map an incoming proxy request onto the book origin.
///
/// The target path is set on a copy of the origin, never joined onto it, so
/// a target such as `//other.host/x` stays a path on the book host.
fn to_fetch_request<B>(
    req: &Request<B>,
    body: Bytes,
    router: &OfflineRouter,
) -> Result<FetchRequest, TargetError> {
    let mut url = router.classifier().origin().clone();
    url.set_path(req.uri().path());
    url.set_query(req.uri().query());
    if !router.classifier().is_same_origin(&url) {
        return Err(TargetError::ForeignOrigin(url));
    }

    let navigate = req
        .headers()
        .get("sec-fetch-mode")
        .is_some_and(|mode| mode.as_bytes() == b"navigate");
    let mode = if navigate {
        RequestMode::Navigate
    } else {
        RequestMode::default()
    };

    let mut headers = req.headers().clone();
    for name in LOCAL_HEADERS {
        headers.remove(name);
    }

    Ok(FetchRequest {
        method: req.method().clone(),
        url,
        mode,
        headers,
        body,
    })
}

#[derive(Debug, Deserialize)]
struct SyncEvent {
    tag: String,
}

#[derive(Debug, Default, Deserialize)]
struct ClickEvent {
    #[serde(default)]
    action: Option<String>,
}

async fn handle_control(
    method: &Method,
    path: &str,
    body: Bytes,
    router: &OfflineRouter,
) -> Response<RespBody> {
    match (method, path) {
        (&Method::GET, "healthz") => build_response(StatusCode::OK, "ok"),
        (&Method::POST, "message") => {
            let value: serde_json::Value = match serde_json::from_slice(&body) {
                Ok(value) => value,
                Err(err) => {
                    return build_response(StatusCode::BAD_REQUEST, err.to_string());
                }
            };
            if ControlMessage::parse(&value) == Some(ControlMessage::GetVersion) {
                let (tx, rx) = oneshot::channel();
                router
                    .handle_message(ControlMessage::GetVersion, Some(tx))
                    .await;
                return match rx.await {
                    Ok(reply) => json_response(StatusCode::OK, &reply),
                    Err(_) => {
                        build_response(StatusCode::INTERNAL_SERVER_ERROR, "")
                    }
                };
            }
            router.handle_raw_message(&value, None).await;
            build_response(StatusCode::ACCEPTED, "")
        }
        (&Method::POST, "sync") => {
            match serde_json::from_slice::<SyncEvent>(&body) {
                Ok(event) => match router.handle_sync(&event.tag).await {
                    Some(report) => json_response(StatusCode::OK, &report),
                    None => build_response(StatusCode::ACCEPTED, ""),
                },
                Err(err) => {
                    build_response(StatusCode::BAD_REQUEST, err.to_string())
                }
            }
        }
        (&Method::POST, "push") => {
            let data = (!body.is_empty()).then_some(&body[..]);
            match router.handle_push(data).await {
                Ok(Some(notification)) => {
                    json_response(StatusCode::OK, &notification)
                }
                Ok(None) => build_response(StatusCode::NO_CONTENT, ""),
                Err(err) => {
                    build_response(StatusCode::BAD_REQUEST, err.to_string())
                }
            }
        }
        (&Method::POST, "notification-click") => {
            let event = if body.is_empty() {
                Ok(ClickEvent::default())
            } else {
                serde_json::from_slice::<ClickEvent>(&body)
            };
            match event {
                Ok(event) => {
                    router
                        .handle_notification_click(event.action.as_deref())
                        .await;
                    build_response(StatusCode::NO_CONTENT, "")
                }
                Err(err) => {
                    build_response(StatusCode::BAD_REQUEST, err.to_string())
                }
            }
        }
        _ => build_response(StatusCode::NOT_FOUND, "not found"),
    }
}

async fn handle(
    req: Request<Incoming>,
    router: Arc<OfflineRouter>,
) -> Result<Response<RespBody>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            return Ok(build_response(StatusCode::BAD_REQUEST, err.to_string()));
        }
    };
    let req = Request::from_parts(parts, ());

    if let Some(path) = req.uri().path().strip_prefix(CONTROL_PREFIX) {
        return Ok(handle_control(req.method(), path, body, &router).await);
    }

    let request = match to_fetch_request(&req, body, &router) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected request target");
            return Ok(build_response(StatusCode::BAD_REQUEST, err.to_string()));
        }
    };

    let response = match router.handle_fetch(&request).await {
        FetchDisposition::Respond(response) => to_http_response(response),
        FetchDisposition::Passthrough => match router.passthrough(&request).await {
            Ok(response) => to_http_response(response),
            Err(err) => {
                warn!(url = %request.url, error = %err, "passthrough failed");
                build_response(StatusCode::BAD_GATEWAY, "bad gateway")
            }
        },
    };
    debug!(
        method = %request.method,
        url = %request.url,
        status = response.status().as_u16(),
        "served"
    );
    Ok(response)
}

/// Serve connections from `listener` until accepting fails.
pub async fn serve(
    listener: TcpListener,
    router: Arc<OfflineRouter>,
) -> ServeResult {
    info!(addr = ?listener.local_addr().ok(), "proxy listening");
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let router = router.clone();
        let service = service_fn(move |req| handle(req, router.clone()));
        tokio::spawn(async move {
            if let Err(err) = Builder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                tracing::error!(?err, "proxy connection error");
            }
        });
    }
}

/// Start the proxy on the given address.
pub async fn bind_and_serve(
    addr: SocketAddr,
    router: Arc<OfflineRouter>,
) -> ServeResult {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, router).await
}
