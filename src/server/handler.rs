// src/server/handler.rs
use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::time::Instant;
use tower::Service;
use uuid::Uuid;

use crate::status::StatusService;

pub const HEALTH_BODY: &str = r#"{"status":"ok"}"#;

/// Routes `/api/status` and `/health`; everything else is a bare 404.
#[derive(Clone)]
pub struct RequestHandler {
    service: StatusService,
    cors: bool,
}

impl RequestHandler {
    pub fn new(service: StatusService) -> Self {
        let cors = service.config().server.cors;
        Self { service, cors }
    }

    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let request_id = Uuid::new_v4();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let mut response = match (&method, path.as_str()) {
            (&Method::OPTIONS, _) if self.cors => empty(StatusCode::OK),
            (&Method::GET, "/api/status") => self.status().await,
            (&Method::GET, "/health") => json(HEALTH_BODY),
            _ => empty(StatusCode::NOT_FOUND),
        };

        if self.cors {
            apply_cors(response.headers_mut());
        }

        let elapsed = start.elapsed();
        let status = response.status().as_u16();
        tracing::info!(
            target: "access",
            %request_id,
            %method,
            %path,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "[StatusServer] \"{} {}\" {}",
            method,
            path,
            status
        );

        if let Some(metrics) = self.service.metrics() {
            metrics.record_request(method.as_str(), &path, status, elapsed);
        }

        response
    }

    async fn status(&self) -> Response<Body> {
        let report = self.service.report().await;
        match serde_json::to_vec(&report) {
            Ok(body) => json(body),
            Err(e) => {
                tracing::error!(%e, "failed to serialize status report");
                empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}

fn empty(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn json(body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}
