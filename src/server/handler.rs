// src/server/handler.rs
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tower::Service;
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Config, ServerConfig};
use crate::health::{ConstantScorer, ServiceMonitor};
use crate::metrics::{HealthScoreExporter, MetricsRegistry};

pub const MONITOR_RESPONSE_BODY: &str = "API service monitor is running...";

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Routes `/metrics` to the exporter and `/monitor` to the manual trigger.
#[derive(Clone)]
pub struct RequestHandler {
    exporter: Arc<HealthScoreExporter>,
    monitor: Arc<ServiceMonitor>,
    routes: Arc<ServerConfig>,
}

impl RequestHandler {
    pub fn new(
        exporter: Arc<HealthScoreExporter>,
        monitor: Arc<ServiceMonitor>,
        routes: ServerConfig,
    ) -> Self {
        Self {
            exporter,
            monitor,
            routes: Arc::new(routes),
        }
    }

    /// Wire registry, scorer, monitor and exporter from a validated config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = MetricsRegistry::new()?;
        let scorer = ConstantScorer::new(config.scoring.constant_score)?;
        let monitor = Arc::new(ServiceMonitor::new(
            &config.monitor,
            Arc::new(scorer),
            Some(registry.collector()),
        )?);
        let exporter = Arc::new(HealthScoreExporter::new(registry, monitor.clone()));

        Ok(Self::new(exporter, monitor, config.server.clone()))
    }

    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let path = req.uri().path().to_owned();
        let method = req.method().clone();
        drop(req);

        if path == self.routes.metrics_path {
            match method {
                Method::GET | Method::HEAD => self.metrics().await,
                _ => text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
            }
        } else if path == self.routes.monitor_path {
            self.monitor().await
        } else {
            text_response(StatusCode::NOT_FOUND, "Not Found")
        }
    }

    async fn metrics(&self) -> Response<Body> {
        match self.exporter.scrape().await {
            Ok(buffer) => {
                let mut response = Response::new(Body::from(buffer));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(METRICS_CONTENT_TYPE));
                response
            }
            Err(e) => {
                error!(error = %e, "Failed to encode metrics");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    async fn monitor(&self) -> Response<Body> {
        // The fetch outcome never reaches the caller.
        let monitor = self.monitor.clone();
        run_detached(async move { monitor.trigger().await }).await;

        text_response(StatusCode::OK, MONITOR_RESPONSE_BODY)
    }
}

/// Run `task` on its own tokio task and wait for it, so a dropped request
/// does not cancel it. A panic is logged and yields `None`.
async fn run_detached<T, F>(task: F) -> Option<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(task).await {
        Ok(output) => Some(output),
        Err(e) => {
            warn!(error = %e, "Detached task failed");
            None
        }
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
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
        let span = info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path(),
        );

        Box::pin(async move { Ok(handler.handle(req).await) }.instrument(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::unreachable_url;
    use tower::ServiceExt;
    use url::Url;

    fn handler_for(api_endpoint: Url) -> RequestHandler {
        let mut config = Config::default();
        config.monitor.api_endpoint = api_endpoint;
        config.monitor.poll_interval_secs = 2;
        RequestHandler::from_config(&config).unwrap()
    }

    async fn send(handler: RequestHandler, method: Method, path: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = handler.oneshot(req).await.unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_monitor_returns_ok_when_endpoint_unreachable() {
        let handler = handler_for(unreachable_url());

        for method in [Method::GET, Method::POST, Method::PUT] {
            let (status, body) = send(handler.clone(), method, "/monitor").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, MONITOR_RESPONSE_BODY);
        }
    }

    #[tokio::test]
    async fn test_monitor_triggers_a_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/health")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let handler = handler_for(Url::parse(&format!("{}/api/health", server.url())).unwrap());

        let (status, _) = send(handler, Method::GET, "/monitor").await;

        assert_eq!(status, StatusCode::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_metrics_exposes_health_score() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body("fine")
            .create_async()
            .await;
        let handler = handler_for(Url::parse(&format!("{}/api/health", server.url())).unwrap());

        let req = Request::get("/metrics").body(Body::empty()).unwrap();
        let response = handler.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            METRICS_CONTENT_TYPE
        );
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("e5u6_api_service_health_score 1"));
    }

    #[tokio::test]
    async fn test_metrics_zero_when_endpoint_unreachable() {
        let handler = handler_for(unreachable_url());

        let (status, body) = send(handler, Method::GET, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("e5u6_api_service_health_score 0"));
    }

    #[tokio::test]
    async fn test_metrics_answers_head() {
        let handler = handler_for(unreachable_url());

        let req = Request::head("/metrics").body(Body::empty()).unwrap();
        let response = handler.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            METRICS_CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_run_detached_survives_panicking_task() {
        assert_eq!(run_detached(async { 7 }).await, Some(7));

        let panicked: Option<()> = run_detached(async { panic!("trigger blew up") }).await;
        assert!(panicked.is_none());
    }

    #[tokio::test]
    async fn test_metrics_rejects_other_methods() {
        let handler = handler_for(unreachable_url());
        let (status, _) = send(handler, Method::POST, "/metrics").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let handler = handler_for(unreachable_url());
        let (status, body) = send(handler, Method::GET, "/healthz").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn test_custom_routes() {
        let mut config = Config::default();
        config.monitor.api_endpoint = unreachable_url();
        config.server.monitor_path = "/trigger".to_string();
        let handler = RequestHandler::from_config(&config).unwrap();

        let (status, _) = send(handler.clone(), Method::GET, "/trigger").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(handler, Method::GET, "/monitor").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
