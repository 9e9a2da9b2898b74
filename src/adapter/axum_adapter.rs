use super::{Adapter, RouteRegistration};
use crate::controller::Handler;
use crate::error::{Result, TrellisError};
use crate::exception::{ExceptionFilter, HttpExceptionFilter};
use crate::lifecycle::shutdown_signal;
use crate::metadata::HttpMethod;
use crate::middleware::{Middleware, MiddlewareChain};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::Request,
    routing::{MethodFilter, MethodRouter},
};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use tower_http::trace::TraceLayer;

type ShutdownFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Default transport: serves routes with axum.
pub struct AxumAdapter {
    host: String,
    port: u16,
    routes: BTreeMap<String, MethodRouter>,
    registered: HashSet<(HttpMethod, String)>,
    // Set once during startup, after routes are registered.
    filter: Arc<OnceLock<Arc<dyn ExceptionFilter>>>,
    shutdown: Option<ShutdownFuture>,
}

impl Default for AxumAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AxumAdapter {
    pub fn new() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            routes: BTreeMap::new(),
            registered: HashSet::new(),
            filter: Arc::new(OnceLock::new()),
            shutdown: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Stop serving when `signal` completes instead of on Ctrl+C/SIGTERM.
    pub fn shutdown_on<F>(mut self, signal: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.shutdown = Some(Box::pin(signal));
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn route_count(&self) -> usize {
        self.registered.len()
    }

    /// The axum router for every route registered so far.
    pub fn router(&self) -> Router {
        self.routes
            .iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(path, method_router.clone())
            })
            .layer(TraceLayer::new_for_http())
    }
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Head => MethodFilter::HEAD,
        HttpMethod::Options => MethodFilter::OPTIONS,
    }
}

/// Translate `:param` and `*rest` segments into axum's `{param}`/`{*rest}`.
pub fn to_axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                let name = if name.is_empty() { "wildcard" } else { name };
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl Adapter for AxumAdapter {
    type Middleware = MiddlewareChain;
    type Handler = Handler;

    fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    fn prepare_middlewares(&self, middlewares: Vec<Arc<dyn Middleware>>) -> MiddlewareChain {
        MiddlewareChain::new(middlewares)
    }

    fn prepare_handler(&self, handler: Handler) -> Handler {
        handler
    }

    fn register_route(&mut self, route: RouteRegistration<MiddlewareChain, Handler>) -> Result<()> {
        if !route.path.starts_with('/') {
            return Err(TrellisError::invalid_path(route.path, "must start with '/'"));
        }
        if !self.registered.insert((route.method, route.path.clone())) {
            return Err(TrellisError::RouteConflict {
                method: route.method.to_string(),
                path: route.path,
            });
        }

        let RouteRegistration {
            method,
            path,
            middleware: chain,
            handler,
        } = route;
        let filter = Arc::clone(&self.filter);
        let endpoint = move |request: Request<Body>| {
            let chain = chain.clone();
            let handler = Arc::clone(&handler);
            let filter = Arc::clone(&filter);
            async move {
                match chain.run(request, handler).await {
                    Ok(response) => response,
                    Err(error) => match filter.get() {
                        Some(filter) => filter.catch(error),
                        None => HttpExceptionFilter.catch(error),
                    },
                }
            }
        };

        let axum_path = to_axum_path(&path);
        let method_router = self
            .routes
            .remove(&axum_path)
            .unwrap_or_else(MethodRouter::new);
        self.routes
            .insert(axum_path, method_router.on(method_filter(method), endpoint));
        Ok(())
    }

    fn set_exception_filter(&mut self, filter: Arc<dyn ExceptionFilter>) {
        if self.filter.set(filter).is_err() {
            tracing::warn!("Exception filter already configured, keeping the first one");
        }
    }

    async fn start(&mut self) -> Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port)).await?;
        tracing::debug!("Listening on {}", listener.local_addr()?);

        let shutdown = self
            .shutdown
            .take()
            .unwrap_or_else(|| Box::pin(shutdown_signal()));
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::HandlerResult;
    use crate::error::BoxError;
    use crate::exception::HttpException;
    use crate::middleware::Next;
    use axum::{
        extract::FromRequestParts,
        extract::Path,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use tower::ServiceExt;

    fn echo_id() -> Handler {
        Arc::new(|request: Request<Body>| {
            Box::pin(async move {
                let (mut parts, _body) = request.into_parts();
                let Path(id) = Path::<String>::from_request_parts(&mut parts, &())
                    .await
                    .map_err(|e| Box::new(HttpException::bad_request(e.to_string())) as BoxError)?;
                Ok(id.into_response())
            })
        })
    }

    fn failing() -> Handler {
        Arc::new(|_request| {
            Box::pin(async move { Err(Box::new(HttpException::forbidden("nope")) as BoxError) })
        })
    }

    struct Teapot;

    impl ExceptionFilter for Teapot {
        fn catch(&self, _error: BoxError) -> Response {
            StatusCode::IM_A_TEAPOT.into_response()
        }
    }

    struct Stamp;

    #[async_trait]
    impl Middleware for Stamp {
        async fn handle(&self, request: Request<Body>, next: Next) -> HandlerResult {
            let mut response = next.run(request).await?;
            response
                .headers_mut()
                .insert("x-stamp", "1".parse().unwrap());
            Ok(response)
        }
    }

    fn register(adapter: &mut AxumAdapter, method: HttpMethod, path: &str, handler: Handler) -> Result<()> {
        let middleware = adapter.prepare_middlewares(vec![Arc::new(Stamp) as Arc<dyn Middleware>]);
        let handler = adapter.prepare_handler(handler);
        adapter.register_route(RouteRegistration {
            method,
            path: path.to_string(),
            middleware,
            handler,
        })
    }

    async fn call(router: Router, method: &str, uri: &str) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[test]
    fn test_to_axum_path() {
        assert_eq!(to_axum_path("/users/:id"), "/users/{id}");
        assert_eq!(to_axum_path("/files/*path"), "/files/{*path}");
        assert_eq!(to_axum_path("/files/*"), "/files/{*wildcard}");
        assert_eq!(to_axum_path("/"), "/");
    }

    #[tokio::test]
    async fn test_routes_serve_through_the_chain() {
        let mut adapter = AxumAdapter::new();
        register(&mut adapter, HttpMethod::Get, "/users/:id", echo_id()).unwrap();
        register(&mut adapter, HttpMethod::Delete, "/users/:id", failing()).unwrap();
        assert_eq!(adapter.route_count(), 2);

        let response = call(adapter.router(), "GET", "/users/42").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-stamp"], "1");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"42");

        let response = call(adapter.router(), "DELETE", "/users/42").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = call(adapter.router(), "POST", "/users/42").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_configured_filter_handles_errors() {
        let mut adapter = AxumAdapter::new();
        register(&mut adapter, HttpMethod::Get, "/fail", failing()).unwrap();
        adapter.set_exception_filter(Arc::new(Teapot));

        let response = call(adapter.router(), "GET", "/fail").await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn test_duplicate_route_conflicts() {
        let mut adapter = AxumAdapter::new();
        register(&mut adapter, HttpMethod::Get, "/a", failing()).unwrap();
        let err = register(&mut adapter, HttpMethod::Get, "/a", failing()).unwrap_err();
        assert!(matches!(err, TrellisError::RouteConflict { .. }));
        assert!(matches!(
            register(&mut adapter, HttpMethod::Get, "relative", failing()),
            Err(TrellisError::InvalidPath { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_serves_until_shutdown() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut adapter = AxumAdapter::new().host("127.0.0.1").shutdown_on(async {
            let _ = rx.await;
        });
        adapter.set_port(0);

        let server = tokio::spawn(async move { adapter.start().await });
        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
