//! Request middleware and chain execution.

use crate::controller::{Handler, HandlerFuture, HandlerResult};
use async_trait::async_trait;
use axum::{body::Body, http::Request};
use std::sync::Arc;

/// Represents the rest of the chain
pub struct Next {
    run: Box<dyn FnOnce(Request<Body>) -> HandlerFuture + Send>,
}

impl Next {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Request<Body>) -> HandlerFuture + Send + 'static,
    {
        Self { run: Box::new(f) }
    }

    /// Pass the request on to the next middleware, or the handler.
    pub async fn run(self, request: Request<Body>) -> HandlerResult {
        (self.run)(request).await
    }
}

/// A middleware component.
///
/// Middleware can short-circuit by returning without calling `next`.
///
/// # Example
/// ```rust,ignore
/// #[derive(Default)]
/// struct RequireJson;
///
/// #[async_trait]
/// impl Middleware for RequireJson {
///     async fn handle(&self, request: Request<Body>, next: Next) -> HandlerResult {
///         if request.headers().get(CONTENT_TYPE) != Some(&HeaderValue::from_static("application/json")) {
///             return Err(HttpException::bad_request("expected JSON").into());
///         }
///         next.run(request).await
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, request: Request<Body>, next: Next) -> HandlerResult;
}

/// An ordered, shareable middleware chain. The first entry runs outermost.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            middlewares: Arc::new(middlewares),
        }
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run the request through every middleware, then the handler.
    pub async fn run(&self, request: Request<Body>, handler: Handler) -> HandlerResult {
        let mut chain = Next::new(move |req| handler(req));

        // Wrap from the innermost middleware outwards, so index 0 runs first.
        for i in (0..self.middlewares.len()).rev() {
            let middlewares = Arc::clone(&self.middlewares);
            let next = chain;
            chain = Next::new(move |req| {
                Box::pin(async move { middlewares[i].handle(req, next).await })
            });
        }

        chain.run(request).await
    }
}
