#![allow(dead_code)]

use trellis::prelude::*;

/// Rejects requests without an `authorization` header.
#[derive(Default)]
pub struct AuthMiddleware;

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(&self, request: Request<Body>, next: Next) -> HandlerResult {
        if !request.headers().contains_key("authorization") {
            return Err(Box::new(HttpException::unauthorized("missing credentials")));
        }
        next.run(request).await
    }
}

/// Appends its label to the `x-trace` response header.
pub struct Trace(pub &'static str);

#[async_trait]
impl Middleware for Trace {
    async fn handle(&self, request: Request<Body>, next: Next) -> HandlerResult {
        let mut response = next.run(request).await?;
        let trace = match response.headers().get("x-trace") {
            Some(existing) => format!("{},{}", self.0, existing.to_str().unwrap_or_default()),
            None => self.0.to_string(),
        };
        response
            .headers_mut()
            .insert("x-trace", trace.parse().map_err(|e| Box::new(e) as BoxError)?);
        Ok(response)
    }
}

#[derive(Default)]
pub struct UsersController;

impl UsersController {
    async fn find(self: Arc<Self>, request: Request<Body>) -> HandlerResult {
        let id = request
            .uri()
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(format!("user {id}").into_response())
    }

    async fn remove(self: Arc<Self>, _request: Request<Body>) -> HandlerResult {
        Err(Box::new(HttpException::forbidden("users cannot be removed")))
    }
}

impl Controller for UsersController {
    fn handler(self: Arc<Self>, operation: &str) -> Option<Handler> {
        match operation {
            "find" => Some(bind(self, UsersController::find)),
            "remove" => Some(bind(self, UsersController::remove)),
            _ => None,
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
