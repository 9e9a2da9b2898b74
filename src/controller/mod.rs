//! Controllers expose named operations; the composer binds each declared
//! route to the operation of one specific controller instance.

use crate::error::BoxError;
use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Result of handling a request.
pub type HandlerResult = Result<Response, BoxError>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A route handler bound to its controller instance.
pub type Handler = Arc<dyn Fn(Request<Body>) -> HandlerFuture + Send + Sync>;

/// Implemented by controller classes.
///
/// # Example
/// ```rust,ignore
/// impl Controller for UsersController {
///     fn handler(self: Arc<Self>, operation: &str) -> Option<Handler> {
///         match operation {
///             "find" => Some(bind(self, |this, req| async move { this.find(req).await })),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// The handler for `operation`, bound to this instance, or `None` if the
    /// controller has no such operation.
    fn handler(self: Arc<Self>, operation: &str) -> Option<Handler>;
}

/// Bind an operation to a controller instance.
pub fn bind<C, F, Fut>(controller: Arc<C>, operation: F) -> Handler
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |request| Box::pin(operation(Arc::clone(&controller), request)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    struct Greeter {
        greeting: &'static str,
    }

    impl Greeter {
        async fn greet(&self, _request: Request<Body>) -> HandlerResult {
            Ok(self.greeting.into_response())
        }
    }

    impl Controller for Greeter {
        fn handler(self: Arc<Self>, operation: &str) -> Option<Handler> {
            match operation {
                "greet" => Some(bind(self, |this, req| async move { this.greet(req).await })),
                _ => None,
            }
        }
    }

    #[tokio::test]
    async fn test_handler_is_bound_to_its_instance() {
        let hello: Arc<dyn Controller> = Arc::new(Greeter { greeting: "hello" });
        let hi: Arc<dyn Controller> = Arc::new(Greeter { greeting: "hi" });

        let first = hello.handler("greet").unwrap();
        let second = hi.clone().handler("greet").unwrap();
        assert!(hi.handler("missing").is_none());

        let body = |response: Response| async move {
            axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap()
        };
        let a = first(Request::new(Body::empty())).await.unwrap();
        let b = second(Request::new(Body::empty())).await.unwrap();
        assert_eq!(&body(a).await[..], b"hello");
        assert_eq!(&body(b).await[..], b"hi");
    }
}
