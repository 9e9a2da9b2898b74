//! Transport adapters.
//!
//! The composer hands every route to an [`Adapter`], which owns the protocol
//! side: turning middleware chains and handlers into whatever its server
//! understands, registering routes, and serving them.

mod axum_adapter;

pub use axum_adapter::{AxumAdapter, to_axum_path};

use crate::controller::Handler;
use crate::error::Result;
use crate::exception::ExceptionFilter;
use crate::metadata::HttpMethod;
use crate::middleware::Middleware;
use async_trait::async_trait;
use std::sync::Arc;

/// A route as handed to the transport.
#[derive(Clone)]
pub struct RouteRegistration<M, H> {
    pub method: HttpMethod,
    pub path: String,
    pub middleware: M,
    pub handler: H,
}

#[async_trait]
pub trait Adapter: Send {
    /// Transport form of a middleware chain.
    type Middleware: Send;
    /// Transport form of a route handler.
    type Handler: Send;

    fn set_port(&mut self, port: u16);

    fn prepare_middlewares(&self, middlewares: Vec<Arc<dyn Middleware>>) -> Self::Middleware;

    fn prepare_handler(&self, handler: Handler) -> Self::Handler;

    fn register_route(
        &mut self,
        route: RouteRegistration<Self::Middleware, Self::Handler>,
    ) -> Result<()>;

    fn set_exception_filter(&mut self, filter: Arc<dyn ExceptionFilter>);

    /// Serve registered routes until the transport shuts down.
    async fn start(&mut self) -> Result<()>;
}
