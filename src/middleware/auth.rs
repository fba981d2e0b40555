//! Middleware that materializes the forwarded identity headers into an
//! [`Actor`] request extension

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::http::Response;
use axum::response::IntoResponse;
use tower::{Layer, Service};

use crate::actor::Actor;

/// Middleware layer that guarantees a request carries a complete identity
///
/// The parsed [`Actor`] is stored as an [`Extension`](axum::Extension);
/// controllers that need it should ask for an [`Actor`] in their arguments
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthLayer;

impl AuthLayer {
	#[must_use]
	pub fn new() -> Self { Self }
}

impl<S> Layer<S> for AuthLayer {
	type Service = AuthMiddleware<S>;

	fn layer(&self, inner: S) -> Self::Service { AuthMiddleware { inner } }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
	inner: S,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
	S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Error = S::Error;
	type Future = Pin<
		Box<
			dyn Future<Output = Result<Self::Response, Self::Error>>
				+ Send
				+ 'static,
		>,
	>;
	type Response = S::Response;

	fn poll_ready(
		&mut self,
		cx: &mut Context<'_>,
	) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	#[instrument(skip_all)]
	fn call(&mut self, mut req: Request<Body>) -> Self::Future {
		let cloned_inner = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, cloned_inner);

		Box::pin(async move {
			let actor = match Actor::from_headers(req.headers()) {
				Ok(actor) => actor,
				Err(e) => {
					info!("got request without a valid identity");

					return Ok(e.into_response());
				},
			};

			req.extensions_mut().insert(actor);

			inner.call(req).await
		})
	}
}
