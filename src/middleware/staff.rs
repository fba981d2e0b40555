use std::pin::Pin;

use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use crate::actor::Actor;
use crate::error::{Error, InternalServerError};

/// Middleware layer that restricts routes to staff and superuser actors
///
/// Must sit inside an [`AuthLayer`](crate::middleware::AuthLayer), the actor
/// extension is expected to be present
#[derive(Clone, Copy, Debug, Default)]
pub struct StaffLayer;

impl StaffLayer {
	#[must_use]
	pub fn new() -> Self { Self }
}

impl<S> Layer<S> for StaffLayer {
	type Service = StaffMiddleware<S>;

	fn layer(&self, inner: S) -> Self::Service { StaffMiddleware { inner } }
}

#[derive(Clone)]
pub struct StaffMiddleware<S> {
	inner: S,
}

impl<S> Service<Request<Body>> for StaffMiddleware<S>
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
		cx: &mut std::task::Context<'_>,
	) -> std::task::Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	#[instrument(skip_all)]
	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let cloned_inner = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, cloned_inner);

		Box::pin(async move {
			let Some(actor) = req.extensions().get::<Actor>() else {
				return Ok(Error::from(
					InternalServerError::ActorWithoutAuthError,
				)
				.into_response());
			};

			if !actor.is_elevated() {
				debug!("actor {} is not staff", actor.username);

				return Ok(Error::Forbidden.into_response());
			}

			inner.call(req).await
		})
	}
}
