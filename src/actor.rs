//! Actor identity as forwarded by the upstream directory service
//!
//! The service never authenticates credentials itself; it trusts the
//! identity headers set by the deployment's auth proxy.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::error::{Error, IdentityError, InternalServerError};
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-auth-user-id";
pub const USERNAME_HEADER: &str = "x-auth-username";
pub const STAFF_HEADER: &str = "x-auth-staff";
pub const SUPERUSER_HEADER: &str = "x-auth-superuser";
pub const ACTIVE_HEADER: &str = "x-auth-active";

/// The authenticated actor behind a request
///
/// ```rs
/// pub async fn foo_route(actor: Actor) -> impl IntoResponse {
///     println!("{:?}", actor.username);
///
///     ()
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Actor {
	pub id:           i32,
	pub username:     String,
	pub is_staff:     bool,
	pub is_superuser: bool,
	pub is_active:    bool,
}

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Result<&'h str, Error> {
	headers
		.get(name)
		.ok_or(IdentityError::Missing)?
		.to_str()
		.map_err(|_| IdentityError::Malformed.into())
}

fn flag(headers: &HeaderMap, name: &str) -> Result<bool, Error> {
	header(headers, name)?
		.parse::<bool>()
		.map_err(|_| IdentityError::Malformed.into())
}

impl Actor {
	/// Parse an [`Actor`] from the forwarded identity headers
	///
	/// # Errors
	/// Fails if a header is missing, unparsable, or the account is disabled
	pub fn from_headers(headers: &HeaderMap) -> Result<Self, Error> {
		let id = header(headers, USER_ID_HEADER)?
			.parse::<i32>()
			.map_err(|_| IdentityError::Malformed)?;

		let username = header(headers, USERNAME_HEADER)?.trim().to_string();
		if username.is_empty() {
			return Err(IdentityError::Malformed.into());
		}

		let is_staff = flag(headers, STAFF_HEADER)?;
		let is_superuser = flag(headers, SUPERUSER_HEADER)?;
		let is_active = flag(headers, ACTIVE_HEADER)?;

		if !is_active {
			return Err(IdentityError::Disabled.into());
		}

		Ok(Self { id, username, is_staff, is_superuser, is_active })
	}

	/// Whether this actor may act on rooms and reservations they do not own
	#[must_use]
	pub fn is_elevated(&self) -> bool { self.is_staff || self.is_superuser }

	/// Capability descriptor for cancelling the actor's own reservations
	#[must_use]
	pub fn owner_capability(&self) -> CancelCapability {
		CancelCapability {
			owner:       Some(self.username.clone()),
			is_elevated: false,
		}
	}

	/// Capability descriptor for administrative cancellation of any
	/// reservation
	#[must_use]
	pub fn elevated_capability(&self) -> CancelCapability {
		CancelCapability { owner: None, is_elevated: true }
	}
}

/// What a cancellation request is allowed to touch
///
/// The ledger branches on this descriptor instead of inspecting user
/// attributes: an owner capability only ever matches reservations whose
/// `user_identifier` equals `owner`, an elevated capability matches any
/// reservation by id
#[derive(Clone, Debug)]
pub struct CancelCapability {
	pub owner:       Option<String>,
	pub is_elevated: bool,
}

impl FromRequestParts<AppState> for Actor {
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut Parts,
		_state: &AppState,
	) -> Result<Self, Self::Rejection> {
		match parts.extensions.get::<Actor>() {
			Some(actor) => Ok(actor.clone()),
			None => Err(InternalServerError::ActorWithoutAuthError.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use axum::http::{HeaderMap, HeaderValue};

	use super::*;

	fn identity_headers(
		id: &'static str,
		username: &'static str,
		staff: &'static str,
		active: &'static str,
	) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(USER_ID_HEADER, HeaderValue::from_static(id));
		headers.insert(USERNAME_HEADER, HeaderValue::from_static(username));
		headers.insert(STAFF_HEADER, HeaderValue::from_static(staff));
		headers.insert(SUPERUSER_HEADER, HeaderValue::from_static("false"));
		headers.insert(ACTIVE_HEADER, HeaderValue::from_static(active));
		headers
	}

	#[test]
	fn parses_a_full_identity() {
		let headers = identity_headers("7", "20231001", "false", "true");

		let actor = Actor::from_headers(&headers).unwrap();

		assert_eq!(actor.id, 7);
		assert_eq!(actor.username, "20231001");
		assert!(!actor.is_elevated());
	}

	#[test]
	fn staff_and_superuser_are_elevated() {
		let headers = identity_headers("1", "registrar", "true", "true");
		let actor = Actor::from_headers(&headers).unwrap();

		assert!(actor.is_elevated());
		assert!(actor.elevated_capability().is_elevated);
		assert_eq!(
			actor.owner_capability().owner.as_deref(),
			Some("registrar")
		);
	}

	#[test]
	fn missing_headers_are_rejected() {
		let mut headers = identity_headers("1", "someone", "false", "true");
		headers.remove(USERNAME_HEADER);

		let err = Actor::from_headers(&headers).unwrap_err();

		assert!(matches!(
			err,
			Error::IdentityError(IdentityError::Missing)
		));
	}

	#[test]
	fn disabled_accounts_are_rejected() {
		let headers = identity_headers("1", "someone", "false", "false");

		let err = Actor::from_headers(&headers).unwrap_err();

		assert!(matches!(
			err,
			Error::IdentityError(IdentityError::Disabled)
		));
	}

	#[test]
	fn malformed_flags_are_rejected() {
		let headers = identity_headers("1", "someone", "yes", "true");

		let err = Actor::from_headers(&headers).unwrap_err();

		assert!(matches!(
			err,
			Error::IdentityError(IdentityError::Malformed)
		));
	}
}
