//! Library-wide error types and [`From`] impls

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use diesel::result::DatabaseErrorKind;
use thiserror::Error;
use tokio::sync::mpsc;

/// Top level application error, can be converted into a [`Response`]
#[derive(Debug, Error)]
pub enum Error {
	/// Duplicate resource created
	#[error("{0}")]
	Duplicate(String),
	/// Request/operation forbidden
	#[error("forbidden")]
	Forbidden,
	/// Opaque internal server error
	#[error("internal server error")]
	InternalServerError,
	/// Resource not found
	#[error("not found - {0}")]
	NotFound(String),
	/// More than one active room matched a name that should be unique
	#[error("ambiguous name - {0}")]
	Ambiguous(String),
	/// A room cannot be edited or retired while it has upcoming reservations
	#[error("the room still has upcoming reservations")]
	RoomInUse,
	/// Any error related to creating or cancelling a reservation
	#[error(transparent)]
	BookingError(#[from] BookingError),
	/// Any error related to the forwarded actor identity
	#[error(transparent)]
	IdentityError(#[from] IdentityError),
	/// Resource could not be validated
	#[error("{0}")]
	ValidationError(String),
}

impl Error {
	/// Return a unique identifying code for this error
	///
	/// When modifying this function the error code should only ever increase,
	/// an error code should never be reused once its assigned to avoid
	/// unexpectedly breaking the frontend
	fn code(&self) -> i32 {
		match self {
			Self::Duplicate(_) => 1,
			Self::Forbidden => 2,
			Self::InternalServerError => 3,
			Self::NotFound(_) => 4,
			Self::Ambiguous(_) => 5,
			Self::RoomInUse => 6,
			Self::ValidationError(_) => 7,
			Self::BookingError(e) => {
				match e {
					BookingError::RoomInactive => 8,
					BookingError::EndNotAfterStart => 9,
					BookingError::StartInPast => 10,
					BookingError::UserOverlap(_) => 11,
					BookingError::RoomOverlap { .. } => 12,
					BookingError::PeriodTaken => 13,
					BookingError::AlreadyCancelled => 14,
					BookingError::AlreadyConcluded => 15,
				}
			},
			Self::IdentityError(e) => {
				match e {
					IdentityError::Missing => 16,
					IdentityError::Malformed => 17,
					IdentityError::Disabled => 18,
				}
			},
		}
	}

	/// Return additional information about the error
	fn info(&self) -> Option<String> {
		match self {
			Self::Duplicate(m)
			| Self::NotFound(m)
			| Self::Ambiguous(m)
			| Self::ValidationError(m) => Some(m.to_owned()),
			Self::BookingError(e) => {
				match e {
					BookingError::UserOverlap(room) => {
						Some(serde_json::json!({"room": room}).to_string())
					},
					BookingError::RoomOverlap { start, end } => {
						Some(
							serde_json::json!({"start": start, "end": end})
								.to_string(),
						)
					},
					_ => None,
				}
			},
			_ => None,
		}
	}
}

/// Convert an error into a [`Response`]
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		error!("{self:?}");

		let message = self.to_string();

		let data = serde_json::json!({
			"message": message,
			"code": self.code(),
			"info": self.info(),
		});

		let status = match self {
			Self::Duplicate(_) | Self::Ambiguous(_) | Self::RoomInUse => {
				StatusCode::CONFLICT
			},
			Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::BookingError(
				BookingError::EndNotAfterStart | BookingError::StartInPast,
			)
			| Self::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
			Self::BookingError(_) => StatusCode::CONFLICT,
			Self::IdentityError(IdentityError::Disabled) => {
				StatusCode::FORBIDDEN
			},
			Self::IdentityError(_) => StatusCode::UNAUTHORIZED,
		};

		(status, axum::Json(data)).into_response()
	}
}

/// Any error related to creating or cancelling a reservation
#[derive(Debug, Error)]
pub enum BookingError {
	/// The target room was soft-deleted
	#[error("this room has been retired and can no longer be booked")]
	RoomInactive,
	#[error("the end of a reservation must come after its start")]
	EndNotAfterStart,
	#[error("reservations cannot start in the past")]
	StartInPast,
	/// The user already holds a booking during the requested period
	#[error("you already hold an overlapping reservation in room '{0}'")]
	UserOverlap(String),
	/// The room already has a booking during the requested period
	#[error("the room is already reserved during the requested period")]
	RoomOverlap { start: DateTime<Utc>, end: DateTime<Utc> },
	/// A concurrent request claimed the period between our overlap check and
	/// the insert; surfaced by the database exclusion constraint
	#[error("the requested period was claimed by a concurrent booking")]
	PeriodTaken,
	#[error("this reservation was already cancelled")]
	AlreadyCancelled,
	#[error("this reservation has already concluded")]
	AlreadyConcluded,
}

/// Any error related to the identity headers forwarded by the directory
/// service
#[derive(Debug, Error)]
pub enum IdentityError {
	#[error("missing identity headers")]
	Missing,
	#[error("malformed identity headers")]
	Malformed,
	#[error("this account is disabled")]
	Disabled,
}

/// A list of possible internal errors
///
/// API end users should never see these details
#[derive(Debug, Error)]
pub enum InternalServerError {
	/// Unknown database constraint violation
	#[error("constraint error -- {0:?}")]
	ConstraintError(String),
	/// Error executing some database operation
	#[error("database error -- {0:?}")]
	DatabaseError(diesel::result::Error),
	/// Error interacting with a database connection
	#[error("database interaction error -- {0:?}")]
	DatabaseInteractionError(deadpool_diesel::InteractError),
	/// Malformed email
	#[error("invalid email -- {0:?}")]
	InvalidEmail(lettre::address::AddressError),
	/// Mailer stopped unexpectedly
	#[error("mailer stopped -- {0:?}")]
	MailerStopped(mpsc::error::SendError<lettre::Message>),
	/// Mail queue is full
	#[error("mail queue full -- {0:?}")]
	MailQueueFull(mpsc::error::TrySendError<lettre::Message>),
	/// Generic mailer error
	#[error("mail error -- {0:?}")]
	MailError(lettre::error::Error),
	/// Error acquiring database pool connection
	#[error("database pool error -- {0:?}")]
	PoolError(deadpool_diesel::PoolError),
	/// Attempted to extract an actor from a request that has not been
	/// authorized
	#[error("attempted to extract actor without checking authorization")]
	ActorWithoutAuthError,
}

// Map internal server errors to application errors
impl From<InternalServerError> for Error {
	fn from(value: InternalServerError) -> Self {
		error!("internal server error -- {value}");

		Self::InternalServerError
	}
}

/// Map validation errors to application errors
impl From<validator::ValidationErrors> for Error {
	fn from(err: validator::ValidationErrors) -> Self {
		let errs = err.field_errors();
		let repr = errs
			.values()
			.map(|v| {
				v.iter()
					.map(ToString::to_string)
					.collect::<Vec<String>>()
					.join("\n")
			})
			.collect::<Vec<String>>()
			.join("\n");

		Self::ValidationError(repr)
	}
}

/// Map database interaction errors to application errors
impl From<deadpool_diesel::InteractError> for Error {
	fn from(value: deadpool_diesel::InteractError) -> Self {
		InternalServerError::DatabaseInteractionError(value).into()
	}
}

/// Map database result errors to application errors.
impl From<diesel::result::Error> for Error {
	fn from(err: diesel::result::Error) -> Self {
		match &err {
			// No rows returned by query that expected at least one
			diesel::result::Error::NotFound => {
				Self::NotFound("no context provided".to_string())
			},
			diesel::result::Error::DatabaseError(kind, info) => {
				// The named constraints implement domain invariants, their
				// violations are well-defined conflicts rather than bugs
				match info.constraint_name() {
					Some("room_name_active_key") => {
						Self::Duplicate(
							"name is already in use by an active room"
								.to_string(),
						)
					},
					Some(
						"reservation_room_no_overlap"
						| "reservation_user_no_overlap",
					) => BookingError::PeriodTaken.into(),
					unknown => {
						match kind {
							DatabaseErrorKind::ForeignKeyViolation => {
								Self::ValidationError(
									info.message().to_string(),
								)
							},
							DatabaseErrorKind::UniqueViolation => {
								InternalServerError::ConstraintError(
									unknown.unwrap_or_default().to_string(),
								)
								.into()
							},
							_ => {
								InternalServerError::DatabaseError(err).into()
							},
						}
					},
				}
			},
			_ => InternalServerError::DatabaseError(err).into(),
		}
	}
}

impl From<deadpool_diesel::PoolError> for Error {
	fn from(value: deadpool_diesel::PoolError) -> Self {
		InternalServerError::PoolError(value).into()
	}
}

impl From<lettre::address::AddressError> for Error {
	fn from(err: lettre::address::AddressError) -> Self {
		InternalServerError::InvalidEmail(err).into()
	}
}

impl From<mpsc::error::SendError<lettre::Message>> for Error {
	fn from(err: mpsc::error::SendError<lettre::Message>) -> Self {
		InternalServerError::MailerStopped(err).into()
	}
}

impl From<mpsc::error::TrySendError<lettre::Message>> for Error {
	fn from(err: mpsc::error::TrySendError<lettre::Message>) -> Self {
		InternalServerError::MailQueueFull(err).into()
	}
}

impl From<lettre::error::Error> for Error {
	fn from(err: lettre::error::Error) -> Self {
		InternalServerError::MailError(err).into()
	}
}
