//! Controllers for [`Reservation`]s

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, NoContent};
use axum::Json;
use chrono::{NaiveDate, Utc};

use crate::actor::Actor;
use crate::error::Error;
use crate::mailer::Mailer;
use crate::models::{block_availability, Reservation, Room};
use crate::schemas::reservation::{
	CreateReservationRequest,
	ReservationResponse,
	SlotResponse,
	SlotsQuery,
};
use crate::DbPool;

/// Book a room for the requesting actor
#[instrument(skip(pool, mailer))]
pub(crate) async fn create_reservation(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	actor: Actor,
	Json(request): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;
	let now = Utc::now();

	let (reservation, room) =
		request.to_insertable(actor.username).insert(now, &conn).await?;

	// Notification delivery is best effort, the booking stands either way
	if let Err(e) = mailer.send_booking_confirmed(&reservation, &room) {
		warn!("could not queue confirmation email: {e:?}");
	}

	let response = ReservationResponse::new(reservation, Some(room), now);

	Ok((StatusCode::CREATED, Json(response)))
}

/// Get the requesting actor's booking history, oldest first
#[instrument(skip(pool))]
pub(crate) async fn get_my_reservations(
	State(pool): State<DbPool>,
	actor: Actor,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;
	let now = Utc::now();

	let history = Reservation::for_user(actor.username, &conn).await?;

	let response: Vec<ReservationResponse> = history
		.into_iter()
		.map(|(reservation, room)| {
			ReservationResponse::new(reservation, Some(room), now)
		})
		.collect();

	Ok((StatusCode::OK, Json(response)))
}

/// Cancel one of the requesting actor's own reservations
#[instrument(skip(pool, mailer))]
pub(crate) async fn cancel_reservation(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	actor: Actor,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let (reservation, room) =
		Reservation::cancel(id, actor.owner_capability(), Utc::now(), &conn)
			.await?;

	if let Err(e) = mailer.send_booking_cancelled(&reservation, &room) {
		warn!("could not queue cancellation email: {e:?}");
	}

	Ok((StatusCode::NO_CONTENT, NoContent))
}

/// Cancel any reservation on behalf of an elevated actor
#[instrument(skip(pool, mailer))]
pub(crate) async fn admin_cancel_reservation(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	actor: Actor,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let (reservation, room) = Reservation::cancel(
		id,
		actor.elevated_capability(),
		Utc::now(),
		&conn,
	)
	.await?;

	if let Err(e) = mailer.send_booking_cancelled(&reservation, &room) {
		warn!("could not queue cancellation email: {e:?}");
	}

	Ok((StatusCode::NO_CONTENT, NoContent))
}

/// Get the availability of the standard blocks of a room on a given day
#[instrument(skip(pool))]
pub(crate) async fn get_room_slots(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
	Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, Error> {
	let Some(date) = query.date else {
		return Err(Error::ValidationError("a date is required".to_string()));
	};

	let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
		Error::ValidationError(format!(
			"'{date}' is not a valid date, expected YYYY-MM-DD"
		))
	})?;

	let conn = pool.get().await?;

	let room = Room::get_by_id(id, &conn).await?;

	let taken = Reservation::for_room_on_date(room.id, date, &conn).await?;

	let response: Vec<SlotResponse> =
		block_availability(date, Utc::now(), &taken)
			.into_iter()
			.map(Into::into)
			.collect();

	Ok((StatusCode::OK, Json(response)))
}
