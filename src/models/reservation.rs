use chrono::{DateTime, Duration, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::actor::CancelCapability;
use crate::error::{BookingError, Error};
use crate::models::Room;
use crate::schema::{reservations, rooms};
use crate::DbConn;

/// The standard bookable blocks of a day, as (start, end) hours
pub const SLOT_HOURS: [(u32, u32); 7] =
	[(8, 10), (10, 12), (12, 14), (14, 16), (16, 18), (18, 20), (20, 22)];

/// Derived lifecycle state of a [`Reservation`]
///
/// `Concluded` is never stored; any non-cancelled reservation whose end has
/// passed counts as concluded at read time
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum ReservationState {
	Active,
	Cancelled,
	Concluded,
}

#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(Pg))]
pub struct Reservation {
	pub id:              i32,
	pub room_id:         i32,
	pub user_identifier: String,
	pub start_time:      DateTime<Utc>,
	pub end_time:        DateTime<Utc>,
	pub cancelled:       bool,
	pub created_at:      DateTime<Utc>,
}

/// Overlap test on half-open intervals `[start, end)`
#[must_use]
pub fn overlaps(
	a_start: DateTime<Utc>,
	a_end: DateTime<Utc>,
	b_start: DateTime<Utc>,
	b_end: DateTime<Utc>,
) -> bool {
	a_start < b_end && b_start < a_end
}

/// Validate the requested period of a new reservation
pub(crate) fn check_reservation_times(
	start: DateTime<Utc>,
	end: DateTime<Utc>,
	now: DateTime<Utc>,
) -> Result<(), Error> {
	if end <= start {
		return Err(BookingError::EndNotAfterStart.into());
	}

	if start < now {
		return Err(BookingError::StartInPast.into());
	}

	Ok(())
}

/// A bookable block of a day and whether it can still be reserved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
	pub start:     DateTime<Utc>,
	pub end:       DateTime<Utc>,
	pub available: bool,
}

/// Compute the availability of the standard blocks of a day
///
/// A block is unavailable once its start has passed or when it overlaps any
/// of the given (non-cancelled) reservations
#[must_use]
pub fn block_availability(
	date: NaiveDate,
	now: DateTime<Utc>,
	taken: &[Reservation],
) -> Vec<Slot> {
	SLOT_HOURS
		.iter()
		.filter_map(|&(from, until)| {
			let start = date.and_hms_opt(from, 0, 0)?.and_utc();
			let end = date.and_hms_opt(until, 0, 0)?.and_utc();

			let free = start >= now
				&& !taken
					.iter()
					.any(|r| overlaps(start, end, r.start_time, r.end_time));

			Some(Slot { start, end, available: free })
		})
		.collect()
}

impl Reservation {
	/// The derived state of this reservation at a given instant
	#[must_use]
	pub fn state_at(&self, now: DateTime<Utc>) -> ReservationState {
		if self.cancelled {
			ReservationState::Cancelled
		} else if self.end_time < now {
			ReservationState::Concluded
		} else {
			ReservationState::Active
		}
	}

	/// Get all the reservations of a user together with their rooms, oldest
	/// first
	///
	/// Soft-deleted rooms are included so the booking history stays complete
	#[instrument(skip(conn))]
	pub async fn for_user(
		username: String,
		conn: &DbConn,
	) -> Result<Vec<(Self, Room)>, Error> {
		let history = conn
			.interact(move |conn| {
				reservations::table
					.inner_join(rooms::table)
					.filter(
						reservations::user_identifier.eq(username.as_str()),
					)
					.order((
						reservations::start_time.asc(),
						reservations::id.asc(),
					))
					.select((Self::as_select(), Room::as_select()))
					.load(conn)
			})
			.await??;

		Ok(history)
	}

	/// Get the non-cancelled reservations of a room that touch a given day
	#[instrument(skip(conn))]
	pub async fn for_room_on_date(
		room_id: i32,
		date: NaiveDate,
		conn: &DbConn,
	) -> Result<Vec<Self>, Error> {
		let Some(day_start) = date.and_hms_opt(0, 0, 0) else {
			return Ok(vec![]);
		};
		let day_start = day_start.and_utc();
		let day_end = day_start + Duration::days(1);

		let reservations = conn
			.interact(move |conn| {
				reservations::table
					.filter(reservations::room_id.eq(room_id))
					.filter(reservations::cancelled.eq(false))
					.filter(reservations::start_time.lt(day_end))
					.filter(reservations::end_time.gt(day_start))
					.order(reservations::start_time.asc())
					.select(Self::as_select())
					.load(conn)
			})
			.await??;

		Ok(reservations)
	}

	/// Cancel a reservation on behalf of the given capability
	///
	/// An owner capability only matches reservations held by that owner, so a
	/// foreign id comes back as [`Error::NotFound`]; an elevated capability
	/// matches any reservation
	#[instrument(skip(conn))]
	pub async fn cancel(
		r_id: i32,
		capability: CancelCapability,
		now: DateTime<Utc>,
		conn: &DbConn,
	) -> Result<(Self, Room), Error> {
		let cancelled = conn
			.interact(move |conn| {
				conn.transaction::<_, Error, _>(|conn| {
					if capability.owner.is_none() && !capability.is_elevated {
						return Err(Error::Forbidden);
					}

					let reservation: Option<Self> = match &capability.owner {
						Some(owner) => {
							reservations::table
								.filter(reservations::id.eq(r_id))
								.filter(
									reservations::user_identifier
										.eq(owner.as_str()),
								)
								.select(Self::as_select())
								.for_update()
								.get_result(conn)
								.optional()?
						},
						None => {
							reservations::table
								.filter(reservations::id.eq(r_id))
								.select(Self::as_select())
								.for_update()
								.get_result(conn)
								.optional()?
						},
					};

					let Some(reservation) = reservation else {
						return Err(Error::NotFound(format!(
							"no reservation with id {r_id}"
						)));
					};

					if reservation.cancelled {
						return Err(BookingError::AlreadyCancelled.into());
					}

					if reservation.end_time < now {
						return Err(BookingError::AlreadyConcluded.into());
					}

					let reservation =
						diesel::update(reservations::table.find(r_id))
							.set(reservations::cancelled.eq(true))
							.returning(Self::as_returning())
							.get_result(conn)?;

					let room = rooms::table
						.find(reservation.room_id)
						.select(Room::as_select())
						.get_result(conn)?;

					Ok((reservation, room))
				})
			})
			.await??;

		info!("cancelled reservation {r_id}");

		Ok(cancelled)
	}
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = reservations)]
pub struct NewReservation {
	pub room_id:         i32,
	pub user_identifier: String,
	pub start_time:      DateTime<Utc>,
	pub end_time:        DateTime<Utc>,
}

impl NewReservation {
	/// Insert this [`NewReservation`] after checking every booking rule
	///
	/// The room row is locked for the duration of the transaction, so the
	/// overlap checks and the insert act on one consistent snapshot; the
	/// exclusion constraints on the reservations table catch whatever slips
	/// past the checks under concurrency
	#[instrument(skip(conn))]
	pub async fn insert(
		self,
		now: DateTime<Utc>,
		conn: &DbConn,
	) -> Result<(Reservation, Room), Error> {
		let created = conn
			.interact(move |conn| {
				conn.transaction::<_, Error, _>(|conn| {
					let room: Option<Room> = rooms::table
						.filter(rooms::id.eq(self.room_id))
						.select(Room::as_select())
						.for_update()
						.get_result(conn)
						.optional()?;

					let Some(room) = room else {
						return Err(Error::NotFound(format!(
							"no room with id {}",
							self.room_id
						)));
					};

					if !room.active {
						return Err(BookingError::RoomInactive.into());
					}

					check_reservation_times(
						self.start_time,
						self.end_time,
						now,
					)?;

					// A user cannot hold two simultaneous bookings, whatever
					// the room
					let user_conflict: Option<(Reservation, Room)> =
						reservations::table
							.inner_join(rooms::table)
							.filter(
								reservations::user_identifier
									.eq(self.user_identifier.as_str()),
							)
							.filter(reservations::cancelled.eq(false))
							.filter(
								reservations::start_time.lt(self.end_time),
							)
							.filter(reservations::end_time.gt(self.start_time))
							.select((
								Reservation::as_select(),
								Room::as_select(),
							))
							.first(conn)
							.optional()?;

					if let Some((_, conflicting_room)) = user_conflict {
						return Err(BookingError::UserOverlap(
							conflicting_room.name,
						)
						.into());
					}

					let room_conflict: Option<Reservation> =
						reservations::table
							.filter(reservations::room_id.eq(self.room_id))
							.filter(reservations::cancelled.eq(false))
							.filter(
								reservations::start_time.lt(self.end_time),
							)
							.filter(reservations::end_time.gt(self.start_time))
							.select(Reservation::as_select())
							.first(conn)
							.optional()?;

					if let Some(existing) = room_conflict {
						return Err(BookingError::RoomOverlap {
							start: existing.start_time,
							end:   existing.end_time,
						}
						.into());
					}

					let reservation =
						diesel::insert_into(reservations::table)
							.values(&self)
							.returning(Reservation::as_returning())
							.get_result(conn)?;

					Ok((reservation, room))
				})
			})
			.await??;

		info!(
			"created reservation {} for room {}",
			created.0.id, created.0.room_id
		);

		Ok(created)
	}
}
