use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::PaginationOptions;
use crate::schema::{reservations, rooms};
use crate::DbConn;

#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, PartialEq, Eq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::RoomKind"]
pub enum RoomKind {
	#[default]
	Collective,
	Auditorium,
}

#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, PartialEq, Eq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::RoomStatus"]
pub enum RoomStatus {
	#[default]
	Available,
	UnderMaintenance,
}

type BoxedCondition<S, T = Bool> =
	Box<dyn BoxableExpression<S, Pg, SqlType = T>>;

#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(Pg))]
pub struct Room {
	pub id:          i32,
	pub name:        String,
	pub capacity:    i32,
	pub kind:        RoomKind,
	pub location:    Option<String>,
	pub equipment:   Vec<String>,
	pub description: Option<String>,
	pub status:      RoomStatus,
	pub active:      bool,
	pub created_at:  DateTime<Utc>,
}

impl Room {
	fn active_condition(active_only: bool) -> BoxedCondition<rooms::table> {
		if active_only {
			Box::new(rooms::active.eq(true))
		} else {
			Box::new(true.into_sql::<Bool>().eq(true))
		}
	}

	/// Whether a room still has non-cancelled reservations that start at or
	/// after the given instant; such rooms may not be edited or retired
	fn has_upcoming_reservations(
		room_id: i32,
		now: DateTime<Utc>,
		conn: &mut PgConnection,
	) -> Result<bool, Error> {
		let upcoming: i64 = reservations::table
			.filter(reservations::room_id.eq(room_id))
			.filter(reservations::cancelled.eq(false))
			.filter(reservations::start_time.ge(now))
			.count()
			.get_result(conn)?;

		Ok(upcoming > 0)
	}

	/// Get an active [`Room`] by its id
	#[instrument(skip(conn))]
	pub async fn get_by_id(room_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let room = conn
			.interact(move |conn| {
				rooms::table
					.filter(rooms::id.eq(room_id))
					.filter(rooms::active.eq(true))
					.select(Self::as_select())
					.get_result(conn)
					.optional()
			})
			.await??
			.ok_or_else(|| {
				Error::NotFound(format!("no room with id {room_id}"))
			})?;

		Ok(room)
	}

	/// Get the unique active [`Room`] with a given name
	///
	/// The partial unique index makes a second active row with the same name
	/// impossible; if one shows up anyway the caller gets a distinguishable
	/// error instead of an arbitrary pick
	#[instrument(skip(conn))]
	pub async fn get_by_name(
		room_name: String,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let lookup = room_name.clone();

		let mut matches: Vec<Self> = conn
			.interact(move |conn| {
				rooms::table
					.filter(rooms::name.eq(lookup))
					.filter(rooms::active.eq(true))
					.limit(2)
					.select(Self::as_select())
					.load(conn)
			})
			.await??;

		match matches.len() {
			0 => Err(Error::NotFound(format!(
				"no active room named '{room_name}'"
			))),
			1 => Ok(matches.remove(0)),
			_ => Err(Error::Ambiguous(format!(
				"multiple active rooms share the name '{room_name}'"
			))),
		}
	}

	/// Get a page of [`Room`]s ordered by name, ties broken by id
	#[instrument(skip(conn))]
	pub async fn get_all(
		active_only: bool,
		p_opts: PaginationOptions,
		conn: &DbConn,
	) -> Result<(i64, Vec<Self>), Error> {
		let page = conn
			.interact(move |conn| {
				conn.transaction::<_, Error, _>(|conn| {
					let total: i64 = rooms::table
						.filter(Self::active_condition(active_only))
						.count()
						.get_result(conn)?;

					let page = rooms::table
						.filter(Self::active_condition(active_only))
						.order((rooms::name.asc(), rooms::id.asc()))
						.limit(p_opts.limit())
						.offset(p_opts.offset())
						.select(Self::as_select())
						.load(conn)?;

					Ok((total, page))
				})
			})
			.await??;

		Ok(page)
	}

	/// Soft-delete a [`Room`] by setting its active flag to false
	///
	/// Fails with [`Error::RoomInUse`] while the room still has upcoming
	/// reservations; fully historical reservations are kept for the booking
	/// history view
	#[instrument(skip(conn))]
	pub async fn soft_delete(
		room_id: i32,
		now: DateTime<Utc>,
		conn: &DbConn,
	) -> Result<(), Error> {
		conn.interact(move |conn| {
			conn.transaction::<_, Error, _>(|conn| {
				// Lock the row so the reservation gate and the flag flip see
				// the same state
				let room: Option<Self> = rooms::table
					.filter(rooms::id.eq(room_id))
					.filter(rooms::active.eq(true))
					.select(Self::as_select())
					.for_update()
					.get_result(conn)
					.optional()?;

				if room.is_none() {
					return Err(Error::NotFound(format!(
						"no room with id {room_id}"
					)));
				}

				if Self::has_upcoming_reservations(room_id, now, conn)? {
					return Err(Error::RoomInUse);
				}

				diesel::update(rooms::table.find(room_id))
					.set(rooms::active.eq(false))
					.execute(conn)?;

				Ok(())
			})
		})
		.await??;

		info!("retired room {room_id}");

		Ok(())
	}
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = rooms)]
pub struct NewRoom {
	pub name:        String,
	pub capacity:    i32,
	pub kind:        RoomKind,
	pub location:    Option<String>,
	pub equipment:   Vec<String>,
	pub description: Option<String>,
	pub status:      RoomStatus,
}

impl NewRoom {
	/// Insert this [`NewRoom`]
	///
	/// The duplicate check and the insert run in one transaction; the partial
	/// unique index on active room names backs it up under concurrency
	#[instrument(skip(conn))]
	pub async fn insert(self, conn: &DbConn) -> Result<Room, Error> {
		let room = conn
			.interact(move |conn| {
				conn.transaction::<_, Error, _>(|conn| {
					let name = self.name.clone();

					let taken: i64 = rooms::table
						.filter(rooms::name.eq(name.as_str()))
						.filter(rooms::active.eq(true))
						.count()
						.get_result(conn)?;

					if taken > 0 {
						return Err(Error::Duplicate(format!(
							"a room named '{name}' already exists"
						)));
					}

					let room = diesel::insert_into(rooms::table)
						.values(self)
						.returning(Room::as_returning())
						.get_result(conn)?;

					Ok(room)
				})
			})
			.await??;

		info!("created room {} ({})", room.id, room.name);

		Ok(room)
	}
}

#[derive(AsChangeset, Clone, Debug, Default)]
#[diesel(table_name = rooms)]
pub struct RoomUpdate {
	pub name:        Option<String>,
	pub capacity:    Option<i32>,
	pub kind:        Option<RoomKind>,
	pub location:    Option<Option<String>>,
	pub equipment:   Option<Vec<String>>,
	pub description: Option<Option<String>>,
	pub status:      Option<RoomStatus>,
}

impl RoomUpdate {
	fn is_noop(&self) -> bool {
		self.name.is_none()
			&& self.capacity.is_none()
			&& self.kind.is_none()
			&& self.location.is_none()
			&& self.equipment.is_none()
			&& self.description.is_none()
			&& self.status.is_none()
	}

	/// Apply this partial update to a [`Room`]
	///
	/// Fails with [`Error::RoomInUse`] while the room still has upcoming
	/// reservations, since changing capacity or kind underneath an accepted
	/// booking would invalidate its premise
	#[instrument(skip(conn))]
	pub async fn apply(
		self,
		room_id: i32,
		now: DateTime<Utc>,
		conn: &DbConn,
	) -> Result<Room, Error> {
		let room = conn
			.interact(move |conn| {
				conn.transaction::<_, Error, _>(|conn| {
					let room: Option<Room> = rooms::table
						.filter(rooms::id.eq(room_id))
						.filter(rooms::active.eq(true))
						.select(Room::as_select())
						.for_update()
						.get_result(conn)
						.optional()?;

					let Some(room) = room else {
						return Err(Error::NotFound(format!(
							"no room with id {room_id}"
						)));
					};

					if self.is_noop() {
						return Ok(room);
					}

					if Room::has_upcoming_reservations(room_id, now, conn)? {
						return Err(Error::RoomInUse);
					}

					if let Some(new_name) = self.name.clone() {
						let clash: i64 = rooms::table
							.filter(rooms::name.eq(new_name.as_str()))
							.filter(rooms::active.eq(true))
							.filter(rooms::id.ne(room_id))
							.count()
							.get_result(conn)?;

						if clash > 0 {
							return Err(Error::Duplicate(format!(
								"a room named '{new_name}' already exists"
							)));
						}
					}

					let room = diesel::update(rooms::table.find(room_id))
						.set(self)
						.returning(Room::as_returning())
						.get_result(conn)?;

					Ok(room)
				})
			})
			.await??;

		info!("updated room {} ({})", room.id, room.name);

		Ok(room)
	}
}
