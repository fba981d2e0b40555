//! Controllers for [`Room`]s

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, NoContent};
use axum::Json;
use chrono::Utc;
use validator::Validate;

use crate::error::Error;
use crate::models::{PaginationOptions, Room};
use crate::schemas::room::{
	CreateRoomRequest,
	RoomFilter,
	RoomLookup,
	RoomResponse,
	UpdateRoomRequest,
};
use crate::DbPool;

/// Register a new room
#[instrument(skip(pool))]
pub(crate) async fn create_room(
	State(pool): State<DbPool>,
	Json(request): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let conn = pool.get().await?;

	let room = request.to_insertable()?.insert(&conn).await?;

	let response = RoomResponse::from(room);

	Ok((StatusCode::CREATED, Json(response)))
}

/// Get a page of rooms ordered by name
#[instrument(skip(pool))]
pub(crate) async fn get_rooms(
	State(pool): State<DbPool>,
	Query(filter): Query<RoomFilter>,
	Query(p_opts): Query<PaginationOptions>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let (total, rooms) =
		Room::get_all(filter.active_only, p_opts, &conn).await?;

	let data: Vec<RoomResponse> = rooms.into_iter().map(Into::into).collect();

	Ok((StatusCode::OK, Json(p_opts.paginate(total, data))))
}

/// Look up the unique active room with a given name
#[instrument(skip(pool))]
pub(crate) async fn lookup_room(
	State(pool): State<DbPool>,
	Query(lookup): Query<RoomLookup>,
) -> Result<impl IntoResponse, Error> {
	let Some(name) = lookup.name else {
		return Err(Error::ValidationError(
			"a room name is required".to_string(),
		));
	};

	let conn = pool.get().await?;

	let room = Room::get_by_name(name, &conn).await?;

	let response = RoomResponse::from(room);

	Ok((StatusCode::OK, Json(response)))
}

/// Get a single active room
#[instrument(skip(pool))]
pub(crate) async fn get_room(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let room = Room::get_by_id(id, &conn).await?;

	let response = RoomResponse::from(room);

	Ok((StatusCode::OK, Json(response)))
}

/// Partially update a room
///
/// Rejected while the room has upcoming reservations, since their premise
/// would silently change
#[instrument(skip(pool))]
pub(crate) async fn update_room(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
	Json(request): Json<UpdateRoomRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let conn = pool.get().await?;

	let room = request.to_changeset()?.apply(id, Utc::now(), &conn).await?;

	let response = RoomResponse::from(room);

	Ok((StatusCode::OK, Json(response)))
}

/// Soft-delete a room
///
/// Rejected while the room has upcoming reservations; the row itself is kept
/// so reservation history stays intact
#[instrument(skip(pool))]
pub(crate) async fn delete_room(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	Room::soft_delete(id, Utc::now(), &conn).await?;

	Ok((StatusCode::NO_CONTENT, NoContent))
}
