use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::models::{
	NewReservation,
	Reservation,
	ReservationState,
	Room,
	Slot,
};
use crate::schemas::room::RoomResponse;

#[skip_serializing_none]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
	pub id:              i32,
	pub room_id:         i32,
	pub user_identifier: String,
	pub start_time:      DateTime<Utc>,
	pub end_time:        DateTime<Utc>,
	pub state:           ReservationState,
	pub created_at:      DateTime<Utc>,
	pub room:            Option<RoomResponse>,
}

impl ReservationResponse {
	/// Build a response from a reservation and (optionally) its room,
	/// deriving the lifecycle state at the given instant
	#[must_use]
	pub fn new(
		reservation: Reservation,
		room: Option<Room>,
		now: DateTime<Utc>,
	) -> Self {
		let state = reservation.state_at(now);

		Self {
			id: reservation.id,
			room_id: reservation.room_id,
			user_identifier: reservation.user_identifier,
			start_time: reservation.start_time,
			end_time: reservation.end_time,
			state,
			created_at: reservation.created_at,
			room: room.map(Into::into),
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
	pub room_id:    i32,
	pub start_time: DateTime<Utc>,
	pub end_time:   DateTime<Utc>,
}

impl CreateReservationRequest {
	#[must_use]
	pub fn to_insertable(self, user_identifier: String) -> NewReservation {
		NewReservation {
			room_id: self.room_id,
			user_identifier,
			start_time: self.start_time,
			end_time: self.end_time,
		}
	}
}

/// Query parameters for the slot availability listing
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SlotsQuery {
	pub date: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
	pub start:     DateTime<Utc>,
	pub end:       DateTime<Utc>,
	pub available: bool,
}

impl From<Slot> for SlotResponse {
	fn from(value: Slot) -> Self {
		Self {
			start:     value.start,
			end:       value.end,
			available: value.available,
		}
	}
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;
	use crate::models::{RoomKind, RoomStatus};

	fn at(h: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 6, 10, h, 0, 0).unwrap()
	}

	fn sample_reservation() -> Reservation {
		Reservation {
			id:              1,
			room_id:         2,
			user_identifier: "20231001".to_string(),
			start_time:      at(14),
			end_time:        at(16),
			cancelled:       false,
			created_at:      at(9),
		}
	}

	#[test]
	fn create_requests_parse_from_camel_case() {
		let request: CreateReservationRequest = serde_json::from_str(
			r#"{
				"roomId": 2,
				"startTime": "2024-06-10T14:00:00Z",
				"endTime": "2024-06-10T16:00:00Z"
			}"#,
		)
		.unwrap();

		let insertable = request.to_insertable("20231001".to_string());

		assert_eq!(insertable.room_id, 2);
		assert_eq!(insertable.user_identifier, "20231001");
		assert_eq!(insertable.start_time, at(14));
	}

	#[test]
	fn responses_carry_the_derived_state() {
		let response =
			ReservationResponse::new(sample_reservation(), None, at(17));

		assert_eq!(response.state, ReservationState::Concluded);

		let body = serde_json::to_value(&response).unwrap();

		assert_eq!(body["state"], "Concluded");
		// No room was attached, the field is skipped entirely
		assert!(body.get("room").is_none());
	}

	#[test]
	fn responses_embed_the_room_when_given() {
		let room = Room {
			id:          2,
			name:        "Lab A".to_string(),
			capacity:    10,
			kind:        RoomKind::Collective,
			location:    None,
			equipment:   vec![],
			description: None,
			status:      RoomStatus::Available,
			active:      true,
			created_at:  at(8),
		};

		let response = ReservationResponse::new(
			sample_reservation(),
			Some(room),
			at(12),
		);

		assert_eq!(response.state, ReservationState::Active);
		assert_eq!(response.room.as_ref().map(|r| r.id), Some(2));
	}
}
