use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::skip_serializing_none;
use validator_derive::Validate;

use crate::error::Error;
use crate::models::{NewRoom, Room, RoomKind, RoomStatus, RoomUpdate};

#[skip_serializing_none]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
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

impl From<Room> for RoomResponse {
	fn from(value: Room) -> Self {
		Self {
			id:          value.id,
			name:        value.name,
			capacity:    value.capacity,
			kind:        value.kind,
			location:    value.location,
			equipment:   value.equipment,
			description: value.description,
			status:      value.status,
			active:      value.active,
			created_at:  value.created_at,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
	#[validate(length(min = 1))]
	pub name:        String,
	#[validate(range(min = 1))]
	pub capacity:    i32,
	pub kind:        RoomKind,
	pub location:    Option<String>,
	#[serde(default, deserialize_with = "de_equipment")]
	pub equipment:   Vec<String>,
	pub description: Option<String>,
	#[serde(default)]
	pub status:      RoomStatus,
}

impl CreateRoomRequest {
	/// Normalize this request into an insertable [`NewRoom`]
	///
	/// # Errors
	/// Fails if the name is empty once trimmed
	pub fn to_insertable(self) -> Result<NewRoom, Error> {
		Ok(NewRoom {
			name:        required_trimmed("name", self.name)?,
			capacity:    self.capacity,
			kind:        self.kind,
			location:    optional_trimmed(self.location),
			equipment:   clean_equipment(self.equipment),
			description: optional_trimmed(self.description),
			status:      self.status,
		})
	}
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomRequest {
	#[validate(length(min = 1))]
	pub name:        Option<String>,
	#[validate(range(min = 1))]
	pub capacity:    Option<i32>,
	pub kind:        Option<RoomKind>,
	pub location:    Option<String>,
	#[serde(default, deserialize_with = "de_equipment_opt")]
	pub equipment:   Option<Vec<String>>,
	pub description: Option<String>,
	pub status:      Option<RoomStatus>,
}

impl UpdateRoomRequest {
	/// Normalize this request into a [`RoomUpdate`] changeset
	///
	/// Absent fields keep their stored values; sending an empty string for an
	/// optional field clears it
	///
	/// # Errors
	/// Fails if a new name is empty once trimmed
	pub fn to_changeset(self) -> Result<RoomUpdate, Error> {
		let name = match self.name {
			Some(name) => Some(required_trimmed("name", name)?),
			None => None,
		};

		Ok(RoomUpdate {
			name,
			capacity: self.capacity,
			kind: self.kind,
			location: self.location.map(|v| optional_trimmed(Some(v))),
			equipment: self.equipment.map(clean_equipment),
			description: self.description.map(|v| optional_trimmed(Some(v))),
			status: self.status,
		})
	}
}

/// Filter for the room listing
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFilter {
	#[serde(default = "active_only_default")]
	pub active_only: bool,
}

const fn active_only_default() -> bool { true }

impl Default for RoomFilter {
	fn default() -> Self { Self { active_only: true } }
}

/// Query parameters for the room lookup by name
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RoomLookup {
	pub name: Option<String>,
}

fn required_trimmed(field: &str, value: String) -> Result<String, Error> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(Error::ValidationError(format!(
			"the room {field} must not be empty"
		)));
	}

	Ok(trimmed.to_string())
}

fn optional_trimmed(value: Option<String>) -> Option<String> {
	value.and_then(|v| {
		let trimmed = v.trim();

		if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
	})
}

fn clean_equipment(items: Vec<String>) -> Vec<String> {
	items
		.into_iter()
		.filter_map(|item| {
			let trimmed = item.trim();

			if trimmed.is_empty() {
				None
			} else {
				Some(trimmed.to_string())
			}
		})
		.collect()
}

/// A visitor accepting equipment as either a list of strings or a single
/// comma-separated string; string-to-list coercion stays an API boundary
/// concern, the stored form is always a list
struct EquipmentInput;

impl<'de> Visitor<'de> for EquipmentInput {
	type Value = Vec<String>;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "a list of strings or a comma-separated string")
	}

	fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
	where
		E: serde::de::Error,
	{
		Ok(v.split(',').map(str::to_owned).collect())
	}

	fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
	where
		A: SeqAccess<'de>,
	{
		let mut items = Vec::new();

		while let Some(item) = seq.next_element::<String>()? {
			items.push(item);
		}

		Ok(items)
	}
}

fn de_equipment<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	d.deserialize_any(EquipmentInput)
}

struct MaybeEquipmentInput;

impl<'de> Visitor<'de> for MaybeEquipmentInput {
	type Value = Option<Vec<String>>;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "a list of strings, a comma-separated string, or null")
	}

	fn visit_none<E>(self) -> Result<Self::Value, E>
	where
		E: serde::de::Error,
	{
		Ok(None)
	}

	fn visit_unit<E>(self) -> Result<Self::Value, E>
	where
		E: serde::de::Error,
	{
		Ok(None)
	}

	fn visit_some<D>(self, d: D) -> Result<Self::Value, D::Error>
	where
		D: Deserializer<'de>,
	{
		de_equipment(d).map(Some)
	}
}

fn de_equipment_opt<'de, D>(d: D) -> Result<Option<Vec<String>>, D::Error>
where
	D: Deserializer<'de>,
{
	d.deserialize_option(MaybeEquipmentInput)
}

#[cfg(test)]
mod tests {
	use validator::Validate;

	use super::*;

	#[test]
	fn equipment_accepts_a_list() {
		let request: CreateRoomRequest = serde_json::from_str(
			r#"{
				"name": "Lab A",
				"capacity": 10,
				"kind": "Collective",
				"equipment": ["Projector", " Whiteboard ", ""]
			}"#,
		)
		.unwrap();

		let room = request.to_insertable().unwrap();

		assert_eq!(room.equipment, vec!["Projector", "Whiteboard"]);
	}

	#[test]
	fn equipment_accepts_a_comma_separated_string() {
		let request: CreateRoomRequest = serde_json::from_str(
			r#"{
				"name": "Lab A",
				"capacity": 10,
				"kind": "Collective",
				"equipment": "Projector, Whiteboard,,Microphone"
			}"#,
		)
		.unwrap();

		let room = request.to_insertable().unwrap();

		assert_eq!(
			room.equipment,
			vec!["Projector", "Whiteboard", "Microphone"]
		);
	}

	#[test]
	fn non_string_equipment_members_are_rejected() {
		let result = serde_json::from_str::<CreateRoomRequest>(
			r#"{
				"name": "Lab A",
				"capacity": 10,
				"kind": "Collective",
				"equipment": ["Projector", 3]
			}"#,
		);

		assert!(result.is_err());
	}

	#[test]
	fn optional_fields_are_trimmed_to_null() {
		let request: CreateRoomRequest = serde_json::from_str(
			r#"{
				"name": "  Lab A  ",
				"capacity": 10,
				"kind": "Auditorium",
				"location": "   ",
				"description": " First floor "
			}"#,
		)
		.unwrap();

		let room = request.to_insertable().unwrap();

		assert_eq!(room.name, "Lab A");
		assert_eq!(room.location, None);
		assert_eq!(room.description.as_deref(), Some("First floor"));
		assert_eq!(room.status, RoomStatus::Available);
		assert!(room.equipment.is_empty());
	}

	#[test]
	fn blank_names_fail_validation() {
		let request: CreateRoomRequest = serde_json::from_str(
			r#"{"name": "   ", "capacity": 10, "kind": "Collective"}"#,
		)
		.unwrap();

		assert!(matches!(
			request.to_insertable(),
			Err(Error::ValidationError(_))
		));
	}

	#[test]
	fn non_positive_capacity_fails_validation() {
		let request: CreateRoomRequest = serde_json::from_str(
			r#"{"name": "Lab A", "capacity": 0, "kind": "Collective"}"#,
		)
		.unwrap();

		assert!(request.validate().is_err());
	}

	#[test]
	fn unknown_kinds_are_rejected() {
		let result = serde_json::from_str::<CreateRoomRequest>(
			r#"{"name": "Lab A", "capacity": 10, "kind": "Closet"}"#,
		);

		assert!(result.is_err());
	}

	#[test]
	fn partial_updates_keep_absent_fields() {
		let request: UpdateRoomRequest =
			serde_json::from_str(r#"{"capacity": 25}"#).unwrap();

		let changeset = request.to_changeset().unwrap();

		assert_eq!(changeset.capacity, Some(25));
		assert!(changeset.name.is_none());
		assert!(changeset.location.is_none());
		assert!(changeset.equipment.is_none());
	}

	#[test]
	fn empty_optional_updates_clear_the_field() {
		let request: UpdateRoomRequest =
			serde_json::from_str(r#"{"location": "  "}"#).unwrap();

		let changeset = request.to_changeset().unwrap();

		assert_eq!(changeset.location, Some(None));
	}

	#[test]
	fn update_equipment_accepts_both_forms() {
		let from_string: UpdateRoomRequest =
			serde_json::from_str(r#"{"equipment": "Projector, Screen"}"#)
				.unwrap();
		let from_list: UpdateRoomRequest =
			serde_json::from_str(r#"{"equipment": ["Projector", "Screen"]}"#)
				.unwrap();

		let expected = Some(vec![
			"Projector".to_string(),
			"Screen".to_string(),
		]);

		assert_eq!(from_string.to_changeset().unwrap().equipment, expected);
		assert_eq!(from_list.to_changeset().unwrap().equipment, expected);
	}
}
