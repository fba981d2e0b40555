use std::path::PathBuf;

use diesel::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::Error;
use crate::models::{NewRoom, RoomKind, RoomStatus};
use crate::DbConn;

pub struct Seeder<'c> {
	connection: &'c DbConn,
}

impl<'c> Seeder<'c> {
	#[must_use]
	pub fn new(connection: &'c DbConn) -> Self { Self { connection } }

	/// Read a file into a series of deserializable items
	///
	/// # Panics
	/// Panics if reading or deserializing the file fails
	fn read_file_records<T, I>(filename: &str) -> I
	where
		T: DeserializeOwned,
		I: IntoIterator<Item = T> + DeserializeOwned,
	{
		let path = std::env::var("CARGO_MANIFEST_DIR")
			.map(PathBuf::from)
			.unwrap_or_default()
			.join(filename);

		let s = std::fs::read_to_string(path)
			.unwrap_or_else(|_| panic!("COULD NOT READ SEED FILE {filename}"));

		serde_json::from_str(&s)
			.unwrap_or_else(|_| panic!("COULD NOT MAP SEED FILE {filename}"))
	}

	/// Load a file and populate the database with it
	///
	/// # Panics
	/// Panics if reading the file or interacting with the database fails
	pub async fn populate<T, F>(&self, filename: &str, loader: F) -> &Self
	where
		T: DeserializeOwned + std::fmt::Debug,
		F: AsyncFnOnce(&DbConn, Vec<T>) -> Result<(), Error>,
	{
		let records = Self::read_file_records(filename);

		loader(self.connection, records).await.unwrap_or_else(|_| {
			panic!("COULD NOT LOAD RECORDS FOR {filename}")
		});

		info!("seeded database from {filename}");

		self
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct SeedRoom {
	pub name:        String,
	pub capacity:    i32,
	pub kind:        RoomKind,
	#[serde(default)]
	pub location:    Option<String>,
	#[serde(default)]
	pub equipment:   Vec<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub status:      RoomStatus,
}

impl SeedRoom {
	/// Insert this [`SeedRoom`]
	pub async fn insert(self, conn: &DbConn) -> Result<(), Error> {
		let insertable = NewRoom {
			name:        self.name,
			capacity:    self.capacity,
			kind:        self.kind,
			location:    self.location,
			equipment:   self.equipment,
			description: self.description,
			status:      self.status,
		};

		conn.interact(move |conn| {
			use crate::schema::rooms::dsl::*;

			diesel::insert_into(rooms).values(insertable).execute(conn)
		})
		.await??;

		Ok(())
	}
}
