//! # Campusrooms backend library

#[macro_use]
extern crate tracing;

use axum::extract::FromRef;
use deadpool_diesel::postgres::{Object, Pool};

mod config;
mod seeder;

pub mod actor;
pub mod controllers;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod schemas;

pub use config::*;
pub use seeder::*;

use crate::mailer::Mailer;

pub type DbPool = Pool;
pub type DbConn = Object;

/// Common state of the app
#[derive(Clone)]
pub struct AppState {
	pub config:        Config,
	pub database_pool: DbPool,
	pub mailer:        Mailer,
}

impl FromRef<AppState> for Config {
	fn from_ref(input: &AppState) -> Self { input.config.clone() }
}

impl FromRef<AppState> for DbPool {
	fn from_ref(input: &AppState) -> Self { input.database_pool.clone() }
}

impl FromRef<AppState> for Mailer {
	fn from_ref(input: &AppState) -> Self { input.mailer.clone() }
}
