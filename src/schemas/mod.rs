//! Request and response schemas for the HTTP API

pub mod reservation;
pub mod room;
