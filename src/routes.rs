use std::time::Duration;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::controllers::healthcheck;
use crate::controllers::reservation::{
	admin_cancel_reservation,
	cancel_reservation,
	create_reservation,
	get_my_reservations,
	get_room_slots,
};
use crate::controllers::room::{
	create_room,
	delete_room,
	get_room,
	get_rooms,
	lookup_room,
	update_room,
};
use crate::middleware::{AuthLayer, StaffLayer};
use crate::AppState;

/// Get the app router
pub fn get_app_router(state: AppState) -> Router {
	let api_routes = Router::new()
		.route("/healthcheck", get(healthcheck))
		.nest("/rooms", room_routes())
		.nest("/reservations", reservation_routes())
		.nest("/admin", admin_routes());

	Router::new()
		.merge(api_routes)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(10))),
		)
		.with_state(state)
}

/// Room routes with staff protection for write operations
fn room_routes() -> Router<AppState> {
	let staff = Router::new()
		.route("/", post(create_room))
		.route("/{id}", patch(update_room).delete(delete_room))
		.route_layer(StaffLayer::new())
		.route_layer(AuthLayer::new());

	Router::new()
		.route("/", get(get_rooms))
		.route("/lookup", get(lookup_room))
		.route("/{id}", get(get_room))
		.route("/{id}/slots", get(get_room_slots))
		.merge(staff)
}

/// Reservation routes, all of them need an authenticated actor
fn reservation_routes() -> Router<AppState> {
	Router::new()
		.route("/", get(get_my_reservations).post(create_reservation))
		.route("/{id}", delete(cancel_reservation))
		.route_layer(AuthLayer::new())
}

/// Administrative routes
fn admin_routes() -> Router<AppState> {
	Router::new()
		.route("/reservations/{id}", delete(admin_cancel_reservation))
		.route_layer(StaffLayer::new())
		.route_layer(AuthLayer::new())
}
