use axum::{
	Router,
	routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::App;
use crate::auth;
use crate::location;

pub fn init(state: App) -> Router {
	Router::new()
		.route("/api/auth/register", post(auth::register::post_register))
		.route("/api/auth/login", post(auth::handler::post_login))
		.route("/api/auth/logout", post(auth::handler::post_logout))
		.route("/api/auth/grants", get(auth::handler::get_grants))
		.route("/api/locations", get(location::get_locations).post(location::post_location))
		.route(
			"/api/locations/{id}",
			get(location::get_location).put(location::put_location).delete(location::delete_location),
		)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

// vim: ts=4
