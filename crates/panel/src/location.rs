//! Location handlers
//!
//! Reads need `locations.view`, writes need `locations.edit`, either on the
//! location itself or globally.

use axum::{
	Json,
	extract::{Path, State},
	http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use panel_core::Auth;
use panel_types::scope::Scope;
use panel_types::store_adapter::{Location, LocationData};
use panel_types::types::ApiResponse;

use crate::prelude::*;

#[derive(Debug, Deserialize)]
pub struct LocationReq {
	#[serde(default)]
	code: String,
	#[serde(default)]
	name: String,
}

/// # GET /api/locations
pub async fn get_locations(
	State(app): State<App>,
	Auth(auth): Auth,
) -> PnResult<(StatusCode, Json<ApiResponse<Vec<Location>>>)> {
	app.perms.require(auth.user_id, &Scope::LOCATIONS_VIEW, None).await?;
	let locations = app.store.list_locations().await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(locations))))
}

/// # GET /api/locations/{id}
pub async fn get_location(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(location_id): Path<Uuid>,
) -> PnResult<(StatusCode, Json<ApiResponse<Location>>)> {
	let target = location_id.to_string();
	app.perms.require(auth.user_id, &Scope::LOCATIONS_VIEW, Some(&target)).await?;
	let location = app.store.read_location(location_id).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(location))))
}

/// # POST /api/locations
pub async fn post_location(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(req): Json<LocationReq>,
) -> PnResult<(StatusCode, Json<ApiResponse<Location>>)> {
	app.perms.require(auth.user_id, &Scope::LOCATIONS_EDIT, None).await?;
	let location = app
		.store
		.create_location(&LocationData {
			location_id: Uuid::new_v4(),
			code: &req.code,
			name: &req.name,
		})
		.await?;
	info!("{} created location {}", auth.username, location.code);
	Ok((StatusCode::CREATED, Json(ApiResponse::new(location))))
}

/// # PUT /api/locations/{id}
pub async fn put_location(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(location_id): Path<Uuid>,
	Json(req): Json<LocationReq>,
) -> PnResult<(StatusCode, Json<ApiResponse<Location>>)> {
	let target = location_id.to_string();
	app.perms.require(auth.user_id, &Scope::LOCATIONS_EDIT, Some(&target)).await?;
	let location = app
		.store
		.update_location(&LocationData { location_id, code: &req.code, name: &req.name })
		.await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(location))))
}

/// # DELETE /api/locations/{id}
pub async fn delete_location(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(location_id): Path<Uuid>,
) -> PnResult<(StatusCode, Json<ApiResponse<()>>)> {
	let target = location_id.to_string();
	app.perms.require(auth.user_id, &Scope::LOCATIONS_EDIT, Some(&target)).await?;
	app.store.delete_location(location_id).await?;
	info!("{} deleted location {}", auth.username, location_id);
	Ok((StatusCode::OK, Json(ApiResponse::new(()))))
}

// vim: ts=4
