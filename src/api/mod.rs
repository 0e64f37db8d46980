use rocket::{
    http::Status,
    serde::json::{json, Json, Value},
    Catcher, Request, Route,
};

use crate::error::GENERIC_SERVER_ERROR;

pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod responses;
pub(crate) mod survey;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(survey::routes());
    routes.extend(responses::routes());
    routes.extend(auth::routes());
    routes.extend(admin::routes());
    routes
}

/// JSON bodies for failures that never reach a handler, such as rejected
/// request guards or malformed request bodies.
pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, not_found, unprocessable, default_catcher]
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({ "message": "Unauthenticated." }))
}

#[catch(404)]
fn not_found() -> Json<Value> {
    Json(json!({ "message": "Not found." }))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    Json(json!({
        "message": "The given data was invalid.",
        "errors": {},
    }))
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<Value>) {
    let message = if status.code >= 500 {
        GENERIC_SERVER_ERROR
    } else {
        status.reason().unwrap_or("Request failed.")
    };
    (status, Json(json!({ "message": message })))
}
