use axum::{response::IntoResponse, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{ActorRole, RequireAuth};

#[derive(Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub role: ActorRole,
    pub name: String,
}

/// GET /me
///
/// Echo the authenticated actor, mostly for front-end session checks.
pub async fn get_me(RequireAuth(actor): RequireAuth) -> impl IntoResponse {
    Json(MeResponse {
        id: actor.id,
        role: actor.role,
        name: actor.name,
    })
}
