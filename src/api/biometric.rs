use rocket::{http::CookieJar, serde::json::Json, Route, State};

use crate::biometric::FaceMatch;
use crate::caster::VoteCaster;
use crate::config::Config;
use crate::error::Result;
use crate::model::{
    api::{
        auth::{AuthToken, FaceToken},
        face::{FaceCheckRequest, FaceCheckResponse},
    },
    common::{Rejection, VoterId},
    db::voter::Voter,
};

pub fn routes() -> Vec<Route> {
    routes![check_face]
}

/// Run a live face sample past the face service.
///
/// The verdict, pass or fail, replaces the session's face token. Casting
/// reads that token and nothing else.
#[post("/voters/<voter_id>/face", data = "<request>", format = "json")]
async fn check_face(
    token: AuthToken<Voter>,
    voter_id: VoterId,
    request: Json<FaceCheckRequest>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
    caster: &State<VoteCaster>,
) -> Result<Json<FaceCheckResponse>> {
    if token.id != voter_id {
        return Err(Rejection::NotAuthorized.into());
    }
    let response = caster.check_face(&voter_id, &request.sample).await?;
    let result = FaceMatch {
        matched: response.matched,
        distance: response.distance,
    };
    cookies.add(FaceToken::new(voter_id, result).into_cookie(config)?);
    Ok(Json(response))
}
