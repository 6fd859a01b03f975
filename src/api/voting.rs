use log::warn;
use rocket::{
    http::{CookieJar, Status},
    response::status::Custom,
    serde::json::Json,
    Route, State,
};

use crate::caster::VoteCaster;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::{AuthToken, FaceToken},
        cast::{CastRequest, CastResponse},
    },
    common::{ElectionId, Rejection},
    db::voter::Voter,
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, cast_vote_not_json, cast_vote_unauthenticated]
}

fn rejected(rejection: Rejection) -> Custom<Json<CastResponse>> {
    Custom(rejection.status(), Json(CastResponse::rejected(rejection)))
}

#[post("/elections/<election_id>/votes", data = "<request>", format = "json")]
async fn cast_vote(
    token: AuthToken<Voter>,
    election_id: ElectionId,
    request: Json<CastRequest>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
    caster: &State<VoteCaster>,
) -> Result<Custom<Json<CastResponse>>> {
    // Voters may only cast their own vote.
    if token.id != request.voter_id {
        warn!(
            "Voter {} tried to cast a vote as {}",
            token.id, request.voter_id
        );
        return Ok(rejected(Rejection::NotAuthorized));
    }

    // Only the server's own face check counts.
    let mut request = request.into_inner();
    request.biometric = FaceToken::for_voter(cookies, config, &request.voter_id);

    match caster.cast(election_id, &request).await {
        Ok(receipt) => Ok(Custom(Status::Ok, Json(CastResponse::accepted(&receipt)))),
        Err(Error::Rejected(rejection)) => Ok(rejected(rejection)),
        Err(e) => Err(e),
    }
}

/// A valid voter token, but the body is not JSON.
#[post("/elections/<_election_id>/votes", rank = 2)]
fn cast_vote_not_json(_token: AuthToken<Voter>, _election_id: ElectionId) -> Error {
    Error::Status(
        Status::UnsupportedMediaType,
        "Votes must be sent as JSON".to_string(),
    )
}

/// No valid voter token: still answer in the cast response shape.
#[post("/elections/<_election_id>/votes", rank = 3)]
fn cast_vote_unauthenticated(_election_id: ElectionId) -> Custom<Json<CastResponse>> {
    Custom(
        Status::Unauthorized,
        Json(CastResponse::rejected(Rejection::NotAuthorized)),
    )
}
