use rocket::{serde::json::Json, Route, State};

use crate::caster::VoteCaster;
use crate::error::{Error, Result};
use crate::integrity::VoteHash;
use crate::model::api::receipt::PublicReceipt;

pub fn routes() -> Vec<Route> {
    routes![vote_by_hash]
}

/// Public proof that a vote with this hash was recorded.
#[get("/votes/<vote_hash>")]
async fn vote_by_hash(vote_hash: VoteHash, caster: &State<VoteCaster>) -> Result<Json<PublicReceipt>> {
    let vote = caster
        .ledger
        .find_by_hash(&vote_hash)
        .await?
        .ok_or_else(|| Error::not_found(format!("Vote {vote_hash}")))?;
    Ok(Json(vote.into()))
}
