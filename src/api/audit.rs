use rocket::{serde::json::Json, Route, State};

use crate::caster::VoteCaster;
use crate::error::Result;
use crate::model::{
    api::{
        audit::AuditReport,
        auth::{Admin, AuthToken},
    },
    common::ElectionId,
};

pub fn routes() -> Vec<Route> {
    routes![audit_election]
}

/// Unseal and re-hash every stored vote of an election.
#[get("/elections/<election_id>/audit")]
async fn audit_election(
    _token: AuthToken<Admin>,
    election_id: ElectionId,
    caster: &State<VoteCaster>,
) -> Result<Json<AuditReport>> {
    Ok(Json(caster.audit(election_id).await?))
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;

    use super::*;
    use crate::api::testing::{client, cookie};
    use crate::caster::testing::fixture;
    use crate::model::{
        api::cast::CastRequest, db::election::examples::ACTIVE_ID, mongodb::Id,
    };

    #[rocket::async_test]
    async fn clean_audit() {
        let fixture = fixture().await;
        fixture
            .caster
            .cast(ACTIVE_ID, &CastRequest::example(fixture.voter.id))
            .await
            .unwrap();
        let client = client(fixture.caster).await;
        let admin = Admin { id: Id::new() };

        let response = client
            .get(uri!(audit_election(ACTIVE_ID)))
            .cookie(cookie(&client, &admin))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let report: AuditReport = response.into_json().await.unwrap();
        assert_eq!(report.total, 1);
        assert!(report.is_clean());
    }

    #[rocket::async_test]
    async fn admin_only() {
        let fixture = fixture().await;
        let client = client(fixture.caster).await;

        let response = client.get(uri!(audit_election(ACTIVE_ID))).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
