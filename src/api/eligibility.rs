use log::info;
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::caster::VoteCaster;
use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::{Admin, AuthToken},
        eligibility::{EligibilityRow, ImportSummary},
    },
    common::ElectionId,
    db::eligibility::EligibilityList,
};

pub fn routes() -> Vec<Route> {
    routes![import_eligibility]
}

/// Bulk upsert rows into one eligibility list, the current list by default.
#[post(
    "/elections/<election_id>/eligibility?<list>",
    data = "<rows>",
    format = "json"
)]
async fn import_eligibility(
    _token: AuthToken<Admin>,
    election_id: ElectionId,
    list: Option<EligibilityList>,
    rows: Json<Vec<EligibilityRow>>,
    caster: &State<VoteCaster>,
) -> Result<Json<ImportSummary>> {
    let list = list.unwrap_or(EligibilityList::Current);
    let source = caster.eligibility.source(list).ok_or_else(|| {
        Error::Status(
            Status::BadRequest,
            format!("Eligibility list '{list}' is not configured"),
        )
    })?;
    caster
        .registry
        .election(election_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;

    let counts = source.import(election_id, &rows).await?;
    info!(
        "Imported {} rows into the {list} list of election {election_id}: {} new, {} updated, {} skipped",
        rows.len(),
        counts.inserted,
        counts.updated,
        counts.skipped
    );
    Ok(Json(ImportSummary {
        list,
        received: rows.len(),
        counts,
    }))
}

#[cfg(test)]
mod tests {
    use rocket::http::ContentType;
    use rocket::serde::json::serde_json::json;

    use super::*;
    use crate::api::testing::{client, cookie};
    use crate::caster::testing::fixture;
    use crate::model::{common::Email, db::election::examples::ACTIVE_ID, mongodb::Id};

    #[rocket::async_test]
    async fn import_into_whitelist() {
        let fixture = fixture().await;
        let store = fixture.store.clone();
        let eligibility = fixture.caster.eligibility.clone();
        let client = client(fixture.caster).await;
        let admin = Admin { id: Id::new() };

        let rows = json!([
            { "name": "Bob", "email": " BOB@example.org" },
            { "name": "Nobody", "email": "" },
        ]);
        let response = client
            .post(format!("/elections/{ACTIVE_ID}/eligibility?list=legacy_whitelist"))
            .header(ContentType::JSON)
            .cookie(cookie(&client, &admin))
            .body(rows.to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let summary: ImportSummary = response.into_json().await.unwrap();
        assert_eq!(summary.list, EligibilityList::LegacyWhitelist);
        assert_eq!(summary.received, 2);
        assert_eq!((summary.counts.inserted, summary.counts.skipped), (1, 1));

        let records = store
            .records(EligibilityList::LegacyWhitelist, ACTIVE_ID)
            .await;
        assert_eq!(records.len(), 1);
        assert!(eligibility
            .is_eligible(ACTIVE_ID, &Email::normalize("bob@example.org"))
            .await
            .unwrap());
    }

    #[rocket::async_test]
    async fn voters_cannot_import() {
        let fixture = fixture().await;
        let voter = fixture.voter.clone();
        let client = client(fixture.caster).await;

        let response = client
            .post(format!("/elections/{ACTIVE_ID}/eligibility"))
            .header(ContentType::JSON)
            .cookie(cookie(&client, &voter))
            .body("[]")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn unknown_election() {
        let fixture = fixture().await;
        let client = client(fixture.caster).await;
        let admin = Admin { id: Id::new() };

        let response = client
            .post("/elections/99/eligibility")
            .header(ContentType::JSON)
            .cookie(cookie(&client, &admin))
            .body("[]")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
