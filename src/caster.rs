//! The vote-cast state machine.
//!
//! Gates run in a fixed order and the first failing gate decides the
//! rejection. Everything before the ledger append is a fast-fail
//! optimisation; the append's uniqueness constraint is the real guard.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::biometric::{BiometricPolicy, FaceTemplates, FaceVerifier, TemplateStatus};
use crate::error::{Error, Result};
use crate::integrity::{
    audit_votes, notarize_within, truncate_to_millis, NotarizationInfo, Notary, VoteContent,
    VoteHash, VoteSealer,
};
use crate::model::{
    api::{
        audit::AuditReport, cast::CastRequest, face::FaceCheckResponse, receipt::VoteReceipt,
    },
    common::{ElectionId, Rejection, VoterId, WindowRejection},
    db::{
        election::Election,
        vote::{Vote, VoteCore},
        voter::Voter,
    },
};
use crate::store::{Eligibility, Registry, VoteLedger};

/// Progress of a single cast request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CastStage {
    Received,
    IdentityChecked,
    EligibilityChecked,
    NotAlreadyVoted,
    WindowChecked,
    CandidateChecked,
    Sealed,
    Committed,
}

impl Display for CastStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Everything a cast needs, injected once at startup.
pub struct VoteCaster {
    pub registry: Arc<dyn Registry>,
    pub eligibility: Eligibility,
    pub ledger: Arc<dyn VoteLedger>,
    pub templates: Arc<dyn FaceTemplates>,
    pub verifier: Arc<dyn FaceVerifier>,
    pub policy: BiometricPolicy,
    pub sealer: VoteSealer,
    pub notary: Arc<dyn Notary>,
    pub notary_timeout: Duration,
}

/// Log and produce a rejection.
fn reject<T>(voter_id: &VoterId, election_id: ElectionId, rejection: Rejection) -> Result<T> {
    info!("Vote by {voter_id} in election {election_id} rejected: {rejection}");
    Err(rejection.into())
}

fn stage(voter_id: &VoterId, election_id: ElectionId, stage: CastStage) {
    debug!("Vote by {voter_id} in election {election_id}: {stage}");
}

impl VoteCaster {
    /// Cast a vote now.
    pub async fn cast(&self, election_id: ElectionId, request: &CastRequest) -> Result<VoteReceipt> {
        self.cast_at(election_id, request, Utc::now()).await
    }

    /// Cast a vote as if at `now`.
    pub async fn cast_at(
        &self,
        election_id: ElectionId,
        request: &CastRequest,
        now: DateTime<Utc>,
    ) -> Result<VoteReceipt> {
        let voter_id = &request.voter_id;
        let now = truncate_to_millis(now);
        stage(voter_id, election_id, CastStage::Received);

        // 1. Identity.
        let voter = match self.registry.voter(voter_id).await? {
            Some(voter) if voter.authorized => voter,
            _ => return reject(voter_id, election_id, Rejection::NotAuthorized),
        };

        // 2. Face template, then the session's biometric result.
        match self.templates.status(voter.face_template_ref.as_deref()).await {
            TemplateStatus::Missing => {
                return reject(voter_id, election_id, Rejection::FaceImageMissing)
            }
            TemplateStatus::Invalid => {
                return reject(voter_id, election_id, Rejection::FaceImageInvalid)
            }
            TemplateStatus::Readable => {}
        }
        let verified = request
            .biometric
            .map_or(false, |result| self.policy.admits(&result));
        if !verified {
            return reject(voter_id, election_id, Rejection::FaceNotVerified);
        }
        stage(voter_id, election_id, CastStage::IdentityChecked);

        // 3. Eligibility, OR across the configured lists.
        if !self.eligibility.is_eligible(election_id, &voter.email).await? {
            return reject(voter_id, election_id, Rejection::NotEligible);
        }
        stage(voter_id, election_id, CastStage::EligibilityChecked);

        // 4. Friendly double-vote pre-check.
        if self.ledger.has_voted(voter_id, election_id).await? {
            return reject(voter_id, election_id, Rejection::AlreadyVoted);
        }
        stage(voter_id, election_id, CastStage::NotAlreadyVoted);

        // 5. Window, always recomputed.
        let election = self
            .registry
            .election(election_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
        let status = election.status_at(now);
        self.refresh_cached_status(&election, now).await;
        if let Some(reason) = WindowRejection::for_status(status) {
            return reject(voter_id, election_id, Rejection::ElectionNotActive(reason));
        }
        stage(voter_id, election_id, CastStage::WindowChecked);

        // 6. Candidate membership.
        let candidate = self.registry.candidate(request.candidate_id).await?;
        if !candidate.map_or(false, |candidate| candidate.belongs_to(election_id)) {
            return reject(voter_id, election_id, Rejection::CandidateMismatch);
        }
        stage(voter_id, election_id, CastStage::CandidateChecked);

        // 7. Seal, hash, notarise.
        let content = VoteContent {
            election_id,
            candidate_id: request.candidate_id,
            voter_id: *voter_id,
            cast_at_millis: now.timestamp_millis(),
        };
        let sealed = content
            .to_bytes()
            .and_then(|plaintext| self.sealer.seal(&plaintext))
            .map_err(|e| {
                error!("Failed to seal vote by {voter_id} in election {election_id}: {e}");
                e
            })?;
        let vote_hash = VoteHash::compute(election_id, request.candidate_id, voter_id, now);
        stage(voter_id, election_id, CastStage::Sealed);

        let notarization = match request.notarization_ref.as_deref() {
            Some(reference) if !reference.trim().is_empty() => NotarizationInfo::Recorded {
                reference: reference.to_string(),
            },
            _ => notarize_within(self.notary.as_ref(), &vote_hash, self.notary_timeout).await,
        };

        // 8. The authoritative, atomic step.
        let vote = Vote::new(VoteCore {
            voter_id: *voter_id,
            election_id,
            candidate_id: request.candidate_id,
            sealed,
            vote_hash,
            notarization_ref: notarization.reference().map(str::to_string),
            cast_at: now,
        });
        match self.ledger.append(&vote, &voter.email).await {
            Ok(()) => {}
            Err(Error::StorageConflict) => {
                info!("Vote by {voter_id} in election {election_id} lost a race to a concurrent vote");
                return reject(voter_id, election_id, Rejection::AlreadyVoted);
            }
            Err(e) => return Err(e),
        }
        stage(voter_id, election_id, CastStage::Committed);
        info!("Vote {vote_hash} committed in election {election_id}");

        // 9. Receipt.
        Ok(VoteReceipt {
            vote_id: vote.id.into(),
            election_id,
            vote_hash,
            notarization,
            cast_at: now,
        })
    }

    /// Rewrite a stale cached status. Failure only costs a warning.
    async fn refresh_cached_status(&self, election: &Election, now: DateTime<Utc>) {
        let status = election.status_at(now);
        if status == election.status {
            return;
        }
        debug!(
            "Election {} cached status {} is stale, now {status}",
            election.id, election.status
        );
        if let Err(e) = self.registry.refresh_status(election.id, status).await {
            warn!("Failed to refresh status of election {}: {e}", election.id);
        }
    }

    /// Ask the face service about a sample, and whether our policy would accept it.
    pub async fn check_face(&self, voter_id: &VoterId, sample_b64: &str) -> Result<FaceCheckResponse> {
        let voter: Voter = self
            .registry
            .voter(voter_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Voter {voter_id}")))?;

        match self.templates.status(voter.face_template_ref.as_deref()).await {
            TemplateStatus::Missing => return Err(Rejection::FaceImageMissing.into()),
            TemplateStatus::Invalid => return Err(Rejection::FaceImageInvalid.into()),
            TemplateStatus::Readable => {}
        }

        let result = self.verifier.verify(&voter, sample_b64).await?;
        let accepted = self.policy.admits(&result);
        debug!(
            "Face check for {voter_id}: matched={} distance={:?} accepted={accepted}",
            result.matched, result.distance
        );
        Ok(FaceCheckResponse::new(result, accepted))
    }

    /// Check every stored vote of an election.
    pub async fn audit(&self, election_id: ElectionId) -> Result<AuditReport> {
        let votes = self.ledger.votes(election_id).await?;
        Ok(audit_votes(election_id, votes, &self.sealer))
    }
}

#[cfg(test)]
pub mod testing {
    //! A fully in-memory caster with the example data loaded.

    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::biometric::{
        fakes::{FixedFaceVerifier, FixedTemplates},
        FaceMatch,
    };
    use crate::integrity::{DisabledNotary, KEY_LEN};
    use crate::model::{
        api::eligibility::EligibilityRow,
        db::{
            candidate::Candidate,
            eligibility::EligibilityList,
            voter::{Voter, VoterCore},
        },
        mongodb::Id,
    };
    use crate::store::{EligibilitySource, MemoryStore};

    pub const TEST_KEY: [u8; KEY_LEN] = [42; KEY_LEN];

    pub struct Fixture {
        pub store: MemoryStore,
        pub caster: VoteCaster,
        /// Authorized, eligible via the current list, with a readable template.
        pub voter: Voter,
    }

    pub async fn fixture() -> Fixture {
        fixture_with(Arc::new(DisabledNotary), TemplateStatus::Readable).await
    }

    pub async fn fixture_with(notary: Arc<dyn Notary>, template: TemplateStatus) -> Fixture {
        let store = MemoryStore::default();
        store.insert_election(Election::active_example()).await;
        store.insert_election(Election::upcoming_example()).await;
        store.insert_election(Election::completed_example()).await;
        store.insert_candidate(Candidate::example()).await;
        store.insert_candidate(Candidate::example2()).await;
        store.insert_candidate(Candidate::other_election_example()).await;

        let voter = Voter::new(Id::new(), VoterCore::example());
        store.insert_voter(voter.clone()).await;
        let row = EligibilityRow {
            name: voter.name.clone(),
            email: voter.email.clone(),
            active: true,
        };
        for election in [
            Election::active_example(),
            Election::upcoming_example(),
            Election::completed_example(),
        ] {
            store
                .list(EligibilityList::Current)
                .import(election.id, &[row.clone()])
                .await
                .unwrap();
        }

        let caster = VoteCaster {
            registry: Arc::new(store.clone()),
            eligibility: store.eligibility(&EligibilityList::ALL),
            ledger: Arc::new(store.clone()),
            templates: Arc::new(FixedTemplates(template)),
            verifier: Arc::new(FixedFaceVerifier(FaceMatch {
                matched: true,
                distance: Some(0.2),
            })),
            policy: BiometricPolicy::default(),
            sealer: VoteSealer::new(&TEST_KEY).unwrap(),
            notary,
            notary_timeout: Duration::from_millis(200),
        };

        Fixture {
            store,
            caster,
            voter,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;
    use rocket::tokio;

    use super::testing::{fixture, fixture_with};
    use super::*;
    use crate::biometric::FaceMatch;
    use crate::integrity::{
        fakes::{BrokenNotary, FixedNotary},
        DisabledNotary,
    };
    use crate::model::{
        api::audit::AuditVerdict,
        common::ElectionStatus,
        db::{
            candidate::Candidate,
            election::examples::{ACTIVE_ID, COMPLETED_ID, UPCOMING_ID},
            eligibility::EligibilityList,
            voter::VoterCore,
        },
        mongodb::Id,
    };
    use crate::store::EligibilitySource;

    fn rejection(result: Result<VoteReceipt>) -> Rejection {
        match result {
            Err(Error::Rejected(rejection)) => rejection,
            Ok(receipt) => panic!("expected a rejection, got {receipt:?}"),
            Err(e) => panic!("expected a rejection, got {e}"),
        }
    }

    #[rocket::async_test]
    async fn happy_path() {
        let fixture = fixture().await;
        let request = CastRequest::example(fixture.voter.id);

        let receipt = fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();

        assert_eq!(receipt.election_id, ACTIVE_ID);
        assert_eq!(receipt.notarization, NotarizationInfo::Skipped);
        assert_eq!(
            receipt.vote_hash,
            VoteHash::compute(ACTIVE_ID, request.candidate_id, &fixture.voter.id, receipt.cast_at)
        );

        let votes = fixture.store.votes(ACTIVE_ID).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].vote_hash, receipt.vote_hash);
        assert_eq!(votes[0].candidate_id, request.candidate_id);

        let records = fixture.store.records(EligibilityList::Current, ACTIVE_ID).await;
        assert!(records[0].has_voted);
    }

    #[rocket::async_test]
    async fn sealed_payload_opens_to_the_vote() {
        let fixture = fixture().await;
        let request = CastRequest::example(fixture.voter.id);
        fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();

        let vote = fixture.store.votes(ACTIVE_ID).await.unwrap().remove(0);
        let plaintext = fixture.caster.sealer.unseal(&vote.sealed).unwrap();
        let content = VoteContent::from_bytes(&plaintext).unwrap();
        assert!(content.matches(&vote));
    }

    #[rocket::async_test]
    async fn double_vote_sequential() {
        let fixture = fixture().await;
        let request = CastRequest::example(fixture.voter.id);

        fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();
        let second = fixture.caster.cast(ACTIVE_ID, &request).await;

        assert_eq!(rejection(second), Rejection::AlreadyVoted);
        assert_eq!(fixture.store.votes(ACTIVE_ID).await.unwrap().len(), 1);
    }

    #[test]
    fn concurrent_casts_commit_once() {
        const ATTEMPTS: usize = 16;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            // The notary delay holds every attempt after the pre-checks, so
            // they all race on the append.
            let notary = Arc::new(FixedNotary::delayed("tx", std::time::Duration::from_millis(50)));
            let fixture = fixture_with(notary, TemplateStatus::Readable).await;
            let caster = Arc::new(fixture.caster);
            let request = CastRequest::example(fixture.voter.id);

            let handles: Vec<_> = (0..ATTEMPTS)
                .map(|_| {
                    let caster = caster.clone();
                    let request = request.clone();
                    tokio::spawn(async move { caster.cast(ACTIVE_ID, &request).await })
                })
                .collect();

            let mut successes = 0;
            let mut already_voted = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => successes += 1,
                    Err(Error::Rejected(Rejection::AlreadyVoted)) => already_voted += 1,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }

            assert_eq!(successes, 1);
            assert_eq!(already_voted, ATTEMPTS - 1);
            assert_eq!(fixture.store.votes(ACTIVE_ID).await.unwrap().len(), 1);
        });
    }

    #[rocket::async_test]
    async fn unknown_or_unauthorized_voter() {
        let fixture = fixture().await;

        let stranger = CastRequest::example(Id::new());
        assert_eq!(
            rejection(fixture.caster.cast(ACTIVE_ID, &stranger).await),
            Rejection::NotAuthorized
        );

        let mut core = VoterCore::example2();
        core.authorized = false;
        let unauthorized = Voter::new(Id::new(), core);
        fixture.store.insert_voter(unauthorized.clone()).await;
        let request = CastRequest::example(unauthorized.id);
        assert_eq!(
            rejection(fixture.caster.cast(ACTIVE_ID, &request).await),
            Rejection::NotAuthorized
        );
    }

    #[rocket::async_test]
    async fn template_problems() {
        let missing = fixture_with(Arc::new(DisabledNotary), TemplateStatus::Missing).await;
        let request = CastRequest::example(missing.voter.id);
        assert_eq!(
            rejection(missing.caster.cast(ACTIVE_ID, &request).await),
            Rejection::FaceImageMissing
        );

        let invalid = fixture_with(Arc::new(DisabledNotary), TemplateStatus::Invalid).await;
        let request = CastRequest::example(invalid.voter.id);
        assert_eq!(
            rejection(invalid.caster.cast(ACTIVE_ID, &request).await),
            Rejection::FaceImageInvalid
        );
    }

    #[rocket::async_test]
    async fn biometric_fails_closed() {
        let fixture = fixture().await;
        let cases = [
            None,
            Some(FaceMatch {
                matched: true,
                distance: None,
            }),
            Some(FaceMatch {
                matched: true,
                distance: Some(0.4),
            }),
            Some(FaceMatch {
                matched: false,
                distance: Some(0.1),
            }),
        ];
        for biometric in cases {
            let mut request = CastRequest::example(fixture.voter.id);
            request.biometric = biometric;
            assert_eq!(
                rejection(fixture.caster.cast(ACTIVE_ID, &request).await),
                Rejection::FaceNotVerified,
                "{biometric:?}"
            );
        }
        assert!(fixture.store.votes(ACTIVE_ID).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn not_eligible() {
        let fixture = fixture().await;
        let outsider = Voter::new(Id::new(), VoterCore::example2());
        fixture.store.insert_voter(outsider.clone()).await;
        let request = CastRequest::example(outsider.id);
        assert_eq!(
            rejection(fixture.caster.cast(ACTIVE_ID, &request).await),
            Rejection::NotEligible
        );
    }

    #[rocket::async_test]
    async fn window_rejections_differ() {
        let fixture = fixture().await;

        let mut request = CastRequest::example(fixture.voter.id);
        request.candidate_id = Candidate::other_election_example().id;
        assert_eq!(
            rejection(fixture.caster.cast(UPCOMING_ID, &request).await),
            Rejection::ElectionNotActive(WindowRejection::NotStarted)
        );
        assert_eq!(
            rejection(fixture.caster.cast(COMPLETED_ID, &request).await),
            Rejection::ElectionNotActive(WindowRejection::Ended)
        );
        assert!(fixture.store.votes(UPCOMING_ID).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn window_boundaries_are_inclusive() {
        let fixture = fixture().await;
        let election = fixture.store.election(ACTIVE_ID).await.unwrap().unwrap();
        let request = CastRequest::example(fixture.voter.id);

        let early = election.start_time - ChronoDuration::seconds(1);
        assert_eq!(
            rejection(fixture.caster.cast_at(ACTIVE_ID, &request, early).await),
            Rejection::ElectionNotActive(WindowRejection::NotStarted)
        );
        fixture
            .caster
            .cast_at(ACTIVE_ID, &request, election.end_time)
            .await
            .unwrap();
    }

    #[rocket::async_test]
    async fn stale_status_is_refreshed_not_trusted() {
        let fixture = fixture().await;
        // The cache claims the election is over; the window says otherwise.
        fixture
            .store
            .refresh_status(ACTIVE_ID, ElectionStatus::Completed)
            .await
            .unwrap();

        let request = CastRequest::example(fixture.voter.id);
        fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();

        let election = fixture.store.election(ACTIVE_ID).await.unwrap().unwrap();
        assert_eq!(election.status, ElectionStatus::Active);
    }

    #[rocket::async_test]
    async fn candidate_mismatch() {
        let fixture = fixture().await;
        let mut request = CastRequest::example(fixture.voter.id);
        request.candidate_id = Candidate::other_election_example().id;
        assert_eq!(
            rejection(fixture.caster.cast(ACTIVE_ID, &request).await),
            Rejection::CandidateMismatch
        );

        request.candidate_id = 999;
        assert_eq!(
            rejection(fixture.caster.cast(ACTIVE_ID, &request).await),
            Rejection::CandidateMismatch
        );
    }

    #[rocket::async_test]
    async fn gate_order() {
        // Ineligible *and* wrong candidate *and* upcoming: eligibility is reported.
        let fixture = fixture().await;
        let outsider = Voter::new(Id::new(), VoterCore::example2());
        fixture.store.insert_voter(outsider.clone()).await;
        let mut request = CastRequest::example(outsider.id);
        request.candidate_id = 999;
        request.biometric = Some(FaceMatch {
            matched: true,
            distance: Some(0.0),
        });
        assert_eq!(
            rejection(fixture.caster.cast(UPCOMING_ID, &request).await),
            Rejection::NotEligible
        );

        // Already voted beats a closed window.
        let fixture = super::testing::fixture().await;
        let request = CastRequest::example(fixture.voter.id);
        fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();
        let election = fixture.store.election(ACTIVE_ID).await.unwrap().unwrap();
        let late = election.end_time + ChronoDuration::seconds(1);
        assert_eq!(
            rejection(fixture.caster.cast_at(ACTIVE_ID, &request, late).await),
            Rejection::AlreadyVoted
        );
    }

    #[rocket::async_test]
    async fn notary_down_still_casts() {
        let fixture = fixture_with(Arc::new(BrokenNotary), TemplateStatus::Readable).await;
        let request = CastRequest::example(fixture.voter.id);
        let receipt = fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();
        assert_eq!(receipt.notarization, NotarizationInfo::Unavailable);
        let vote = fixture.store.votes(ACTIVE_ID).await.unwrap().remove(0);
        assert_eq!(vote.notarization_ref, None);
    }

    #[rocket::async_test]
    async fn notary_timeout_still_casts() {
        let slow = FixedNotary::delayed("tx-late", std::time::Duration::from_secs(5));
        let fixture = fixture_with(Arc::new(slow), TemplateStatus::Readable).await;
        let request = CastRequest::example(fixture.voter.id);
        let receipt = fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();
        assert_eq!(receipt.notarization, NotarizationInfo::Unavailable);
    }

    #[rocket::async_test]
    async fn notarised() {
        let fixture = fixture_with(Arc::new(FixedNotary::new("tx-7")), TemplateStatus::Readable).await;
        let request = CastRequest::example(fixture.voter.id);
        let receipt = fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();
        assert_eq!(receipt.notarization.reference(), Some("tx-7"));
        let vote = fixture.store.find_by_hash(&receipt.vote_hash).await.unwrap().unwrap();
        assert_eq!(vote.notarization_ref.as_deref(), Some("tx-7"));
    }

    #[rocket::async_test]
    async fn precomputed_reference_is_kept() {
        let fixture = fixture_with(Arc::new(FixedNotary::new("tx-ignored")), TemplateStatus::Readable).await;
        let mut request = CastRequest::example(fixture.voter.id);
        request.notarization_ref = Some("client-tx".to_string());
        let receipt = fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();
        assert_eq!(receipt.notarization.reference(), Some("client-tx"));
    }

    #[rocket::async_test]
    async fn eligibility_via_legacy_list_only() {
        let fixture = fixture().await;
        let legacy = Voter::new(Id::new(), VoterCore::example2());
        fixture.store.insert_voter(legacy.clone()).await;
        fixture
            .store
            .list(EligibilityList::LegacyWhitelist)
            .import(
                ACTIVE_ID,
                &[crate::model::api::eligibility::EligibilityRow {
                    name: legacy.name.clone(),
                    email: legacy.email.clone(),
                    active: true,
                }],
            )
            .await
            .unwrap();

        let request = CastRequest::example(legacy.id);
        fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();
    }

    #[rocket::async_test]
    async fn audit_after_casts() {
        let fixture = fixture().await;
        let request = CastRequest::example(fixture.voter.id);
        fixture.caster.cast(ACTIVE_ID, &request).await.unwrap();

        let report = fixture.caster.audit(ACTIVE_ID).await.unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.entries[0].verdict, AuditVerdict::Intact);
    }

    #[rocket::async_test]
    async fn face_check() {
        let fixture = fixture().await;
        let response = fixture
            .caster
            .check_face(&fixture.voter.id, "aGVsbG8=")
            .await
            .unwrap();
        assert!(response.matched);
        assert!(response.accepted);

        assert!(matches!(
            fixture.caster.check_face(&Id::new(), "aGVsbG8=").await,
            Err(Error::Status(..))
        ));
    }
}
