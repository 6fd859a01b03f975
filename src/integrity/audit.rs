use log::{error, info};

use super::{VoteContent, VoteHash, VoteSealer};
use crate::model::{
    api::audit::{AuditEntry, AuditReport, AuditVerdict},
    common::ElectionId,
    db::vote::Vote,
};

/// Check every vote independently. A broken record is reported, never fatal to the batch.
pub fn audit_votes<I>(election_id: ElectionId, votes: I, sealer: &VoteSealer) -> AuditReport
where
    I: IntoIterator<Item = Vote>,
{
    let entries: Vec<AuditEntry> = votes
        .into_iter()
        .map(|vote| AuditEntry {
            vote_id: vote.id.into(),
            vote_hash: vote.vote_hash,
            verdict: audit_vote(&vote, sealer),
        })
        .collect();

    let intact = entries
        .iter()
        .filter(|entry| entry.verdict == AuditVerdict::Intact)
        .count();
    info!(
        "Audited election {election_id}: {intact} of {} votes intact",
        entries.len()
    );

    AuditReport {
        election_id,
        total: entries.len(),
        intact,
        entries,
    }
}

fn audit_vote(vote: &Vote, sealer: &VoteSealer) -> AuditVerdict {
    let content = match sealer
        .unseal(&vote.sealed)
        .and_then(|plaintext| VoteContent::from_bytes(&plaintext))
    {
        Ok(content) => content,
        Err(e) => {
            error!("Vote {} in election {} failed to unseal: {e}", vote.id, vote.election_id);
            return AuditVerdict::SealBroken;
        }
    };

    if !content.matches(vote) {
        error!("Vote {} sealed content does not match its record", vote.id);
        return AuditVerdict::ContentMismatch;
    }

    let recomputed = VoteHash::compute(
        vote.election_id,
        vote.candidate_id,
        &vote.voter_id,
        vote.cast_at,
    );
    if recomputed != vote.vote_hash {
        error!("Vote {} hash does not recompute", vote.id);
        return AuditVerdict::HashMismatch;
    }

    AuditVerdict::Intact
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::integrity::{truncate_to_millis, KEY_LEN};
    use crate::model::{db::vote::VoteCore, mongodb::Id};

    fn sealer() -> VoteSealer {
        VoteSealer::new(&[3; KEY_LEN]).unwrap()
    }

    fn sealed_vote(sealer: &VoteSealer, candidate_id: u32) -> Vote {
        let voter_id = Id::new();
        let cast_at = truncate_to_millis(Utc::now());
        let content = VoteContent {
            election_id: 1,
            candidate_id,
            voter_id,
            cast_at_millis: cast_at.timestamp_millis(),
        };
        Vote::new(VoteCore {
            voter_id,
            election_id: 1,
            candidate_id,
            sealed: sealer.seal(&content.to_bytes().unwrap()).unwrap(),
            vote_hash: VoteHash::compute(1, candidate_id, &voter_id, cast_at),
            notarization_ref: None,
            cast_at,
        })
    }

    #[test]
    fn clean_batch() {
        let sealer = sealer();
        let votes = vec![sealed_vote(&sealer, 10), sealed_vote(&sealer, 11)];
        let report = audit_votes(1, votes, &sealer);
        assert_eq!(report.total, 2);
        assert!(report.is_clean());
    }

    #[test]
    fn failures_are_per_record() {
        let sealer = sealer();

        let good = sealed_vote(&sealer, 10);

        let mut tampered = sealed_vote(&sealer, 10);
        tampered.vote.sealed.ciphertext[0] ^= 0xff;

        // Record says 11, sealed content says 10.
        let mut swapped = sealed_vote(&sealer, 10);
        swapped.vote.candidate_id = 11;

        let mut rehashed = sealed_vote(&sealer, 10);
        rehashed.vote.vote_hash = VoteHash::compute(9, 9, &Id::new(), Utc::now());

        let report = audit_votes(1, vec![tampered, good, swapped, rehashed], &sealer);
        let verdicts: Vec<_> = report.entries.iter().map(|entry| entry.verdict).collect();
        assert_eq!(
            verdicts,
            [
                AuditVerdict::SealBroken,
                AuditVerdict::Intact,
                AuditVerdict::ContentMismatch,
                AuditVerdict::HashMismatch,
            ]
        );
        assert_eq!(report.intact, 1);
        assert_eq!(report.failures().count(), 3);
    }

    #[test]
    fn wrong_key_breaks_every_seal() {
        let votes = vec![sealed_vote(&sealer(), 10)];
        let other = VoteSealer::new(&[4; KEY_LEN]).unwrap();
        let report = audit_votes(1, votes, &other);
        assert_eq!(report.entries[0].verdict, AuditVerdict::SealBroken);
    }
}
