// Round key submission

use tracing::{debug, warn};

use super::Committee;
use crate::aggregation::{submission_message, AggregateResult, KeySubmission};
use crate::crypto::MemberKey;
use crate::error::{CommitteeError, Result};
use crate::ledger::{Clock, ProofVerifier, ValueTransfer};
use crate::types::{Identity, RoundIndex};

impl<C, T, V> Committee<C, T, V>
where
    C: Clock,
    T: ValueTransfer,
    V: ProofVerifier,
{
    /// Record `voter`'s key for the current round.
    ///
    /// When the submission brings the round to a majority of its snapshot
    /// (or the round has run out of time) the round is finalized, its keys
    /// are announced in arrival order and the next round opens. The closed
    /// round's result is returned in that case.
    pub fn submit_key(
        &mut self,
        voter: Identity,
        round_index: RoundIndex,
        key: &[u8],
        proof: &[u8],
    ) -> Result<Option<AggregateResult>> {
        let current = self.rounds.current_index();
        if round_index != current {
            return Err(CommitteeError::RoundMismatch {
                expected: current,
                got: round_index,
            });
        }
        self.authorize_member(&voter)?;

        let now = self.clock.now();
        let round = self.rounds.current();
        if round.has_submitted(&voter) {
            return Err(CommitteeError::DuplicateSubmission(voter));
        }
        if round.is_expired(now) {
            return Err(CommitteeError::RoundExpired(current));
        }

        let key = MemberKey::from_bytes(key).map_err(|e| CommitteeError::InvalidKey(e.to_string()))?;
        let recovered = self.verifier.recover(&submission_message(current, &key), proof);
        if recovered != Some(voter) {
            warn!(voter = %voter, round = current, "rejected key proof");
            return Err(CommitteeError::InvalidProof(voter));
        }

        let round = self.rounds.current_mut();
        round.record_key(voter, key);
        let submitted = round.public_key_count();
        let members = round.active_nodes.len();
        let closing = round.keys_reached_quorum() || round.is_expired(now);
        self.registry.set_public_key(&voter, key);
        debug!(voter = %voter, round = current, submitted, members, "key submitted");

        if !closing {
            return Ok(None);
        }

        let mut staged = Vec::new();
        self.finalize_current(&mut staged);
        let result = AggregateResult::in_submission_order(self.rounds.current());
        self.start_new_round(&mut staged);
        self.events.extend(staged);
        Ok(Some(result))
    }

    pub fn submit(&mut self, submission: &KeySubmission) -> Result<Option<AggregateResult>> {
        self.submit_key(
            submission.voter,
            submission.round,
            &submission.key,
            &submission.proof,
        )
    }
}
