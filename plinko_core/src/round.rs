//! Round lifecycle as immutable snapshots.
//!
//! `Created --start--> Started --reveal--> Revealed`. Every transition
//! borrows the current snapshot and returns a new one, so a failed
//! transition (bad input, integrity violation) leaves the old snapshot as it
//! was.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    commitment::{Commitment, NonceSource, ServerSecret},
    engine::{begin_round, play_round, reveal_round, EngineParams, PlayOutcome, Step},
    error::{EngineError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    Created,
    Started,
    Revealed,
}

impl RoundStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RoundStatus::Created => "CREATED",
            RoundStatus::Started => "STARTED",
            RoundStatus::Revealed => "REVEALED",
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CREATED" => Ok(RoundStatus::Created),
            "STARTED" => Ok(RoundStatus::Started),
            "REVEALED" => Ok(RoundStatus::Revealed),
            other => Err(EngineError::CorruptRecord(format!("unknown status {other:?}"))),
        }
    }
}

/// Start-phase record. Everything here is public once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPlay {
    pub client_seed: String,
    pub drop_column: u32,
    pub rows: u32,
    pub combined_seed: String,
    pub peg_map_hash: String,
    pub path: Vec<Step>,
    pub bin_index: u32,
    pub payout_multiplier: f64,
}

impl RoundPlay {
    fn from_outcome(client_seed: &str, drop_column: u32, rows: u32, outcome: PlayOutcome) -> Self {
        Self {
            client_seed: client_seed.to_string(),
            drop_column,
            rows,
            combined_seed: outcome.combined_seed,
            peg_map_hash: outcome.peg_map_hash,
            path: outcome.path,
            bin_index: outcome.bin_index,
            payout_multiplier: outcome.payout_multiplier,
        }
    }
}

/// What may be shown to anyone: the secret appears only after reveal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicRound {
    pub status: RoundStatus,
    pub nonce: String,
    pub commit_hex: String,
    pub server_seed: Option<String>,
    pub play: Option<RoundPlay>,
}

#[derive(Debug, Clone)]
pub struct Round {
    status: RoundStatus,
    secret: ServerSecret,
    commitment: Commitment,
    play: Option<RoundPlay>,
}

impl Round {
    pub fn begin(nonces: &NonceSource) -> Self {
        let begun = begin_round(nonces);
        Self::committed(begun.secret, begun.commitment)
    }

    pub fn committed(secret: ServerSecret, commitment: Commitment) -> Self {
        Self {
            status: RoundStatus::Created,
            secret,
            commitment,
            play: None,
        }
    }

    /// Rebuild a snapshot from storage. Checks that the fields present agree
    /// with `status`; the commitment itself is only checked on reveal.
    pub fn restore(
        status: RoundStatus,
        secret: ServerSecret,
        commitment: Commitment,
        play: Option<RoundPlay>,
    ) -> Result<Self> {
        match (status, play.is_some()) {
            (RoundStatus::Created, true) => {
                return Err(EngineError::CorruptRecord(
                    "created round carries a play".into(),
                ))
            }
            (RoundStatus::Started | RoundStatus::Revealed, false) => {
                return Err(EngineError::CorruptRecord(format!(
                    "{status} round has no play"
                )))
            }
            _ => {}
        }
        Ok(Self {
            status,
            secret,
            commitment,
            play,
        })
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn nonce(&self) -> &str {
        &self.commitment.nonce
    }

    pub fn commit_hex(&self) -> &str {
        &self.commitment.commit_hex
    }

    pub fn play(&self) -> Option<&RoundPlay> {
        self.play.as_ref()
    }

    /// Secret for persistence. Never send this to a player before reveal.
    pub fn sealed_secret(&self) -> &ServerSecret {
        &self.secret
    }

    /// Public secret, available only once revealed.
    pub fn server_seed(&self) -> Option<&str> {
        (self.status == RoundStatus::Revealed).then(|| self.secret.expose())
    }

    pub fn public_view(&self) -> PublicRound {
        PublicRound {
            status: self.status,
            nonce: self.commitment.nonce.clone(),
            commit_hex: self.commitment.commit_hex.clone(),
            server_seed: self.server_seed().map(str::to_string),
            play: self.play.clone(),
        }
    }

    pub fn start(
        &self,
        client_seed: &str,
        drop_column: u32,
        params: &EngineParams,
    ) -> Result<Self> {
        self.guard(RoundStatus::Created, "start")?;
        let outcome = play_round(
            self.secret.expose(),
            &self.commitment.nonce,
            client_seed,
            drop_column,
            params,
        )?;
        Ok(Self {
            status: RoundStatus::Started,
            secret: self.secret.clone(),
            commitment: self.commitment.clone(),
            play: Some(RoundPlay::from_outcome(
                client_seed,
                drop_column,
                params.rows,
                outcome,
            )),
        })
    }

    pub fn reveal(&self) -> Result<Self> {
        self.reveal_with(self.secret.expose())
    }

    /// Reveal an externally supplied secret. A mismatch with the published
    /// commitment is an `IntegrityViolation`.
    pub fn reveal_with(&self, candidate: &str) -> Result<Self> {
        self.guard(RoundStatus::Started, "reveal")?;
        if !reveal_round(candidate, &self.commitment.nonce, &self.commitment.commit_hex) {
            return Err(EngineError::IntegrityViolation {
                nonce: self.commitment.nonce.clone(),
            });
        }
        Ok(Self {
            status: RoundStatus::Revealed,
            secret: ServerSecret::new(candidate),
            commitment: self.commitment.clone(),
            play: self.play.clone(),
        })
    }

    fn guard(&self, expected: RoundStatus, action: &'static str) -> Result<()> {
        if self.status != expected {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_round() -> Round {
        let secret = "00".repeat(32);
        let commitment = Commitment::for_secret(&secret, "1700000000000");
        Round::committed(ServerSecret::new(secret), commitment)
    }

    #[test]
    fn full_lifecycle() {
        let created = fixed_round();
        assert_eq!(created.status(), RoundStatus::Created);
        assert_eq!(
            created.commit_hex(),
            "0519704766adce7b171d427f0c476bef01d50d941bd8b32171b233546cdf70bd"
        );
        assert!(created.server_seed().is_none());

        let started = created
            .start("player-seed", 6, &EngineParams::default())
            .unwrap();
        assert_eq!(started.status(), RoundStatus::Started);
        assert!(started.server_seed().is_none());
        assert_eq!(started.play().unwrap().bin_index, 7);
        assert_eq!(created.status(), RoundStatus::Created);

        let revealed = started.reveal().unwrap();
        assert_eq!(revealed.status(), RoundStatus::Revealed);
        assert_eq!(revealed.server_seed(), Some("00".repeat(32).as_str()));
        assert_eq!(revealed.play(), started.play());
    }

    #[test]
    fn transitions_are_guarded() {
        let created = fixed_round();
        assert!(matches!(
            created.reveal(),
            Err(EngineError::InvalidTransition {
                from: RoundStatus::Created,
                action: "reveal"
            })
        ));
        let started = created.start("p", 0, &EngineParams::default()).unwrap();
        assert!(matches!(
            started.start("p", 0, &EngineParams::default()),
            Err(EngineError::InvalidTransition { .. })
        ));
        let revealed = started.reveal().unwrap();
        assert!(revealed.reveal().is_err());
        assert!(revealed.start("p", 0, &EngineParams::default()).is_err());
    }

    #[test]
    fn tampered_reveal_leaves_outcome_untouched() {
        let started = fixed_round()
            .start("player-seed", 6, &EngineParams::default())
            .unwrap();
        let forged = format!("01{}", "00".repeat(31));
        let err = started.reveal_with(&forged).unwrap_err();
        assert!(err.is_integrity_violation());
        assert_eq!(started.status(), RoundStatus::Started);
        let play = started.play().unwrap();
        assert_eq!(play.bin_index, 7);
        assert_eq!(play.path.len(), 12);
    }

    #[test]
    fn failed_start_keeps_round_created() {
        let created = fixed_round();
        assert!(created.start("", 6, &EngineParams::default()).is_err());
        assert!(created.start("p", 13, &EngineParams::default()).is_err());
        assert_eq!(created.status(), RoundStatus::Created);
        assert!(created.play().is_none());
    }

    #[test]
    fn restore_checks_consistency() {
        let started = fixed_round()
            .start("player-seed", 6, &EngineParams::default())
            .unwrap();
        let play = started.play().cloned();
        let secret = ServerSecret::new("00".repeat(32));
        let commitment = started.commitment().clone();

        let status = RoundStatus::Created;
        assert!(Round::restore(status, secret.clone(), commitment.clone(), play.clone()).is_err());
        let status = RoundStatus::Started;
        assert!(Round::restore(status, secret.clone(), commitment.clone(), None).is_err());
        let restored = Round::restore(RoundStatus::Started, secret, commitment, play).unwrap();
        assert!(restored.reveal().is_ok());
    }

    #[test]
    fn corrupt_secret_is_integrity_violation() {
        let started = fixed_round()
            .start("player-seed", 6, &EngineParams::default())
            .unwrap();
        let corrupted = Round::restore(
            RoundStatus::Started,
            ServerSecret::new("ff".repeat(32)),
            started.commitment().clone(),
            started.play().cloned(),
        )
        .unwrap();
        assert!(corrupted.reveal().unwrap_err().is_integrity_violation());
    }

    #[test]
    fn public_view_hides_secret_until_reveal() {
        let secret = "ab".repeat(32);
        let commitment = Commitment::for_secret(&secret, "42");
        let created = Round::committed(ServerSecret::new(secret.clone()), commitment);
        let started = created
            .start("player-seed", 6, &EngineParams::default())
            .unwrap();

        for round in [&created, &started] {
            let view = round.public_view();
            assert!(view.server_seed.is_none());
            assert!(!format!("{view:?}").contains(&secret));
        }
        assert!(created.public_view().play.is_none());
        assert_eq!(started.public_view().play.as_ref(), started.play());

        let view = started.reveal().unwrap().public_view();
        assert_eq!(view.status, RoundStatus::Revealed);
        assert_eq!(view.server_seed.as_deref(), Some(secret.as_str()));
        assert_eq!(view.commit_hex, started.commit_hex());
        assert_eq!(view.nonce, "42");
    }

    #[test]
    fn status_text_roundtrip() {
        for status in [RoundStatus::Created, RoundStatus::Started, RoundStatus::Revealed] {
            assert_eq!(status.as_str().parse::<RoundStatus>().unwrap(), status);
        }
        assert!("DONE".parse::<RoundStatus>().is_err());
    }
}
