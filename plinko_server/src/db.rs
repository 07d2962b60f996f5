use anyhow::Context;
use chrono::{DateTime, Utc};
use plinko_core::{Commitment, Round, RoundPlay, RoundStatus, ServerSecret, Step};
use plinko_shared::RoundView;
use sqlx::SqlitePool;

// DB schema is defined in migrations (see migrations/ folder)

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoundRow {
    pub id: i64,
    pub status: String,
    pub server_seed: String,
    pub nonce: String,
    pub commit_hex: String,
    pub client_seed: Option<String>,
    pub combined_seed: Option<String>,
    pub peg_map_hash: Option<String>,
    pub path_json: Option<String>,
    pub bin_index: Option<i64>,
    pub bet_cents: Option<i64>,
    pub payout_multiplier: Option<f64>,
    pub drop_column: Option<i64>,
    pub row_count: Option<i64>,
    pub created_at: String,
    pub revealed_at: Option<String>,
}

const SELECT_ROUND: &str = "SELECT id, status, server_seed, nonce, commit_hex, client_seed, \
     combined_seed, peg_map_hash, path_json, bin_index, bet_cents, payout_multiplier, \
     drop_column, row_count, created_at, revealed_at FROM rounds";

fn column<T>(value: Option<T>, name: &str) -> anyhow::Result<T> {
    value.with_context(|| format!("round record missing {name}"))
}

fn small(value: i64, name: &str) -> anyhow::Result<u32> {
    u32::try_from(value).with_context(|| format!("round record {name} out of range: {value}"))
}

fn parse_ts(value: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("bad timestamp {value:?}"))?
        .with_timezone(&Utc))
}

impl RoundRow {
    fn play(&self) -> anyhow::Result<Option<RoundPlay>> {
        let Some(client_seed) = self.client_seed.clone() else {
            return Ok(None);
        };
        let path: Vec<Step> = serde_json::from_str(&column(self.path_json.clone(), "path_json")?)
            .context("round record path_json is not a path")?;
        Ok(Some(RoundPlay {
            client_seed,
            drop_column: small(column(self.drop_column, "drop_column")?, "drop_column")?,
            rows: small(column(self.row_count, "row_count")?, "row_count")?,
            combined_seed: column(self.combined_seed.clone(), "combined_seed")?,
            peg_map_hash: column(self.peg_map_hash.clone(), "peg_map_hash")?,
            path,
            bin_index: small(column(self.bin_index, "bin_index")?, "bin_index")?,
            payout_multiplier: column(self.payout_multiplier, "payout_multiplier")?,
        }))
    }

    /// Rebuild the state-machine snapshot; inconsistent rows are rejected.
    pub fn to_round(&self) -> anyhow::Result<Round> {
        let status: RoundStatus = self.status.parse()?;
        let commitment = Commitment {
            nonce: self.nonce.clone(),
            commit_hex: self.commit_hex.clone(),
        };
        let round = Round::restore(
            status,
            ServerSecret::new(self.server_seed.clone()),
            commitment,
            self.play()?,
        )?;
        Ok(round)
    }

    pub fn view(&self, round: &Round) -> anyhow::Result<RoundView> {
        let public = round.public_view();
        let play = public.play.as_ref();
        Ok(RoundView {
            round_id: self.id,
            status: public.status.to_string(),
            nonce: public.nonce.clone(),
            commit_hex: public.commit_hex.clone(),
            server_seed: public.server_seed.clone(),
            client_seed: play.map(|p| p.client_seed.clone()),
            combined_seed: play.map(|p| p.combined_seed.clone()),
            peg_map_hash: play.map(|p| p.peg_map_hash.clone()),
            path: play.map(|p| wire_path(&p.path)),
            bin_index: play.map(|p| p.bin_index),
            drop_column: play.map(|p| p.drop_column),
            rows: play.map(|p| p.rows),
            bet_cents: self.bet_cents,
            payout_multiplier: play.map(|p| p.payout_multiplier),
            created_at: parse_ts(&self.created_at)?,
            revealed_at: self.revealed_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

pub fn wire_path(path: &[Step]) -> Vec<String> {
    path.iter().map(|s| s.as_char().to_string()).collect()
}

pub async fn insert_round(pool: &SqlitePool, round: &Round) -> anyhow::Result<i64> {
    let res = sqlx::query(
        "INSERT INTO rounds (status, server_seed, nonce, commit_hex, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(round.status().as_str())
    .bind(round.sealed_secret().expose())
    .bind(round.nonce())
    .bind(round.commit_hex())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn fetch_round(pool: &SqlitePool, id: i64) -> anyhow::Result<Option<RoundRow>> {
    let row = sqlx::query_as::<_, RoundRow>(&format!("{SELECT_ROUND} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Persist the start phase. Returns `false` if another request moved the
/// round out of CREATED first.
pub async fn mark_started(
    pool: &SqlitePool,
    id: i64,
    round: &Round,
    bet_cents: i64,
) -> anyhow::Result<bool> {
    let play = column(round.play(), "play")?;
    let res = sqlx::query(
        "UPDATE rounds SET status = ?, client_seed = ?, combined_seed = ?, peg_map_hash = ?, \
         path_json = ?, bin_index = ?, bet_cents = ?, payout_multiplier = ?, drop_column = ?, \
         row_count = ? WHERE id = ? AND status = 'CREATED'",
    )
    .bind(round.status().as_str())
    .bind(&play.client_seed)
    .bind(&play.combined_seed)
    .bind(&play.peg_map_hash)
    .bind(serde_json::to_string(&play.path)?)
    .bind(i64::from(play.bin_index))
    .bind(bet_cents)
    .bind(play.payout_multiplier)
    .bind(i64::from(play.drop_column))
    .bind(i64::from(play.rows))
    .bind(id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn mark_revealed(pool: &SqlitePool, id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query(
        "UPDATE rounds SET status = 'REVEALED', revealed_at = ? WHERE id = ? AND status = 'STARTED'",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Highest numeric nonce stored, so a restarted server never reissues one.
pub async fn max_nonce(pool: &SqlitePool) -> anyhow::Result<u64> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(CAST(nonce AS INTEGER)) FROM rounds")
        .fetch_one(pool)
        .await?;
    Ok(max.and_then(|n| u64::try_from(n).ok()).unwrap_or(0))
}
