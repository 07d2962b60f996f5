use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use plinko_core::{verify_round, EngineError, EngineParams, NonceSource, Round};
use plinko_shared::{
    ApiError, CommitResponse, RevealResponse, RoundView, StartRequest, StartResponse,
    VerifyRequest, VerifyResponse,
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::db::{self, wire_path};

pub struct AppState {
    pub db: SqlitePool,
    pub nonces: NonceSource,
    pub params: EngineParams,
}

/// Response-side wrapper so shared `ApiError` can become an HTTP reply.
#[derive(Debug)]
pub struct ApiFailure(ApiError);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Integrity(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self.0.body())).into_response()
    }
}

impl From<ApiError> for ApiFailure {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<EngineError> for ApiFailure {
    fn from(err: EngineError) -> Self {
        let api = match &err {
            EngineError::IntegrityViolation { .. } => ApiError::Integrity(err.to_string()),
            EngineError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            EngineError::CorruptRecord(_) => {
                error!(%err, "corrupt round record");
                ApiError::Internal
            }
            _ => ApiError::Invalid(err.to_string()),
        };
        Self(api)
    }
}

impl From<anyhow::Error> for ApiFailure {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<EngineError>() {
            Ok(engine) => engine.into(),
            Err(other) => {
                error!(err = ?other, "storage failure");
                Self(ApiError::Internal)
            }
        }
    }
}

type ApiReply<T> = Result<Json<T>, ApiFailure>;

async fn load_round(state: &AppState, id: i64) -> Result<(db::RoundRow, Round), ApiFailure> {
    let row = db::fetch_round(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let round = row.to_round()?;
    Ok((row, round))
}

async fn route_commit(State(state): State<Arc<AppState>>) -> ApiReply<CommitResponse> {
    let round = Round::begin(&state.nonces);
    let round_id = db::insert_round(&state.db, &round).await?;
    info!(round_id, nonce = round.nonce(), commit = round.commit_hex(), "round committed");
    Ok(Json(CommitResponse {
        round_id,
        commit_hex: round.commit_hex().to_string(),
        nonce: round.nonce().to_string(),
    }))
}

async fn route_start(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<StartRequest>,
) -> ApiReply<StartResponse> {
    if req.bet_cents <= 0 {
        return Err(ApiError::Invalid("bet_cents must be positive".into()).into());
    }
    let (_, round) = load_round(&state, id).await?;
    let started = round.start(&req.client_seed, req.drop_column, &state.params)?;
    if !db::mark_started(&state.db, id, &started, req.bet_cents).await? {
        warn!(round_id = id, "start lost race");
        return Err(ApiError::Conflict("round already started".into()).into());
    }
    let play = started.play().ok_or(ApiError::Internal)?;
    info!(
        round_id = id,
        bin_index = play.bin_index,
        payout_multiplier = play.payout_multiplier,
        "round started"
    );
    Ok(Json(StartResponse {
        round_id: id,
        peg_map_hash: play.peg_map_hash.clone(),
        bin_index: play.bin_index,
        payout_multiplier: play.payout_multiplier,
        bet_cents: req.bet_cents,
        path: wire_path(&play.path),
        rows: play.rows,
    }))
}

async fn route_reveal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiReply<RevealResponse> {
    let (_, round) = load_round(&state, id).await?;
    let revealed = round.reveal().inspect_err(|err| {
        if err.is_integrity_violation() {
            error!(round_id = id, nonce = round.nonce(), "reveal does not match commitment");
        }
    })?;
    if !db::mark_revealed(&state.db, id).await? {
        return Err(ApiError::Conflict("round already revealed".into()).into());
    }
    info!(round_id = id, "round revealed");
    Ok(Json(RevealResponse {
        round_id: id,
        server_seed: revealed.server_seed().unwrap_or_default().to_string(),
    }))
}

async fn route_round(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiReply<RoundView> {
    let (row, round) = load_round(&state, id).await?;
    Ok(Json(row.view(&round)?))
}

async fn route_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> ApiReply<VerifyResponse> {
    let params = EngineParams::new(req.rows, state.params.paytable.clone())?;
    let check = verify_round(
        &req.server_seed,
        &req.nonce,
        &req.client_seed,
        req.drop_column,
        &params,
    )?;
    Ok(Json(VerifyResponse {
        commit_hex: check.commit_hex,
        combined_seed: check.combined_seed,
        peg_map_hash: check.peg_map_hash,
        bin_index: check.bin_index,
        path: wire_path(&check.path),
        payout_multiplier: check.payout_multiplier,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/rounds/commit", post(route_commit))
        .route("/rounds/:id", get(route_round))
        .route("/rounds/:id/start", post(route_start))
        .route("/rounds/:id/reveal", post(route_reveal))
        .route("/verify", post(route_verify))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
