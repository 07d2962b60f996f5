use clap::{Parser, Subcommand};
use plinko_core::{
    path_string, verify_round, EngineParams, Paytable, Step, DEFAULT_DROP_COLUMN, DEFAULT_ROWS,
};
use plinko_shared::VerifyResponse;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plinko-cli", about = "Admin CLI for the plinko server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Database URL, default sqlite://plinko.db
    #[arg(long, value_parser, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// View last N rounds
    ViewRounds {
        #[arg(default_value_t = 20)]
        n: i64,
    },
    /// Export rounds to CSV path
    ExportCsv { path: String },
    /// Re-derive a revealed round and compare it with the stored record
    Audit { id: i64 },
    /// Recompute a round from its public inputs and revealed secret
    Verify {
        #[arg(long)]
        server_seed: String,
        #[arg(long)]
        client_seed: String,
        #[arg(long)]
        nonce: String,
        #[arg(long, default_value_t = DEFAULT_DROP_COLUMN)]
        drop_column: u32,
        #[arg(long, default_value_t = DEFAULT_ROWS)]
        rows: u32,
    },
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    status: String,
    server_seed: String,
    nonce: String,
    commit_hex: String,
    client_seed: Option<String>,
    combined_seed: Option<String>,
    peg_map_hash: Option<String>,
    path_json: Option<String>,
    bin_index: Option<i64>,
    drop_column: Option<i64>,
    row_count: Option<i64>,
}

/// A field whose stored value differs from the recomputed one.
#[derive(Debug, PartialEq)]
struct Mismatch {
    field: &'static str,
    stored: String,
    derived: String,
}

async fn get_pool(url: Option<String>) -> anyhow::Result<SqlitePool> {
    let url = url.unwrap_or_else(|| "sqlite://plinko.db".into());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;
    Ok(pool)
}

fn verify_offline(
    server_seed: &str,
    client_seed: &str,
    nonce: &str,
    drop_column: u32,
    rows: u32,
) -> anyhow::Result<VerifyResponse> {
    let params = EngineParams::new(rows, Paytable::standard())?;
    let check = verify_round(server_seed, nonce, client_seed, drop_column, &params)?;
    Ok(VerifyResponse {
        commit_hex: check.commit_hex,
        combined_seed: check.combined_seed,
        peg_map_hash: check.peg_map_hash,
        bin_index: check.bin_index,
        path: check.path.iter().map(|s| s.as_char().to_string()).collect(),
        payout_multiplier: check.payout_multiplier,
    })
}

fn audit_row(row: &AuditRow) -> anyhow::Result<Vec<Mismatch>> {
    if row.status != "REVEALED" {
        anyhow::bail!("round is {}, only revealed rounds can be audited", row.status);
    }
    let (Some(client_seed), Some(drop_column), Some(rows)) =
        (row.client_seed.as_deref(), row.drop_column, row.row_count)
    else {
        anyhow::bail!("revealed round is missing its start record");
    };
    let check = verify_offline(
        &row.server_seed,
        client_seed,
        &row.nonce,
        u32::try_from(drop_column)?,
        u32::try_from(rows)?,
    )?;
    let stored_path = match row.path_json.as_deref() {
        Some(json) => path_string(&serde_json::from_str::<Vec<Step>>(json)?),
        None => String::new(),
    };
    let fields = [
        ("commit_hex", row.commit_hex.clone(), check.commit_hex),
        (
            "combined_seed",
            row.combined_seed.clone().unwrap_or_default(),
            check.combined_seed,
        ),
        (
            "peg_map_hash",
            row.peg_map_hash.clone().unwrap_or_default(),
            check.peg_map_hash,
        ),
        ("path", stored_path, check.path.concat()),
        (
            "bin_index",
            row.bin_index.map(|b| b.to_string()).unwrap_or_default(),
            check.bin_index.to_string(),
        ),
    ];
    Ok(fields
        .into_iter()
        .filter(|(_, stored, derived)| stored != derived)
        .map(|(field, stored, derived)| Mismatch {
            field,
            stored,
            derived,
        })
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let database_url = cli.database_url;
    match cli.command {
        Commands::Verify {
            server_seed,
            client_seed,
            nonce,
            drop_column,
            rows,
        } => {
            let check = verify_offline(&server_seed, &client_seed, &nonce, drop_column, rows)?;
            println!("{}", serde_json::to_string_pretty(&check)?);
        }
        Commands::ViewRounds { n } => {
            let pool = get_pool(database_url).await?;
            let rows = sqlx::query("SELECT id, status, created_at, client_seed, nonce, commit_hex, bin_index, payout_multiplier FROM rounds ORDER BY id DESC LIMIT ?")
                .bind(n)
                .fetch_all(&pool).await?;
            for r in rows {
                let id: i64 = r.get("id");
                let status: String = r.get("status");
                let ts: String = r.get("created_at");
                let client_seed: Option<String> = r.get("client_seed");
                let nonce: String = r.get("nonce");
                let commit_hex: String = r.get("commit_hex");
                let bin: Option<i64> = r.get("bin_index");
                let multiplier: Option<f64> = r.get("payout_multiplier");
                println!(
                    "#{:>6} {} {:<8} seed={} nonce={} commit={} bin={} x{}",
                    id,
                    ts,
                    status,
                    client_seed.unwrap_or_else(|| "-".into()),
                    nonce,
                    commit_hex,
                    bin.map(|b| b.to_string()).unwrap_or_else(|| "-".into()),
                    multiplier.map(|m| m.to_string()).unwrap_or_else(|| "-".into()),
                );
            }
        }
        Commands::ExportCsv { path } => {
            let pool = get_pool(database_url).await?;
            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record([
                "id",
                "status",
                "created_at",
                "revealed_at",
                "server_seed",
                "nonce",
                "commit_hex",
                "client_seed",
                "combined_seed",
                "peg_map_hash",
                "path_json",
                "bin_index",
                "bet_cents",
                "payout_multiplier",
            ])?;
            let rows = sqlx::query("SELECT id, status, created_at, revealed_at, server_seed, nonce, commit_hex, client_seed, combined_seed, peg_map_hash, path_json, bin_index, bet_cents, payout_multiplier FROM rounds ORDER BY id ASC")
                .fetch_all(&pool).await?;
            let total = rows.len();
            for r in &rows {
                let status: String = r.get("status");
                // secrets stay sealed until the round is revealed
                let server_seed = if status == "REVEALED" {
                    r.get::<String, _>("server_seed")
                } else {
                    String::new()
                };
                let opt = |name: &str| r.get::<Option<String>, _>(name).unwrap_or_default();
                let opt_num = |name: &str| {
                    r.get::<Option<i64>, _>(name)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                };
                wtr.write_record(&[
                    r.get::<i64, _>("id").to_string(),
                    status,
                    r.get::<String, _>("created_at"),
                    opt("revealed_at"),
                    server_seed,
                    r.get::<String, _>("nonce"),
                    r.get::<String, _>("commit_hex"),
                    opt("client_seed"),
                    opt("combined_seed"),
                    opt("peg_map_hash"),
                    opt("path_json"),
                    opt_num("bin_index"),
                    opt_num("bet_cents"),
                    r.get::<Option<f64>, _>("payout_multiplier")
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
            println!("Exported {} rows to {}", total, path);
        }
        Commands::Audit { id } => {
            let pool = get_pool(database_url).await?;
            let row = sqlx::query_as::<_, AuditRow>(
                "SELECT status, server_seed, nonce, commit_hex, client_seed, combined_seed, peg_map_hash, path_json, bin_index, drop_column, row_count FROM rounds WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| anyhow::anyhow!("round {id} not found"))?;
            let mismatches = audit_row(&row)?;
            if mismatches.is_empty() {
                info!(round_id = id, "audit passed");
                println!("round {id}: OK");
            } else {
                for m in &mismatches {
                    error!(round_id = id, field = m.field, "audit mismatch");
                    println!(
                        "round {id}: {} stored={} derived={}",
                        m.field, m.stored, m.derived
                    );
                }
                anyhow::bail!("round {id} failed audit ({} fields)", mismatches.len());
            }
        }
    }

    Ok(())
}
