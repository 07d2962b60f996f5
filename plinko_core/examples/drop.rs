use plinko_core::{path_string, verify_round, EngineParams, NonceSource, Round};

fn main() -> plinko_core::Result<()> {
    // Example end-to-end round
    let nonces = NonceSource::new();
    let params = EngineParams::default();
    let round = Round::begin(&nonces);
    println!("commit={} nonce={}", round.commit_hex(), round.nonce());

    let started = round.start("example-client-seed", 6, &params)?;
    let revealed = started.reveal()?;
    let Some(play) = revealed.play() else {
        return Ok(());
    };
    println!(
        "bin={} multiplier={} path={} peg_map_hash={}",
        play.bin_index,
        play.payout_multiplier,
        path_string(&play.path),
        play.peg_map_hash
    );

    let server_seed = revealed.server_seed().unwrap_or_default();
    let check = verify_round(server_seed, revealed.nonce(), "example-client-seed", 6, &params)?;
    println!("server_seed={server_seed} verified={}", check.bin_index == play.bin_index);
    Ok(())
}
