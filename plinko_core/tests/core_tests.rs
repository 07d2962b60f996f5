use plinko_core::{
    combine, commit_hex, extract_seed32, path_string, play_round, verify_reveal, verify_round,
    EngineParams, NonceSource, Paytable, Round, RoundStatus, Step, XorShift32,
};

const ZERO_SECRET: &str = "0000000000000000000000000000000000000000000000000000000000000000";
const NONCE: &str = "1700000000000";

#[test]
fn rng_repeatable() {
    let mut a = XorShift32::new(42);
    let mut b = XorShift32::new(42);
    assert_eq!(a.next_floats(10), b.next_floats(10));
}

#[test]
fn zero_secret_commitment() {
    let commit = commit_hex(ZERO_SECRET, NONCE);
    assert_eq!(
        commit,
        "0519704766adce7b171d427f0c476bef01d50d941bd8b32171b233546cdf70bd"
    );
    assert!(verify_reveal(ZERO_SECRET, NONCE, &commit));
}

#[test]
fn single_character_mutations_break_commitment() {
    let commit = commit_hex(ZERO_SECRET, NONCE);
    for i in 0..ZERO_SECRET.len() {
        let mut forged = ZERO_SECRET.to_string();
        forged.replace_range(i..=i, "1");
        assert!(!verify_reveal(&forged, NONCE, &commit), "secret index {i}");
    }
    for i in 0..NONCE.len() {
        let mut forged = NONCE.to_string();
        let c = if &NONCE[i..=i] == "9" { "8" } else { "9" };
        forged.replace_range(i..=i, c);
        assert!(!verify_reveal(ZERO_SECRET, &forged, &commit), "nonce index {i}");
    }
}

#[test]
fn centered_drop_reference() {
    let params = EngineParams::default();
    let out = play_round(ZERO_SECRET, NONCE, "player-seed", 6, &params).unwrap();
    assert_eq!(extract_seed32(&out.combined_seed).unwrap(), 410_113_307);
    assert_eq!(path_string(&out.path), "RLLRLLRRRRLR");
    assert_eq!(out.path.len(), 12);
    assert_eq!(out.bin_index, 7);
    assert_eq!(out.payout_multiplier, 1.5);
    assert_eq!(
        out.peg_map.canonical_json(),
        "[[0.494159],[0.404513,0.564466],[0.474098,0.5339,0.461854],\
         [0.42859,0.441282,0.45607,0.534121],[0.505541,0.446296,0.541002,0.557,0.511325],\
         [0.545788,0.400292,0.456589,0.490105,0.51511,0.586926],\
         [0.505483,0.582763,0.547924,0.542276,0.4382,0.461778,0.442968],\
         [0.409477,0.503603,0.524397,0.413592,0.402718,0.485498,0.457513,0.588135],\
         [0.463872,0.42134,0.400373,0.476277,0.416285,0.405672,0.527329,0.579706,0.472708],\
         [0.42599,0.514785,0.417764,0.557596,0.471545,0.454865,0.541358,0.591079,0.47454,0.507031],\
         [0.434315,0.420687,0.543074,0.538382,0.523698,0.435302,0.524515,0.529156,0.444681,\
         0.502118,0.525769],\
         [0.516771,0.52949,0.48874,0.513051,0.45775,0.5889,0.466155,0.473609,0.552002,0.57782,\
         0.458185,0.504235]]"
    );
}

#[test]
fn second_reference_round() {
    let out = play_round(ZERO_SECRET, "1", "abc", 6, &EngineParams::default()).unwrap();
    assert_eq!(
        out.combined_seed,
        "8dc73389d803e5651c61ed2456b4ee35ed9a8903946e78a6ac00a753fec07194"
    );
    assert_eq!(path_string(&out.path), "LLRLLLRLLRRR");
    assert_eq!(out.bin_index, 5);
    assert_eq!(
        out.peg_map_hash,
        "b768d6130a85144cdaee9b62b00fc6d9e0cf3f1858f07ed5782f4f31ec245a70"
    );
}

#[test]
fn single_row_board() {
    let table = Paytable::new(vec![2.0, 2.0]).unwrap();
    let params = EngineParams::new(1, table).unwrap();
    let out = play_round(ZERO_SECRET, NONCE, "player-seed", 1, &params).unwrap();
    assert_eq!(out.path, vec![Step::Left]);
    assert_eq!(
        out.peg_map_hash,
        "c554b3ac7226c614ca0177457dfc7864a13c879e94d8838710b167307ba00c04"
    );
}

#[test]
fn verify_is_independent_of_play() {
    let nonces = NonceSource::new();
    let params = EngineParams::default();
    for (i, seed) in ["a", "lucky", "player-seed", "🎲"].into_iter().enumerate() {
        let round = Round::begin(&nonces);
        let started = round.start(seed, (i % 13) as u32, &params).unwrap();
        let revealed = started.reveal().unwrap();
        let secret = revealed.server_seed().unwrap();
        let play = revealed.play().unwrap();

        let check = verify_round(secret, revealed.nonce(), seed, play.drop_column, &params).unwrap();
        assert_eq!(check.commit_hex, revealed.commit_hex());
        assert_eq!(check.combined_seed, combine(secret, seed, revealed.nonce()));
        assert_eq!(check.combined_seed, play.combined_seed);
        assert_eq!(check.peg_map_hash, play.peg_map_hash);
        assert_eq!(check.path, play.path);
        assert_eq!(check.bin_index, play.bin_index);
    }
}

#[test]
fn every_round_gets_its_own_nonce() {
    let nonces = NonceSource::new();
    let a = Round::begin(&nonces);
    let b = Round::begin(&nonces);
    assert_ne!(a.nonce(), b.nonce());
    assert_ne!(a.commit_hex(), b.commit_hex());
    assert_eq!(a.status(), RoundStatus::Created);
}

#[test]
fn custom_paytable_rows() {
    let table = Paytable::new(vec![5.0, 1.0, 0.5, 1.0, 5.0]).unwrap();
    let params = EngineParams::new(4, table).unwrap();
    let out = play_round(ZERO_SECRET, NONCE, "player-seed", 2, &params).unwrap();
    assert!(out.bin_index <= 4);
    assert_eq!(out.payout_multiplier, params.paytable.resolve(out.bin_index));
}

#[test]
fn board_without_matching_paytable_is_rejected() {
    let standard = Paytable::standard();
    assert!(EngineParams::new(16, standard.clone()).is_err());
    let params = EngineParams::new(12, standard).unwrap();
    for i in 0..=params.rows {
        assert_eq!(params.paytable.resolve(i), params.paytable.resolve(params.rows - i));
    }
}

#[test]
fn rtp_simulation_smoke() {
    let params = EngineParams::default();
    let secret = "11".repeat(32);
    let mut total = 0.0;
    let mut bins = [0u32; 13];
    for n in 0..2000u32 {
        let out = play_round(&secret, &n.to_string(), "client", 6, &params).unwrap();
        bins[out.bin_index as usize] += 1;
        total += out.payout_multiplier;
    }
    let rtp = total / 2000.0;
    // loose bounds; the table is fixed, not tuned
    assert!(rtp > 0.5 && rtp < 3.0);
    assert!(bins[5] + bins[6] + bins[7] > bins[0] + bins[12]);
}
