#![no_main]

extern crate arbitrary;
extern crate libfuzzer_sys;
extern crate rs_swiss;

use rs_swiss::swiss::{
    store::{MemoryStore, TournamentStore},
    test_util::assert_valid_round,
    PairingConfig, PairingEngine, PairingError, PlayerId, RematchPolicy,
};

use libfuzzer_sys::fuzz_target;

const MAX_PLAYERS: u8 = 24;
const MAX_RESULTS: usize = 256;
const MAX_SEARCH_STEPS: usize = 2_000;

#[derive(Debug, Clone, arbitrary::Arbitrary)]
struct PairingInput {
    pub num_players: u8,
    /// Results as (winner, loser) indices into the registered players. A
    /// loser equal to the winner is recorded as a bye.
    pub results: Vec<(u8, u8)>,
    pub config: PairingConfig,
}

fuzz_target!(|input: PairingInput| {
    let num_players = input.num_players % MAX_PLAYERS;
    // Keep the rematch search short so fuzzing stays fast
    let config = PairingConfig {
        max_search_steps: input.config.max_search_steps.clamp(1, MAX_SEARCH_STEPS),
        ..input.config
    };

    let mut store = MemoryStore::new();
    let ids: Vec<PlayerId> = (0..num_players)
        .map(|idx| store.register_player(&format!("Player-{idx}")).unwrap())
        .collect();

    if !ids.is_empty() {
        for (winner, loser) in input.results.iter().take(MAX_RESULTS) {
            let winner = ids[*winner as usize % ids.len()];
            let loser = ids[*loser as usize % ids.len()];
            let loser = if winner == loser { None } else { Some(loser) };
            store.report_match(winner, loser).unwrap();
        }
    }

    let standings = store.standings().unwrap();
    let history = store.matches().unwrap();
    let engine = PairingEngine::new(config.clone());

    match engine.plan_round(&standings, &history) {
        Ok(round) => {
            assert_valid_round(&standings, &round);
            if config.rematch_policy == RematchPolicy::Forbid {
                assert!(round.is_rematch_free());
            }
        }
        Err(PairingError::InvalidState(_)) => assert!(standings.is_empty()),
        Err(PairingError::ExhaustedOpponents(_)) => {
            assert_eq!(config.rematch_policy, RematchPolicy::Forbid)
        }
        Err(err) => panic!("Unexpected pairing error {err}"),
    }
});
