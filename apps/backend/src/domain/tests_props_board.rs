//! Property tests for board generation and turn rotation.
//!
//! Increase cases locally with: PROPTEST_CASES=800 cargo test

use std::collections::HashSet;
use std::env;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::board::generate;
use crate::domain::state::next_index;

fn proptest_config() -> ProptestConfig {
    let cases = env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(64);

    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}

fn board_params() -> impl Strategy<Value = (usize, usize, usize, u64)> {
    (1usize..=12, 1usize..=12)
        .prop_filter("need room for one bomb and one safe tile", |(w, h)| w * h >= 2)
        .prop_flat_map(|(w, h)| (Just(w), Just(h), 1..w * h, any::<u64>()))
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn bomb_count_is_exact((w, h, bombs, seed) in board_params()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let tiles = generate(w, h, bombs, &mut rng).unwrap();

        prop_assert_eq!(tiles.len(), w * h);
        prop_assert_eq!(tiles.iter().filter(|t| t.is_bomb).count(), bombs);
        prop_assert_eq!(tiles.iter().filter(|t| !t.is_bomb).count(), w * h - bombs);

        let coords: HashSet<(usize, usize)> = tiles.iter().map(|t| (t.x, t.y)).collect();
        prop_assert_eq!(coords.len(), w * h);
    }

    #[test]
    fn rotation_returns_to_start(len in 1usize..=16, start_seed in any::<usize>()) {
        let start = start_seed % len;
        let mut current = start;
        let mut visited = HashSet::new();
        for _ in 0..len {
            visited.insert(current);
            current = next_index(current, len).unwrap();
        }
        prop_assert_eq!(current, start);
        prop_assert_eq!(visited.len(), len);
    }
}
