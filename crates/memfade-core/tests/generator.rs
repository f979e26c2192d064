// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Pinned generator output and fill/verify determinism.

use memfade_core::{BlockSet, Lcg64, RetryPolicy, Seed, SystemAllocator, FALLBACK_SEED};
use proptest::prelude::*;

fn first_words(seed: u32) -> [u32; 4] {
    let mut lcg = Lcg64::seeded(Seed(seed));
    std::array::from_fn(|_| lcg.next_word())
}

#[test]
fn golden_sequences_are_pinned() {
    assert_eq!(
        first_words(0xdead_beef),
        [0xc112_0809, 0x2579_3eee, 0x06fc_5976, 0xcde2_2b8d]
    );
    assert_eq!(
        first_words(FALLBACK_SEED.0),
        [0xed1a_e8ca, 0x0eaa_f807, 0xbe73_1ab9, 0x6048_cad5]
    );
    assert_eq!(
        first_words(0),
        [0x1405_7b7e, 0x1a08_ee11, 0x9af6_7822, 0x66b6_1ae9]
    );
}

proptest! {
    #[test]
    fn same_seed_same_sequence(seed in any::<u32>(), n in 0usize..2048) {
        let a: Vec<u32> = Lcg64::seeded(Seed(seed)).take(n).collect();
        let b: Vec<u32> = Lcg64::seeded(Seed(seed)).take(n).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn reseeding_mid_stream_restarts(seed in any::<u32>(), skip in 0usize..512) {
        let mut lcg = Lcg64::seeded(Seed(seed));
        for _ in 0..skip {
            lcg.next_word();
        }
        lcg.reseed(Seed(seed));
        let replay: Vec<u32> = lcg.take(16).collect();
        let fresh: Vec<u32> = Lcg64::seeded(Seed(seed)).take(16).collect();
        prop_assert_eq!(replay, fresh);
    }

    #[test]
    fn fill_then_verify_is_clean(
        seed in any::<u32>(),
        count in 1usize..8,
        words in 1usize..300,
    ) {
        let mut blocks = BlockSet::allocate(count, words, &SystemAllocator, RetryPolicy::once())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        blocks.fill(&mut Lcg64::seeded(Seed(seed)));
        let found = blocks.verify(&mut Lcg64::seeded(Seed(seed)), |_| {});
        prop_assert_eq!(found, 0);
    }
}
