// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! Fill/fade/verify behaviour of a single test instance.

mod common;

use std::thread;
use std::time::{Duration, Instant};

use common::{small, BudgetAllocator, ScriptedSeeds};
use memfade_core::{
    AllocError, CancelToken, FixedSeed, InstanceStatus, JobId, RetryPolicy, Seed, SystemAllocator,
    TestConfigBuilder, TestInstance, WORD_BYTES,
};

fn instance(builder: TestConfigBuilder) -> TestInstance {
    let config = builder.build().expect("config");
    TestInstance::new(&config, JobId::SOLE, &SystemAllocator, RetryPolicy::once()).expect("setup")
}

#[test]
fn single_corrupted_word_is_reported_exactly_once() {
    let mut inst = instance(small());
    inst.fill_pass(&FixedSeed(Seed(0xabcd)));

    let original = inst.blocks().blocks()[3].as_slice()[77];
    inst.blocks_mut().words_mut(3).unwrap()[77] = original ^ 0x0000_0100;

    assert_eq!(inst.verify_pass(), 1);
    assert_eq!(inst.status(), InstanceStatus::Failed);

    // Restore the word: the instance verdict stays failed.
    inst.blocks_mut().words_mut(3).unwrap()[77] = original;
    assert_eq!(inst.verify_pass(), 0);
    assert_eq!(inst.status(), InstanceStatus::Failed);
    assert_eq!(inst.report().mismatches, 1);
}

#[test]
fn every_read_iteration_sees_the_same_mismatches() {
    let mut inst = instance(small());
    inst.fill_pass(&FixedSeed(Seed(9)));
    inst.blocks_mut().words_mut(0).unwrap()[0] ^= 1;
    inst.blocks_mut().words_mut(1).unwrap()[255] ^= 0x8000_0000;

    let counts: Vec<u64> = (0..4).map(|_| inst.verify_pass()).collect();
    assert_eq!(counts, [2, 2, 2, 2]);
    assert_eq!(inst.report().verify_passes, 4);
    assert_eq!(inst.report().mismatches, 8);
}

#[test]
fn finite_budget_runs_exactly_k_cycles() {
    let seeds = ScriptedSeeds::new([11, 22, 33, 44, 55]);
    let mut inst = instance(small().total_iterations(5));
    let report = inst.run(&CancelToken::new(), &seeds);

    assert_eq!(report.cycles, 5);
    assert_eq!(report.verify_passes, 5);
    assert!(report.is_success());
    assert!(!report.cancelled);
    assert_eq!(report.last_seed, Some(Seed(55)));
    assert_eq!(seeds.handed_out().len(), 5);
}

#[test]
fn each_cycle_draws_a_fresh_seed() {
    let seeds = ScriptedSeeds::new([1, 2, 3]);
    let mut inst = instance(small().total_iterations(3).read_iterations(3));
    let report = inst.run(&CancelToken::new(), &seeds);

    assert_eq!(seeds.handed_out(), [Seed(1), Seed(2), Seed(3)]);
    assert_eq!(report.verify_passes, 9);
}

#[test]
fn cancel_during_fade_still_compares() {
    let mut inst = instance(small().fade_seconds(60).read_iterations(5).unbounded());
    let cancel = CancelToken::new();
    let start = Instant::now();

    let report = thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(100));
            cancel.cancel();
        });
        inst.run(&cancel, &FixedSeed(Seed(3)))
    });

    assert!(start.elapsed() < Duration::from_secs(30));
    assert!(report.cancelled);
    assert_eq!(report.cycles, 1);
    // The in-flight comparison ran; the remaining read iterations did not.
    assert_eq!(report.verify_passes, 1);
    assert!(report.is_success());
}

#[test]
fn sub_second_fade_elapses_between_fill_and_verify() {
    let mut inst = instance(
        small()
            .fade(Duration::from_millis(20))
            .total_iterations(1)
            .read_iterations(2),
    );
    let start = Instant::now();
    let report = inst.run(&CancelToken::new(), &FixedSeed(Seed(4)));
    assert!(start.elapsed() >= Duration::from_millis(40));
    assert_eq!(report.verify_passes, 2);
}

#[test]
fn setup_failure_releases_and_reports_block() {
    let config = small().build().unwrap();
    let allocator = BudgetAllocator::new(2);
    let err = TestInstance::new(
        &config,
        JobId::new(4),
        &allocator,
        RetryPolicy::new(3, Duration::ZERO),
    )
    .unwrap_err();

    assert_eq!(err.job, JobId::new(4));
    assert_eq!(
        err.source,
        AllocError::Block {
            block: 2,
            bytes: 1024,
            attempts: 3,
        }
    );
    // Two successes, then three refused attempts for block 2.
    assert_eq!(allocator.attempts(), 5);
    assert!(err.to_string().starts_with("[4] "));
}

#[test]
fn block_geometry_follows_config() {
    let inst = instance(small().size_per_block(1027));
    assert_eq!(inst.blocks().len(), 4);
    assert_eq!(inst.blocks().words_per_block(), 256);
    assert_eq!(inst.blocks().total_bytes(), 4 * 256 * WORD_BYTES);
}
