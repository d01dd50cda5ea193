// Integration tests over the public API

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use pascalian::{combine, Cell, Color, CycleDirection, PropagationEngine, TriangleLayout};

/// Runs an activation to completion with no animation delay.
fn activate_and_wait(engine: &PropagationEngine, index: usize, direction: CycleDirection) {
    engine.set_step_delay_fraction(0.0);
    assert!(engine.activate_cell(index, direction).unwrap());
    assert!(engine.wait_until_idle(Duration::from_secs(10)));
}

/// Reference recomputation of every row strictly below `start_row`,
/// applied to a snapshot. Mirrors what a propagation pass must produce.
fn propagate_snapshot(layout: TriangleLayout, cells: &mut [Cell], start_row: usize) {
    for row in (start_row + 1)..layout.size() {
        for col in 0..layout.row_len(row) {
            let (left, right) = layout.parents(row, col);
            let child = layout.cell_index(row, col);
            cells[child] = combine(cells[left], cells[right], cells[child]);
        }
    }
}

mod determinism {
    use super::*;

    #[test]
    fn identical_seeds_build_identical_boards() {
        let seed = [Color::Blue, Color::Red, Color::Yellow, Color::Red, Color::Blue];
        let mut a = PropagationEngine::new(5);
        let mut b = PropagationEngine::new(5);
        a.rebuild_from_seed(&seed);
        b.rebuild_from_seed(&seed);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn seeded_rng_builds_are_reproducible() {
        let mut a = PropagationEngine::new(12);
        let mut b = PropagationEngine::new(12);
        a.rebuild_random(&mut StdRng::seed_from_u64(42));
        b.rebuild_random(&mut StdRng::seed_from_u64(42));
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn pattern_build_is_a_pure_function_of_size() {
        let mut a = PropagationEngine::new(9);
        let mut b = PropagationEngine::new(9);
        a.rebuild_pattern();
        b.rebuild_pattern();
        assert_eq!(a.snapshot(), b.snapshot());
    }
}

mod incremental_recompute {
    use super::*;

    #[test]
    fn seed_row_activation_matches_full_rebuild() {
        let seed = [Color::Yellow, Color::Yellow, Color::Red, Color::Blue, Color::Blue, Color::Yellow];
        let mut engine = PropagationEngine::new(6);
        engine.rebuild_from_seed(&seed);
        activate_and_wait(&engine, 2, CycleDirection::Forward);

        let mut edited = seed;
        edited[2] = seed[2].cycled(CycleDirection::Forward);
        let mut reference = PropagationEngine::new(6);
        reference.rebuild_from_seed(&edited);

        assert_eq!(engine.snapshot(), reference.snapshot());
    }

    #[test]
    fn interior_activation_changes_only_descendant_rows() {
        let mut engine = PropagationEngine::new(8);
        engine.rebuild_random(&mut StdRng::seed_from_u64(3));
        let layout = engine.layout();
        let before = engine.snapshot();

        // Activate the second cell of row 3.
        let row = 3;
        let index = layout.cell_index(row, 1);
        activate_and_wait(&engine, index, CycleDirection::Reverse);
        let after = engine.snapshot();

        // Rows at or above the mutated row are untouched, except the
        // mutated cell itself.
        let descendants_start = layout.offset(row + 1);
        for i in 0..descendants_start {
            if i == index {
                continue;
            }
            assert_eq!(after[i], before[i], "cell {i} above the cascade changed");
        }
        assert_eq!(
            after[index].color().unwrap(),
            before[index].color().unwrap().cycled(CycleDirection::Reverse),
        );

        // Descendant rows match the reference recomputation.
        let mut expected = before.clone();
        expected[index] = after[index];
        propagate_snapshot(layout, &mut expected, row);
        assert_eq!(after, expected);
    }

    #[test]
    fn repeated_activations_settle_to_full_rebuild_result() {
        let seed = [Color::Blue; 7];
        let mut engine = PropagationEngine::new(7);
        engine.rebuild_from_seed(&seed);

        // Three forward cycles return the cell to its original color,
        // and the cascade returns the whole board with it.
        let before = engine.snapshot();
        for _ in 0..3 {
            activate_and_wait(&engine, 4, CycleDirection::Forward);
        }
        assert_eq!(engine.snapshot(), before);
    }
}

mod notification_minimality {
    use super::*;

    #[test]
    fn notifications_match_the_diff_exactly() {
        let mut engine = PropagationEngine::new(9);
        engine.rebuild_random(&mut StdRng::seed_from_u64(17));
        let before = engine.snapshot();

        let changes = engine.subscribe();
        activate_and_wait(&engine, 0, CycleDirection::Forward);
        let after = engine.snapshot();

        let mut notified: Vec<usize> = changes.try_iter().map(|c| c.index).collect();
        notified.sort_unstable();
        notified.dedup();

        let diff: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(notified, diff);
    }

    #[test]
    fn notifications_carry_old_and_new_values() {
        let seed = [Color::Blue, Color::Blue];
        let mut engine = PropagationEngine::new(2);
        engine.rebuild_from_seed(&seed);

        let changes = engine.subscribe();
        activate_and_wait(&engine, 0, CycleDirection::Forward);

        let all: Vec<_> = changes.try_iter().collect();
        // Seed cell Blue -> Red, child third(Red, Blue) = Yellow.
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].index, 0);
        assert_eq!(all[0].old, Cell::Color(Color::Blue));
        assert_eq!(all[0].new, Cell::Color(Color::Red));
        assert_eq!(all[1].index, 2);
        assert_eq!(all[1].old, Cell::Color(Color::Blue));
        assert_eq!(all[1].new, Cell::Color(Color::Yellow));
    }

    #[test]
    fn unchanged_cascade_notifies_only_the_activated_cell() {
        // A board of one color: cycling a bottom-corner cell touches no
        // other cell, so exactly one notification is emitted.
        let mut engine = PropagationEngine::new(4);
        engine.rebuild_from_seed(&[Color::Yellow; 4]);
        let changes = engine.subscribe();

        let bottom = engine.cell_count() - 1;
        activate_and_wait(&engine, bottom, CycleDirection::Forward);

        let all: Vec<_> = changes.try_iter().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].index, bottom);
    }
}

mod concurrency {
    use super::*;

    #[test]
    fn second_activation_during_a_pass_is_dropped() {
        let mut engine = PropagationEngine::new(10);
        engine.rebuild_pattern();
        // Slow pass: nine rows with a one-second pause between them.
        engine.set_step_delay_fraction(1.0);

        assert!(engine.activate_cell(0, CycleDirection::Forward).unwrap());
        assert!(!engine.activate_cell(1, CycleDirection::Forward).unwrap());
        assert!(engine.is_updating());
        // The dropped activation wrote nothing: seed cell 1 keeps its
        // pattern color, and the pass never touches the seed row.
        assert_eq!(engine.cell(1).unwrap(), Cell::Color(Color::Yellow));

        engine.set_step_delay_fraction(0.0);
        assert!(engine.wait_until_idle(Duration::from_secs(30)));
    }

    #[test]
    fn rebuild_discards_an_in_flight_pass() {
        let mut engine = PropagationEngine::new(10);
        engine.rebuild_pattern();
        engine.set_step_delay_fraction(1.0);

        assert!(engine.activate_cell(0, CycleDirection::Forward).unwrap());
        // Rebuild while the pass sleeps between rows. The pass holds the
        // old board, so the new one must come out exactly as a fresh
        // pattern build.
        engine.rebuild_pattern();
        let rebuilt = engine.snapshot();

        let mut reference = PropagationEngine::new(10);
        reference.rebuild_pattern();
        assert_eq!(rebuilt, reference.snapshot());

        // The stale pass exits at its next between-rows check and leaves
        // the new board untouched.
        engine.set_step_delay_fraction(0.0);
        assert!(engine.wait_until_idle(Duration::from_secs(30)));
        assert_eq!(engine.snapshot(), reference.snapshot());
    }

    #[test]
    fn clear_invalidates_an_in_flight_pass() {
        let mut engine = PropagationEngine::new(10);
        engine.rebuild_pattern();
        engine.set_step_delay_fraction(1.0);

        assert!(engine.activate_cell(0, CycleDirection::Forward).unwrap());
        engine.clear();

        engine.set_step_delay_fraction(0.0);
        assert!(engine.wait_until_idle(Duration::from_secs(30)));
        assert!(engine.snapshot().iter().all(|&c| c == Cell::Cleared));
    }
}

mod boundaries {
    use super::*;

    #[test]
    fn smallest_board_builds_and_cascades() {
        let mut engine = PropagationEngine::new(2);
        assert_eq!(engine.cell_count(), 3);
        engine.rebuild_pattern();
        assert!(engine.snapshot().iter().all(|c| c.is_resolved()));
        activate_and_wait(&engine, 0, CycleDirection::Forward);
        assert!(engine.snapshot().iter().all(|c| c.is_resolved()));
    }

    #[test]
    fn largest_board_builds_and_cascades() {
        let mut engine = PropagationEngine::new(60);
        assert_eq!(engine.cell_count(), 1830);
        engine.rebuild_random(&mut StdRng::seed_from_u64(1));
        assert!(engine.snapshot().iter().all(|c| c.is_resolved()));
        activate_and_wait(&engine, 0, CycleDirection::Reverse);
        assert!(engine.snapshot().iter().all(|c| c.is_resolved()));
    }
}
