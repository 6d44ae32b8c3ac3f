//! Random time-of-day slots with a minimum spacing.
//!
//! Slots are drawn uniformly from `[start, end)` at minute resolution and
//! accepted only when they sit at least `min_interval` minutes away from
//! every slot accepted so far.
//!
//! Two behaviours are available:
//!
//! - [`SlotStrategy::Legacy`]: rejection sampling only. A slot that cannot be
//!   placed within [`MAX_ATTEMPTS`] draws is dropped, so tight but feasible
//!   windows may come back short.
//! - [`SlotStrategy::Corrected`]: after the draws are exhausted the slot goes
//!   into the first gap that satisfies the spacing. If earlier random picks
//!   have fragmented the window so that no gap is left, the whole day falls
//!   back to the packed layout `start + i * interval`. The result always has
//!   exactly `count` slots when `(count - 1) * interval < end - start`.
//!
//! Both return an empty set when the window is structurally too small.

use chrono::NaiveTime;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::time_of_day::{from_minutes, minutes_of_day};

/// Random draws per slot before giving up (legacy) or falling back.
pub const MAX_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStrategy {
    /// Historical behaviour, may under-fill.
    Legacy,
    /// Guarantees `count` slots whenever the window is feasible.
    #[default]
    Corrected,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SlotGenerator {
    strategy: SlotStrategy,
}

impl SlotGenerator {
    pub fn new(strategy: SlotStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SlotStrategy {
        self.strategy
    }

    /// Generate up to `count` slots in `[start, end)`, sorted ascending.
    pub fn generate<R: Rng>(
        &self,
        count: u32,
        start: NaiveTime,
        end: NaiveTime,
        min_interval: u32,
        rng: &mut R,
    ) -> Vec<NaiveTime> {
        let start_min = minutes_of_day(start);
        let end_min = minutes_of_day(end);

        if count == 0 || !is_feasible(count, start_min, end_min, min_interval) {
            return Vec::new();
        }

        let mut used: Vec<u32> = Vec::with_capacity(count as usize);
        let mut fragmented = false;

        for _ in 0..count {
            if let Some(minute) = draw(start_min, end_min, min_interval, &used, rng) {
                used.push(minute);
                continue;
            }

            match self.strategy {
                SlotStrategy::Legacy => {}
                SlotStrategy::Corrected => match first_gap(start_min, end_min, min_interval, &used) {
                    Some(minute) => used.push(minute),
                    None => {
                        fragmented = true;
                        break;
                    }
                },
            }
        }

        if fragmented {
            used = (0..count).map(|i| start_min + i * min_interval).collect();
        }

        used.sort_unstable();
        used.into_iter().filter_map(from_minutes).collect()
    }
}

/// `true` when `count` slots spaced `min_interval` apart fit in `[start, end)`.
fn is_feasible(count: u32, start_min: u32, end_min: u32, min_interval: u32) -> bool {
    if end_min <= start_min {
        return false;
    }
    let needed = u64::from(count.saturating_sub(1)) * u64::from(min_interval);
    needed < u64::from(end_min - start_min)
}

fn too_close(candidate: u32, used: &[u32], min_interval: u32) -> bool {
    used.iter().any(|&u| candidate.abs_diff(u) < min_interval)
}

fn draw<R: Rng>(
    start_min: u32,
    end_min: u32,
    min_interval: u32,
    used: &[u32],
    rng: &mut R,
) -> Option<u32> {
    (0..MAX_ATTEMPTS)
        .map(|_| rng.gen_range(start_min..end_min))
        .find(|candidate| !too_close(*candidate, used, min_interval))
}

fn first_gap(start_min: u32, end_min: u32, min_interval: u32, used: &[u32]) -> Option<u32> {
    (start_min..end_min).find(|candidate| !too_close(*candidate, used, min_interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn spaced(slots: &[NaiveTime], min_interval: u32) -> bool {
        slots.windows(2).all(|w| minutes_of_day(w[1]) - minutes_of_day(w[0]) >= min_interval)
    }

    #[test]
    fn boundary_window_is_infeasible() {
        // (3 - 1) * 30 = 60 >= 60
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        for strategy in [SlotStrategy::Legacy, SlotStrategy::Corrected] {
            let slots = SlotGenerator::new(strategy).generate(3, t(9, 0), t(10, 0), 30, &mut rng);
            assert!(slots.is_empty(), "{strategy:?} should refuse an infeasible window");
        }
    }

    #[test]
    fn zero_count_is_empty() {
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        assert!(SlotGenerator::default()
            .generate(0, t(9, 0), t(18, 0), 30, &mut rng)
            .is_empty());
    }

    #[test]
    fn roomy_window_fills_exactly() {
        let mut rng = Mcg128Xsl64::seed_from_u64(42);
        let slots = SlotGenerator::default().generate(5, t(9, 0), t(18, 0), 30, &mut rng);
        assert_eq!(slots.len(), 5);
        assert!(spaced(&slots, 30));
        assert!(slots.iter().all(|s| *s >= t(9, 0) && *s < t(18, 0)));
    }

    #[test]
    fn legacy_under_fills_tight_windows() {
        // 61 minutes, three slots 30 apart: the only placement is 09:00, 09:30,
        // 10:00. Random draws almost never find it.
        let generator = SlotGenerator::new(SlotStrategy::Legacy);
        let under_filled = (0..50u64).any(|seed| {
            let mut rng = Mcg128Xsl64::seed_from_u64(seed);
            generator.generate(3, t(9, 0), t(10, 1), 30, &mut rng).len() < 3
        });
        assert!(under_filled);
    }

    #[test]
    fn corrected_fills_tight_windows() {
        let generator = SlotGenerator::new(SlotStrategy::Corrected);
        for seed in 0..50u64 {
            let mut rng = Mcg128Xsl64::seed_from_u64(seed);
            let slots = generator.generate(3, t(9, 0), t(10, 1), 30, &mut rng);
            assert_eq!(slots, vec![t(9, 0), t(9, 30), t(10, 0)]);
        }
    }

    #[test]
    fn legacy_slots_still_respect_spacing() {
        let generator = SlotGenerator::new(SlotStrategy::Legacy);
        let mut rng = Mcg128Xsl64::seed_from_u64(7);
        let slots = generator.generate(10, t(9, 0), t(12, 0), 15, &mut rng);
        assert!(slots.len() <= 10);
        assert!(spaced(&slots, 15));
    }

    #[test]
    fn single_slot_in_empty_window_is_empty() {
        let mut rng = Mcg128Xsl64::seed_from_u64(3);
        assert!(SlotGenerator::default()
            .generate(1, t(9, 0), t(9, 0), 30, &mut rng)
            .is_empty());
    }

    proptest! {
        #[test]
        fn corrected_returns_exact_count_when_feasible(
            seed in any::<u64>(),
            start in 0u32..900,
            interval in 1u32..60,
            count in 1u32..8,
            slack in 1u32..120,
        ) {
            let end = start + (count - 1) * interval + slack;

            let mut rng = Mcg128Xsl64::seed_from_u64(seed);
            let slots = SlotGenerator::new(SlotStrategy::Corrected).generate(
                count,
                from_minutes(start).unwrap(),
                from_minutes(end).unwrap(),
                interval,
                &mut rng,
            );

            prop_assert_eq!(slots.len(), count as usize);
            let inside = slots.iter().all(|s| {
                let m = minutes_of_day(*s);
                m >= start && m < end
            });
            prop_assert!(inside);
            prop_assert!(spaced(&slots, interval));
        }

        #[test]
        fn infeasible_windows_are_empty(
            seed in any::<u64>(),
            start in 0u32..900,
            interval in 1u32..60,
            count in 2u32..8,
            fraction in 0.0f64..=1.0,
        ) {
            let needed = (count - 1) * interval;
            let len = ((f64::from(needed) * fraction) as u32).max(1);
            let end = start + len;

            let mut rng = Mcg128Xsl64::seed_from_u64(seed);
            for strategy in [SlotStrategy::Legacy, SlotStrategy::Corrected] {
                let slots = SlotGenerator::new(strategy).generate(
                    count,
                    from_minutes(start).unwrap(),
                    from_minutes(end).unwrap(),
                    interval,
                    &mut rng,
                );
                prop_assert!(slots.is_empty());
            }
        }
    }
}
