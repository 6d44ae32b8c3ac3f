//! Distribution engine: spreads a queue of items over future days.
//!
//! For each item, in queue order:
//!
//! 1. When the current day's bucket is full (or ran out of slots), move the
//!    day offset forward until it resolves to a later date.
//! 2. Resolve the target date through the [`DayWalker`].
//! 3. The first time a date is used, generate its slots. Today gets the
//!    narrowed start and capacity from the [`CutoffEvaluator`], or is skipped
//!    entirely when it cannot take anything. Other dates use the full window.
//! 4. Take the next slot, compose the absolute instant in the site zone and
//!    drop anything not strictly after `now`. A slot whose civil time a DST
//!    shift skips is passed over; a repeated time resolves to its first
//!    occurrence.
//! 5. Pick the owner through the [`OwnerRotator`] and emit the assignment.
//!
//! A bad item never aborts the batch; it becomes a skipped outcome in the
//! [`ScheduleReport`]. The only `Err` is an invalid window.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::SiteZone;
use crate::cutoff::{CutoffEvaluator, CutoffReason, DEFAULT_SAFETY_BUFFER_MINUTES};
use crate::day_walker::{DayWalker, ResolvedDay};
use crate::error::ValidationError;
use crate::owner::{OwnerPolicy, OwnerRotator, RotationState};
use crate::report::{DayReport, ItemOutcome, Outcome, ScheduleIssue, ScheduleReport};
use crate::slots::{SlotGenerator, SlotStrategy};
use crate::window::SchedulingWindow;

/// A queued content item. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub owner_id: String,
    pub title: String,
}

impl Item {
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            title: title.into(),
        }
    }
}

/// A publication instant and owner chosen for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub item: Item,
    pub at: DateTime<FixedOffset>,
    pub owner_id: String,
    pub owner_changed: bool,
}

/// Engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub slot_strategy: SlotStrategy,
    pub safety_buffer_minutes: u32,
    /// Zone the window's civil times are read in.
    #[serde(default)]
    pub zone: SiteZone,
    /// Random seed for reproducible runs (None = entropy)
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_strategy: SlotStrategy::Corrected,
            safety_buffer_minutes: DEFAULT_SAFETY_BUFFER_MINUTES,
            zone: SiteZone::default(),
            seed: None,
        }
    }
}

/// Result of one scheduling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub assignments: Vec<Assignment>,
    pub report: ScheduleReport,
    /// Rotation state to persist for the next run.
    pub rotation: RotationState,
}

/// Slots generated for one date during one run.
#[derive(Debug)]
struct DayBucket {
    date: NaiveDate,
    slots: Vec<NaiveTime>,
    next: usize,
    capacity: u32,
    used: u32,
    exhausted: bool,
}

impl DayBucket {
    fn is_closed(&self) -> bool {
        self.exhausted || self.used >= self.capacity
    }

    fn take(&mut self) -> Option<NaiveTime> {
        let slot = self.slots.get(self.next).copied();
        if slot.is_some() {
            self.next += 1;
        }
        slot
    }

    /// Next slot that exists as an absolute instant in `zone`.
    fn take_instant(&mut self, zone: &SiteZone) -> Option<DateTime<FixedOffset>> {
        while let Some(slot) = self.take() {
            match zone.resolve_local(self.date.and_time(slot)) {
                Some(at) => return Some(at),
                None => debug!(date = %self.date, slot = %slot.format("%H:%M"), "slot falls in a DST gap"),
            }
        }
        None
    }
}

pub struct DistributionEngine {
    config: EngineConfig,
    slots: SlotGenerator,
    walker: DayWalker,
    cutoff: CutoffEvaluator,
    rotator: OwnerRotator,
}

impl DistributionEngine {
    /// Create an engine with default config.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with custom config.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            slots: SlotGenerator::new(config.slot_strategy),
            walker: DayWalker::new(),
            cutoff: CutoffEvaluator::new(config.safety_buffer_minutes),
            rotator: OwnerRotator::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assign publication instants to `items`, oldest first.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if `window` is invalid. Nothing is
    /// scheduled in that case.
    pub fn schedule(
        &self,
        items: &[Item],
        window: &SchedulingWindow,
        owners: &OwnerPolicy,
        now: DateTime<FixedOffset>,
    ) -> Result<ScheduleOutcome, ValidationError> {
        let mut rng = match self.config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        self.schedule_with_rng(items, window, owners, now, &mut rng)
    }

    /// [`schedule`](Self::schedule) with a caller-supplied random source.
    pub fn schedule_with_rng<R: Rng>(
        &self,
        items: &[Item],
        window: &SchedulingWindow,
        owners: &OwnerPolicy,
        now: DateTime<FixedOffset>,
        rng: &mut R,
    ) -> Result<ScheduleOutcome, ValidationError> {
        window.validate()?;
        let now = self.config.zone.localize(now.with_timezone(&Utc));

        let mut report = ScheduleReport::new(now);
        let mut assignments = Vec::with_capacity(items.len());
        let mut rotation = owners.state;

        if let Some(warning) = window.capacity_warning() {
            warn!(%warning, "scheduling window is narrower than the daily capacity needs");
            report.issues.push(warning);
        }

        if items.is_empty() {
            info!("no items to schedule");
            report.issues.push(ScheduleIssue::NoItemsToSchedule);
            return Ok(ScheduleOutcome {
                assignments,
                report,
                rotation,
            });
        }

        let today = now.date_naive();
        let mut day_offset: u32 = 0;
        let mut bucket: Option<DayBucket> = None;

        for item in items {
            if let Some(current) = bucket.as_ref().filter(|b| b.is_closed()) {
                day_offset = self.advance_past(today, day_offset, current.date, window);
                bucket = None;
            }

            if bucket.is_none() {
                bucket = Some(self.open_day(today, &mut day_offset, now, window, &mut report, rng));
            }
            let Some(day) = bucket.as_mut() else {
                continue;
            };

            let Some(at) = day.take_instant(&self.config.zone) else {
                day.exhausted = true;
                skip(&mut report, item, ScheduleIssue::SlotUnavailable { date: day.date });
                continue;
            };

            if at <= now {
                skip(&mut report, item, ScheduleIssue::PastInstantRejected { at, now });
                continue;
            }

            let owner_id = if owners.enabled {
                let (owner, next) = self.rotator.next_owner(
                    &item.owner_id,
                    &owners.pool,
                    &owners.excluded,
                    owners.strategy,
                    rotation,
                    rng,
                );
                rotation = next;
                owner
            } else {
                item.owner_id.clone()
            };
            let owner_changed = owner_id != item.owner_id;

            day.used += 1;
            if let Some(day_report) = report.day_mut(day.date) {
                day_report.assigned += 1;
            }

            debug!(item = %item.id, %at, owner = %owner_id, owner_changed, "assigned");
            report.outcomes.push(ItemOutcome {
                item_id: item.id.clone(),
                title: item.title.clone(),
                outcome: Outcome::Scheduled {
                    at,
                    owner_id: owner_id.clone(),
                    owner_changed,
                },
            });
            assignments.push(Assignment {
                item: item.clone(),
                at,
                owner_id,
                owner_changed,
            });
        }

        Ok(ScheduleOutcome {
            assignments,
            report,
            rotation,
        })
    }

    /// Resolve the date for `day_offset` and generate its slots.
    fn open_day<R: Rng>(
        &self,
        today: NaiveDate,
        day_offset: &mut u32,
        now: DateTime<FixedOffset>,
        window: &SchedulingWindow,
        report: &mut ScheduleReport,
        rng: &mut R,
    ) -> DayBucket {
        let mut date = self.resolve(today, *day_offset, window, report);
        let mut start = window.start_of_day;
        let mut capacity = window.daily_capacity;
        let mut effective_start = None;

        if date == today {
            let cutoff = self.cutoff.evaluate_today(now, window);
            if cutoff.usable {
                start = cutoff.effective_start;
                capacity = cutoff.capacity_today;
                if start != window.start_of_day {
                    effective_start = Some(start);
                }
            } else {
                let reason = cutoff.reason.unwrap_or(CutoffReason::PastEndOfDay);
                info!(date = %today, %reason, "skipping today");
                report.issues.push(ScheduleIssue::TodaySkipped {
                    date: today,
                    reason,
                });
                *day_offset += 1;
                date = self.resolve(today, *day_offset, window, report);
            }
        }

        let slots = self.slots.generate(
            capacity,
            start,
            window.end_of_day,
            window.min_interval_minutes,
            rng,
        );

        info!(
            %date,
            capacity,
            slots = slots.len(),
            start = %start.format("%H:%M"),
            "opened publishing day"
        );
        report.days.push(DayReport {
            date,
            capacity,
            slots_generated: slots.len(),
            assigned: 0,
            effective_start,
        });

        DayBucket {
            date,
            slots,
            next: 0,
            capacity,
            used: 0,
            exhausted: false,
        }
    }

    fn resolve(
        &self,
        today: NaiveDate,
        day_offset: u32,
        window: &SchedulingWindow,
        report: &mut ScheduleReport,
    ) -> NaiveDate {
        let ResolvedDay { date, fell_back } =
            self.walker.resolve(today, day_offset, window.eligible_weekdays);
        if fell_back {
            let issue = ScheduleIssue::NoEligibleDayFound {
                from: today,
                fallback: date,
                horizon_days: self.walker.horizon_days(),
            };
            warn!(%issue, "day walk exhausted");
            report.issues.push(issue);
        }
        date
    }

    /// Smallest offset after `day_offset` whose date is later than `current`.
    fn advance_past(
        &self,
        today: NaiveDate,
        day_offset: u32,
        current: NaiveDate,
        window: &SchedulingWindow,
    ) -> u32 {
        let mut offset = day_offset + 1;
        // resolve(offset) >= today + offset, so this ends within the horizon.
        for _ in 0..=self.walker.horizon_days() {
            let date = self
                .walker
                .next_eligible_date(today, offset, window.eligible_weekdays);
            if date > current {
                break;
            }
            offset += 1;
        }
        offset
    }
}

impl Default for DistributionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn skip(report: &mut ScheduleReport, item: &Item, reason: ScheduleIssue) {
    warn!(item = %item.id, %reason, "item skipped");
    report.outcomes.push(ItemOutcome {
        item_id: item.id.clone(),
        title: item.title.clone(),
        outcome: Outcome::Skipped { reason },
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::OwnerStrategy;
    use crate::time_of_day::minutes_of_day;
    use crate::window::WeekdaySet;
    use chrono::{Datelike, TimeZone, Timelike, Weekday};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(format!("post-{i}"), "1", format!("Post {i}")))
            .collect()
    }

    fn seeded(seed: u64) -> DistributionEngine {
        DistributionEngine::with_config(EngineConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    #[test]
    fn fills_today_when_window_is_ahead() {
        // Monday 08:00, window 09:00-12:00, three posts 30 minutes apart.
        let window = SchedulingWindow::new(t(9, 0), t(12, 0), 30, WeekdaySet::all(), 3).unwrap();
        let now = at(2024, 3, 4, 8, 0);

        let outcome = seeded(11)
            .schedule(&items(3), &window, &OwnerPolicy::disabled(), now)
            .unwrap();

        assert_eq!(outcome.assignments.len(), 3);
        let mut minutes: Vec<u32> = outcome
            .assignments
            .iter()
            .map(|a| {
                assert_eq!(a.at.date_naive(), now.date_naive());
                minutes_of_day(a.at.time())
            })
            .collect();
        minutes.sort_unstable();
        assert!(minutes.iter().all(|m| (540..720).contains(m)));
        assert!(minutes.windows(2).all(|w| w[1] - w[0] >= 30));
        assert_eq!(outcome.report.summary(), "Successfully scheduled 3 posts.");
    }

    #[test]
    fn walks_to_eligible_weekdays() {
        // Tuesday start, Monday/Wednesday only, two per day.
        let window = SchedulingWindow::new(
            t(9, 0),
            t(18, 0),
            30,
            [Weekday::Mon, Weekday::Wed].into_iter().collect(),
            2,
        )
        .unwrap();
        let now = at(2024, 3, 5, 8, 0);

        let outcome = seeded(5)
            .schedule(&items(5), &window, &OwnerPolicy::disabled(), now)
            .unwrap();

        let dates: Vec<String> = outcome
            .assignments
            .iter()
            .map(|a| a.at.date_naive().to_string())
            .collect();
        assert_eq!(
            dates,
            vec!["2024-03-06", "2024-03-06", "2024-03-11", "2024-03-11", "2024-03-13"]
        );
        assert_eq!(outcome.report.days.len(), 3);
    }

    #[test]
    fn skips_today_after_window_closes() {
        let window = SchedulingWindow::new(t(9, 0), t(18, 0), 30, WeekdaySet::all(), 2).unwrap();
        let now = at(2024, 3, 4, 19, 0);

        let outcome = seeded(1)
            .schedule(&items(3), &window, &OwnerPolicy::disabled(), now)
            .unwrap();

        let dates: Vec<u32> = outcome.assignments.iter().map(|a| a.at.day()).collect();
        assert_eq!(dates, vec![5, 5, 6]);
        assert!(outcome.report.issues.iter().any(|i| matches!(
            i,
            ScheduleIssue::TodaySkipped { reason: CutoffReason::PastEndOfDay, .. }
        )));
    }

    #[test]
    fn narrows_today_and_caps_capacity() {
        // 11:00 with a 5 minute buffer leaves [11:05, 12:00): two 30-minute slots.
        let window = SchedulingWindow::new(t(9, 0), t(12, 0), 30, WeekdaySet::all(), 5).unwrap();
        let now = at(2024, 3, 4, 11, 0);

        let outcome = seeded(9)
            .schedule(&items(4), &window, &OwnerPolicy::disabled(), now)
            .unwrap();

        let today: Vec<_> = outcome
            .assignments
            .iter()
            .filter(|a| a.at.date_naive() == now.date_naive())
            .collect();
        assert_eq!(today.len(), 2);
        assert!(today.iter().all(|a| a.at.time() >= t(11, 5)));
        assert_eq!(outcome.report.days[0].effective_start, Some(t(11, 5)));
        assert_eq!(outcome.assignments.len(), 4);
    }

    #[test]
    fn empty_queue_is_not_an_error() {
        let window = SchedulingWindow::new(t(9, 0), t(18, 0), 30, WeekdaySet::all(), 5).unwrap();
        let outcome = DistributionEngine::new()
            .schedule(&[], &window, &OwnerPolicy::disabled(), at(2024, 3, 4, 8, 0))
            .unwrap();
        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.report.issues, vec![ScheduleIssue::NoItemsToSchedule]);
    }

    #[test]
    fn invalid_window_is_rejected_up_front() {
        let window = SchedulingWindow {
            start_of_day: t(18, 0),
            end_of_day: t(9, 0),
            min_interval_minutes: 30,
            eligible_weekdays: WeekdaySet::all(),
            daily_capacity: 5,
        };
        let err = DistributionEngine::new()
            .schedule(&items(2), &window, &OwnerPolicy::disabled(), at(2024, 3, 4, 8, 0))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange { .. }));
    }

    #[test]
    fn infeasible_window_skips_instead_of_inventing_times() {
        // (3 - 1) * 30 >= 60: the generator refuses every full day. Start after
        // today's window so no narrowed capacity comes into play.
        let window = SchedulingWindow::new(t(9, 0), t(10, 0), 30, WeekdaySet::all(), 3).unwrap();
        let outcome = seeded(2)
            .schedule(&items(2), &window, &OwnerPolicy::disabled(), at(2024, 3, 4, 19, 0))
            .unwrap();

        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.report.skipped_count(), 2);
        assert!(matches!(
            outcome.report.issues[0],
            ScheduleIssue::ConfigurationWarning { .. }
        ));
        // One skip per day, then the next item moves on.
        assert_eq!(outcome.report.days.len(), 2);
    }

    #[test]
    fn legacy_under_fill_skips_and_moves_on() {
        let engine = DistributionEngine::with_config(EngineConfig {
            slot_strategy: SlotStrategy::Legacy,
            seed: Some(0),
            ..Default::default()
        });
        // 61-minute window with three 30-minute slots: legacy almost always
        // comes up short.
        let window = SchedulingWindow::new(t(9, 0), t(10, 1), 30, WeekdaySet::all(), 3).unwrap();
        let outcome = engine
            .schedule(&items(6), &window, &OwnerPolicy::disabled(), at(2024, 3, 4, 6, 0))
            .unwrap();

        let skipped_for_slots = outcome
            .report
            .outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Skipped { reason: ScheduleIssue::SlotUnavailable { .. } }))
            .count();
        assert!(skipped_for_slots > 0);
        assert_eq!(outcome.assignments.len() + skipped_for_slots, 6);
    }

    #[test]
    fn rotates_owners_and_returns_state() {
        let window = SchedulingWindow::new(t(9, 0), t(18, 0), 30, WeekdaySet::all(), 5).unwrap();
        let owners = OwnerPolicy {
            enabled: true,
            strategy: OwnerStrategy::RoundRobin,
            pool: vec!["2".into(), "3".into(), "4".into()],
            excluded: vec!["4".into()],
            state: RotationState::default(),
        };

        let outcome = seeded(3)
            .schedule(&items(3), &window, &owners, at(2024, 3, 4, 6, 0))
            .unwrap();

        let picked: Vec<&str> = outcome.assignments.iter().map(|a| a.owner_id.as_str()).collect();
        assert_eq!(picked, vec!["2", "3", "2"]);
        assert!(outcome.assignments.iter().all(|a| a.owner_changed));
        assert_eq!(outcome.rotation.current_index, 1);
    }

    #[test]
    fn disabled_owner_policy_keeps_original() {
        let window = SchedulingWindow::new(t(9, 0), t(18, 0), 30, WeekdaySet::all(), 5).unwrap();
        let outcome = seeded(3)
            .schedule(&items(2), &window, &OwnerPolicy::disabled(), at(2024, 3, 4, 6, 0))
            .unwrap();
        assert!(outcome.assignments.iter().all(|a| a.owner_id == "1" && !a.owner_changed));
    }

    #[test]
    fn same_seed_same_schedule() {
        let window = SchedulingWindow::new(t(9, 0), t(18, 0), 30, WeekdaySet::work_week(), 4).unwrap();
        let now = at(2024, 3, 4, 6, 0);
        let a = seeded(77).schedule(&items(9), &window, &OwnerPolicy::disabled(), now).unwrap();
        let b = seeded(77).schedule(&items(9), &window, &OwnerPolicy::disabled(), now).unwrap();
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn zero_buffer_never_lands_on_now() {
        let engine_for = |seed| {
            DistributionEngine::with_config(EngineConfig {
                safety_buffer_minutes: 0,
                seed: Some(seed),
                ..Default::default()
            })
        };
        let window = SchedulingWindow::new(t(9, 0), t(11, 10), 5, WeekdaySet::all(), 1).unwrap();
        let now = at(2024, 3, 4, 11, 0);

        for seed in 0..40 {
            let outcome = engine_for(seed)
                .schedule(&items(1), &window, &OwnerPolicy::disabled(), now)
                .unwrap();
            assert_eq!(outcome.assignments.len(), 1, "seed {seed}");
            let a = &outcome.assignments[0];
            assert_eq!(a.at.date_naive(), now.date_naive());
            assert!(a.at.time() >= t(11, 1));
        }
    }

    fn zoned(zone: &str, seed: u64) -> DistributionEngine {
        DistributionEngine::with_config(EngineConfig {
            zone: zone.parse().unwrap(),
            seed: Some(seed),
            ..Default::default()
        })
    }

    #[test]
    fn keeps_civil_window_across_spring_forward() {
        // New York moves from -05:00 to -04:00 on Sunday 2024-03-10.
        let window = SchedulingWindow::new(t(9, 0), t(18, 0), 30, WeekdaySet::all(), 2).unwrap();
        let now = Utc
            .with_ymd_and_hms(2024, 3, 8, 12, 0, 0)
            .unwrap()
            .fixed_offset();

        let outcome = zoned("America/New_York", 4)
            .schedule(&items(8), &window, &OwnerPolicy::disabled(), now)
            .unwrap();

        assert_eq!(outcome.assignments.len(), 8);
        for a in &outcome.assignments {
            assert!(a.at.time() >= t(9, 0) && a.at.time() < t(18, 0));
            let expected = if a.at.date_naive() < NaiveDate::from_ymd_opt(2024, 3, 10).unwrap() {
                -5 * 3600
            } else {
                -4 * 3600
            };
            assert_eq!(a.at.offset().local_minus_utc(), expected, "{}", a.at);
        }
        // Friday 07:00 local: the run starts with today in local terms.
        assert_eq!(outcome.report.days[0].date.to_string(), "2024-03-08");
    }

    #[test]
    fn slots_in_spring_forward_gap_are_passed_over() {
        // 02:00-03:00 does not exist on 2024-03-10 in New York. The packed
        // window yields 01:30, 02:00, 02:30, 03:00, 03:30.
        let window = SchedulingWindow::new(t(1, 30), t(3, 31), 30, WeekdaySet::all(), 5).unwrap();
        let now = Utc
            .with_ymd_and_hms(2024, 3, 10, 5, 0, 0)
            .unwrap()
            .fixed_offset();

        let outcome = zoned("America/New_York", 1)
            .schedule(&items(5), &window, &OwnerPolicy::disabled(), now)
            .unwrap();

        let times: Vec<String> = outcome
            .assignments
            .iter()
            .map(|a| a.at.format("%H:%M%:z").to_string())
            .collect();
        assert_eq!(times[..3].to_vec(), vec!["01:30-05:00", "03:00-04:00", "03:30-04:00"]);
        assert_eq!(outcome.report.days[0].date.to_string(), "2024-03-10");

        // Only three slots exist that night: the fourth item finds the day
        // exhausted and the fifth moves on to Monday.
        assert!(matches!(
            outcome.report.outcomes[3].outcome,
            Outcome::Skipped { reason: ScheduleIssue::SlotUnavailable { .. } }
        ));
        assert_eq!(outcome.assignments.len(), 4);
        assert_eq!(outcome.assignments[3].at.date_naive().to_string(), "2024-03-11");
    }

    #[test]
    fn repeated_hour_rejects_instants_already_past() {
        // New York falls back from 02:00 EDT to 01:00 EST on 2024-11-03.
        // At 01:40 EST the first 01:45-01:55 is an hour gone.
        let window = SchedulingWindow::new(t(1, 0), t(2, 10), 5, WeekdaySet::all(), 5).unwrap();
        let now = Utc
            .with_ymd_and_hms(2024, 11, 3, 6, 40, 0)
            .unwrap()
            .fixed_offset();

        let outcome = zoned("America/New_York", 8)
            .schedule(&items(5), &window, &OwnerPolicy::disabled(), now)
            .unwrap();

        let rejected = outcome
            .report
            .outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Skipped { reason: ScheduleIssue::PastInstantRejected { .. } }))
            .count();
        assert_eq!(rejected, 3);
        let kept: Vec<String> = outcome
            .assignments
            .iter()
            .map(|a| a.at.format("%H:%M%:z").to_string())
            .collect();
        assert_eq!(kept, vec!["02:00-05:00", "02:05-05:00"]);
        assert!(outcome.assignments.iter().all(|a| a.at > now));
    }

    proptest! {
        #[test]
        fn respects_capacity_and_future_instants(
            seed in any::<u64>(),
            day in 1u32..28,
            hour in 0u32..24,
            minute in 0u32..60,
            start_hour in 0u32..12,
            span_hours in 1u32..12,
            interval in 5u32..120,
            capacity in 1u32..10,
            mask in 0u8..128,
            count in 0usize..40,
            legacy in any::<bool>(),
        ) {
            let days = [
                Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu,
                Weekday::Fri, Weekday::Sat, Weekday::Sun,
            ];
            let eligible: WeekdaySet = days
                .into_iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, d)| d)
                .collect();
            let window = SchedulingWindow::new(
                t(start_hour, 0),
                t(start_hour + span_hours, 0),
                interval,
                eligible,
                capacity,
            )
            .unwrap();
            let now = at(2024, 5, day, hour, minute);
            let engine = DistributionEngine::with_config(EngineConfig {
                slot_strategy: if legacy { SlotStrategy::Legacy } else { SlotStrategy::Corrected },
                seed: Some(seed),
                ..Default::default()
            });

            let outcome = engine
                .schedule(&items(count), &window, &OwnerPolicy::disabled(), now)
                .unwrap();

            let mut per_day: HashMap<NaiveDate, u32> = HashMap::new();
            for a in &outcome.assignments {
                prop_assert!(a.at > now);
                prop_assert!(a.at.time() >= window.start_of_day && a.at.time() < window.end_of_day);
                prop_assert!(window.eligible_weekdays.allows(a.at.weekday()));
                prop_assert_eq!(a.at.second(), 0);
                *per_day.entry(a.at.date_naive()).or_default() += 1;
            }
            prop_assert!(per_day.values().all(|n| *n <= capacity));
            prop_assert_eq!(outcome.report.outcomes.len(), count);
        }
    }
}
