//! Cooldown schedules and the time-varying capacity state of cooldown sources.
//!
//! A [`CooldownSchedule`] is static catalog data: how often a source resets
//! and how many units it supplies per window. [`CooldownState`] is the
//! caller-owned, mutable side: how much of the current window is left and
//! when it ends. The planner only ever reads a snapshot of the state; it is
//! decremented through [`Planner::commit`](crate::planner::Planner::commit)
//! once the caller accepts a plan.

use crate::catalog::Catalog;
use crate::error::PlanError;
use crate::id::CooldownSourceId;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;

/// Static reset schedule of a cooldown source. Windows start at `anchor`
/// and repeat every `reset_period`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownSchedule {
    pub name: String,
    pub reset_period: TimeDelta,
    pub capacity: u32,
    pub anchor: DateTime<Utc>,
}

impl CooldownSchedule {
    /// A schedule resetting every day at 00:00 UTC.
    pub fn daily(name: &str, capacity: u32) -> Self {
        Self {
            name: name.to_string(),
            reset_period: TimeDelta::days(1),
            capacity,
            anchor: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// First reset boundary strictly after `at`.
    pub fn next_reset_after(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        if at < self.anchor {
            return self.anchor;
        }
        let period = self.reset_period.num_seconds().max(1);
        let elapsed = (at - self.anchor).num_seconds();
        let periods = elapsed / period + 1;
        period
            .checked_mul(periods)
            .and_then(TimeDelta::try_seconds)
            .and_then(|offset| self.anchor.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Number of reset boundaries in `[resets_at, at]`, i.e. how many windows
    /// have started since a window that ends at `resets_at`.
    fn boundaries_crossed(&self, resets_at: DateTime<Utc>, at: DateTime<Utc>) -> u64 {
        if at < resets_at {
            return 0;
        }
        let period = self.reset_period.num_seconds().max(1);
        let elapsed = (at - resets_at).num_seconds();
        (elapsed / period) as u64 + 1
    }
}

/// Capacity of one source in its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownWindow {
    /// Units still available before `resets_at`.
    pub remaining: u32,
    /// End of the current window.
    pub resets_at: DateTime<Utc>,
    /// Units already promised to future windows (carryover fulfillment).
    pub reserved_ahead: u64,
}

impl CooldownWindow {
    fn fresh(schedule: &CooldownSchedule, at: DateTime<Utc>) -> Self {
        Self {
            remaining: schedule.capacity,
            resets_at: schedule.next_reset_after(at),
            reserved_ahead: 0,
        }
    }

    /// This window as seen at `at`, rolling over any resets that happened.
    /// Each new window first pays back units reserved ahead.
    fn rolled(self, schedule: &CooldownSchedule, at: DateTime<Utc>) -> Self {
        let crossed = schedule.boundaries_crossed(self.resets_at, at);
        if crossed == 0 {
            return self;
        }
        let capacity = u64::from(schedule.capacity);
        let mut reserved = self.reserved_ahead;
        let mut remaining = schedule.capacity;
        if capacity > 0 {
            for step in 1..=crossed {
                let repaid = reserved.min(capacity);
                reserved -= repaid;
                remaining = (capacity - repaid) as u32;
                if reserved == 0 {
                    // Every later window starts full.
                    if step < crossed {
                        remaining = schedule.capacity;
                    }
                    break;
                }
            }
        }
        Self {
            remaining,
            resets_at: schedule.next_reset_after(at),
            reserved_ahead: reserved,
        }
    }
}

/// Remaining capacity per cooldown source. Sources without an entry have
/// never been drawn from and hold their full capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownState {
    windows: BTreeMap<CooldownSourceId, CooldownWindow>,
}

impl CooldownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every source of the catalog at full capacity for the window
    /// containing `at`.
    pub fn from_catalog(catalog: &Catalog, at: DateTime<Utc>) -> Self {
        let windows = catalog
            .cooldown_sources()
            .map(|(id, schedule)| (id, CooldownWindow::fresh(schedule, at)))
            .collect();
        Self { windows }
    }

    /// The source's window as seen at `at`.
    pub fn window(
        &self,
        source: CooldownSourceId,
        schedule: &CooldownSchedule,
        at: DateTime<Utc>,
    ) -> CooldownWindow {
        match self.windows.get(&source) {
            Some(window) => window.rolled(schedule, at),
            None => CooldownWindow::fresh(schedule, at),
        }
    }

    /// Units the source can still supply in the window containing `at`.
    pub fn remaining_capacity(
        &self,
        source: CooldownSourceId,
        schedule: &CooldownSchedule,
        at: DateTime<Utc>,
    ) -> u32 {
        self.window(source, schedule, at).remaining
    }

    /// Overwrite the remaining capacity of the current window.
    pub fn set_remaining(
        &mut self,
        source: CooldownSourceId,
        schedule: &CooldownSchedule,
        remaining: u32,
        at: DateTime<Utc>,
    ) {
        let mut window = self.window(source, schedule, at);
        window.remaining = remaining;
        self.windows.insert(source, window);
    }

    /// Draw `quantity` units at `at`. With `carryover`, units beyond the
    /// current window are reserved from the following windows.
    pub fn consume(
        &mut self,
        source: CooldownSourceId,
        schedule: &CooldownSchedule,
        quantity: u64,
        carryover: bool,
        at: DateTime<Utc>,
    ) -> Result<(), PlanError> {
        let mut window = self.window(source, schedule, at);
        if quantity <= u64::from(window.remaining) {
            window.remaining -= quantity as u32;
        } else if carryover && schedule.capacity > 0 {
            window.reserved_ahead = window
                .reserved_ahead
                .saturating_add(quantity - u64::from(window.remaining));
            window.remaining = 0;
        } else {
            return Err(PlanError::CapacityExceeded {
                cooldown: source,
                requested: quantity,
                remaining: window.remaining,
            });
        }
        self.windows.insert(source, window);
        Ok(())
    }

    /// Roll every tracked window forward to `at`.
    pub fn advance_to(&mut self, catalog: &Catalog, at: DateTime<Utc>) {
        for (source, schedule) in catalog.cooldown_sources() {
            if let Some(window) = self.windows.get_mut(&source) {
                *window = window.rolled(schedule, at);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CooldownSourceId, &CooldownWindow)> {
        self.windows.iter().map(|(id, w)| (*id, w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn quartz() -> (CooldownSourceId, CooldownSchedule) {
        (CooldownSourceId(0), CooldownSchedule::daily("quartz", 1))
    }

    #[test]
    fn daily_schedule_resets_at_midnight() {
        let (_, schedule) = quartz();
        assert_eq!(schedule.next_reset_after(ts(4, 13)), ts(5, 0));
        // Exactly on a boundary, the next reset is a full period later.
        assert_eq!(schedule.next_reset_after(ts(5, 0)), ts(6, 0));
    }

    #[test]
    fn anchor_in_future_is_next_reset() {
        let schedule = CooldownSchedule {
            name: "weekly".into(),
            reset_period: TimeDelta::days(7),
            capacity: 3,
            anchor: ts(10, 7),
        };
        assert_eq!(schedule.next_reset_after(ts(4, 0)), ts(10, 7));
        assert_eq!(schedule.next_reset_after(ts(10, 8)), ts(17, 7));
    }

    #[test]
    fn untouched_source_has_full_capacity() {
        let (id, schedule) = quartz();
        let state = CooldownState::new();
        assert_eq!(state.remaining_capacity(id, &schedule, ts(4, 12)), 1);
    }

    #[test]
    fn consume_then_reset() {
        let (id, schedule) = quartz();
        let mut state = CooldownState::new();
        state.consume(id, &schedule, 1, false, ts(4, 12)).unwrap();
        assert_eq!(state.remaining_capacity(id, &schedule, ts(4, 23)), 0);
        assert_eq!(state.remaining_capacity(id, &schedule, ts(5, 0)), 1);
    }

    #[test]
    fn consume_beyond_capacity_fails_without_carryover() {
        let (id, schedule) = quartz();
        let mut state = CooldownState::new();
        let err = state.consume(id, &schedule, 2, false, ts(4, 12)).unwrap_err();
        assert_eq!(
            err,
            PlanError::CapacityExceeded {
                cooldown: id,
                requested: 2,
                remaining: 1,
            }
        );
        // Failed draws leave the state untouched.
        assert_eq!(state.remaining_capacity(id, &schedule, ts(4, 12)), 1);
    }

    #[test]
    fn carryover_reserves_future_windows() {
        let (id, _) = quartz();
        let schedule = CooldownSchedule::daily("quartz", 2);
        let mut state = CooldownState::new();
        state.consume(id, &schedule, 5, true, ts(4, 12)).unwrap();

        let today = state.window(id, &schedule, ts(4, 12));
        assert_eq!(today.remaining, 0);
        assert_eq!(today.reserved_ahead, 3);

        // Day 5 repays 2 of the 3 reserved units.
        let tomorrow = state.window(id, &schedule, ts(5, 1));
        assert_eq!(tomorrow.remaining, 0);
        assert_eq!(tomorrow.reserved_ahead, 1);

        // Day 6 repays the last unit and has one left.
        let day_after = state.window(id, &schedule, ts(6, 1));
        assert_eq!(day_after.remaining, 1);
        assert_eq!(day_after.reserved_ahead, 0);

        // Later windows are full again.
        assert_eq!(state.remaining_capacity(id, &schedule, ts(9, 1)), 2);
    }

    #[test]
    fn huge_carryover_saturates_reservation() {
        let (id, schedule) = quartz();
        let mut state = CooldownState::new();
        state.consume(id, &schedule, 3, true, ts(4, 12)).unwrap();
        state.consume(id, &schedule, u64::MAX, true, ts(4, 12)).unwrap();

        assert_eq!(state.window(id, &schedule, ts(4, 12)).reserved_ahead, u64::MAX);
    }

    #[test]
    fn set_remaining_overrides_current_window() {
        let (id, schedule) = quartz();
        let mut state = CooldownState::new();
        state.set_remaining(id, &schedule, 0, ts(4, 12));
        assert_eq!(state.remaining_capacity(id, &schedule, ts(4, 20)), 0);
        assert_eq!(state.remaining_capacity(id, &schedule, ts(5, 20)), 1);
    }
}
