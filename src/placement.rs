/*
Session placement over a tiered slot pool.

Three placers share one rule set:
- tiers are consumed strictly in order, a tier is exhausted before the next
- days are scanned in weekly order
Block and single-hour placement also prefer days that do not hold the
subject yet, and among those the day with the fewest booked hours.
Forced placement drops both preferences.
*/

use tracing::debug;

use crate::availability::SlotPool;
use crate::models::{Day, SlotKey, Tier};
use crate::priority::NameMatch;
use crate::schedule::PlacementState;

pub const BLOCK_HOURS: u8 = 2;

pub struct Placer<'a> {
    pool: &'a SlotPool,
    tiers: &'a [Tier],
    matching: NameMatch,
}

impl<'a> Placer<'a> {
    pub fn new(pool: &'a SlotPool, tiers: &'a [Tier], matching: NameMatch) -> Self {
        Self {
            pool,
            tiers,
            matching,
        }
    }

    /// Places as many 2-hour blocks as fit. Returns the hours left over.
    ///
    /// An odd demand always leaves its last hour for `place_singles`.
    pub fn place_blocks(&self, state: &mut PlacementState, subject: &str, hours: u32) -> u32 {
        self.place_spread(state, subject, hours, BLOCK_HOURS)
    }

    /// Places 1-hour sessions. Returns the hours left over.
    pub fn place_singles(&self, state: &mut PlacementState, subject: &str, hours: u32) -> u32 {
        self.place_spread(state, subject, hours, 1)
    }

    /// Last resort: first free slot, tier by tier, ignoring how often the
    /// subject already appears on that day. Returns the true shortfall.
    pub fn place_forced(&self, state: &mut PlacementState, subject: &str, hours: u32) -> u32 {
        let mut remaining = hours;

        for &tier in self.tiers {
            for &key in self.pool.slots(tier) {
                if remaining == 0 {
                    return 0;
                }
                if state.used.is_free(key) {
                    debug!(subject, day = %key.day, hour = key.hour, ?tier, "forced placement");
                    state.place(subject, key.day, key.hour, 1);
                    remaining -= 1;
                }
            }
        }

        remaining
    }

    fn place_spread(&self, state: &mut PlacementState, subject: &str, hours: u32, len: u8) -> u32 {
        let mut remaining = hours;

        for &tier in self.tiers {
            let mut placed = true;
            while placed && remaining >= u32::from(len) {
                placed = false;
                if let Some((day, start)) = self.find_spread(state, tier, subject, len) {
                    debug!(subject, day = %day, start, len, ?tier, "placed session");
                    state.place(subject, day, start, len);
                    remaining -= u32::from(len);
                    placed = true;
                }
            }
        }

        remaining
    }

    // Days without the subject first, then the rest. Inside each group the
    // lighter day wins, ties go to weekly order.
    fn find_spread(
        &self,
        state: &PlacementState,
        tier: Tier,
        subject: &str,
        len: u8,
    ) -> Option<(Day, u8)> {
        let (mut fresh, mut repeat): (Vec<Day>, Vec<Day>) = Day::ALL
            .into_iter()
            .partition(|&day| !state.schedule.has_subject_on(day, subject, self.matching));

        let load = |day: &Day| state.schedule.hours_on(*day);
        fresh.sort_by_key(load);
        repeat.sort_by_key(load);

        fresh
            .into_iter()
            .chain(repeat)
            .find_map(|day| self.first_free_run(state, tier, day, len).map(|h| (day, h)))
    }

    // First start hour whose `len` consecutive hours all sit in `tier` and are free
    fn first_free_run(&self, state: &PlacementState, tier: Tier, day: Day, len: u8) -> Option<u8> {
        let hours: Vec<u8> = self.pool.hours_on(tier, day).collect();
        hours.iter().copied().find(|&start| {
            (start..start + len)
                .all(|h| hours.contains(&h) && state.used.is_free(SlotKey::new(day, h)))
        })
    }
}
