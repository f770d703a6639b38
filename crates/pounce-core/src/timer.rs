use std::fmt::Debug;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Trait for enums naming the slots of a [`TimerBank`].
pub trait TimerSlot: Debug + Clone + Copy + PartialEq + Eq {
    /// Number of slots. Must not exceed 64.
    const COUNT: usize;

    /// Dense index in `0..COUNT`.
    fn index(self) -> usize;
}

/// A bank of decrementing countdown timers, generic over the slot enum.
///
/// A timer is active while its remaining time is above zero. All timers are
/// decremented together once per tick. Serialized as a plain list of
/// remaining times; a list whose length is not `K::COUNT` fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "", try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct TimerBank<K: TimerSlot> {
    remaining: Vec<f32>,
    _slot: PhantomData<K>,
}

impl<K: TimerSlot> TryFrom<Vec<f32>> for TimerBank<K> {
    type Error = String;

    fn try_from(remaining: Vec<f32>) -> Result<Self, Self::Error> {
        if remaining.len() != K::COUNT {
            return Err(format!(
                "timer bank has {} slots, expected {}",
                remaining.len(),
                K::COUNT
            ));
        }
        if let Some(bad) = remaining.iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(format!("invalid remaining time {bad}"));
        }
        Ok(Self {
            remaining,
            _slot: PhantomData,
        })
    }
}

impl<K: TimerSlot> From<TimerBank<K>> for Vec<f32> {
    fn from(bank: TimerBank<K>) -> Self {
        bank.remaining
    }
}

impl<K: TimerSlot> Default for TimerBank<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TimerSlot> TimerBank<K> {
    pub fn new() -> Self {
        Self {
            remaining: vec![0.0; K::COUNT],
            _slot: PhantomData,
        }
    }

    /// Start (or restart) a timer. Negative and non-finite durations clear it.
    pub fn start(&mut self, slot: K, seconds: f32) {
        self.remaining[slot.index()] = if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            0.0
        };
    }

    /// Start a timer only if it would run longer than what remains.
    pub fn extend(&mut self, slot: K, seconds: f32) {
        if seconds > self.remaining(slot) {
            self.start(slot, seconds);
        }
    }

    pub fn clear(&mut self, slot: K) {
        self.remaining[slot.index()] = 0.0;
    }

    pub fn remaining(&self, slot: K) -> f32 {
        self.remaining[slot.index()]
    }

    pub fn is_active(&self, slot: K) -> bool {
        self.remaining[slot.index()] > 0.0
    }

    /// Clear every timer.
    pub fn reset(&mut self) {
        self.remaining.iter_mut().for_each(|r| *r = 0.0);
    }

    /// Decrement all active timers by `dt`, flooring at zero.
    ///
    /// Returns the slots that reached zero during this call.
    pub fn tick(&mut self, dt: f32) -> Expired<K> {
        let mut expired = Expired::none();
        if dt <= 0.0 || !dt.is_finite() {
            return expired;
        }
        for (i, r) in self.remaining.iter_mut().enumerate() {
            if *r > 0.0 {
                *r = (*r - dt).max(0.0);
                if *r == 0.0 {
                    expired.bits |= 1 << i;
                }
            }
        }
        expired
    }
}

/// Set of slots that expired during one [`TimerBank::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired<K: TimerSlot> {
    bits: u64,
    _slot: PhantomData<K>,
}

impl<K: TimerSlot> Expired<K> {
    fn none() -> Self {
        Self {
            bits: 0,
            _slot: PhantomData,
        }
    }

    pub fn contains(&self, slot: K) -> bool {
        self.bits & (1 << slot.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Slot {
        Cooldown,
        Buffer,
    }

    impl TimerSlot for Slot {
        const COUNT: usize = 2;

        fn index(self) -> usize {
            self as usize
        }
    }

    #[test]
    fn timer_expires_after_exact_duration() {
        let mut bank = TimerBank::<Slot>::new();
        bank.start(Slot::Cooldown, 0.25);
        let dt = 1.0 / 64.0;
        for i in 1..16 {
            let expired = bank.tick(dt);
            assert!(bank.is_active(Slot::Cooldown), "tick {i} should still be active");
            assert!(expired.is_empty());
        }
        let expired = bank.tick(dt);
        assert!(!bank.is_active(Slot::Cooldown));
        assert!(expired.contains(Slot::Cooldown));
        assert!(!expired.contains(Slot::Buffer));
    }

    #[test]
    fn tick_floors_at_zero_and_ignores_idle_slots() {
        let mut bank = TimerBank::<Slot>::new();
        bank.start(Slot::Buffer, 0.1);
        let expired = bank.tick(1.0);
        assert_eq!(bank.remaining(Slot::Buffer), 0.0);
        assert!(expired.contains(Slot::Buffer));
        // Already idle: no second expiry
        assert!(bank.tick(1.0).is_empty());
    }

    #[test]
    fn zero_or_invalid_dt_is_noop() {
        let mut bank = TimerBank::<Slot>::new();
        bank.start(Slot::Cooldown, 1.0);
        bank.tick(0.0);
        bank.tick(f32::NAN);
        bank.tick(-1.0);
        assert_eq!(bank.remaining(Slot::Cooldown), 1.0);
    }

    #[test]
    fn extend_never_shortens() {
        let mut bank = TimerBank::<Slot>::new();
        bank.start(Slot::Cooldown, 1.0);
        bank.extend(Slot::Cooldown, 0.5);
        assert_eq!(bank.remaining(Slot::Cooldown), 1.0);
        bank.extend(Slot::Cooldown, 2.0);
        assert_eq!(bank.remaining(Slot::Cooldown), 2.0);
    }

    #[test]
    fn start_rejects_non_finite() {
        let mut bank = TimerBank::<Slot>::new();
        bank.start(Slot::Buffer, f32::INFINITY);
        assert!(!bank.is_active(Slot::Buffer));
        bank.start(Slot::Buffer, -3.0);
        assert!(!bank.is_active(Slot::Buffer));
    }

    #[test]
    fn snapshot_with_wrong_slot_count_is_rejected() {
        let short = rmp_serde::to_vec(&vec![0.5f32]).unwrap();
        let err = rmp_serde::from_slice::<TimerBank<Slot>>(&short).unwrap_err();
        assert!(err.to_string().contains("expected 2"), "error: {err}");

        let negative = rmp_serde::to_vec(&vec![0.5f32, -1.0]).unwrap();
        assert!(rmp_serde::from_slice::<TimerBank<Slot>>(&negative).is_err());

        let mut bank = TimerBank::<Slot>::new();
        bank.start(Slot::Buffer, 0.75);
        let bytes = rmp_serde::to_vec(&bank).unwrap();
        let back: TimerBank<Slot> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, bank);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn tick_never_raises_and_reports_each_expiry_once(
                starts in prop::collection::vec(0.0f32..2.0, 2),
                dts in prop::collection::vec(0.0f32..0.5, 1..40),
            ) {
                let mut bank = TimerBank::<Slot>::new();
                bank.start(Slot::Cooldown, starts[0]);
                bank.start(Slot::Buffer, starts[1]);
                let mut expiries = [0u32; 2];
                for dt in dts {
                    let before = [bank.remaining(Slot::Cooldown), bank.remaining(Slot::Buffer)];
                    let expired = bank.tick(dt);
                    for (i, slot) in [Slot::Cooldown, Slot::Buffer].into_iter().enumerate() {
                        let after = bank.remaining(slot);
                        prop_assert!(after >= 0.0 && after <= before[i], "{:?}: {} -> {}", slot, before[i], after);
                        if expired.contains(slot) {
                            prop_assert!(before[i] > 0.0 && after == 0.0);
                            expiries[i] += 1;
                        }
                    }
                }
                prop_assert!(expiries.iter().all(|&n| n <= 1), "expiries {:?}", expiries);
            }
        }
    }
}
