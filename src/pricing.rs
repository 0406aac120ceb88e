//! Trip cost policies.
//!
//! A small strategy family: casual and member base rates, plus a peak-hour
//! decorator that multiplies the wrapped strategy's cost when the trip
//! starts inside the configured window. Strategies hold no per-call state
//! and are reused across every trip in a run.

use chrono::NaiveDateTime;

use crate::config::PeakWindow;
use crate::model::UserType;

pub trait PricingStrategy {
    /// Cost of a trip of `duration_minutes` starting at `start`.
    fn cost(&self, duration_minutes: f64, start: NaiveDateTime) -> f64;
}

/// Per-minute rate with a minimum charge.
pub struct CasualPricing;

impl CasualPricing {
    pub const PER_MINUTE: f64 = 0.15;
    pub const MINIMUM_CHARGE: f64 = 1.00;
}

impl PricingStrategy for CasualPricing {
    fn cost(&self, duration_minutes: f64, _start: NaiveDateTime) -> f64 {
        (Self::PER_MINUTE * duration_minutes).max(Self::MINIMUM_CHARGE)
    }
}

/// Discounted per-minute rate, no minimum.
pub struct MemberPricing;

impl MemberPricing {
    pub const PER_MINUTE: f64 = 0.08;
}

impl PricingStrategy for MemberPricing {
    fn cost(&self, duration_minutes: f64, _start: NaiveDateTime) -> f64 {
        Self::PER_MINUTE * duration_minutes
    }
}

/// A [`PricingStrategy`] wrapper that applies a surcharge multiplier when
/// the trip starts inside the peak window, deferring to the wrapped base
/// strategy otherwise.
pub struct PeakHourPricing<S> {
    pub base: S,
    pub window: PeakWindow,
    pub multiplier: f64,
}

impl<S> PeakHourPricing<S> {
    pub const DEFAULT_MULTIPLIER: f64 = 1.5;

    pub fn new(base: S, window: PeakWindow) -> Self {
        Self {
            base,
            window,
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }
}

impl<S: PricingStrategy> PricingStrategy for PeakHourPricing<S> {
    fn cost(&self, duration_minutes: f64, start: NaiveDateTime) -> f64 {
        let base_cost = self.base.cost(duration_minutes, start);
        if self.window.contains(start) {
            base_cost * self.multiplier
        } else {
            base_cost
        }
    }
}

/// Selects the strategy for a rider: member vs casual base rate, with the
/// peak-hour surcharge layered on top.
pub fn strategy_for(user_type: UserType, window: &PeakWindow) -> Box<dyn PricingStrategy> {
    match user_type {
        UserType::Casual => Box::new(PeakHourPricing::new(CasualPricing, window.clone())),
        UserType::Member => Box::new(PeakHourPricing::new(MemberPricing, window.clone())),
    }
}
