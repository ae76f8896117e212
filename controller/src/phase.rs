use crate::amount::mul_div;
use crate::state::{Amount, AuctionTiming, AuctionWindow, PriceBounds, PriceCurve, UnixTimestamp};

use std::fmt;
use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;

/// Remaining time split into whole units, truncated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Countdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl From<Duration> for Countdown {
    fn from(remaining: Duration) -> Self {
        let total = remaining.as_secs();
        Self {
            days: total / SECONDS_PER_DAY,
            hours: total % SECONDS_PER_DAY / SECONDS_PER_HOUR,
            minutes: total % SECONDS_PER_HOUR / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    Active,
    Ended,
}

/// Phase of the auction together with its price bounds.
///
/// The bounds resolve independently of the timing: a missing raised total or
/// curve leaves them `None` without affecting the stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuctionPhase {
    pub stage: Stage,
    pub timing: AuctionTiming,
    pub bounds: Option<PriceBounds>,
}

pub fn resolve_timing(now: UnixTimestamp, window: &AuctionWindow) -> AuctionTiming {
    let has_started = now >= window.start_time();
    let has_ended = now >= window.end_time();
    let remaining = if has_ended {
        Duration::ZERO
    } else {
        Duration::from_secs(window.end_time().abs_diff(now))
    };
    AuctionTiming {
        has_started,
        has_ended,
        remaining,
    }
}

/// Derives the price bounds from the curve and the current raised total.
///
/// The token price rises once the raise exceeds the floor: it is the larger
/// of `raised` and `min_raise` divided by the distributed project tokens.
/// Returns `None` only for a degenerate curve.
pub fn resolve_price(
    raised: Amount,
    curve: &PriceCurve,
    project_decimals: u8,
) -> Option<PriceBounds> {
    if curve.max_project_tokens == 0 || curve.min_raise > curve.max_raise {
        return None;
    }
    let token_price = 10_u128
        .checked_pow(project_decimals as u32)
        .and_then(|unit| mul_div(raised.max(curve.min_raise), unit, curve.max_project_tokens));
    Some(PriceBounds {
        min_raise: curve.min_raise,
        max_raise: curve.max_raise,
        token_price,
    })
}

/// Project tokens a `contribution` receives out of a total raise of
/// `raised`. Below the floor raise only a proportional part of the project
/// tokens is distributed.
pub fn estimate_allocation(contribution: Amount, raised: Amount, curve: &PriceCurve) -> Option<Amount> {
    if raised == 0 {
        return Some(0);
    }
    let distributed = if curve.min_raise == 0 {
        curve.max_project_tokens
    } else {
        mul_div(raised.min(curve.min_raise), curve.max_project_tokens, curve.min_raise)?
    };
    mul_div(contribution, distributed, raised)
}

/// Combines the clock, the auction window and the price inputs. Returns
/// `None` while the window is unresolved.
pub fn resolve(
    now: UnixTimestamp,
    window: Option<&AuctionWindow>,
    raised: Option<Amount>,
    curve: Option<&PriceCurve>,
    project_decimals: Option<u8>,
) -> Option<AuctionPhase> {
    let timing = resolve_timing(now, window?);
    let stage = if timing.has_ended {
        Stage::Ended
    } else if timing.has_started {
        Stage::Active
    } else {
        Stage::NotStarted
    };
    let bounds = match (raised, curve, project_decimals) {
        (Some(raised), Some(curve), Some(decimals)) => resolve_price(raised, curve, decimals),
        _ => None,
    };
    Some(AuctionPhase {
        stage,
        timing,
        bounds,
    })
}
