//! Derived-value calculators: listing expiration dates and adjusted prices.
//!
//! Both calculators are pure and deterministic. `now` is injected rather
//! than read from a global clock, and pricing policy is passed in at call
//! time — the engine never caches a policy across steps, because policy can
//! change while the user is filling the form.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Longest a listing may stay visible, regardless of what was requested.
///
/// Platform policy, not a validation rule: longer requests are capped
/// silently rather than rejected.
pub const MAX_LISTING_DAYS: i64 = 28;

/// Listing duration codes offered by the platform.
///
/// Serde names match the wire codes (`"3_days"`, `"2_weeks"`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationCode {
    #[serde(rename = "3_days")]
    ThreeDays,
    #[default]
    #[serde(rename = "7_days")]
    SevenDays,
    #[serde(rename = "2_weeks")]
    TwoWeeks,
    #[serde(rename = "3_weeks")]
    ThreeWeeks,
    #[serde(rename = "4_weeks")]
    FourWeeks,
}

impl DurationCode {
    /// Parse a wire code.
    ///
    /// Unknown codes fall back to [`DurationCode::SevenDays`] rather than
    /// failing — a stale client sending a retired code still gets a listing.
    pub fn parse(code: &str) -> Self {
        match code {
            "3_days" => DurationCode::ThreeDays,
            "7_days" => DurationCode::SevenDays,
            "2_weeks" => DurationCode::TwoWeeks,
            "3_weeks" => DurationCode::ThreeWeeks,
            "4_weeks" => DurationCode::FourWeeks,
            _ => DurationCode::SevenDays,
        }
    }

    /// Exact day count for this code.
    pub fn days(self) -> i64 {
        match self {
            DurationCode::ThreeDays => 3,
            DurationCode::SevenDays => 7,
            DurationCode::TwoWeeks => 14,
            DurationCode::ThreeWeeks => 21,
            DurationCode::FourWeeks => 28,
        }
    }

    /// The wire code for this duration.
    pub fn as_str(self) -> &'static str {
        match self {
            DurationCode::ThreeDays => "3_days",
            DurationCode::SevenDays => "7_days",
            DurationCode::TwoWeeks => "2_weeks",
            DurationCode::ThreeWeeks => "3_weeks",
            DurationCode::FourWeeks => "4_weeks",
        }
    }
}

impl std::fmt::Display for DurationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute when a listing with the given duration code expires.
pub fn compute_expiration(code: DurationCode, now: OffsetDateTime) -> OffsetDateTime {
    expiration_after_days(code.days(), now)
}

/// Compute an expiration a number of days from `now`, capped at
/// [`MAX_LISTING_DAYS`].
pub fn expiration_after_days(days: i64, now: OffsetDateTime) -> OffsetDateTime {
    now + time::Duration::days(days.clamp(0, MAX_LISTING_DAYS))
}

/// Per-option price override from external configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOverride {
    pub price: f64,
    /// Why the override exists, for display ("launch promotion", ...).
    #[serde(default)]
    pub reason: Option<String>,
}

/// Pricing policy supplied by external configuration.
///
/// Fetched by the caller and passed into [`compute_price`] on every use;
/// see the module docs on why it is never cached here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// When set, every option is free unless an explicit override applies.
    #[serde(default)]
    pub free_by_default: bool,
    /// Per-option price overrides keyed by option id.
    #[serde(default)]
    pub overrides: HashMap<String, PriceOverride>,
}

/// Price derived for a single option under the current policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedPricing {
    pub base_price: f64,
    pub override_price: Option<f64>,
    pub final_price: f64,
    pub was_overridden: bool,
    pub override_reason: Option<String>,
}

/// Compute the price for an option under the given policy.
///
/// Exactly one rule fires, in precedence order:
///
/// 1. an explicit per-option override,
/// 2. the global free-by-default flag,
/// 3. the raw base price.
pub fn compute_price(option_id: &str, base_price: f64, policy: &PricingPolicy) -> DerivedPricing {
    if let Some(over) = policy.overrides.get(option_id) {
        return DerivedPricing {
            base_price,
            override_price: Some(over.price),
            final_price: over.price,
            was_overridden: true,
            override_reason: over.reason.clone(),
        };
    }

    if policy.free_by_default {
        return DerivedPricing {
            base_price,
            override_price: Some(0.0),
            final_price: 0.0,
            was_overridden: true,
            override_reason: None,
        };
    }

    DerivedPricing {
        base_price,
        override_price: None,
        final_price: base_price,
        was_overridden: false,
        override_reason: None,
    }
}
