//! Spoilage probability curve

use super::ExpiryFault;
use crate::models::SpoilageDataPoint;
use crate::stats::round_to;
use chrono::{Days, NaiveDate};

/// Days past the predicted expiry covered by the curve
pub const CURVE_TAIL_DAYS: i64 = 2;

/// Share of the shelf life during which spoilage stays negligible
const LOW_RISK_SHARE: f64 = 0.7;

/// Probability of spoilage `days` after purchase for a shelf life of `shelf_life` days
pub fn spoilage_probability(days: i64, shelf_life: i64) -> f64 {
    let d = days as f64;
    let l = shelf_life as f64;

    if days < 0 {
        0.0
    } else if d <= l * LOW_RISK_SHARE {
        let ramp = l * LOW_RISK_SHARE;
        if ramp > 0.0 {
            0.01 * (d / ramp)
        } else {
            0.0
        }
    } else if days <= shelf_life {
        let remaining = l - d;
        let total_remaining = l * (1.0 - LOW_RISK_SHARE);
        0.1 + 0.4 * (1.0 - remaining / total_remaining)
    } else {
        let days_past = d - l;
        (0.5 + 0.45 * (days_past / 3.0).min(1.0)).min(0.95)
    }
}

/// Build the day-by-day curve from purchase through expiry plus the tail
pub fn build_curve(
    purchase_date: NaiveDate,
    shelf_life_days: i64,
) -> Result<Vec<SpoilageDataPoint>, ExpiryFault> {
    let last_offset = shelf_life_days + CURVE_TAIL_DAYS;
    let mut curve = Vec::with_capacity((last_offset + 1).max(1) as usize);

    for offset in 0..=last_offset {
        let date = purchase_date
            .checked_add_days(Days::new(offset as u64))
            .ok_or(ExpiryFault::DateOutOfRange)?;
        curve.push(SpoilageDataPoint {
            date,
            prob_spoiled: round_to(spoilage_probability(offset, shelf_life_days), 3),
        });
    }

    verify_curve(&curve)?;
    Ok(curve)
}

/// Check ordering invariants before a curve leaves the predictor
pub fn verify_curve(curve: &[SpoilageDataPoint]) -> Result<(), ExpiryFault> {
    let first = curve.first().ok_or(ExpiryFault::EmptyCurve)?;
    if first.prob_spoiled != 0.0 {
        return Err(ExpiryFault::CurveNotMonotonic { index: 0 });
    }

    for (index, pair) in curve.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.date <= prev.date || next.prob_spoiled < prev.prob_spoiled {
            return Err(ExpiryFault::CurveNotMonotonic { index: index + 1 });
        }
        if !(0.0..=1.0).contains(&next.prob_spoiled) {
            return Err(ExpiryFault::CurveNotMonotonic { index: index + 1 });
        }
    }
    Ok(())
}
