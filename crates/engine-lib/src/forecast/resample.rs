//! Calendar bucketing of demand history

use crate::models::{DemandPoint, ForecastGranularity};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;

/// Date a point is summed into for the given granularity
///
/// Weekly buckets are labelled by the Sunday that closes the week.
pub fn bucket_date(date: NaiveDate, granularity: ForecastGranularity) -> NaiveDate {
    match granularity {
        ForecastGranularity::Daily => date,
        ForecastGranularity::Weekly => {
            let to_sunday = 6 - date.weekday().num_days_from_monday();
            date.checked_add_days(Days::new(to_sunday as u64))
                .unwrap_or(date)
        }
    }
}

fn bucket_step(granularity: ForecastGranularity) -> Days {
    match granularity {
        ForecastGranularity::Daily => Days::new(1),
        ForecastGranularity::Weekly => Days::new(7),
    }
}

/// Sum quantities per bucket, ascending and gap-free
///
/// Buckets between the first and last observation that received no data are
/// reported with a zero quantity.
pub fn resample(history: &[DemandPoint], granularity: ForecastGranularity) -> Vec<(NaiveDate, f64)> {
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for point in history {
        *sums.entry(bucket_date(point.date, granularity)).or_insert(0.0) += point.quantity;
    }

    let (Some(&first), Some(&last)) = (sums.keys().next(), sums.keys().next_back()) else {
        return Vec::new();
    };

    let step = bucket_step(granularity);
    let mut series = Vec::new();
    let mut cursor = first;
    loop {
        series.push((cursor, sums.get(&cursor).copied().unwrap_or(0.0)));
        if cursor >= last {
            break;
        }
        match cursor.checked_add_days(step) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    series
}
