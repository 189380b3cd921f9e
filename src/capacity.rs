use log::warn;

/// Productive hours one agent delivers in a period:
/// `business_days * shift_hours * (1 - shrinkage_rate)`.
///
/// Shrinkage at or above 100 % and non-positive shift lengths yield zero
/// capacity instead of a negative figure. No rounding happens here.
pub fn effective_hours(business_days: u32, shift_hours: f64, shrinkage_rate: f64) -> f64 {
    if !shift_hours.is_finite() || shift_hours <= 0.0 {
        warn!("shift length {shift_hours} is not positive; capacity forced to zero");
        return 0.0;
    }
    if !shrinkage_rate.is_finite() || shrinkage_rate >= 1.0 {
        warn!("shrinkage {shrinkage_rate} leaves no productive time; capacity forced to zero");
        return 0.0;
    }
    let shrinkage = shrinkage_rate.max(0.0);
    f64::from(business_days) * shift_hours * (1.0 - shrinkage)
}

/// Shrinkage once recurring weekly downtime is folded in.
///
/// `minutes_per_work_week` is the paid time the downtime is taken from,
/// usually `shift_hours * 60 * working_days_per_week` (2400 for 8h x 5).
pub fn combined_shrinkage(base_shrinkage: f64, weekly_downtime_minutes: f64, minutes_per_work_week: f64) -> f64 {
    let downtime_share = if minutes_per_work_week > 0.0 {
        weekly_downtime_minutes.max(0.0) / minutes_per_work_week
    } else {
        0.0
    };
    base_shrinkage.max(0.0) + downtime_share
}

pub fn minutes_per_work_week(shift_hours: f64, working_days_per_week: u32) -> f64 {
    if shift_hours <= 0.0 {
        return 0.0;
    }
    shift_hours * 60.0 * f64::from(working_days_per_week)
}
