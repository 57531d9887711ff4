//! Gap repair for nullable, time-indexed series.

use chrono::{DateTime, Utc};

/// Time-weighted linear interpolation over interior null runs of at most `max_gap` rows.
///
/// A run is only bridged when it has a known value on both sides; longer runs and
/// runs touching either end of the series are left untouched.
pub fn interpolate_short_gaps(index: &[DateTime<Utc>], values: &mut [Option<f64>], max_gap: usize) {
    debug_assert_eq!(index.len(), values.len());
    let mut last_known: Option<usize> = None;
    let mut i = 0;

    while i < values.len() {
        if values[i].is_some() {
            last_known = Some(i);
            i += 1;
            continue;
        }

        let run_start = i;
        while i < values.len() && values[i].is_none() {
            i += 1;
        }
        let run_len = i - run_start;

        let (Some(left), true) = (last_known, i < values.len()) else {
            continue;
        };
        if run_len > max_gap {
            continue;
        }

        let right = i;
        let (Some(y0), Some(y1)) = (values[left], values[right]) else {
            continue;
        };
        let t0 = index[left].timestamp_millis() as f64;
        let span = index[right].timestamp_millis() as f64 - t0;
        for k in run_start..right {
            let u = if span > 0.0 {
                (index[k].timestamp_millis() as f64 - t0) / span
            } else {
                0.0
            };
            values[k] = Some(y0 + u * (y1 - y0));
        }
    }
}

/// Carry the last known value forward through null runs.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }
}

/// Carry the next known value backward through null runs.
pub fn backward_fill(values: &mut [Option<f64>]) {
    let mut next = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn minutes(n: usize) -> Vec<DateTime<Utc>> {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| t0 + Duration::minutes(i as i64)).collect()
    }

    #[test]
    fn bridges_gap_at_limit() {
        let index = minutes(7);
        let mut values = vec![Some(0.0), None, None, None, None, None, Some(6.0)];
        interpolate_short_gaps(&index, &mut values, 5);
        let expected: Vec<Option<f64>> = (0..7).map(|i| Some(i as f64)).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn leaves_gap_over_limit_untouched() {
        let index = minutes(8);
        let mut values = vec![Some(0.0), None, None, None, None, None, None, Some(7.0)];
        interpolate_short_gaps(&index, &mut values, 5);
        assert!(values[1..7].iter().all(Option::is_none));
    }

    #[test]
    fn weights_by_elapsed_time() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let index = vec![t0, t0 + Duration::minutes(1), t0 + Duration::minutes(4)];
        let mut values = vec![Some(0.0), None, Some(8.0)];
        interpolate_short_gaps(&index, &mut values, 5);
        assert_eq!(values[1], Some(2.0));
    }

    #[test]
    fn edges_are_not_extrapolated() {
        let index = minutes(4);
        let mut values = vec![None, Some(1.0), Some(2.0), None];
        interpolate_short_gaps(&index, &mut values, 5);
        assert_eq!(values, vec![None, Some(1.0), Some(2.0), None]);
    }

    #[test]
    fn fills_cover_both_directions() {
        let mut values = vec![None, Some(1.0), None, Some(3.0), None];
        forward_fill(&mut values);
        assert_eq!(values, vec![None, Some(1.0), Some(1.0), Some(3.0), Some(3.0)]);
        backward_fill(&mut values);
        assert_eq!(values[0], Some(1.0));
    }
}
