//! Trailing rolling-window statistics over nullable series.
//!
//! All windows are row-count based and trailing: the value at `i` only sees
//! rows `i + 1 - window ..= i`. Nulls are ignored inside a window and a single
//! non-null sample is enough to produce a value, so the start of a series
//! never yields nulls unless the series itself starts with them.

use std::collections::VecDeque;

/// Rolling median; even-sized samples average the two middle values.
pub fn rolling_median(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut scratch = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            scratch.clear();
            scratch.extend(values[start..=i].iter().flatten().copied());
            median(&mut scratch)
        })
        .collect()
}

/// Rolling minimum using a monotonic deque (O(n)).
pub fn rolling_min(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut deque: VecDeque<(usize, f64)> = VecDeque::new();
    let mut out = Vec::with_capacity(values.len());

    for (i, value) in values.iter().enumerate() {
        if let Some(v) = *value {
            while deque.back().is_some_and(|&(_, b)| b >= v) {
                deque.pop_back();
            }
            deque.push_back((i, v));
        }
        while deque.front().is_some_and(|&(j, _)| j + window <= i) {
            deque.pop_front();
        }
        out.push(deque.front().map(|&(_, v)| v));
    }

    out
}

/// Rolling arithmetic mean using a running sum.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut sum = 0.0;
    let mut count = 0usize;
    let mut out = Vec::with_capacity(values.len());

    for (i, value) in values.iter().enumerate() {
        if let Some(v) = *value {
            sum += v;
            count += 1;
        }
        if i >= window {
            if let Some(old) = values[i - window] {
                sum -= old;
                count -= 1;
            }
        }
        out.push(if count > 0 { Some(sum / count as f64) } else { None });
    }

    out
}

fn median(sample: &mut [f64]) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    sample.sort_by(f64::total_cmp);
    let mid = sample.len() / 2;
    if sample.len() % 2 == 0 {
        Some((sample[mid - 1] + sample[mid]) / 2.0)
    } else {
        Some(sample[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn median_uses_partial_windows_at_start() {
        let out = rolling_median(&some(&[5.0, 1.0, 3.0, 100.0, 2.0]), 3);
        assert_eq!(out, some(&[5.0, 3.0, 3.0, 3.0, 3.0]));
    }

    #[test]
    fn median_skips_nulls() {
        let out = rolling_median(&[None, Some(4.0), None, Some(2.0)], 3);
        assert_eq!(out, vec![None, Some(4.0), Some(4.0), Some(3.0)]);
    }

    #[test]
    fn min_matches_naive_scan() {
        let values = some(&[3.0, 1.0, 4.0, 1.5, 5.0, 9.0, 2.0, 6.0]);
        let out = rolling_min(&values, 3);
        for i in 0..values.len() {
            let start = (i + 1).saturating_sub(3);
            let naive = values[start..=i].iter().flatten().copied().fold(f64::INFINITY, f64::min);
            assert_eq!(out[i], Some(naive), "index {i}");
        }
    }

    #[test]
    fn min_drops_expired_values_even_across_nulls() {
        let out = rolling_min(&[Some(1.0), None, None, Some(5.0)], 2);
        assert_eq!(out, vec![Some(1.0), Some(1.0), None, Some(5.0)]);
    }

    #[test]
    fn mean_is_trailing() {
        let out = rolling_mean(&some(&[2.0, 4.0, 6.0, 8.0]), 2);
        assert_eq!(out, some(&[2.0, 3.0, 5.0, 7.0]));
    }

    #[test]
    fn mean_evicts_values_leaving_the_window_across_nulls() {
        let out = rolling_mean(&[Some(2.0), None, Some(6.0), None, None], 2);
        assert_eq!(out, vec![Some(2.0), Some(2.0), Some(6.0), Some(6.0), None]);
    }
}
