use serde::{Deserialize, Serialize};

/// One equal-width histogram bin covering `[x0, x1)`; the last bin is closed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub x0: f64,
    pub x1: f64,
    pub count: usize,
}

/// Bin `values` into `bins` equal-width buckets over `domain`.
/// Values outside the domain are not counted.
pub fn histogram(values: &[f64], domain: [f64; 2], bins: usize) -> Vec<HistogramBin> {
    let [lo, hi] = domain;
    if bins == 0 || !(hi > lo) {
        return Vec::new();
    }

    let width = (hi - lo) / bins as f64;
    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            x0: lo + width * i as f64,
            x1: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for &v in values {
        if !(v >= lo && v <= hi) {
            continue;
        }
        let bucket = (((v - lo) / width) as usize).min(bins - 1);
        result[bucket].count += 1;
    }

    result
}
