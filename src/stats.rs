// Numeric helpers shared by the dataset summary and the statistics phase

use std::collections::HashSet;

/// Upper bound on the Freedman-Diaconis bin count before Sturges takes over
pub const MAX_HISTOGRAM_BINS: usize = 1000;

/// Linear-interpolated percentile of already sorted data, `p` in [0, 1]
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return f64::NAN; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Mean and sample standard deviation (ddof = 1). NaN where undefined.
pub fn mean_std(data: &[f64]) -> (f64, f64) {
    let n = data.len() as f64;
    if data.is_empty() { return (f64::NAN, f64::NAN); }

    let mean = data.iter().sum::<f64>() / n;
    if data.len() < 2 { return (mean, f64::NAN); }

    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

/// Pearson correlation over the rows where both values are present
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x.iter().zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .collect();

    if pairs.len() < 2 { return f64::NAN; }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for &(a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 { return f64::NAN; }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Bin edges using the "auto" rule: the smaller width of Sturges and
/// Freedman-Diaconis, falling back to Sturges when the IQR is zero or
/// the Freedman-Diaconis count exceeds [`MAX_HISTOGRAM_BINS`].
pub fn histogram_edges(sorted_data: &[f64]) -> Vec<f64> {
    let n = sorted_data.len();
    if n == 0 { return vec![]; }

    let min = sorted_data[0];
    let max = sorted_data[n - 1];
    let range = max - min;
    if range == 0.0 {
        return vec![min - 0.5, max + 0.5];
    }
    if !range.is_finite() {
        return vec![min, max];
    }

    let sturges_bins = ((n as f64).log2() + 1.0).ceil().max(1.0);
    let iqr = percentile(sorted_data, 0.75) - percentile(sorted_data, 0.25);
    let fd = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);
    let fd_bins = if fd > 0.0 { (range / fd).ceil() } else { 0.0 };

    // Smaller width means more bins
    let bins = if fd_bins > sturges_bins && fd_bins <= MAX_HISTOGRAM_BINS as f64 {
        fd_bins as usize
    } else {
        sturges_bins as usize
    };
    let step = range / bins as f64;
    (0..=bins).map(|i| if i == bins { max } else { min + i as f64 * step }).collect()
}

/// Count of values per bin. The last bin is closed on the right.
pub fn histogram_counts(data: &[f64], edges: &[f64]) -> Vec<usize> {
    if edges.len() < 2 { return vec![]; }
    let bins = edges.len() - 1;
    let first = edges[0];
    let last = edges[bins];
    let width = (last - first) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in data {
        if v.is_nan() || v < first || v > last { continue; }
        let idx = (((v - first) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Scott's rule of thumb for bandwidth selection
pub fn scott_bandwidth(data: &[f64]) -> f64 {
    let (_, std) = mean_std(data);
    std * (data.len() as f64).powf(-0.2)
}

/// Gaussian kernel function
fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE evaluated on `grid_points` evenly spaced points between
/// `lo` and `hi`. Returns (grid, density) with density integrating to 1.
pub fn kde(data: &[f64], bandwidth: f64, lo: f64, hi: f64, grid_points: usize) -> (Vec<f64>, Vec<f64>) {
    let n = data.len() as f64;
    if data.is_empty() || grid_points < 2 || !(bandwidth > 0.0) {
        return (vec![], vec![]);
    }

    let step = (hi - lo) / (grid_points - 1) as f64;
    let mut grid = Vec::with_capacity(grid_points);
    let mut density = Vec::with_capacity(grid_points);

    for i in 0..grid_points {
        let x = if i == grid_points - 1 { hi } else { lo + i as f64 * step };
        let d: f64 = data.iter().map(|&xi| gaussian_kernel((x - xi) / bandwidth)).sum();
        grid.push(x);
        density.push(d / (n * bandwidth));
    }

    (grid, density)
}

/// Distinct category labels in first-appearance order, sorted numerically
/// when every label is a number.
pub fn category_order(keys: &[Option<String>]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut order: Vec<String> = Vec::new();
    for key in keys.iter().flatten() {
        if seen.insert(key.as_str()) {
            order.push(key.clone());
        }
    }

    let numeric: Option<Vec<f64>> = order.iter().map(|s| s.trim().parse::<f64>().ok()).collect();
    if let Some(nums) = numeric {
        let mut paired: Vec<(f64, String)> = nums.into_iter().zip(order).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));
        order = paired.into_iter().map(|(_, s)| s).collect();
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percentile_linear() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&data, 0.5), 2.5);
        assert_relative_eq!(percentile(&data, 0.25), 1.75);
        assert_eq!(percentile(&data, 1.0), 4.0);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_pairwise_complete() {
        let x = [1.0, 2.0, f64::NAN, 3.0];
        let y = [1.0, 2.0, 100.0, 3.0];
        assert_relative_eq!(pearson(&x, &y), 1.0, epsilon = 1e-12);
        assert!(pearson(&[1.0], &[2.0]).is_nan());
    }

    #[test]
    fn test_histogram_edges_cover_range() {
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let edges = histogram_edges(&data);
        assert_eq!(edges[0], 0.0);
        assert_eq!(*edges.last().unwrap(), 99.0);
        // Sturges gives 8 bins for n=100, FD gives 5; the smaller width wins
        assert_eq!(edges.len() - 1, 8);
        let counts = histogram_counts(&data, &edges);
        assert_eq!(counts.iter().sum::<usize>(), 100);
    }

    #[test]
    fn test_histogram_single_value() {
        let edges = histogram_edges(&[3.0, 3.0]);
        assert_eq!(edges, vec![2.5, 3.5]);
        assert_eq!(histogram_counts(&[3.0, 3.0], &edges), vec![2]);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let data = [0.0, 1.0, 1.5, 2.0, 4.0];
        let h = scott_bandwidth(&data);
        let (grid, density) = kde(&data, h, -10.0, 14.0, 400);
        let step = grid[1] - grid[0];
        let area: f64 = density.iter().sum::<f64>() * step;
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_category_order() {
        let keys = vec![Some("b".to_string()), None, Some("a".to_string()), Some("b".to_string())];
        assert_eq!(category_order(&keys), vec!["b", "a"]);

        let nums = vec![Some("10".to_string()), Some("2".to_string())];
        assert_eq!(category_order(&nums), vec!["2", "10"]);
    }

    #[test]
    fn test_category_order_many_distinct_labels() {
        let keys: Vec<Option<String>> = (0..50_000)
            .map(|i| Some(format!("id{}", i % 40_000)))
            .collect();
        let order = category_order(&keys);
        assert_eq!(order.len(), 40_000);
        assert_eq!(order[0], "id0");
        assert_eq!(order[39_999], "id39999");
    }

    #[test]
    fn test_histogram_edges_with_outlier_stay_bounded() {
        let mut data: Vec<f64> = (1..=1000).map(|i| i as f64).collect();
        data.push(1e12);
        let edges = histogram_edges(&data);

        let bins = edges.len() - 1;
        assert!(bins >= 1 && bins <= MAX_HISTOGRAM_BINS);
        // Sturges: ceil(log2(1001) + 1) = 11
        assert_eq!(bins, 11);
        assert_eq!(edges[0], 1.0);
        assert_eq!(*edges.last().unwrap(), 1e12);
        assert_eq!(histogram_counts(&data, &edges).iter().sum::<usize>(), 1001);
    }
}
