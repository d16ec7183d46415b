use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::ir::{AxisData, Bar, BoxStats, ChartKind, Marks, RenderData, RenderPlan, Series};
use crate::stats;

const BAR_WIDTH: f64 = 0.8;
const KDE_GRID_POINTS: usize = 200;

/// Main entry point: apply the chart kind's statistics to a render plan
pub fn apply_statistics(plan: &RenderPlan) -> Result<RenderData> {
    match plan.kind {
        ChartKind::Scatter => {
            let (x, y) = both_series(plan)?;
            Ok(compute_scatter(x, y))
        }
        ChartKind::Line => {
            let (x, y) = both_series(plan)?;
            Ok(compute_line(x, y))
        }
        ChartKind::Bar => {
            let (x, y) = both_series(plan)?;
            Ok(compute_bar(x, y))
        }
        ChartKind::Boxplot => {
            let (x, y) = both_series(plan)?;
            Ok(compute_boxplot(x, y))
        }
        ChartKind::Histogram => {
            let x = plan.primary.as_ref()
                .ok_or_else(|| anyhow!("histogram plan has no value series"))?;
            Ok(compute_histogram(x))
        }
        ChartKind::Heatmap => {
            let matrix = plan.matrix.clone()
                .ok_or_else(|| anyhow!("heatmap plan has no correlation matrix"))?;
            let labels = matrix.columns.clone();
            Ok(RenderData {
                x_axis: AxisData::Categorical(labels.clone()),
                y_axis: AxisData::Categorical(labels),
                marks: Marks::Cells(matrix),
            })
        }
    }
}

fn both_series(plan: &RenderPlan) -> Result<(&Series, &Series)> {
    let x = plan.primary.as_ref().ok_or_else(|| anyhow!("{} plan has no x series", plan.kind))?;
    let y = plan.secondary.as_ref().ok_or_else(|| anyhow!("{} plan has no y series", plan.kind))?;
    Ok((x, y))
}

/// Positions of one series along an axis. Numeric series are continuous;
/// anything else is placed at the index of its category.
struct Positions {
    axis: AxisData,
    values: Vec<f64>,
}

fn positions(series: &Series) -> Positions {
    match series.numeric() {
        Some(values) => Positions {
            axis: AxisData::Continuous,
            values: values.to_vec(),
        },
        None => categorical_positions(series),
    }
}

fn categorical_positions(series: &Series) -> Positions {
    let keys = series.category_keys();
    let order = stats::category_order(&keys);
    let index: HashMap<&str, f64> = order.iter().enumerate().map(|(i, c)| (c.as_str(), i as f64)).collect();

    let values = keys
        .iter()
        .map(|k| k.as_deref().and_then(|k| index.get(k).copied()).unwrap_or(f64::NAN))
        .collect();

    Positions {
        axis: AxisData::Categorical(order),
        values,
    }
}

fn compute_scatter(x: &Series, y: &Series) -> RenderData {
    let px = positions(x);
    let py = positions(y);

    let points = px.values.iter().zip(&py.values)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .collect();

    RenderData {
        x_axis: px.axis,
        y_axis: py.axis,
        marks: Marks::Points(points),
    }
}

/// Mean of y per distinct x, in order of first appearance
fn mean_by_position(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    let mut order: Vec<u64> = Vec::new();
    let mut sums: HashMap<u64, (f64, f64, usize)> = HashMap::new();

    for (&a, &b) in x.iter().zip(y) {
        if a.is_nan() || b.is_nan() { continue; }
        // -0 and 0 are the same position
        let a = if a == 0.0 { 0.0 } else { a };
        let key = a.to_bits();
        let entry = sums.entry(key).or_insert_with(|| {
            order.push(key);
            (a, 0.0, 0)
        });
        entry.1 += b;
        entry.2 += 1;
    }

    order.into_iter()
        .map(|k| {
            let (a, sum, n) = sums[&k];
            (a, sum / n as f64)
        })
        .collect()
}

fn compute_line(x: &Series, y: &Series) -> RenderData {
    let px = positions(x);
    let py = positions(y);
    let points = mean_by_position(&px.values, &py.values);

    RenderData {
        x_axis: px.axis,
        y_axis: py.axis,
        marks: Marks::Path(points),
    }
}

fn compute_bar(x: &Series, y: &Series) -> RenderData {
    let px = categorical_positions(x);
    let values = y.as_numbers();
    let means = mean_by_position(&px.values, &values);

    let mut bars: Vec<Bar> = means.into_iter()
        .map(|(center, height)| Bar { center, width: BAR_WIDTH, height })
        .collect();
    bars.sort_by(|a, b| a.center.total_cmp(&b.center));

    RenderData {
        x_axis: px.axis,
        y_axis: AxisData::Continuous,
        marks: Marks::Bars { bars, overlay: Vec::new() },
    }
}

fn compute_boxplot(x: &Series, y: &Series) -> RenderData {
    let px = categorical_positions(x);
    let values = y.as_numbers();

    let mut groups: HashMap<u64, Vec<f64>> = HashMap::new();
    for (&pos, &v) in px.values.iter().zip(&values) {
        if pos.is_nan() || v.is_nan() { continue; }
        groups.entry(pos.to_bits()).or_default().push(v);
    }

    let n_categories = match &px.axis {
        AxisData::Categorical(c) => c.len(),
        AxisData::Continuous => 0,
    };

    let mut boxes = Vec::new();
    for idx in 0..n_categories {
        let x_pos = idx as f64;
        let Some(ys) = groups.get_mut(&x_pos.to_bits()) else { continue };
        ys.sort_by(f64::total_cmp);
        boxes.push(box_stats(x_pos, ys));
    }

    RenderData {
        x_axis: px.axis,
        y_axis: AxisData::Continuous,
        marks: Marks::Boxes(boxes),
    }
}

/// Quartiles, 1.5 IQR whiskers and outliers of already sorted values
fn box_stats(x: f64, ys: &[f64]) -> BoxStats {
    let q1 = stats::percentile(ys, 0.25);
    let median = stats::percentile(ys, 0.50);
    let q3 = stats::percentile(ys, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // Whiskers: Range of data within fences
    let lower_whisker = ys.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);

    let outliers = ys.iter().copied().filter(|&v| v < lower_fence || v > upper_fence).collect();

    BoxStats { x, lower_whisker, q1, median, q3, upper_whisker, outliers }
}

fn compute_histogram(x: &Series) -> RenderData {
    match x.numeric() {
        Some(values) => numeric_histogram(values),
        None => categorical_histogram(x),
    }
}

fn numeric_histogram(values: &[f64]) -> RenderData {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let edges = stats::histogram_edges(&sorted);
    let counts = stats::histogram_counts(&sorted, &edges);

    let bars: Vec<Bar> = edges.windows(2).zip(&counts)
        .map(|(e, &count)| Bar {
            center: (e[0] + e[1]) / 2.0,
            width: e[1] - e[0],
            height: count as f64,
        })
        .collect();

    let overlay = density_overlay(&sorted, bars.first().map(|b| b.width).unwrap_or(1.0));

    RenderData {
        x_axis: AxisData::Continuous,
        y_axis: AxisData::Continuous,
        marks: Marks::Bars { bars, overlay },
    }
}

/// KDE over the observed range, scaled from density to counts
fn density_overlay(sorted: &[f64], bin_width: f64) -> Vec<(f64, f64)> {
    let n = sorted.len();
    if n < 2 { return Vec::new(); }

    let bandwidth = stats::scott_bandwidth(sorted);
    if !(bandwidth > 0.0) { return Vec::new(); }

    let (grid, density) = stats::kde(sorted, bandwidth, sorted[0], sorted[n - 1], KDE_GRID_POINTS);
    let scale = n as f64 * bin_width;
    grid.into_iter().zip(density).map(|(x, d)| (x, d * scale)).collect()
}

fn categorical_histogram(x: &Series) -> RenderData {
    let px = categorical_positions(x);

    let mut counts: HashMap<u64, usize> = HashMap::new();
    for pos in px.values.iter().filter(|p| !p.is_nan()) {
        *counts.entry(pos.to_bits()).or_default() += 1;
    }

    let mut bars: Vec<Bar> = counts.into_iter()
        .map(|(bits, count)| Bar {
            center: f64::from_bits(bits),
            width: BAR_WIDTH,
            height: count as f64,
        })
        .collect();
    bars.sort_by(|a, b| a.center.total_cmp(&b.center));

    RenderData {
        x_axis: px.axis,
        y_axis: AxisData::Continuous,
        marks: Marks::Bars { bars, overlay: Vec::new() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::ir::ChartRequest;
    use crate::resolve::resolve_chart;
    use approx::assert_relative_eq;

    fn plan(csv: &str, request: ChartRequest) -> RenderPlan {
        let data = Dataset::from_csv_str(csv).unwrap();
        resolve_chart(&request, &data).unwrap()
    }

    #[test]
    fn test_bar_aggregates_by_mean_in_appearance_order() {
        let p = plan("day,sales\nTue,10\nMon,4\nTue,30\n", ChartRequest::new(ChartKind::Bar).x("day").y("sales"));
        let data = apply_statistics(&p).unwrap();

        assert_eq!(data.x_axis, AxisData::Categorical(vec!["Tue".to_string(), "Mon".to_string()]));
        match data.marks {
            Marks::Bars { bars, overlay } => {
                assert_eq!(bars.len(), 2);
                assert_eq!(bars[0].center, 0.0);
                assert_relative_eq!(bars[0].height, 20.0);
                assert_relative_eq!(bars[1].height, 4.0);
                assert!(overlay.is_empty());
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn test_bar_scenario_categories_against_values() {
        let p = plan("day,sales\nMon,10\nTue,20\n", ChartRequest::new(ChartKind::Bar).x("day").y("sales"));
        let data = apply_statistics(&p).unwrap();
        assert_eq!(data.x_axis, AxisData::Categorical(vec!["Mon".to_string(), "Tue".to_string()]));
        if let Marks::Bars { bars, .. } = data.marks {
            let heights: Vec<f64> = bars.iter().map(|b| b.height).collect();
            assert_eq!(heights, vec![10.0, 20.0]);
        } else {
            panic!("expected bars");
        }
    }

    #[test]
    fn test_scatter_keeps_row_order_and_skips_missing() {
        let p = plan("a,b\n3,1\n1,\n2,5\n", ChartRequest::new(ChartKind::Scatter).x("a").y("b"));
        let data = apply_statistics(&p).unwrap();
        assert_eq!(data.x_axis, AxisData::Continuous);
        match data.marks {
            Marks::Points(points) => assert_eq!(points, vec![(3.0, 1.0), (2.0, 5.0)]),
            other => panic!("expected points, got {:?}", other),
        }
    }

    #[test]
    fn test_scatter_categorical_axis() {
        let p = plan("name,v\nb,1\na,2\nb,3\n", ChartRequest::new(ChartKind::Scatter).x("name").y("v"));
        let data = apply_statistics(&p).unwrap();
        assert_eq!(data.x_axis, AxisData::Categorical(vec!["b".to_string(), "a".to_string()]));
        match data.marks {
            Marks::Points(points) => assert_eq!(points, vec![(0.0, 1.0), (1.0, 2.0), (0.0, 3.0)]),
            other => panic!("expected points, got {:?}", other),
        }
    }

    #[test]
    fn test_line_not_resorted_and_duplicates_averaged() {
        let p = plan("t,v\n3,1\n1,2\n3,5\n2,0\n", ChartRequest::new(ChartKind::Line).x("t").y("v"));
        let data = apply_statistics(&p).unwrap();
        match data.marks {
            Marks::Path(points) => assert_eq!(points, vec![(3.0, 3.0), (1.0, 2.0), (2.0, 0.0)]),
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_line_merges_negative_zero() {
        let p = plan("t,v\n-0,1\n1,2\n0,3\n", ChartRequest::new(ChartKind::Line).x("t").y("v"));
        match apply_statistics(&p).unwrap().marks {
            Marks::Path(points) => {
                assert_eq!(points.len(), 2);
                assert_eq!(points[0].0.to_bits(), 0.0f64.to_bits());
                assert_eq!(points[0].1, 2.0);
                assert_eq!(points[1], (1.0, 2.0));
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_boxplot_stats() {
        let csv = "g,v\na,1\na,2\na,3\na,4\na,100\nb,5\n";
        let p = plan(csv, ChartRequest::new(ChartKind::Boxplot).x("g").y("v"));
        let data = apply_statistics(&p).unwrap();
        match data.marks {
            Marks::Boxes(boxes) => {
                assert_eq!(boxes.len(), 2);
                let a = &boxes[0];
                assert_eq!(a.x, 0.0);
                assert_eq!(a.q1, 2.0);
                assert_eq!(a.median, 3.0);
                assert_eq!(a.q3, 4.0);
                assert_eq!(a.lower_whisker, 1.0);
                assert_eq!(a.upper_whisker, 4.0);
                assert_eq!(a.outliers, vec![100.0]);
                assert_eq!(boxes[1].median, 5.0);
            }
            other => panic!("expected boxes, got {:?}", other),
        }
    }

    #[test]
    fn test_boxplot_skips_groups_without_numbers() {
        let p = plan("g,v\na,x\nb,2\n", ChartRequest::new(ChartKind::Boxplot).x("g").y("v"));
        let data = apply_statistics(&p).unwrap();
        match data.marks {
            Marks::Boxes(boxes) => {
                assert_eq!(boxes.len(), 1);
                assert_eq!(boxes[0].x, 1.0);
            }
            other => panic!("expected boxes, got {:?}", other),
        }
    }

    #[test]
    fn test_histogram_counts_and_density() {
        let csv = "v\n1\n2\n2\n3\n3\n3\n4\n4\n5\n";
        let p = plan(csv, ChartRequest::new(ChartKind::Histogram).x("v"));
        let data = apply_statistics(&p).unwrap();
        match data.marks {
            Marks::Bars { bars, overlay } => {
                let total: f64 = bars.iter().map(|b| b.height).sum();
                assert_eq!(total, 9.0);
                assert_eq!(overlay.len(), KDE_GRID_POINTS);
                assert_eq!(overlay[0].0, 1.0);
                assert_eq!(overlay[KDE_GRID_POINTS - 1].0, 5.0);
                assert!(overlay.iter().all(|(_, d)| *d > 0.0));
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn test_histogram_with_outlier_keeps_bins_bounded() {
        let mut csv = String::from("v\n");
        for i in 1..=1000 {
            csv.push_str(&format!("{}\n", i));
        }
        csv.push_str("1e12\n");
        let p = plan(&csv, ChartRequest::new(ChartKind::Histogram).x("v"));
        match apply_statistics(&p).unwrap().marks {
            Marks::Bars { bars, .. } => {
                assert!(bars.len() <= stats::MAX_HISTOGRAM_BINS);
                assert_eq!(bars.iter().map(|b| b.height).sum::<f64>(), 1001.0);
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn test_histogram_constant_column_has_no_density() {
        let p = plan("v\n7\n7\n", ChartRequest::new(ChartKind::Histogram).x("v"));
        match apply_statistics(&p).unwrap().marks {
            Marks::Bars { bars, overlay } => {
                assert_eq!(bars.len(), 1);
                assert_eq!(bars[0].center, 7.0);
                assert_eq!(bars[0].height, 2.0);
                assert!(overlay.is_empty());
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn test_histogram_on_text_counts_categories() {
        let p = plan("c\nx\ny\nx\n", ChartRequest::new(ChartKind::Histogram).x("c"));
        let data = apply_statistics(&p).unwrap();
        assert_eq!(data.x_axis, AxisData::Categorical(vec!["x".to_string(), "y".to_string()]));
        match data.marks {
            Marks::Bars { bars, overlay } => {
                assert_eq!(bars.iter().map(|b| b.height).collect::<Vec<_>>(), vec![2.0, 1.0]);
                assert!(overlay.is_empty());
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn test_heatmap_passthrough() {
        let p = plan("a,b\n1,2\n2,5\n3,4\n", ChartRequest::new(ChartKind::Heatmap));
        let data = apply_statistics(&p).unwrap();
        assert_eq!(data.y_axis, AxisData::Categorical(vec!["a".to_string(), "b".to_string()]));
        assert!(matches!(data.marks, Marks::Cells(ref m) if m.size() == 2));
    }
}
