use crate::ir::{AxisData, Marks, PanelScales, RenderData, Scale};

/// Build the x and y scales for a chart
pub fn build_scales(data: &RenderData) -> PanelScales {
    let (x_mm, y_mm) = calculate_min_max(&data.marks);

    let x = build_axis_scale(&data.x_axis, x_mm, false);
    // Grids list their first row at the top
    let flip_y = matches!(data.marks, Marks::Cells(_));
    let y = build_axis_scale(&data.y_axis, y_mm, flip_y);

    PanelScales { x, y }
}

fn build_axis_scale(axis: &AxisData, mm: MinMax, reverse_categories: bool) -> Scale {
    match axis {
        AxisData::Categorical(categories) => {
            let n = categories.len() as f64;
            let mut categories = categories.clone();
            if reverse_categories {
                categories.reverse();
            }
            Scale {
                domain: (0.0, n),
                range: if n > 0.0 { (-0.5, n - 0.5) } else { (-0.5, 0.5) },
                is_categorical: true,
                categories,
            }
        }
        AxisData::Continuous => {
            let (min, max) = pad_range(mm.min, mm.max);
            Scale {
                domain: (min, max),
                range: (min, max),
                is_categorical: false,
                categories: Vec::new(),
            }
        }
    }
}

#[derive(Debug, Clone)]
struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    fn empty() -> Self {
        Self { min: f64::INFINITY, max: f64::NEG_INFINITY }
    }

    fn include(&mut self, val: f64) {
        if !val.is_finite() { return; }
        if val < self.min { self.min = val; }
        if val > self.max { self.max = val; }
    }

    fn or_unit(self) -> Self {
        // Handle empty case
        if self.min > self.max { Self { min: 0.0, max: 1.0 } } else { self }
    }
}

fn calculate_min_max(marks: &Marks) -> (MinMax, MinMax) {
    let mut x = MinMax::empty();
    let mut y = MinMax::empty();

    match marks {
        Marks::Points(points) | Marks::Path(points) => {
            for &(px, py) in points {
                x.include(px);
                y.include(py);
            }
        }
        Marks::Bars { bars, overlay } => {
            // Bar charts always include 0
            y.include(0.0);
            for bar in bars {
                x.include(bar.center - bar.width / 2.0);
                x.include(bar.center + bar.width / 2.0);
                y.include(bar.height);
            }
            for &(px, py) in overlay {
                x.include(px);
                y.include(py);
            }
        }
        Marks::Boxes(boxes) => {
            for b in boxes {
                x.include(b.x);
                y.include(b.lower_whisker);
                y.include(b.upper_whisker);
                for &o in &b.outliers {
                    y.include(o);
                }
            }
        }
        Marks::Cells(_) => {}
    }

    (x.or_unit(), y.or_unit())
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Bar, CorrelationMatrix};

    fn make_render_data(x: Vec<f64>, y: Vec<f64>) -> RenderData {
        RenderData {
            x_axis: AxisData::Continuous,
            y_axis: AxisData::Continuous,
            marks: Marks::Points(x.into_iter().zip(y).collect()),
        }
    }

    #[test]
    fn test_scale_continuous() {
        let data = make_render_data(vec![0.0, 10.0], vec![0.0, 100.0]);
        let panel = build_scales(&data);

        // Check padding
        assert!(panel.x.domain.0 < 0.0);
        assert!(panel.x.domain.1 > 10.0);
        assert!(!panel.x.is_categorical);
    }

    #[test]
    fn test_scale_single_point() {
        let data = make_render_data(vec![5.0], vec![5.0]);
        let panel = build_scales(&data);
        assert_eq!(panel.x.domain.0, 4.0);
        assert_eq!(panel.x.domain.1, 6.0);
    }

    #[test]
    fn test_scale_empty_marks() {
        let data = make_render_data(vec![], vec![]);
        let panel = build_scales(&data);
        assert!(panel.x.domain.0 < 0.0);
        assert!(panel.x.domain.1 > 1.0);
    }

    #[test]
    fn test_scale_categorical() {
        let mut data = make_render_data(vec![0.0, 1.0], vec![10.0, 20.0]);
        data.x_axis = AxisData::Categorical(vec!["A".to_string(), "B".to_string()]);
        let panel = build_scales(&data);

        assert!(panel.x.is_categorical);
        assert_eq!(panel.x.categories, vec!["A", "B"]);
        assert_eq!(panel.x.range, (-0.5, 1.5));
    }

    #[test]
    fn test_scale_bars_include_zero() {
        let data = RenderData {
            x_axis: AxisData::Categorical(vec!["A".to_string()]),
            y_axis: AxisData::Continuous,
            marks: Marks::Bars {
                bars: vec![Bar { center: 0.0, width: 0.8, height: 50.0 }],
                overlay: vec![],
            },
        };
        let panel = build_scales(&data);
        assert!(panel.y.domain.0 < 0.0);
        assert!(panel.y.domain.1 > 50.0);
    }

    #[test]
    fn test_scale_heatmap_rows_top_down() {
        let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let data = RenderData {
            x_axis: AxisData::Categorical(columns.clone()),
            y_axis: AxisData::Categorical(columns.clone()),
            marks: Marks::Cells(CorrelationMatrix { columns, values: vec![1.0; 9] }),
        };
        let panel = build_scales(&data);
        assert_eq!(panel.x.categories, vec!["a", "b", "c"]);
        assert_eq!(panel.y.categories, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_scale_empty_categories() {
        let data = RenderData {
            x_axis: AxisData::Categorical(vec![]),
            y_axis: AxisData::Categorical(vec![]),
            marks: Marks::Cells(CorrelationMatrix { columns: vec![], values: vec![] }),
        };
        let panel = build_scales(&data);
        assert_eq!(panel.x.range, (-0.5, 0.5));
    }
}
