use dashplot::resolve::resolve_chart;
use dashplot::{ChartError, ChartKind, ChartRequest, Dataset};
use proptest::prelude::*;

/// A small all-numeric CSV with `cols` columns and `rows` rows
fn numeric_csv() -> impl Strategy<Value = String> {
    (1usize..5, 0usize..12).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(prop::collection::vec(-1000i32..1000, cols), rows).prop_map(move |table| {
            let mut csv = (0..cols).map(|c| format!("c{}", c)).collect::<Vec<_>>().join(",");
            csv.push('\n');
            for row in table {
                let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                csv.push_str(&cells.join(","));
                csv.push('\n');
            }
            csv
        })
    })
}

fn column_name() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z]{1,8}")
}

proptest! {
    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal(csv in numeric_csv()) {
        let data = Dataset::from_csv_str(&csv).unwrap();
        let matrix = data.correlation_matrix();
        let n = matrix.size();

        for i in 0..n {
            let d = matrix.get(i, i);
            prop_assert!(d.is_nan() || d == 1.0);
            for j in 0..n {
                let (a, b) = (matrix.get(i, j), matrix.get(j, i));
                prop_assert!((a.is_nan() && b.is_nan()) || a == b);
                prop_assert!(a.is_nan() || (-1.0..=1.0).contains(&a));
            }
        }
    }

    #[test]
    fn columns_follow_header_order(names in prop::collection::hash_set("[a-z]{1,6}", 1..6)) {
        let names: Vec<String> = names.into_iter().collect();
        let csv = format!("{}\n", names.join(","));
        let data = Dataset::from_csv_str(&csv).unwrap();
        prop_assert_eq!(data.columns(), names.as_slice());
    }

    #[test]
    fn heatmap_plan_ignores_selections(csv in numeric_csv(), x in column_name(), y in column_name()) {
        let data = Dataset::from_csv_str(&csv).unwrap();
        let bare = resolve_chart(&ChartRequest::new(ChartKind::Heatmap), &data).unwrap();

        let request = ChartRequest { x_column: x, y_column: y, chart_kind: ChartKind::Heatmap };
        let selected = resolve_chart(&request, &data).unwrap();

        // NaN entries never compare equal, so compare through their bit patterns
        let bits = |p: &dashplot::RenderPlan| p.matrix.as_ref().map(|m| m.values.iter().map(|v| v.to_bits()).collect::<Vec<_>>());
        prop_assert_eq!(bits(&bare), bits(&selected));
        prop_assert_eq!(&bare.labels, &selected.labels);
        prop_assert!(selected.primary.is_none() && selected.secondary.is_none());
    }

    #[test]
    fn histogram_ignores_y(csv in numeric_csv(), y in column_name()) {
        let data = Dataset::from_csv_str(&csv).unwrap();
        let request = ChartRequest { x_column: Some("c0".to_string()), y_column: y, chart_kind: ChartKind::Histogram };
        let plan = resolve_chart(&request, &data).unwrap();
        prop_assert!(plan.secondary.is_none());
    }

    #[test]
    fn unknown_kinds_are_rejected(word in "[a-z]{1,10}") {
        let known = ChartKind::ALL.iter().any(|k| k.name() == word);
        match word.parse::<ChartKind>() {
            Ok(kind) => prop_assert!(known && kind.name() == word),
            Err(err) => {
                prop_assert!(!known);
                prop_assert_eq!(err, ChartError::UnknownChartKind { kind: word.clone() });
            }
        }
    }
}
