use std::collections::{HashMap, HashSet};
use std::io::Read;

use serde::Serialize;
use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::ir::{CorrelationMatrix, Series, SeriesValues};
use crate::stats;

/// Cell contents treated as missing values
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

pub fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

/// A parsed, immutable table. One per upload.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    numeric: Vec<bool>,
}

impl Dataset {
    /// Build a dataset from already-split headers and rows.
    /// Short rows are padded with missing cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> ChartResult<Self> {
        if headers.is_empty() {
            return Err(ChartError::parse("no columns to parse from file"));
        }
        let headers = dedupe_headers(headers);
        let width = headers.len();

        let mut padded = Vec::with_capacity(rows.len());
        for (idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(ChartError::parse(format!(
                    "expected {} fields in row {}, saw {}",
                    width,
                    idx + 1,
                    row.len()
                )));
            }
            row.resize(width, String::new());
            padded.push(row);
        }

        let numeric = (0..width)
            .map(|col| {
                !padded.is_empty()
                    && padded
                        .iter()
                        .map(|row| row[col].as_str())
                        .filter(|cell| !is_missing(cell))
                        .all(|cell| parse_number(cell).is_some())
            })
            .collect();

        Ok(Self {
            headers,
            rows: padded,
            numeric,
        })
    }

    /// Parse comma-separated content. The first record is the header.
    pub fn from_reader<R: Read>(reader: R) -> ChartResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(ChartError::parse("no columns to parse from file"));
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if record.len() > headers.len() {
                // Blank lines are skipped by the reader, so take the line from it
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(ChartError::parse(format!(
                    "expected {} fields in line {}, saw {}",
                    headers.len(),
                    line,
                    record.len()
                )));
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        let dataset = Self::new(headers, rows)?;
        debug!(
            columns = dataset.headers.len(),
            rows = dataset.rows.len(),
            numeric = dataset.numeric.iter().filter(|n| **n).count(),
            "parsed dataset"
        );
        Ok(dataset)
    }

    pub fn from_csv_bytes(content: &[u8]) -> ChartResult<Self> {
        Self::from_reader(content)
    }

    pub fn from_csv_str(content: &str) -> ChartResult<Self> {
        Self::from_reader(content.as_bytes())
    }

    /// All column names in file order
    pub fn columns(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_numeric(&self, index: usize) -> bool {
        self.numeric.get(index).copied().unwrap_or(false)
    }

    /// Names of the numeric columns, in file order
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .zip(&self.numeric)
            .filter(|(_, numeric)| **numeric)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn column_index(&self, name: &str) -> ChartResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ChartError::unknown_column(name))
    }

    pub fn cells(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    fn numeric_values(&self, index: usize) -> Vec<f64> {
        self.cells(index)
            .map(|cell| {
                if is_missing(cell) {
                    f64::NAN
                } else {
                    parse_number(cell).unwrap_or(f64::NAN)
                }
            })
            .collect()
    }

    /// Values of the named column, typed by the column's kind
    pub fn series(&self, name: &str) -> ChartResult<Series> {
        let index = self.column_index(name)?;
        let values = if self.is_numeric(index) {
            SeriesValues::Numeric(self.numeric_values(index))
        } else {
            SeriesValues::Categorical(
                self.cells(index)
                    .map(|cell| if is_missing(cell) { None } else { Some(cell.to_string()) })
                    .collect(),
            )
        };
        Ok(Series {
            name: self.headers[index].clone(),
            values,
        })
    }

    /// First `n` rows, for preview display
    pub fn head(&self, n: usize) -> Preview {
        Preview {
            columns: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Descriptive statistics. Numeric columns are described when any exist,
    /// otherwise every column gets a frequency summary.
    pub fn summary(&self) -> Summary {
        let numeric_idx: Vec<usize> = (0..self.headers.len()).filter(|&i| self.is_numeric(i)).collect();

        if !numeric_idx.is_empty() {
            let columns = numeric_idx
                .into_iter()
                .map(|i| describe_numeric(&self.headers[i], &self.numeric_values(i)))
                .collect();
            Summary::Numeric(columns)
        } else {
            let columns = (0..self.headers.len())
                .map(|i| describe_categorical(&self.headers[i], self.cells(i)))
                .collect();
            Summary::Categorical(columns)
        }
    }

    /// Pairwise Pearson correlation restricted to numeric columns.
    /// Each pair uses the rows where both values are present.
    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let numeric_idx: Vec<usize> = (0..self.headers.len()).filter(|&i| self.is_numeric(i)).collect();
        let columns: Vec<String> = numeric_idx.iter().map(|&i| self.headers[i].clone()).collect();
        let data: Vec<Vec<f64>> = numeric_idx.iter().map(|&i| self.numeric_values(i)).collect();

        let n = data.len();
        let mut values = vec![f64::NAN; n * n];
        for i in 0..n {
            for j in i..n {
                let mut r = stats::pearson(&data[i], &data[j]);
                if i == j && !r.is_nan() {
                    r = 1.0;
                }
                values[i * n + j] = r;
                values[j * n + i] = r;
            }
        }

        CorrelationMatrix { columns, values }
    }
}

/// Empty names become `Unnamed: i`, repeated names get `.1`, `.2`, ... suffixes
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());

    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header
        };

        let mut name = base.clone();
        while seen.contains(&name) {
            let count = counts.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

fn describe_numeric(name: &str, values: &[f64]) -> NumericSummary {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    present.sort_by(f64::total_cmp);

    let count = present.len();
    let (mean, std) = stats::mean_std(&present);
    let quantile = |p: f64| if count == 0 { f64::NAN } else { stats::percentile(&present, p) };

    NumericSummary {
        column: name.to_string(),
        count,
        mean,
        std,
        min: present.first().copied().unwrap_or(f64::NAN),
        q25: quantile(0.25),
        q50: quantile(0.50),
        q75: quantile(0.75),
        max: present.last().copied().unwrap_or(f64::NAN),
    }
}

fn describe_categorical<'a>(name: &str, cells: impl Iterator<Item = &'a str>) -> CategoricalSummary {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut count = 0;

    for cell in cells.filter(|c| !is_missing(c)) {
        count += 1;
        let entry = freq.entry(cell).or_insert(0);
        if *entry == 0 {
            order.push(cell);
        }
        *entry += 1;
    }

    // First seen wins ties
    let mut top: Option<(&str, usize)> = None;
    for value in &order {
        let n = freq[value];
        if top.map_or(true, |(_, best)| n > best) {
            top = Some((value, n));
        }
    }

    CategoricalSummary {
        column: name.to_string(),
        count,
        unique: order.len(),
        top: top.map(|(v, _)| v.to_string()),
        freq: top.map(|(_, n)| n).unwrap_or(0),
    }
}

/// First rows of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "columns", rename_all = "snake_case")]
pub enum Summary {
    Numeric(Vec<NumericSummary>),
    Categorical(Vec<CategoricalSummary>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub q50: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SALES: &str = "day,sales,region\nMon,10,north\nTue,20,south\nWed,15,north\n";

    #[test]
    fn test_columns_in_file_order() {
        let ds = Dataset::from_csv_str(SALES).unwrap();
        assert_eq!(ds.columns(), &["day", "sales", "region"]);
        assert_eq!(ds.rows(), 3);
    }

    #[test]
    fn test_numeric_columns_subset() {
        let ds = Dataset::from_csv_str(SALES).unwrap();
        assert_eq!(ds.numeric_columns(), vec!["sales"]);
        for name in ds.numeric_columns() {
            assert!(ds.columns().iter().any(|c| c == name));
        }
    }

    #[test]
    fn test_missing_cells_keep_column_numeric() {
        let ds = Dataset::from_csv_str("a,b\n1,x\n,y\nNA,z\n4,w\n").unwrap();
        assert_eq!(ds.numeric_columns(), vec!["a"]);
        let s = ds.series("a").unwrap();
        let v = s.numeric().unwrap();
        assert_eq!(v[0], 1.0);
        assert!(v[1].is_nan());
        assert!(v[2].is_nan());
    }

    #[test]
    fn test_duplicate_and_empty_headers() {
        let ds = Dataset::from_csv_str("a,a,,a\n1,2,3,4\n").unwrap();
        assert_eq!(ds.columns(), &["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn test_short_rows_padded() {
        let ds = Dataset::from_csv_str("a,b,c\n1,2\n3,4,5\n").unwrap();
        assert_eq!(ds.rows(), 2);
        assert_eq!(ds.head(1).rows[0], vec!["1", "2", ""]);
        assert_eq!(ds.numeric_columns(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_long_rows_rejected() {
        let err = Dataset::from_csv_str("a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, ChartError::Parse { .. }));
        assert!(err.to_string().contains("expected 2 fields"));
    }

    #[test]
    fn test_long_row_reports_file_line() {
        let err = Dataset::from_csv_str("a,b\n1,2\n\n\n3,4\n5,6,7\n").unwrap_err();
        assert_eq!(err.to_string(), "parse error: expected 2 fields in line 6, saw 3");

        let err = Dataset::new(vec!["a".to_string()], vec![vec!["1".to_string(), "2".to_string()]]).unwrap_err();
        assert!(err.to_string().contains("expected 1 fields in row 1"));
    }

    #[test]
    fn test_empty_content_rejected() {
        assert!(matches!(Dataset::from_csv_str(""), Err(ChartError::Parse { .. })));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes = b"a,b\n\xff\xfe,1\n";
        assert!(matches!(Dataset::from_csv_bytes(bytes), Err(ChartError::Parse { .. })));
    }

    #[test]
    fn test_header_only_dataset() {
        let ds = Dataset::from_csv_str("x,y\n").unwrap();
        assert_eq!(ds.rows(), 0);
        assert!(ds.numeric_columns().is_empty());
        assert_eq!(ds.correlation_matrix().size(), 0);
    }

    #[test]
    fn test_unknown_column() {
        let ds = Dataset::from_csv_str(SALES).unwrap();
        assert_eq!(
            ds.column_index("Sales").unwrap_err(),
            ChartError::unknown_column("Sales")
        );
    }

    #[test]
    fn test_head() {
        let ds = Dataset::from_csv_str(SALES).unwrap();
        let preview = ds.head(2);
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[1][0], "Tue");
        assert_eq!(ds.head(100).rows.len(), 3);
    }

    #[test]
    fn test_summary_numeric() {
        let ds = Dataset::from_csv_str("v,label\n1,a\n2,b\n3,c\n4,d\n").unwrap();
        match ds.summary() {
            Summary::Numeric(cols) => {
                assert_eq!(cols.len(), 1);
                let s = &cols[0];
                assert_eq!(s.count, 4);
                assert_relative_eq!(s.mean, 2.5);
                assert_relative_eq!(s.std, 1.2909944487358056, epsilon = 1e-12);
                assert_relative_eq!(s.q25, 1.75);
                assert_relative_eq!(s.q50, 2.5);
                assert_relative_eq!(s.q75, 3.25);
                assert_eq!(s.min, 1.0);
                assert_eq!(s.max, 4.0);
            }
            other => panic!("expected numeric summary, got {:?}", other),
        }
    }

    #[test]
    fn test_summary_categorical_when_no_numeric() {
        let ds = Dataset::from_csv_str("c\nx\ny\ny\nx\n\n").unwrap();
        match ds.summary() {
            Summary::Categorical(cols) => {
                assert_eq!(cols[0].count, 4);
                assert_eq!(cols[0].unique, 2);
                assert_eq!(cols[0].top.as_deref(), Some("x"));
                assert_eq!(cols[0].freq, 2);
            }
            other => panic!("expected categorical summary, got {:?}", other),
        }
    }

    #[test]
    fn test_correlation_matrix_symmetric_with_unit_diagonal() {
        let ds = Dataset::from_csv_str("a,b,c,name\n1,2,9,x\n2,4,7,y\n3,5,8,z\n4,9,1,w\n").unwrap();
        let m = ds.correlation_matrix();
        assert_eq!(m.columns, vec!["a", "b", "c"]);
        for i in 0..3 {
            assert_relative_eq!(m.get(i, i), 1.0, epsilon = 1e-12);
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
        assert!(m.get(0, 1) > 0.9);
        assert!(m.get(0, 2) < 0.0);
    }

    #[test]
    fn test_correlation_single_numeric_column() {
        let ds = Dataset::from_csv_str("a,label\n1,x\n2,y\n5,z\n").unwrap();
        let m = ds.correlation_matrix();
        assert_eq!(m.columns, vec!["a"]);
        assert_eq!(m.values, vec![1.0]);
    }

    #[test]
    fn test_correlation_constant_column_is_nan() {
        let ds = Dataset::from_csv_str("a,b\n1,3\n2,3\n3,3\n").unwrap();
        let m = ds.correlation_matrix();
        assert!(m.get(0, 1).is_nan());
        assert!(m.get(1, 1).is_nan());
        assert_relative_eq!(m.get(0, 0), 1.0);
    }
}
