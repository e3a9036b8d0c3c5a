//! CSV readers for the risk dataset, the edge list and batch requests.
//!
//! Loading happens once at startup. Anything structurally wrong with the
//! risk or edge files is a `ConfigError`; individual bad numeric cells are
//! not, they are normalised to 0.0 and counted in the `LoadReport`.

use crate::error::{ConfigError, QueryError};
use crate::record::{ClassLabel, EntityId, RawEdge, RiskRecord, DEFAULT_ALERT};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

const RISK_DATASET: &str = "risk dataset";
const EDGE_DATASET: &str = "edge list";

const ID_COLUMN: &str = "txId";
const EDGE_SOURCE_COLUMN: &str = "txId1";
const EDGE_TARGET_COLUMN: &str = "txId2";

/// The anomaly score ships under either name depending on pipeline version.
const ANOMALY_COLUMNS: [&str; 2] = ["anomaly_score_norm", "anomaly_score"];

/// What happened while reading the risk dataset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub values_normalized: usize,
}

/// Column positions resolved from the header row.
struct RiskColumns {
    id: usize,
    fraud_prob: usize,
    gnn_fraud_prob: usize,
    anomaly: Option<usize>,
    risk_score: usize,
    alert: usize,
    class: Option<usize>,
}

impl RiskColumns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, ConfigError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &'static str| {
            find(name).ok_or(ConfigError::MissingField {
                dataset: RISK_DATASET,
                field: name,
            })
        };

        Ok(Self {
            id: require(ID_COLUMN)?,
            fraud_prob: require("fraud_prob")?,
            gnn_fraud_prob: require("gnn_fraud_prob")?,
            anomaly: ANOMALY_COLUMNS.iter().find_map(|&name| find(name)),
            risk_score: require("risk_score")?,
            alert: require("alert")?,
            class: find("class"),
        })
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn line_of(row: &csv::StringRecord) -> u64 {
    row.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_id(
    row: &csv::StringRecord,
    column: usize,
    dataset: &'static str,
) -> Result<EntityId, ConfigError> {
    let cell = row.get(column).unwrap_or("");
    cell.parse::<EntityId>()
        .map_err(|_| ConfigError::InvalidRow {
            dataset,
            line: line_of(row),
            reason: format!("id '{}' is not an integer", cell),
        })
}

/// Parses a score cell, counting every value that had to be replaced.
fn parse_score(row: &csv::StringRecord, column: usize, normalized: &mut usize) -> f64 {
    match row.get(column).and_then(|cell| cell.parse::<f64>().ok()) {
        Some(value) if value.is_finite() => value,
        _ => {
            *normalized += 1;
            0.0
        }
    }
}

/// Reads risk records from CSV.
///
/// Duplicate ids keep their first row. The returned records are in file
/// order.
pub fn load_risk_records<R: Read>(reader: R) -> Result<(Vec<RiskRecord>, LoadReport), ConfigError> {
    let mut csv = csv_reader(reader);
    let columns = RiskColumns::resolve(csv.headers()?)?;

    let mut report = LoadReport::default();
    let mut seen: HashSet<EntityId> = HashSet::new();
    let mut records = Vec::new();

    for row in csv.records() {
        let row = row?;
        report.rows_read += 1;

        let id = parse_id(&row, columns.id, RISK_DATASET)?;
        if !seen.insert(id) {
            report.duplicates_dropped += 1;
            continue;
        }

        let normalized = &mut report.values_normalized;
        let fraud_prob = parse_score(&row, columns.fraud_prob, normalized);
        let gnn_fraud_prob = parse_score(&row, columns.gnn_fraud_prob, normalized);
        let risk_score = parse_score(&row, columns.risk_score, normalized);
        let anomaly_score = columns
            .anomaly
            .map(|col| parse_score(&row, col, normalized))
            .unwrap_or(0.0);

        let alert = match row.get(columns.alert) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => DEFAULT_ALERT.to_string(),
        };
        let class_label = columns
            .class
            .and_then(|col| row.get(col))
            .map(ClassLabel::parse)
            .unwrap_or_default();

        records.push(RiskRecord {
            id,
            fraud_prob,
            gnn_fraud_prob,
            anomaly_score,
            risk_score,
            alert,
            class_label,
        });
    }

    if report.duplicates_dropped > 0 {
        warn!(
            "Dropped {} duplicate ids from the risk dataset",
            report.duplicates_dropped
        );
    }
    if report.values_normalized > 0 {
        warn!(
            "Normalised {} missing or non-finite score values to 0.0",
            report.values_normalized
        );
    }
    info!("Loaded {} risk records", records.len());

    Ok((records, report))
}

/// Opens and reads the risk dataset at `path`.
pub fn load_risk_records_file(
    path: impl AsRef<Path>,
) -> Result<(Vec<RiskRecord>, LoadReport), ConfigError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ConfigError::io(path, e))?;
    debug!("Reading risk dataset from {}", path.display());
    load_risk_records(BufReader::new(file))
}

/// Reads the edge list. Rows are kept verbatim, including duplicates and
/// self-loops.
pub fn load_edges<R: Read>(reader: R) -> Result<Vec<RawEdge>, ConfigError> {
    let mut csv = csv_reader(reader);
    let headers = csv.headers()?;
    let find = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(ConfigError::MissingField {
                dataset: EDGE_DATASET,
                field: name,
            })
    };
    let source_col = find(EDGE_SOURCE_COLUMN)?;
    let target_col = find(EDGE_TARGET_COLUMN)?;

    let mut edges = Vec::new();
    for row in csv.records() {
        let row = row?;
        let source = parse_id(&row, source_col, EDGE_DATASET)?;
        let target = parse_id(&row, target_col, EDGE_DATASET)?;
        edges.push(RawEdge::new(source, target));
    }

    info!("Loaded {} edges", edges.len());
    Ok(edges)
}

/// Opens and reads the edge list at `path`.
pub fn load_edges_file(path: impl AsRef<Path>) -> Result<Vec<RawEdge>, ConfigError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ConfigError::io(path, e))?;
    debug!("Reading edge list from {}", path.display());
    load_edges(BufReader::new(file))
}

/// Extracts the identifiers of a batch request from CSV.
///
/// `column` names the id column the caller expects. Blank cells are
/// skipped; everything else is passed through as text so the caller can
/// decide how to resolve it.
pub fn read_batch_ids<R: Read>(reader: R, column: &str) -> Result<Vec<String>, QueryError> {
    let mut csv = csv_reader(reader);
    let headers = csv
        .headers()
        .map_err(|e| QueryError::invalid(format!("unreadable batch file: {}", e)))?;
    let col = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| QueryError::invalid(format!("CSV must contain '{}' column", column)))?;

    let mut ids = Vec::new();
    for row in csv.records() {
        let row = row.map_err(|e| QueryError::invalid(format!("malformed batch row: {}", e)))?;
        if let Some(cell) = row.get(col).filter(|c| !c.is_empty()) {
            ids.push(cell.to_string());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RISK_CSV: &str = "\
txId,fraud_prob,gnn_fraud_prob,anomaly_score_norm,risk_score,alert,class
1,0.10,0.20,0.05,12.5,Low Risk,2
2,0.95,0.80,0.70,91.0,CRITICAL,1
3,NaN,0.30,,45.0,,unknown
2,0.00,0.00,0.00,0.0,Duplicate,2
";

    #[test]
    fn test_load_risk_records() {
        let (records, report) = load_risk_records(RISK_CSV.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.duplicates_dropped, 1);
        // NaN fraud_prob and empty anomaly cell on row 3
        assert_eq!(report.values_normalized, 2);

        assert_eq!(records[0].class_label, ClassLabel::Licit);
        assert_eq!(records[1].class_label, ClassLabel::Illicit);
        assert_eq!(records[1].alert, "CRITICAL");
        assert_eq!(records[2].fraud_prob, 0.0);
        assert_eq!(records[2].anomaly_score, 0.0);
        assert_eq!(records[2].alert, DEFAULT_ALERT);
        assert_eq!(records[2].class_label, ClassLabel::Unknown);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let (records, _) = load_risk_records(RISK_CSV.as_bytes()).unwrap();
        let two = records.iter().find(|r| r.id == 2).unwrap();
        assert_eq!(two.risk_score, 91.0);
    }

    #[test]
    fn test_alternate_anomaly_column_and_missing_class() {
        let csv = "txId,fraud_prob,gnn_fraud_prob,anomaly_score,risk_score,alert\n\
                   9,0.1,0.1,0.33,20,Low Risk\n";
        let (records, report) = load_risk_records(csv.as_bytes()).unwrap();
        assert_eq!(records[0].anomaly_score, 0.33);
        assert_eq!(records[0].class_label, ClassLabel::Unknown);
        assert_eq!(report.values_normalized, 0);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "txId,fraud_prob,gnn_fraud_prob,alert\n1,0.1,0.1,Low\n";
        let err = load_risk_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "risk_score",
                ..
            }
        ));
    }

    #[test]
    fn test_non_integer_id_is_fatal() {
        let csv = "txId,fraud_prob,gnn_fraud_prob,risk_score,alert\nabc,0.1,0.1,5,Low\n";
        let err = load_risk_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn test_load_edges_keeps_duplicates_and_self_loops() {
        let csv = "txId1,txId2\n1,2\n1,2\n3,3\n";
        let edges = load_edges(csv.as_bytes()).unwrap();
        assert_eq!(
            edges,
            vec![RawEdge::new(1, 2), RawEdge::new(1, 2), RawEdge::new(3, 3)]
        );
    }

    #[test]
    fn test_load_edges_missing_column() {
        let csv = "source,target\n1,2\n";
        let err = load_edges(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "txId1",
                ..
            }
        ));
    }

    #[test]
    fn test_read_batch_ids() {
        let csv = "txId,note\n5,a\n3,b\n,c\n5,d\n";
        let ids = read_batch_ids(csv.as_bytes(), "txId").unwrap();
        assert_eq!(ids, vec!["5", "3", "5"]);
    }

    #[test]
    fn test_read_batch_ids_missing_column() {
        let csv = "id\n5\n";
        let err = read_batch_ids(csv.as_bytes(), "txId").unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RISK_CSV.as_bytes()).unwrap();

        let (records, _) = load_risk_records_file(file.path()).unwrap();
        assert_eq!(records.len(), 3);

        let err = load_edges_file("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
