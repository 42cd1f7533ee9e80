//! Integration tests for clickshare.

use std::io::Write;
use tempfile::NamedTempFile;

use clickshare::allocation::{PERCENTAGE_COLUMN, ROW_NUMBER_COLUMN};
use clickshare::{
    AggregationSpec, Aggregator, AllocationMode, AllocationSpec, Allocator, Breakdown,
    BreakdownConfig, ClickshareError, ColumnRoles, DataTable, DiagnosticKind, OutputFormat,
    PartialRoles, Parser, TableWriter,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn parse(content: &str) -> DataTable {
    Parser::new()
        .parse_bytes(content.as_bytes())
        .expect("Failed to parse table")
}

fn breakdown_config(columns: &[&str]) -> BreakdownConfig {
    BreakdownConfig {
        roles: PartialRoles {
            breakdown: columns.iter().map(|c| c.to_string()).collect(),
            ..PartialRoles::default()
        },
        ..BreakdownConfig::default()
    }
}

fn spec(impressions: bool) -> AllocationSpec {
    AllocationSpec {
        group_key: vec!["url".into(), "country".into(), "device".into()],
        clicks: "clicks".into(),
        breakdown: vec!["sessions".into()],
        impressions: impressions.then(|| "impressions".into()),
    }
}

fn column_f64(table: &DataTable, name: &str) -> Vec<f64> {
    table
        .column_by_name(name)
        .expect("column present")
        .iter()
        .map(|v| v.parse().expect("numeric cell"))
        .collect()
}

// =============================================================================
// Allocation Examples
// =============================================================================

#[test]
fn test_two_row_split() {
    let table = parse(
        "url,country,device,query,clicks,sessions\n\
         /a,US,mobile,shoes,3,10\n\
         /a,US,mobile,boots,1,10\n",
    );

    for mode in [AllocationMode::Proportional, AllocationMode::Fallback] {
        let out = Allocator::new(mode)
            .allocate(&table, &spec(false))
            .expect("Allocation failed")
            .augment(&table);

        assert_eq!(column_f64(&out, PERCENTAGE_COLUMN), vec![0.75, 0.25]);
        assert_eq!(column_f64(&out, "sessions_estimated"), vec![7.5, 2.5]);
    }
}

#[test]
fn test_zero_click_fallback_example() {
    let table = parse(
        "url,country,device,query,clicks,impressions,sessions\n\
         /a,US,mobile,q1,0,5,2\n\
         /a,US,mobile,q2,0,10,4\n\
         /a,US,mobile,q3,0,3,1\n",
    );

    let allocation = Allocator::new(AllocationMode::Fallback)
        .allocate(&table, &spec(true))
        .expect("Allocation failed");
    let out = allocation.augment(&table);

    assert_eq!(column_f64(&out, PERCENTAGE_COLUMN), vec![0.0, 1.0, 0.0]);
    assert_eq!(column_f64(&out, "sessions_estimated"), vec![0.0, 4.0, 0.0]);
    assert_eq!(column_f64(&out, ROW_NUMBER_COLUMN), vec![2.0, 1.0, 3.0]);
    assert_eq!(allocation.count(DiagnosticKind::FallbackApplied), 1);
}

#[test]
fn test_rank_ties_follow_input_order() {
    let table = parse(
        "url,country,device,clicks,impressions,sessions\n\
         /a,US,mobile,1,5,3\n\
         /a,US,mobile,1,5,3\n\
         /a,US,mobile,1,9,3\n",
    );

    let allocation = Allocator::default()
        .allocate(&table, &spec(true))
        .expect("Allocation failed");

    assert_eq!(allocation.row_number, Some(vec![2, 3, 1]));
}

#[test]
fn test_rows_keep_input_order_across_interleaved_groups() {
    let table = parse(
        "url,country,device,clicks,sessions\n\
         /b,US,mobile,1,4\n\
         /a,US,mobile,2,9\n\
         /b,US,mobile,3,4\n\
         /a,US,mobile,1,9\n",
    );

    let out = Allocator::default()
        .allocate(&table, &spec(false))
        .expect("Allocation failed")
        .augment(&table);

    assert_eq!(out.column_by_name("url").unwrap(), vec!["/b", "/a", "/b", "/a"]);
    assert_eq!(column_f64(&out, "total_clicks_by_page"), vec![4.0, 3.0, 4.0, 3.0]);
    assert_eq!(column_f64(&out, "sessions_estimated"), vec![1.0, 6.0, 3.0, 3.0]);
}

#[test]
fn test_multiple_breakdown_columns() {
    let table = parse(
        "url,country,device,clicks,sessions,conversions\n\
         /a,US,mobile,1,8,2\n\
         /a,US,mobile,3,8,2\n",
    );
    let mut s = spec(false);
    s.breakdown.push("conversions".into());

    let out = Allocator::default()
        .allocate(&table, &s)
        .expect("Allocation failed")
        .augment(&table);

    assert_eq!(column_f64(&out, "sessions_estimated"), vec![2.0, 6.0]);
    assert_eq!(column_f64(&out, "conversions_estimated"), vec![0.5, 1.5]);
    assert_eq!(column_f64(&out, "total_conversions_per_page"), vec![4.0, 4.0]);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_unknown_breakdown_column() {
    let table = parse("url,country,device,clicks\n/a,US,mobile,1\n");
    let err = Allocator::default()
        .allocate(&table, &spec(false))
        .unwrap_err();

    match err {
        ClickshareError::ColumnNotFound { column, available } => {
            assert_eq!(column, "sessions");
            assert_eq!(available.len(), 4);
        }
        other => panic!("expected ColumnNotFound, got {other:?}"),
    }
}

#[test]
fn test_non_numeric_clicks() {
    let table = parse(
        "url,country,device,clicks,sessions\n\
         /a,US,mobile,1,3\n\
         /a,US,mobile,many,3\n",
    );
    let err = Allocator::default()
        .allocate(&table, &spec(false))
        .unwrap_err();

    assert!(matches!(
        err,
        ClickshareError::TypeMismatch { ref column, row: 2, .. } if column == "clicks"
    ));
}

#[test]
fn test_missing_file() {
    let err = Breakdown::new().run("/nonexistent/joined.csv").unwrap_err();
    assert!(matches!(err, ClickshareError::Io { .. }));
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_pipeline_tsv_with_ga4_style_headers() {
    let content = "Landing Page URL\tDevice Category\tCountry\tDate\tQuery\t\
                   Clicks\tImpressions\tSessions\tConversions\n\
                   /shop\tmobile\tUS\t2024-03-01\tbuy shoes\t6\t100\t20\t2\n\
                   /shop\tmobile\tUS\t2024-03-01\tshoe shop\t2\t80\t20\t2\n\
                   /shop\tdesktop\tUS\t2024-03-01\tbuy shoes\t0\t30\t5\t1\n\
                   /shop\tdesktop\tUS\t2024-03-01\tshoe shop\t0\t45\t5\t1\n";
    let file = create_test_file(content);

    let result = Breakdown::with_config(breakdown_config(&["Sessions", "Conversions"]))
        .run(file.path())
        .expect("Pipeline failed");

    assert_eq!(result.source.as_ref().unwrap().format, "tsv");
    assert_eq!(result.roles.url, "Landing Page URL");
    assert_eq!(result.roles.device, "Device Category");
    assert_eq!(result.summary.groups, 2);
    assert_eq!(result.summary.fallback_groups, 1);

    assert_eq!(column_f64(&result.table, "Sessions_estimated"), vec![15.0, 5.0, 0.0, 5.0]);
    assert_eq!(column_f64(&result.table, "Conversions_estimated"), vec![1.5, 0.5, 0.0, 1.0]);
}

#[test]
fn test_pipeline_aggregate_then_write_csv() {
    let content = "url,device,country,date,query,clicks,impressions,sessions\n\
                   /a,mobile,US,2024-01-01,shoes,1,10,4\n\
                   /a,mobile,US,2024-01-02,shoes,1,10,6\n\
                   /a,mobile,US,2024-01-02,boots,1,10,6\n";
    let file = create_test_file(content);

    let mut config = breakdown_config(&["sessions"]);
    config.aggregate = true;
    let result = Breakdown::with_config(config)
        .run(file.path())
        .expect("Pipeline failed");

    let csv = TableWriter::new(OutputFormat::Csv)
        .render(&result.table)
        .expect("Write failed");
    assert_eq!(
        csv,
        "url,country,device,query,clicks,sessions_estimated\n\
         /a,US,mobile,shoes,2,7\n\
         /a,US,mobile,boots,1,3\n"
    );
}

#[test]
fn test_pipeline_rerun_overwrites_derived_columns() {
    let table = parse(
        "url,device,country,clicks,sessions\n\
         /a,mobile,US,1,8\n\
         /a,mobile,US,1,8\n",
    );
    let mut config = breakdown_config(&["sessions"]);
    config.include_date = false;
    let pipeline = Breakdown::with_config(config);

    let first = pipeline.process(&table).expect("First pass failed");
    let second = pipeline.process(&first.table).expect("Second pass failed");

    assert_eq!(first.table.headers, second.table.headers);
    assert_eq!(first.table.rows, second.table.rows);
}

#[test]
fn test_explicit_aggregation_key() {
    let table = parse(
        "url,country,device,query,clicks,sessions_estimated\n\
         /a,US,mobile,shoes,2,5\n\
         /a,US,desktop,shoes,1,2\n",
    );
    let spec = AggregationSpec {
        group_key: vec!["url".into(), "query".into()],
        clicks: "clicks".into(),
        estimated: vec!["sessions_estimated".into()],
    };

    let out = Aggregator::new()
        .aggregate(&table, &spec)
        .expect("Aggregation failed");
    assert_eq!(out.rows, vec![vec!["/a", "shoes", "3", "7"]]);
}

#[test]
fn test_roles_validation_before_allocation() {
    let table = parse("url,device,country,clicks,sessions\n/a,mobile,US,1,8\n");
    let roles = ColumnRoles::new("url", "device", "country", "clicks")
        .with_impressions("impressions")
        .with_breakdown(["sessions"]);

    let err = roles.validate(&table).unwrap_err();
    assert!(matches!(
        err,
        ClickshareError::ColumnNotFound { ref column, .. } if column == "impressions"
    ));
}
