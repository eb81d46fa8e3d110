//! CSV Output
//!
//! Unix CSV dialect, matching the downstream analysis tooling: every field
//! double-quoted with embedded quotes doubled, records terminated with `\n`.
//! The `repetition` column is present exactly when rows were built per
//! repetition; error rows leave the statistics columns empty, sampled rows
//! leave `error` empty.

use crate::row::ResultRow;

/// Generate the statistics CSV export, header included.
pub fn generate_csv_report(rows: &[ResultRow], combine_repetitions: bool) -> String {
    let mut out = String::new();
    write_record(&mut out, header_fields(combine_repetitions));
    for row in rows {
        write_record(&mut out, row_fields(row, combine_repetitions));
    }
    out
}

fn header_fields(combine_repetitions: bool) -> Vec<&'static str> {
    let mut fields = vec!["class", "test", "config_name", "approach", "batch"];
    if !combine_repetitions {
        fields.push("repetition");
    }
    fields.extend([
        "error",
        "measurements",
        "mean",
        "variance",
        "standard_deviation",
        "standard_error",
        "cv",
        "cv_est",
    ]);
    fields
}

fn row_fields(row: &ResultRow, combine_repetitions: bool) -> Vec<String> {
    let mut fields = vec![
        row.class.clone(),
        row.test.clone(),
        row.config_name.clone(),
        row.approach.to_string(),
        row.batch.to_string(),
    ];
    if !combine_repetitions {
        fields.push(row.repetition.map(|r| r.to_string()).unwrap_or_default());
    }
    fields.push(row.error_text());
    match &row.statistics {
        Some(stats) => {
            fields.push(stats.measurements.to_string());
            fields.push(stats.mean.to_string());
            fields.push(stats.variance.to_string());
            fields.push(stats.std_dev.to_string());
            fields.push(stats.std_err.to_string());
            fields.push(stats.cv.to_string());
            fields.push(stats.cv_est.to_string());
        }
        None => fields.extend(std::iter::repeat_with(String::new).take(7)),
    }
    fields
}

fn write_record<S: AsRef<str>>(out: &mut String, fields: impl IntoIterator<Item = S>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push('"');
        out.push_str(&field.as_ref().replace('"', "\"\""));
        out.push('"');
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchbench_core::ErrorTag;
    use batchbench_runners::Approach;
    use batchbench_stats::ThroughputStatistics;

    fn sampled_row(repetition: Option<usize>) -> ResultRow {
        ResultRow {
            class: "com.example.Suite".to_string(),
            test: "testA".to_string(),
            config_name: "gradle".to_string(),
            approach: Approach::GradleTest,
            batch: 0,
            repetition,
            errors: Vec::new(),
            statistics: Some(ThroughputStatistics {
                measurements: 2,
                mean: 2.5,
                variance: 0.5,
                std_dev: 0.5,
                std_err: 0.25,
                cv: 0.2,
                cv_est: 0.225,
            }),
        }
    }

    fn errored_row(repetition: Option<usize>) -> ResultRow {
        ResultRow {
            class: "com.example.Suite".to_string(),
            test: "testB".to_string(),
            config_name: "jmh".to_string(),
            approach: Approach::Ju2jmh,
            batch: 3,
            repetition,
            errors: vec![ErrorTag::ExecutionFailed, ErrorTag::ZeroDuration],
            statistics: None,
        }
    }

    #[test]
    fn test_combined_report_golden() {
        let rows = vec![sampled_row(None), errored_row(None)];
        let csv = generate_csv_report(&rows, true);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "\"class\",\"test\",\"config_name\",\"approach\",\"batch\",\"error\",\
             \"measurements\",\"mean\",\"variance\",\"standard_deviation\",\
             \"standard_error\",\"cv\",\"cv_est\""
        );
        assert_eq!(
            lines[1],
            "\"com.example.Suite\",\"testA\",\"gradle\",\"gradle-test\",\"0\",\"\",\
             \"2\",\"2.5\",\"0.5\",\"0.5\",\"0.25\",\"0.2\",\"0.225\""
        );
        assert_eq!(
            lines[2],
            "\"com.example.Suite\",\"testB\",\"jmh\",\"ju2jmh\",\"3\",\
             \"FAILED,ZERO_DURATION\",\"\",\"\",\"\",\"\",\"\",\"\",\"\""
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_per_repetition_report_has_repetition_column() {
        let csv = generate_csv_report(&[errored_row(Some(1))], false);
        let lines: Vec<&str> = csv.lines().collect();

        assert!(lines[0].contains("\"batch\",\"repetition\",\"error\""));
        assert_eq!(
            lines[1],
            "\"com.example.Suite\",\"testB\",\"jmh\",\"ju2jmh\",\"3\",\"1\",\
             \"FAILED,ZERO_DURATION\",\"\",\"\",\"\",\"\",\"\",\"\",\"\""
        );
    }

    #[test]
    fn test_header_written_even_without_rows() {
        let csv = generate_csv_report(&[], true);
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn test_fields_with_quotes_and_commas_are_escaped() {
        let mut row = sampled_row(None);
        row.config_name = "we\"ird,name".to_string();
        let csv = generate_csv_report(&[row], true);
        assert!(csv.contains("\"we\"\"ird,name\""));
    }
}
