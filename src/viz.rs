//! The filtering and visualisation routine
//!
//! The web layer treats this as an opaque collaborator behind the
//! [`Visualiser`] trait; [`StandardVisualiser`] is the routine the
//! application ships.
//!
//! The standard routine keys both tables on their first column. Annotation
//! rows survive the filter when every field is non-empty and the key is
//! present in the metadata table. Two charts come out of every run: a bar
//! chart of metadata rows per group (second metadata column), and a
//! histogram of the first numeric annotation column over the surviving
//! rows. When no annotation column is numeric throughout, the second chart
//! falls back to a retained-vs-dropped bar pair.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::figure::{Figure, HistogramBin};
use crate::table::Table;

/// Number of equal-width bins in the annotation histogram
const HISTOGRAM_BINS: usize = 10;

#[derive(Debug, Error)]
pub enum VizError {
    /// A table arrived with no data rows
    #[error("The {0} file contains no data rows.")]
    EmptyTable(&'static str),

    /// The metadata table needs a key column and a group column
    #[error("The metadata file needs at least two columns, got {0}.")]
    TooFewColumns(usize),
}

/// Everything one upload produces
#[derive(Debug, Clone)]
pub struct VisualisationSet {
    /// Charts in display order; the standard routine always produces two
    pub figures: Vec<Figure>,
    /// Annotation rows that survived the filter
    pub filtered_count: u64,
}

/// The filtering and visualisation collaborator
pub trait Visualiser: Send + Sync {
    fn make_all_visualisations(
        &self,
        metadata: &Table,
        annotation: &Table,
    ) -> Result<VisualisationSet, VizError>;
}

/// Production routine: membership filter, group bar chart, value histogram
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardVisualiser;

impl Visualiser for StandardVisualiser {
    fn make_all_visualisations(
        &self,
        metadata: &Table,
        annotation: &Table,
    ) -> Result<VisualisationSet, VizError> {
        if metadata.is_empty() {
            return Err(VizError::EmptyTable("metadata"));
        }
        if annotation.is_empty() {
            return Err(VizError::EmptyTable("annotation"));
        }
        if metadata.width() < 2 {
            return Err(VizError::TooFewColumns(metadata.width()));
        }

        let keys: HashSet<&str> = metadata.column(0).collect();
        let filtered: Vec<&Vec<String>> = annotation
            .rows()
            .iter()
            .filter(|row| row.iter().all(|field| !field.is_empty()))
            .filter(|row| {
                row.first()
                    .map(|key| keys.contains(key.as_str()))
                    .unwrap_or(false)
            })
            .collect();

        let group_chart = group_bar_chart(metadata);
        let value_chart = annotation_histogram(annotation, &filtered)
            .unwrap_or_else(|| retention_chart(annotation.row_count(), filtered.len()));

        Ok(VisualisationSet {
            figures: vec![group_chart, value_chart],
            filtered_count: filtered.len() as u64,
        })
    }
}

/// Bar chart of metadata rows per distinct group value, in order of first
/// appearance
fn group_bar_chart(metadata: &Table) -> Figure {
    let group_column = &metadata.headers()[1];
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, f64> = HashMap::new();
    for value in metadata.column(1) {
        if !counts.contains_key(value) {
            order.push(value.to_string());
        }
        *counts.entry(value.to_string()).or_insert(0.0) += 1.0;
    }
    let values = order.iter().map(|label| counts[label]).collect();

    Figure::Bar {
        title: format!("Metadata rows per {group_column}"),
        labels: order,
        values,
    }
}

/// Histogram over the first annotation column (key column excluded) whose
/// every filtered value parses as a finite f64. None when no column
/// qualifies or nothing survived the filter.
fn annotation_histogram(annotation: &Table, filtered: &[&Vec<String>]) -> Option<Figure> {
    if filtered.is_empty() {
        return None;
    }

    for col in 1..annotation.width() {
        let mut values = Vec::with_capacity(filtered.len());
        let mut numeric = true;
        for row in filtered {
            match row.get(col).map(|field| field.parse::<f64>()) {
                Some(Ok(value)) if value.is_finite() => values.push(value),
                _ => {
                    numeric = false;
                    break;
                }
            }
        }
        if numeric && !values.is_empty() {
            let column_name = annotation.headers()[col].clone();
            return Some(histogram_figure(column_name, &values));
        }
    }
    None
}

fn histogram_figure(column_name: String, values: &[f64]) -> Figure {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let bins = if min == max {
        // All values identical: one bin centered on the value
        vec![HistogramBin {
            start: min - 0.5,
            end: min + 0.5,
            count: values.len(),
        }]
    } else {
        let width = (max - min) / HISTOGRAM_BINS as f64;
        let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
            .map(|i| HistogramBin {
                start: min + width * i as f64,
                end: min + width * (i + 1) as f64,
                count: 0,
            })
            .collect();
        for value in values {
            let mut index = ((value - min) / width) as usize;
            // The maximum lands in the last bin, not one past it
            if index >= HISTOGRAM_BINS {
                index = HISTOGRAM_BINS - 1;
            }
            bins[index].count += 1;
        }
        bins
    };

    Figure::Histogram {
        title: format!("Distribution of {column_name} (filtered annotation)"),
        bins,
    }
}

/// Fallback second chart when the annotation table has no numeric column
fn retention_chart(total: usize, retained: usize) -> Figure {
    Figure::Bar {
        title: "Annotation rows retained vs dropped".to_string(),
        labels: vec!["retained".to_string(), "dropped".to_string()],
        values: vec![retained as f64, (total - retained) as f64],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Table {
        Table::from_csv(
            "metadata",
            "sample,group,age\ns1,control,31\ns2,control,44\ns3,treated,28\n",
        )
        .expect("valid CSV")
    }

    fn run(metadata: &Table, annotation: &Table) -> VisualisationSet {
        StandardVisualiser
            .make_all_visualisations(metadata, annotation)
            .expect("visualisation succeeds")
    }

    #[test]
    fn test_filter_drops_incomplete_and_unknown_rows() {
        let annotation = Table::from_csv(
            "annotation",
            "sample,score\ns1,0.4\ns2,\ns3,0.7\nsX,0.9\n",
        )
        .expect("valid CSV");

        // s2 has an empty field, sX is not in the metadata
        let set = run(&metadata(), &annotation);
        assert_eq!(set.filtered_count, 2);
        assert_eq!(set.figures.len(), 2);
    }

    #[test]
    fn test_group_chart_counts_in_first_appearance_order() {
        let annotation =
            Table::from_csv("annotation", "sample,score\ns1,0.4\n").expect("valid CSV");
        let set = run(&metadata(), &annotation);

        match &set.figures[0] {
            Figure::Bar { title, labels, values } => {
                assert_eq!(title, "Metadata rows per group");
                assert_eq!(labels, &["control", "treated"]);
                assert_eq!(values, &[2.0, 1.0]);
            }
            other => panic!("expected bar chart, got {other:?}"),
        }
    }

    #[test]
    fn test_histogram_uses_first_numeric_column() {
        let annotation = Table::from_csv(
            "annotation",
            "sample,note,score\ns1,aa,1.0\ns2,bb,2.0\ns3,cc,3.0\n",
        )
        .expect("valid CSV");
        let set = run(&metadata(), &annotation);

        match &set.figures[1] {
            Figure::Histogram { title, bins } => {
                // "note" is not numeric, so "score" is the histogram column
                assert_eq!(title, "Distribution of score (filtered annotation)");
                assert_eq!(bins.len(), 10);
                assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
                assert!((bins[0].start - 1.0).abs() < 1e-9);
                assert!((bins[9].end - 3.0).abs() < 1e-9);
                // The maximum value joins the last bin
                assert_eq!(bins[9].count, 1);
            }
            other => panic!("expected histogram, got {other:?}"),
        }
    }

    #[test]
    fn test_histogram_collapses_identical_values_to_one_bin() {
        let annotation = Table::from_csv(
            "annotation",
            "sample,score\ns1,2.0\ns2,2.0\ns3,2.0\n",
        )
        .expect("valid CSV");
        let set = run(&metadata(), &annotation);

        match &set.figures[1] {
            Figure::Histogram { bins, .. } => {
                assert_eq!(bins.len(), 1);
                assert_eq!(bins[0].count, 3);
                assert!(bins[0].start < 2.0 && bins[0].end > 2.0);
            }
            other => panic!("expected histogram, got {other:?}"),
        }
    }

    #[test]
    fn test_no_numeric_column_falls_back_to_retention_chart() {
        let annotation = Table::from_csv(
            "annotation",
            "sample,note\ns1,aa\ns2,bb\nsX,cc\n",
        )
        .expect("valid CSV");
        let set = run(&metadata(), &annotation);

        assert_eq!(set.filtered_count, 2);
        match &set.figures[1] {
            Figure::Bar { title, labels, values } => {
                assert_eq!(title, "Annotation rows retained vs dropped");
                assert_eq!(labels, &["retained", "dropped"]);
                assert_eq!(values, &[2.0, 1.0]);
            }
            other => panic!("expected bar chart, got {other:?}"),
        }
    }

    #[test]
    fn test_nan_is_not_treated_as_numeric() {
        let annotation = Table::from_csv(
            "annotation",
            "sample,score\ns1,NaN\ns2,1.0\n",
        )
        .expect("valid CSV");
        let set = run(&metadata(), &annotation);

        // NaN parses as f64 but is rejected, so the column is non-numeric
        match &set.figures[1] {
            Figure::Bar { title, .. } => {
                assert_eq!(title, "Annotation rows retained vs dropped");
            }
            other => panic!("expected fallback bar chart, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_tables_are_rejected() {
        let empty = Table::from_csv("metadata", "sample,group\n").expect("valid CSV");
        let annotation =
            Table::from_csv("annotation", "sample,score\ns1,0.4\n").expect("valid CSV");

        let err = StandardVisualiser
            .make_all_visualisations(&empty, &annotation)
            .expect_err("empty metadata");
        assert!(matches!(err, VizError::EmptyTable("metadata")));

        let err = StandardVisualiser
            .make_all_visualisations(&metadata(), &empty)
            .expect_err("empty annotation");
        assert!(matches!(err, VizError::EmptyTable("annotation")));
    }

    #[test]
    fn test_narrow_metadata_is_rejected() {
        let narrow = Table::from_csv("metadata", "sample\ns1\n").expect("valid CSV");
        let annotation =
            Table::from_csv("annotation", "sample,score\ns1,0.4\n").expect("valid CSV");

        let err = StandardVisualiser
            .make_all_visualisations(&narrow, &annotation)
            .expect_err("narrow metadata");
        assert!(matches!(err, VizError::TooFewColumns(1)));
    }
}
