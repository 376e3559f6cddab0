use crate::config::PlantConfig;
use crate::error::Result;
use crate::types::{ProcessType, ProductionRow, RowLayout, StoppageBlock};
use crate::util::{parse_date_safe, parse_f64_safe};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Header names of the column that carries the end-time cell comments.
const ANNOTATION_HEADERS: &[&str] = &["comments", "comment", "annotation", "kommentar"];

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
    pub annotated_rows: usize,
}

/// All production days of one sheet.
#[derive(Debug, Clone)]
pub struct ProductionData {
    pub process: ProcessType,
    pub rows: Vec<ProductionRow>,
}

impl ProductionData {
    /// First row for `date`. Duplicate dates are not validated.
    pub fn find(&self, date: NaiveDate) -> Option<&ProductionRow> {
        self.rows.iter().find(|r| r.date == date)
    }

    pub fn known_dates(&self) -> BTreeSet<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

pub fn load_rows<P: AsRef<Path>>(
    path: P,
    process: ProcessType,
    cfg: &PlantConfig,
) -> Result<(ProductionData, LoadReport)> {
    let file = std::fs::File::open(path.as_ref())?;
    info!(path = %path.as_ref().display(), %process, "reading production sheet");
    load_from_reader(file, process, cfg)
}

/// Read a CSV export of the production sheet: `cfg.skip_rows` title rows,
/// one header row, then one row per production day.
pub fn load_from_reader<R: Read>(
    reader: R,
    process: ProcessType,
    cfg: &PlantConfig,
) -> Result<(ProductionData, LoadReport)> {
    let layout = &cfg.profile(process).layout;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records().skip(cfg.skip_rows);
    let annotation_col = match records.next() {
        Some(header) => find_annotation_column(&header?),
        None => None,
    };
    if annotation_col.is_none() && !layout.end_sentinels.is_empty() {
        warn!(%process, "sheet has no comments column, past-midnight end times cannot be recovered");
    }

    let mut total_rows = 0usize;
    let mut skipped_rows = 0usize;
    let mut annotated_rows = 0usize;
    let mut rows = Vec::new();

    for result in records {
        let record = result?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        total_rows += 1;

        let Some(date) = parse_date_safe(record.get(layout.date)) else {
            debug!(row = total_rows, value = ?record.get(layout.date), "no date key, skipping");
            skipped_rows += 1;
            continue;
        };
        let annotation = annotation_col
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if annotation.is_some() {
            annotated_rows += 1;
        }
        rows.push(project_row(layout, date, &record, annotation));
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        skipped_rows,
        annotated_rows,
    };
    info!(?report, "sheet loaded");
    Ok((ProductionData { process, rows }, report))
}

fn find_annotation_column(header: &StringRecord) -> Option<usize> {
    header
        .iter()
        .position(|h| ANNOTATION_HEADERS.contains(&h.trim().to_lowercase().as_str()))
}

/// Build the named-field row from the layout's column positions. Stoppage
/// cells are read as minutes; blanks count as zero.
pub fn project_row(
    layout: &RowLayout,
    date: NaiveDate,
    record: &StringRecord,
    annotation: Option<String>,
) -> ProductionRow {
    let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();
    let stoppage = layout
        .stoppage
        .iter()
        .map(|range| StoppageBlock {
            minutes: (range.start..range.end)
                .map(|i| {
                    let raw = record.get(i).unwrap_or("");
                    parse_f64_safe(Some(raw)).unwrap_or_else(|| {
                        if !raw.trim().is_empty() {
                            warn!(%date, column = i, value = raw, "stoppage cell is not a number, counted as 0");
                        }
                        0.0
                    })
                })
                .collect(),
            divisor: range.divisor,
        })
        .collect();
    ProductionRow {
        date,
        start: cell(layout.start),
        end: cell(layout.end),
        units: cell(layout.units),
        stoppage,
        annotation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::compute_stoppage;

    /// A carcass sheet line with `width` columns, all blank except the given
    /// ones.
    fn line(width: usize, cells: &[(usize, &str)]) -> String {
        let mut v = vec![String::new(); width];
        for (i, s) in cells {
            v[*i] = s.to_string();
        }
        v.join(",")
    }

    fn carcass_sheet() -> String {
        let width = 53;
        let mut header = line(width, &[(0, "Dato"), (2, "Start"), (3, "Slutt"), (5, "Antall")]);
        header.push_str(",comments");
        let mut stoppage: Vec<(usize, &str)> = vec![(0, "2024-07-31 00:00:00"), (2, "06:00:00"), (3, "23:59:00"), (5, "120000")];
        stoppage.extend((27..31).map(|i| (i, "1")));
        stoppage.extend((34..40).map(|i| (i, "6")));
        stoppage.extend((40..51).map(|i| (i, "2")));
        let mut day1 = line(width, &stoppage);
        day1.push_str(",0030");
        let mut day2 = line(width, &[(0, "2024-08-01 00:00:00"), (2, "06:00:00"), (3, "14:00:00"), (5, "50000")]);
        day2.push(',');
        let mut dup = line(width, &[(0, "2024-07-31 00:00:00"), (2, "07:00:00"), (3, "08:00:00")]);
        dup.push(',');
        [
            "Produksjon slakt".to_string(),
            "Uke 31".to_string(),
            header,
            day1,
            day2,
            line(width, &[(0, "Sum"), (5, "170000")]),
            dup,
        ]
        .join("\n")
    }

    #[test]
    fn loads_rows_after_title_lines() {
        let cfg = PlantConfig::default();
        let (data, report) =
            load_from_reader(carcass_sheet().as_bytes(), ProcessType::Carcass, &cfg).unwrap();
        assert_eq!(report.loaded_rows, 3);
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.annotated_rows, 1);

        let day = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
        let row = data.find(day).unwrap();
        assert_eq!(row.start, "06:00:00");
        assert_eq!(row.units, "120000");
        assert_eq!(row.annotation.as_deref(), Some("0030"));
        assert_eq!(compute_stoppage(row), 32.0);
        assert_eq!(data.known_dates().len(), 2);
    }

    #[test]
    fn short_rows_read_blank_cells() {
        let cfg = PlantConfig::default();
        let csv = "title\nsubtitle\nDato,x,Start,Slutt\n2024-07-30,,06:00,14:00\n";
        let (data, _) = load_from_reader(csv.as_bytes(), ProcessType::Carcass, &cfg).unwrap();
        let row = &data.rows[0];
        assert_eq!(row.units, "");
        assert_eq!(row.annotation, None);
        assert_eq!(compute_stoppage(row), 0.0);
    }

    #[test]
    fn fillet_layout_reads_its_own_columns() {
        let cfg = PlantConfig::default();
        let mut cells: Vec<(usize, &str)> =
            vec![(0, "2024-07-30"), (6, "07:00:00"), (7, "15:00:00"), (12, "9600")];
        cells.extend((32..52).map(|i| (i, "1")));
        let csv = format!("a\nb\n{}\n{}\n", line(52, &[(0, "Dato")]), line(52, &cells));
        let (data, report) = load_from_reader(csv.as_bytes(), ProcessType::Fillet, &cfg).unwrap();
        assert_eq!(report.loaded_rows, 1);
        let row = &data.rows[0];
        assert_eq!((row.start.as_str(), row.end.as_str()), ("07:00:00", "15:00:00"));
        assert_eq!(row.units, "9600");
        assert_eq!(compute_stoppage(row), 20.0);
    }
}
