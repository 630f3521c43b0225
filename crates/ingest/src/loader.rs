use crate::error::IngestError;
use crate::table::RawTable;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use configuration::ColumnOverrides;
use core_types::{ColumnMapping, ColumnRole, Observation, Series};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
];

// Slash dates are read day-first.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// The output of [`normalize`]: the clean series plus what was thrown away.
#[derive(Debug)]
pub struct NormalizedSeries {
    pub series: Series,
    /// One `IngestError::Parse` per skipped row.
    pub skipped: Vec<IngestError>,
    /// Rows dropped because an earlier row had the same timestamp.
    pub duplicates_dropped: usize,
}

/// Parses a timestamp cell. Date-only values land on midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Parses a numeric cell exported from a spreadsheet.
///
/// Currency signs, underscores and spaces are ignored. When both `,` and `.`
/// appear, whichever comes last is the decimal point and the other groups
/// thousands (`1,234.5`, `1.234,5`). A lone comma followed by exactly three
/// digits groups thousands (`43,210`); any other lone comma is a decimal
/// comma (`0,25`). Repeated separators of one kind always group thousands.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$' && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (None, None) => cleaned,
        (Some(comma), Some(dot)) if dot > comma => cleaned.replace(',', ""),
        (Some(_), Some(_)) => cleaned.replace('.', "").replace(',', "."),
        (Some(comma), None) => {
            let grouped = cleaned.matches(',').count() > 1 || cleaned.len() - comma - 1 == 3;
            if grouped {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        (None, Some(_)) => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Builds a sorted, de-duplicated `Series` from a raw table.
///
/// Rows with an unparsable timestamp or price are skipped and reported in
/// `NormalizedSeries::skipped`. Unparsable optional cells only blank that field.
/// For duplicate timestamps the first row in input order is kept.
pub fn normalize(
    table: &RawTable,
    columns: &ColumnOverrides,
    mapping: &ColumnMapping,
) -> Result<NormalizedSeries, IngestError> {
    let timestamp_idx = table
        .column_index(&columns.timestamp_column)
        .ok_or_else(|| IngestError::MissingColumn(columns.timestamp_column.clone()))?;
    let price_idx = table
        .column_index(&columns.price_column)
        .ok_or_else(|| IngestError::MissingColumn(columns.price_column.clone()))?;

    let optional: Vec<(ColumnRole, usize)> = ColumnRole::ALL
        .into_iter()
        .filter_map(|role| {
            let column = mapping.get(role)?;
            table.column_index(column).map(|idx| (role, idx))
        })
        .collect();

    let mut skipped = Vec::new();
    let mut observations = Vec::with_capacity(table.rows.len());

    for row in 0..table.rows.len() {
        // 1-based, counting the header line, to match what a user sees in the file.
        let line = row + 2;

        let raw_timestamp = table.cell(row, timestamp_idx).unwrap_or_default();
        let Some(timestamp) = parse_timestamp(raw_timestamp) else {
            skipped.push(IngestError::Parse {
                row: line,
                reason: format!("unparsable timestamp '{raw_timestamp}'"),
            });
            continue;
        };

        let raw_price = table.cell(row, price_idx).unwrap_or_default();
        let observation = match parse_number(raw_price).map(|p| Observation::new(timestamp, p)) {
            Some(Ok(observation)) => observation,
            Some(Err(e)) => {
                skipped.push(IngestError::Parse {
                    row: line,
                    reason: e.to_string(),
                });
                continue;
            }
            None => {
                skipped.push(IngestError::Parse {
                    row: line,
                    reason: format!("unparsable price '{raw_price}'"),
                });
                continue;
            }
        };

        let observation = optional.iter().fold(observation, |obs, (role, idx)| {
            match table.cell(row, *idx).and_then(parse_number) {
                Some(value) => match role {
                    ColumnRole::MarketCap => obs.with_market_cap(value),
                    ColumnRole::Supply => obs.with_supply(value),
                    ColumnRole::Ratio => obs.with_ratio(value),
                },
                None => obs,
            }
        });

        observations.push(observation);
    }

    // Stable sort keeps input order among equal timestamps, so dedup keeps the first.
    observations.sort_by_key(|o| o.timestamp);
    let before = observations.len();
    observations.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
    let duplicates_dropped = before - observations.len();

    if !skipped.is_empty() {
        tracing::warn!(skipped = skipped.len(), "Skipped unparsable rows during normalization");
    }
    if duplicates_dropped > 0 {
        tracing::warn!(duplicates_dropped, "Dropped rows with duplicate timestamps");
    }

    if observations.is_empty() {
        return Err(IngestError::EmptySeries("normalization".to_string()));
    }

    let series = Series::new(observations)?;
    tracing::debug!(observations = series.len(), "Series normalized");

    Ok(NormalizedSeries {
        series,
        skipped,
        duplicates_dropped,
    })
}

/// The cutoff for a trailing window of `days` ending at `now`.
///
/// Plain day arithmetic: four years is `4 * 365` days, leap days are not counted.
pub fn trailing_window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Keeps observations strictly after `since`.
pub fn window_filter(series: &Series, since: DateTime<Utc>) -> Result<Series, IngestError> {
    let windowed = series.since(since);
    if windowed.is_empty() {
        return Err(IngestError::EmptySeries(format!("window filter since {since}")));
    }
    tracing::debug!(
        kept = windowed.len(),
        dropped = series.len() - windowed.len(),
        "Applied trailing window"
    );
    Ok(windowed)
}
