//! Import shim for the legacy split date/time format.
//!
//! Older exports store every instant as two text columns, `YYYY-MM-DD` and
//! `HH:MM:SS`, in the plant's local time. Everything past this module works
//! with a single UTC [`Timestamp`].

use chrono::{FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::Deserialize;

use crate::category::StoppageCategory;
use crate::error::CoreError;
use crate::production::timing::{elapsed_seconds, run_metrics};
use crate::types::{MachineId, Matricula, Timestamp};

pub const LEGACY_DATE_FORMAT: &str = "%Y-%m-%d";
pub const LEGACY_TIME_FORMAT: &str = "%H:%M:%S";

/// Combine a legacy date and time pair into one instant.
///
/// `offset` is the plant's UTC offset at the time the row was written.
pub fn parse_legacy_instant(
    date: &str,
    time: &str,
    offset: FixedOffset,
) -> Result<Timestamp, CoreError> {
    let day = NaiveDate::parse_from_str(date.trim(), LEGACY_DATE_FORMAT)
        .map_err(|e| CoreError::MalformedTimestamp(format!("date '{date}': {e}")))?;
    let clock = NaiveTime::parse_from_str(time.trim(), LEGACY_TIME_FORMAT)
        .map_err(|e| CoreError::MalformedTimestamp(format!("time '{time}': {e}")))?;
    offset
        .from_local_datetime(&day.and_time(clock))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| CoreError::MalformedTimestamp(format!("'{date} {time}' is ambiguous")))
}

/// Seconds from a legacy split start to `end`, reading the start as UTC.
pub fn compute_elapsed(start_date: &str, start_time: &str, end: Timestamp) -> Result<i64, CoreError> {
    compute_elapsed_with_offset(start_date, start_time, end, utc_offset())
}

pub fn compute_elapsed_with_offset(
    start_date: &str,
    start_time: &str,
    end: Timestamp,
    offset: FixedOffset,
) -> Result<i64, CoreError> {
    let start = parse_legacy_instant(start_date, start_time, offset)?;
    elapsed_seconds(start, end)
}

/// Build a fixed offset from minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, CoreError> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt).ok_or_else(|| {
        CoreError::Validation(format!("UTC offset of {minutes} minutes is out of range"))
    })
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse an optional end pair; both halves must be present or both absent.
fn parse_optional_end(
    date: Option<&str>,
    time: Option<&str>,
    offset: FixedOffset,
) -> Result<Option<Timestamp>, CoreError> {
    match (date, time) {
        (None, None) => Ok(None),
        (Some(d), Some(t)) => parse_legacy_instant(d, t, offset).map(Some),
        _ => Err(CoreError::MalformedTimestamp(
            "end date and end time must both be set or both be empty".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Legacy rows
// ---------------------------------------------------------------------------

/// One `atividades` row as exported by the legacy system.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRunRow {
    pub id_maquina: String,
    pub data_inicio: String,
    pub hora_inicio: String,
    pub data_fim: Option<String>,
    pub hora_fim: Option<String>,
    pub operador_inicio: String,
    pub operador_fim: Option<String>,
    pub ciclos_realizados: Option<i32>,
}

/// A run converted to the single-instant representation, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRun {
    pub machine_id: MachineId,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub start_operator: Matricula,
    pub end_operator: Option<Matricula>,
    pub cycle_count: Option<i32>,
    pub total_seconds: Option<i64>,
    pub average_cycle_seconds: Option<f64>,
}

impl LegacyRunRow {
    pub fn convert(&self, offset: FixedOffset) -> Result<ImportedRun, CoreError> {
        let started_at = parse_legacy_instant(&self.data_inicio, &self.hora_inicio, offset)?;
        let ended_at =
            parse_optional_end(self.data_fim.as_deref(), self.hora_fim.as_deref(), offset)?;

        let (total_seconds, average_cycle_seconds) = match ended_at {
            Some(end) => {
                let metrics = run_metrics(started_at, end, self.ciclos_realizados)?;
                (Some(metrics.total_seconds), metrics.average_cycle_seconds)
            }
            None => (None, None),
        };

        Ok(ImportedRun {
            machine_id: self.id_maquina.trim().to_string(),
            started_at,
            ended_at,
            start_operator: self.operador_inicio.trim().to_string(),
            end_operator: self.operador_fim.as_ref().map(|s| s.trim().to_string()),
            cycle_count: self.ciclos_realizados,
            total_seconds,
            average_cycle_seconds,
        })
    }
}

/// One `paradas` row as exported by the legacy system.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyStoppageRow {
    pub id_maquina: String,
    pub tipo_parada: String,
    pub data_inicio: String,
    pub hora_inicio: String,
    pub data_fim: Option<String>,
    pub hora_fim: Option<String>,
    pub operador_inicio: String,
    pub operador_fim: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedStoppage {
    pub machine_id: MachineId,
    pub category: StoppageCategory,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub start_operator: Matricula,
    pub end_operator: Option<Matricula>,
    pub total_seconds: Option<i64>,
}

impl LegacyStoppageRow {
    /// Historical categories are kept verbatim even if the current catalog
    /// no longer lists them; only blank labels are refused.
    pub fn convert(&self, offset: FixedOffset) -> Result<ImportedStoppage, CoreError> {
        let label = self.tipo_parada.trim();
        if label.is_empty() {
            return Err(CoreError::Validation(
                "Stoppage category must not be empty".into(),
            ));
        }
        let started_at = parse_legacy_instant(&self.data_inicio, &self.hora_inicio, offset)?;
        let ended_at =
            parse_optional_end(self.data_fim.as_deref(), self.hora_fim.as_deref(), offset)?;
        let total_seconds = ended_at
            .map(|end| elapsed_seconds(started_at, end))
            .transpose()?;

        Ok(ImportedStoppage {
            machine_id: self.id_maquina.trim().to_string(),
            category: StoppageCategory::from_stored(label),
            started_at,
            ended_at,
            start_operator: self.operador_inicio.trim().to_string(),
            end_operator: self.operador_fim.as_ref().map(|s| s.trim().to_string()),
            total_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::DateTime;

    use super::*;

    fn utc(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn legacy_round_trip_elapsed() {
        let end = utc("2024-05-01T09:30:00Z");
        assert_eq!(compute_elapsed("2024-05-01", "08:00:00", end).unwrap(), 5400);
    }

    #[test]
    fn offset_shifts_to_utc() {
        let brt = offset_from_minutes(-180).unwrap();
        let ts = parse_legacy_instant("2024-05-01", "08:00:00", brt).unwrap();
        assert_eq!(ts, utc("2024-05-01T11:00:00Z"));
    }

    #[test]
    fn malformed_date_reported() {
        let err = compute_elapsed("01/05/2024", "08:00:00", Utc::now()).unwrap_err();
        assert_matches!(err, CoreError::MalformedTimestamp(msg) if msg.contains("01/05/2024"));
    }

    #[test]
    fn malformed_time_reported() {
        let err = parse_legacy_instant("2024-05-01", "8h", utc_offset()).unwrap_err();
        assert_matches!(err, CoreError::MalformedTimestamp(_));
    }

    #[test]
    fn out_of_range_offset_rejected() {
        assert!(offset_from_minutes(24 * 60).is_err());
    }

    fn run_row() -> LegacyRunRow {
        LegacyRunRow {
            id_maquina: " INJ-01 ".into(),
            data_inicio: "2024-05-01".into(),
            hora_inicio: "08:00:00".into(),
            data_fim: Some("2024-05-01".into()),
            hora_fim: Some("09:30:00".into()),
            operador_inicio: "000123".into(),
            operador_fim: Some("000456".into()),
            ciclos_realizados: Some(90),
        }
    }

    #[test]
    fn closed_run_row_gets_metrics() {
        let run = run_row().convert(utc_offset()).unwrap();
        assert_eq!(run.machine_id, "INJ-01");
        assert_eq!(run.total_seconds, Some(5400));
        assert_eq!(run.average_cycle_seconds, Some(60.0));
        assert_eq!(run.end_operator.as_deref(), Some("000456"));
    }

    #[test]
    fn open_run_row_has_no_metrics() {
        let mut row = run_row();
        row.data_fim = None;
        row.hora_fim = None;
        let run = row.convert(utc_offset()).unwrap();
        assert!(run.ended_at.is_none());
        assert!(run.total_seconds.is_none());
        assert!(run.average_cycle_seconds.is_none());
    }

    #[test]
    fn half_end_pair_is_malformed() {
        let mut row = run_row();
        row.hora_fim = None;
        assert_matches!(
            row.convert(utc_offset()),
            Err(CoreError::MalformedTimestamp(_))
        );
    }

    #[test]
    fn stoppage_row_keeps_historical_category() {
        let row = LegacyStoppageRow {
            id_maquina: "INJ-01".into(),
            tipo_parada: "Energia".into(),
            data_inicio: "2024-05-01".into(),
            hora_inicio: "10:00:00".into(),
            data_fim: Some("2024-05-01".into()),
            hora_fim: Some("10:20:00".into()),
            operador_inicio: "000123".into(),
            operador_fim: None,
        };
        let stoppage = row.convert(utc_offset()).unwrap();
        assert_eq!(stoppage.category.as_str(), "Energia");
        assert_eq!(stoppage.total_seconds, Some(1200));
    }

    #[test]
    fn stoppage_row_with_blank_category_rejected() {
        let row = LegacyStoppageRow {
            id_maquina: "INJ-01".into(),
            tipo_parada: "  ".into(),
            data_inicio: "2024-05-01".into(),
            hora_inicio: "10:00:00".into(),
            data_fim: None,
            hora_fim: None,
            operador_inicio: "000123".into(),
            operador_fim: None,
        };
        assert_matches!(row.convert(utc_offset()), Err(CoreError::Validation(_)));
    }
}
