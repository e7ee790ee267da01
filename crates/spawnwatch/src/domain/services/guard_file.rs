//! Guard File - Line-based guard exchange format
//!
//! ```text
//! # name, class, CD, CR, DR, ER, FL, HR, MA, OQ, PE, SR, UT, threshold, alarm, accept_no_stats, notes
//! Good steel, steel, 0, 0, 0, 0, 0, 0, 0, 900, 0, 0, 0, 0, true, false, for weapons
//! ```
//!
//! A `#` line listing all eleven stats sets the column order; without one
//! the alphabetical order applies. Threshold 0 makes a filter guard whose
//! stat columns are minimums, anything else a weights guard. Thresholds up to
//! 102 come from the old 0-100 scale and are multiplied by ten; export writes
//! low weights thresholds back on that scale.

use std::collections::HashSet;

use crate::domain::entities::{Guard, GuardLogic};
use crate::domain::errors::{DomainError, GuardParseError};
use crate::domain::value_objects::{Stat, StatValues};
use crate::ports::ResourceCatalog;

const LEGACY_THRESHOLD_MAX: u16 = Guard::LEGACY_THRESHOLD_MAX;
const FIXED_FIELDS: usize = 2 + Stat::COUNT + 2;

/// Parsed guards and rejected lines
#[derive(Debug, Clone, Default)]
pub struct GuardImport {
    pub guards: Vec<Guard>,
    pub errors: Vec<GuardParseError>,
}

impl GuardImport {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Parse a guard file; bad lines are recorded and skipped
pub fn parse(text: &str, catalog: &dyn ResourceCatalog) -> GuardImport {
    let mut import = GuardImport::default();
    let mut order = Stat::ALL;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            if let Some(parsed) = parse_header(header) {
                order = parsed;
            }
            continue;
        }
        match parse_line(line, &order, catalog) {
            Ok(guard) => import.guards.push(guard),
            Err(message) => {
                tracing::debug!(line = line_no, %message, "Rejected guard line");
                import.errors.push(GuardParseError {
                    line: line_no,
                    message,
                });
            }
        }
    }

    if !import.errors.is_empty() {
        tracing::warn!(
            "Guard import finished with {} errors ({} guards read)",
            import.errors.len(),
            import.guards.len()
        );
    }
    import
}

fn parse_header(header: &str) -> Option<[Stat; Stat::COUNT]> {
    let stats: Vec<Stat> = header
        .split(',')
        .filter_map(|token| token.parse::<Stat>().ok())
        .collect();
    let distinct: HashSet<Stat> = stats.iter().copied().collect();
    if stats.len() != Stat::COUNT || distinct.len() != Stat::COUNT {
        return None;
    }
    let mut order = Stat::ALL;
    order.copy_from_slice(&stats);
    Some(order)
}

fn parse_line(
    line: &str,
    order: &[Stat; Stat::COUNT],
    catalog: &dyn ResourceCatalog,
) -> Result<Guard, String> {
    let fields: Vec<&str> = line.splitn(FIXED_FIELDS + 2, ',').map(str::trim).collect();
    if fields.len() < FIXED_FIELDS {
        return Err(format!(
            "expected at least {} fields, found {}",
            FIXED_FIELDS,
            fields.len()
        ));
    }

    let name = fields[0];
    let class = catalog
        .resource_class(fields[1])
        .ok_or_else(|| format!("unknown resource class '{}'", fields[1]))?;

    let mut values = StatValues::new();
    for (stat, field) in order.iter().zip(&fields[2..2 + Stat::COUNT]) {
        let value = parse_number(field, stat.abbreviation())?;
        if value > StatValues::MAX_VALUE {
            return Err(format!("{} value {} exceeds 1000", stat, value));
        }
        values.set(*stat, value);
    }

    let mut threshold = parse_number(fields[2 + Stat::COUNT], "threshold")?;
    if (1..=LEGACY_THRESHOLD_MAX).contains(&threshold) {
        threshold *= 10;
    }
    let use_alarm = parse_flag(fields[3 + Stat::COUNT], "alarm")?;
    let accept_no_stats = match fields.get(FIXED_FIELDS) {
        Some(field) if !field.is_empty() => parse_flag(field, "accept_no_stats")?,
        _ => false,
    };
    let notes = fields.get(FIXED_FIELDS + 1).copied().unwrap_or_default();

    let guard = if threshold == 0 {
        Guard::filter(name, class, values)
    } else {
        Guard::weights(name, class, values, threshold)
    }
    .map_err(|e| e.to_string())?;

    Ok(guard
        .with_alarm(use_alarm)
        .with_accept_no_stats(accept_no_stats)
        .with_notes(notes))
}

fn parse_number(field: &str, label: &str) -> Result<u16, String> {
    if field.is_empty() {
        return Ok(0);
    }
    field
        .parse::<u16>()
        .map_err(|_| format!("{} is not a number: '{}'", label, field))
}

fn parse_flag(field: &str, label: &str) -> Result<bool, String> {
    match field.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(format!("{} is not a flag: '{}'", label, field)),
    }
}

/// Write guards with a header in the default column order
///
/// Fails on a guard that would not read back as itself: a name starting
/// with `#`, or a weights threshold the file cannot carry.
pub fn export(guards: &[Guard]) -> Result<String, DomainError> {
    let stat_columns: Vec<&str> = Stat::ALL.iter().map(|s| s.abbreviation()).collect();
    let mut out = format!(
        "# name, class, {}, threshold, alarm, accept_no_stats, notes\n",
        stat_columns.join(", ")
    );

    for guard in guards {
        let (values, threshold) = match &guard.logic {
            GuardLogic::Filter(values) => (values, 0),
            GuardLogic::Weights(values) => (values, file_threshold(guard)?),
        };
        if guard.name.trim_start().starts_with('#') {
            return Err(DomainError::validation(format!(
                "Guard '{}' would be read back as a comment",
                guard.name
            )));
        }
        let stats: Vec<String> = Stat::ALL
            .iter()
            .map(|stat| values.get(*stat).to_string())
            .collect();
        out.push_str(&format!(
            "{}, {}, {}, {}, {}, {}, {}\n",
            guard.name.replace(',', ";").replace(['\n', '\r'], " "),
            guard.class.token,
            stats.join(", "),
            threshold,
            guard.use_alarm,
            guard.accept_no_stats,
            guard.notes.replace(['\n', '\r'], " ")
        ));
    }
    Ok(out)
}

fn file_threshold(guard: &Guard) -> Result<u16, DomainError> {
    if !Guard::is_weights_threshold(guard.threshold) {
        return Err(DomainError::validation(format!(
            "Guard '{}' threshold {} cannot be written to a guard file",
            guard.name, guard.threshold
        )));
    }
    if guard.threshold <= LEGACY_THRESHOLD_MAX {
        Ok(guard.threshold / 10)
    } else {
        Ok(guard.threshold)
    }
}
