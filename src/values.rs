use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, info};
use rust_decimal::Decimal;

use crate::combinations::checked_sum;
use crate::error::Error;
use crate::search::Cover;
use crate::tolerance::Tolerance;

/// Reads a headerless delimited file holding one number per row (first column).
/// Blank rows are skipped.
pub fn read_values(path: &Path) -> Result<Vec<Decimal>, Error> {
    let name = path.display().to_string();
    info!("Reading {}", name);

    let load_error = |source| Error::Load {
        path: name.clone(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(load_error)?;

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(load_error)?;
        let Some(field) = record.get(0).filter(|f| !f.is_empty()) else {
            continue; // Skip blank rows
        };
        let value = field.parse::<Decimal>().map_err(|_| Error::Parse {
            path: name.clone(),
            row: row + 1,
            text: field.to_string(),
        })?;
        values.push(value);
    }

    debug!("Read {} values from {}", values.len(), name);
    Ok(values)
}

/// Writes one row per group, the group's values as the row's fields.
pub fn write_cover(path: &Path, cover: &Cover) -> Result<(), Error> {
    let name = path.display().to_string();
    let export_error = |source| Error::Export {
        path: name.clone(),
        source,
    };

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(export_error)?;
    for group in cover {
        writer
            .write_record(group.iter().map(|v| v.to_string()))
            .map_err(export_error)?;
    }
    writer.flush()?;

    debug!("Exported {} groups to {}", cover.len(), name);
    Ok(())
}

/// Checks that a cover can exist at all: both lists non-empty and
/// |sum(candidates) - sum(targets)| <= len(targets) * tolerance.
pub fn check_balance(
    candidates: &[Decimal],
    targets: &[Decimal],
    tolerance: Tolerance,
) -> Result<(), Error> {
    if candidates.is_empty() {
        return Err(Error::EmptyCandidates);
    }
    if targets.is_empty() {
        return Err(Error::EmptyTargets);
    }

    let input = checked_sum(candidates).ok_or(Error::Overflow("input sum"))?;
    let target = checked_sum(targets).ok_or(Error::Overflow("target sum"))?;
    let slack = tolerance.slack(targets.len());
    let gap = input
        .checked_sub(target)
        .ok_or(Error::Overflow("input and target difference"))?;
    if gap.abs() > slack {
        return Err(Error::SumMismatch {
            input,
            target,
            slack,
        });
    }
    Ok(())
}
