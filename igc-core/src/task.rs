//! Task declaration (C record) block decoding.
//!
//! A task declaration spans a variable number of lines: the declaration
//! line, whose chars 24-25 hold the turnpoint count N, followed by exactly
//! 4 + N waypoint lines (takeoff, start, N turnpoints, finish, landing).
//! The sub-parser consumes the whole block itself and reports how many
//! lines it took, so the driver never re-dispatches the waypoint lines.
//!
//! The two date fields on the declaration line are the only lenient fields
//! in the format: a malformed date is stored as `None` and parsing goes on.
//! Everything else in the block is fatal on failure.

use crate::coord;
use crate::parse::ensure_ascii;
use crate::types::{IgcError, Result, Task, TaskPoint};

/// Decode the task block starting at `lines[0]`.
///
/// Returns the decoded task and the number of lines consumed (5 + N).
/// The driver has already checked the declaration line's base length.
pub(crate) fn decode_task(lines: &[&str]) -> Result<(Task, usize)> {
    let line = lines[0];

    let n_tp: usize = line[23..25].parse().map_err(|_| IgcError::InvalidField {
        field: "turnpoint count",
        line: line.to_string(),
    })?;
    if lines.len() < 5 + n_tp {
        return Err(IgcError::StructuralMismatch {
            reason: "task block line count does not match turnpoint count",
            line: line.to_string(),
        });
    }

    let mut task = Task {
        declaration_date: coord::parse_datetime(&line[1..13]).ok(),
        flight_date: coord::parse_date(&line[13..19]).ok(),
        ..Task::default()
    };
    task.number = line[19..23].parse().map_err(|_| IgcError::InvalidField {
        field: "task number",
        line: line.to_string(),
    })?;
    task.description = line[25..].to_string();

    task.takeoff = decode_task_point(lines[1])?;
    task.start = decode_task_point(lines[2])?;
    for i in 0..n_tp {
        task.turnpoints.push(decode_task_point(lines[3 + i])?);
    }
    task.finish = decode_task_point(lines[3 + n_tp])?;
    task.landing = decode_task_point(lines[4 + n_tp])?;

    Ok((task, 5 + n_tp))
}

/// Decode one waypoint line: latitude, longitude, trailing description.
fn decode_task_point(line: &str) -> Result<TaskPoint> {
    ensure_ascii(line)?;
    if line.len() < 18 {
        return Err(IgcError::LineTooShort(line.to_string()));
    }
    Ok(TaskPoint {
        latitude: coord::dmd_to_decimal(&line[1..9]),
        longitude: coord::dmd_to_decimal(&line[9..18]),
        description: line[18..].to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
