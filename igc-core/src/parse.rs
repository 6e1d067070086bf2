//! Parser driver and single-line record decoders.
//!
//! Responsibilities:
//! - Split the input buffer into trimmed lines, skipping blanks
//! - Dispatch on the leading tag character via `RECORD_TABLE`
//! - Enforce each kind's minimum line length before any slicing
//! - Thread the per-parse extension schemas (I/J) into the fix and
//!   periodic-data decoders
//! - Stop at the first structurally invalid record
//!
//! The task declaration (C) is the only multi-line record; its block is
//! handed to the sub-parser in `task`, which reports how many lines it
//! consumed so the driver never re-dispatches waypoint lines.

use std::collections::HashMap;

use chrono::FixedOffset;

use crate::coord;
use crate::task;
use crate::types::{
    record_info, FieldDef, FixValidity, Flight, IgcError, LogEntry, Point, Result,
};

/// Parse a complete IGC log into a `Flight`.
///
/// Fail-fast: the first malformed record aborts the parse and the error
/// carries the offending line. Use [`parse_partial`] to also get whatever
/// was accumulated before the failure.
pub fn parse(content: &str) -> Result<Flight> {
    let (flight, err) = parse_partial(content);
    match err {
        Some(err) => Err(err),
        None => Ok(flight),
    }
}

/// Parse a complete IGC log, returning the partial aggregate together with
/// the first error (if any). No resynchronization is attempted; records
/// after the failing line are never decoded.
pub fn parse_partial(content: &str) -> (Flight, Option<IgcError>) {
    let mut flight = Flight::new();
    let mut parser = IgcParser::default();

    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].is_empty() {
            i += 1;
            continue;
        }
        match parser.decode_record(&lines, i, &mut flight) {
            Ok(consumed) => i += consumed,
            Err(err) => return (flight, Some(err)),
        }
    }

    (flight, None)
}

// ---------------------------------------------------------------------------
// Parser state
// ---------------------------------------------------------------------------

/// Mutable state scoped to a single parse: the two extension-field schema
/// tables, the task-seen latch, and the running satellite count. Never
/// shared across parses.
#[derive(Debug, Default)]
struct IgcParser {
    /// I declarations, consumed by B records.
    fix_fields: Vec<FieldDef>,
    /// J declarations, consumed by K records. Same encoding as `fix_fields`
    /// but a separate table; the two must not be conflated.
    periodic_fields: Vec<FieldDef>,
    /// Only the first task declaration is honored.
    task_done: bool,
    /// From the most recent F record, attached to every following fix.
    num_satellites: usize,
}

impl IgcParser {
    /// Decode the record starting at `lines[i]`, returning how many lines
    /// it consumed (1 for everything but the task block).
    fn decode_record(&mut self, lines: &[&str], i: usize, flight: &mut Flight) -> Result<usize> {
        let line = lines[i];
        ensure_ascii(line)?;

        let tag = line.as_bytes()[0] as char;
        let info = record_info(tag).ok_or_else(|| IgcError::UnknownRecord(line.to_string()))?;

        // Stray C lines after the first completed task block are skipped
        // before any length check; they can be arbitrarily short.
        if tag == 'C' && self.task_done {
            return Ok(1);
        }
        if line.len() < info.min_len {
            return Err(too_short(line));
        }

        match tag {
            'A' => self.decode_recorder_info(line, flight)?,
            'B' => self.decode_fix(line, flight)?,
            'C' => {
                let (decoded, consumed) = task::decode_task(&lines[i..])?;
                flight.task = decoded;
                self.task_done = true;
                return Ok(consumed);
            }
            'D' => self.decode_dgps(line, flight)?,
            'E' => self.decode_event(line, flight)?,
            'F' => self.decode_satellites(line, flight)?,
            'G' => flight.signature.push_str(&line[1..]),
            'H' => self.decode_header(line, flight)?,
            'I' => {
                let defs = decode_declarations(line)?;
                self.fix_fields.extend(defs);
            }
            'J' => {
                let defs = decode_declarations(line)?;
                self.periodic_fields.extend(defs);
            }
            'K' => self.decode_periodic(line, flight)?,
            'L' => self.decode_logbook(line, flight)?,
            _ => return Err(IgcError::UnknownRecord(line.to_string())),
        }
        Ok(1)
    }

    /// A record: manufacturer code, unit ID, free-form extra data.
    fn decode_recorder_info(&self, line: &str, flight: &mut Flight) -> Result<()> {
        flight.header.manufacturer = line[1..4].to_string();
        flight.header.unique_id = line[4..7].to_string();
        flight.header.additional_data = line[7..].to_string();
        Ok(())
    }

    /// B record: one GNSS fix.
    fn decode_fix(&self, line: &str, flight: &mut Flight) -> Result<()> {
        let time = coord::parse_time(&line[1..7]).map_err(|_| invalid("fix time", line))?;
        let validity = FixValidity::from_char(line.as_bytes()[24] as char)
            .ok_or_else(|| invalid("fix validity", line))?;

        flight.points.push(Point {
            time,
            latitude: coord::dmd_to_decimal(&line[7..15]),
            longitude: coord::dmd_to_decimal(&line[15..24]),
            validity,
            pressure_altitude: line[25..30]
                .parse()
                .map_err(|_| invalid("pressure altitude", line))?,
            gnss_altitude: line[30..35]
                .parse()
                .map_err(|_| invalid("GNSS altitude", line))?,
            extensions: extract_extensions(&self.fix_fields, line)?,
            num_satellites: self.num_satellites,
        });
        Ok(())
    }

    /// D record: differential-GPS station ID, present when the mode
    /// character is '2'.
    fn decode_dgps(&self, line: &str, flight: &mut Flight) -> Result<()> {
        if line.as_bytes()[1] == b'2' {
            flight.dgps_station_id = line[2..6].to_string();
        }
        Ok(())
    }

    /// E record: timestamped three-letter event code plus free text.
    fn decode_event(&self, line: &str, flight: &mut Flight) -> Result<()> {
        let time = coord::parse_time(&line[1..7]).map_err(|_| invalid("event time", line))?;
        flight
            .events
            .entry(time)
            .or_default()
            .insert(line[7..10].to_string(), line[10..].to_string());
        Ok(())
    }

    /// F record: the satellite constellation in view. The resulting count
    /// becomes the running count attached to subsequent fixes.
    fn decode_satellites(&mut self, line: &str, flight: &mut Flight) -> Result<()> {
        let time = coord::parse_time(&line[1..7]).map_err(|_| invalid("satellite time", line))?;

        let rest = &line[7..];
        if rest.len() % 2 != 0 {
            return Err(IgcError::StructuralMismatch {
                reason: "satellite id list has an odd number of digits",
                line: line.to_string(),
            });
        }

        let ids = flight.satellites.entry(time).or_default();
        for idx in (0..rest.len()).step_by(2) {
            let id: u32 = rest[idx..idx + 2]
                .parse()
                .map_err(|_| invalid("satellite id", line))?;
            ids.push(id);
        }
        self.num_satellites = ids.len();
        Ok(())
    }

    /// H record: key-value header fields selected by a three-letter sub-key.
    fn decode_header(&self, line: &str, flight: &mut Flight) -> Result<()> {
        let header = &mut flight.header;
        match &line[2..5] {
            "DTE" => {
                if line.len() < 11 {
                    return Err(too_short(line));
                }
                header.date =
                    Some(coord::parse_date(&line[5..11]).map_err(|_| invalid("header date", line))?);
            }
            "FXA" => {
                if line.len() < 8 {
                    return Err(too_short(line));
                }
                header.fix_accuracy = line[5..8]
                    .parse()
                    .map_err(|_| invalid("fix accuracy", line))?;
            }
            "PLT" => header.pilot = strip_label(&line[5..]).to_string(),
            "CM2" => header.crew = strip_label(&line[5..]).to_string(),
            "GTY" => header.glider_type = strip_label(&line[5..]).to_string(),
            "GID" => header.glider_id = strip_label(&line[5..]).to_string(),
            "DTM" => {
                if line.len() < 8 {
                    return Err(too_short(line));
                }
                header.gps_datum = strip_label(&line[5..]).to_string();
            }
            "RFW" => header.firmware_version = strip_label(&line[5..]).to_string(),
            "RHW" => header.hardware_version = strip_label(&line[5..]).to_string(),
            "FTY" => header.flight_recorder = strip_label(&line[5..]).to_string(),
            "GPS" => header.gps_receiver = line[5..].to_string(),
            "PRS" => header.pressure_sensor = strip_label(&line[5..]).to_string(),
            "CID" => header.competition_id = strip_label(&line[5..]).to_string(),
            "CCL" => header.competition_class = strip_label(&line[5..]).to_string(),
            "TZN" => {
                let hours: f64 = strip_label(&line[5..])
                    .parse()
                    .map_err(|_| invalid("timezone", line))?;
                // NaN would cast to 0 and pass for UTC.
                if !hours.is_finite() {
                    return Err(invalid("timezone", line));
                }
                let secs = (hours * 3600.0) as i32;
                if FixedOffset::east_opt(secs).is_none() {
                    return Err(invalid("timezone", line));
                }
                header.utc_offset_secs = secs;
            }
            _ => return Err(IgcError::UnknownRecord(line.to_string())),
        }
        Ok(())
    }

    /// K record: periodic extension data, laid out by the J declarations.
    fn decode_periodic(&self, line: &str, flight: &mut Flight) -> Result<()> {
        let time =
            coord::parse_time(&line[1..7]).map_err(|_| invalid("extension data time", line))?;
        let fields = extract_extensions(&self.periodic_fields, line)?;
        flight.periodic.insert(time, fields);
        Ok(())
    }

    /// L record: logbook entry.
    fn decode_logbook(&self, line: &str, flight: &mut Flight) -> Result<()> {
        flight.logbook.push(LogEntry {
            kind: line[1..4].to_string(),
            text: line[4..].to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared decoding helpers
// ---------------------------------------------------------------------------

/// Decode an I/J declaration line: a two-digit descriptor count followed by
/// that many 7-char groups (2-digit start, 2-digit end, 3-letter code).
/// The line length must be exactly 3 + 7N.
fn decode_declarations(line: &str) -> Result<Vec<FieldDef>> {
    let count: usize = line[1..3]
        .parse()
        .map_err(|_| invalid("extension field count", line))?;
    if line.len() != 3 + 7 * count {
        return Err(IgcError::StructuralMismatch {
            reason: "declaration length does not match field count",
            line: line.to_string(),
        });
    }

    let mut defs = Vec::with_capacity(count);
    for i in 0..count {
        let s = 3 + i * 7;
        let start: usize = line[s..s + 2]
            .parse()
            .map_err(|_| invalid("extension field offset", line))?;
        let end: usize = line[s + 2..s + 4]
            .parse()
            .map_err(|_| invalid("extension field offset", line))?;
        if start == 0 || end < start {
            return Err(invalid("extension field range", line));
        }
        defs.push(FieldDef {
            start,
            end,
            code: line[s + 4..s + 7].to_string(),
        });
    }
    Ok(defs)
}

/// Extract every declared descriptor's substring from a B or K line.
/// A line that ends before a declared descriptor is too short.
fn extract_extensions(defs: &[FieldDef], line: &str) -> Result<HashMap<String, String>> {
    let mut fields = HashMap::with_capacity(defs.len());
    for def in defs {
        match line.get(def.start - 1..def.end) {
            Some(raw) => {
                fields.insert(def.code.clone(), raw.to_string());
            }
            None => return Err(too_short(line)),
        }
    }
    Ok(fields)
}

/// Free-text header values are often prefixed `Label:`; keep what follows
/// the first colon, or the whole value when there is none.
fn strip_label(value: &str) -> &str {
    match value.find(':') {
        Some(i) => &value[i + 1..],
        None => value,
    }
}

/// Record layouts are byte-positional; reject any line with multi-byte
/// characters before slicing.
pub(crate) fn ensure_ascii(line: &str) -> Result<()> {
    if line.is_ascii() {
        Ok(())
    } else {
        Err(IgcError::InvalidField {
            field: "character set",
            line: line.to_string(),
        })
    }
}

fn invalid(field: &'static str, line: &str) -> IgcError {
    IgcError::InvalidField {
        field,
        line: line.to_string(),
    }
}

fn too_short(line: &str) -> IgcError {
    IgcError::LineTooShort(line.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
