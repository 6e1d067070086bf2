//! Shared types, error enum, and the decoded flight aggregate for igc-core.

use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use serde::Serialize;
use thiserror::Error;

/// All errors produced by igc-core.
///
/// Every variant carries the offending line verbatim so callers can report
/// the failure without re-parsing the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IgcError {
    #[error("line too short: {0}")]
    LineTooShort(String),
    #[error("invalid {field}: {line}")]
    InvalidField { field: &'static str, line: String },
    #[error("unknown record: {0}")]
    UnknownRecord(String),
    #[error("{reason}: {line}")]
    StructuralMismatch { reason: &'static str, line: String },
}

pub type Result<T> = std::result::Result<T, IgcError>;

// ---------------------------------------------------------------------------
// Record tag metadata
// ---------------------------------------------------------------------------

/// Metadata for a record kind, keyed by its leading tag character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordInfo {
    pub name: &'static str,
    /// Minimum line length for the fixed fields of this kind.
    pub min_len: usize,
}

/// Known record tag table.
pub const RECORD_TABLE: &[(char, RecordInfo)] = &[
    (
        'A',
        RecordInfo {
            name: "flight recorder info",
            min_len: 7,
        },
    ),
    (
        'B',
        RecordInfo {
            name: "position fix",
            min_len: 37,
        },
    ),
    (
        'C',
        RecordInfo {
            name: "task declaration",
            min_len: 25,
        },
    ),
    (
        'D',
        RecordInfo {
            name: "differential GPS station",
            min_len: 6,
        },
    ),
    (
        'E',
        RecordInfo {
            name: "event",
            min_len: 10,
        },
    ),
    (
        'F',
        RecordInfo {
            name: "satellite constellation",
            min_len: 7,
        },
    ),
    (
        'G',
        RecordInfo {
            name: "security signature",
            min_len: 1,
        },
    ),
    (
        'H',
        RecordInfo {
            name: "header",
            min_len: 5,
        },
    ),
    (
        'I',
        RecordInfo {
            name: "fix extension declaration",
            min_len: 3,
        },
    ),
    (
        'J',
        RecordInfo {
            name: "periodic extension declaration",
            min_len: 3,
        },
    ),
    (
        'K',
        RecordInfo {
            name: "periodic extension data",
            min_len: 7,
        },
    ),
    (
        'L',
        RecordInfo {
            name: "logbook entry",
            min_len: 4,
        },
    ),
];

/// Look up record metadata. Returns `None` for unrecognized tags.
pub fn record_info(tag: char) -> Option<&'static RecordInfo> {
    RECORD_TABLE
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, info)| info)
}

// ---------------------------------------------------------------------------
// Extension field descriptors
// ---------------------------------------------------------------------------

/// One declared extension-field column: byte range plus three-letter code.
///
/// Offsets are 1-based and inclusive, exactly as declared in the I/J record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub start: usize,
    pub end: usize,
    pub code: String,
}

// ---------------------------------------------------------------------------
// Fix validity
// ---------------------------------------------------------------------------

/// Validity flag of a position fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixValidity {
    /// 'A': full 3D fix.
    Valid,
    /// 'V': 2D fix or no GPS solution.
    TwoD,
}

impl FixValidity {
    pub fn from_char(c: char) -> Option<FixValidity> {
        match c {
            'A' => Some(FixValidity::Valid),
            'V' => Some(FixValidity::TwoD),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            FixValidity::Valid => 'A',
            FixValidity::TwoD => 'V',
        }
    }
}

impl std::fmt::Display for FixValidity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ---------------------------------------------------------------------------
// Flight aggregate
// ---------------------------------------------------------------------------

/// Header fields collected from the A record and the H key-value records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Header {
    pub manufacturer: String,
    pub unique_id: String,
    pub additional_data: String,
    pub date: Option<NaiveDate>,
    pub fix_accuracy: i64,
    pub pilot: String,
    pub crew: String,
    pub glider_type: String,
    pub glider_id: String,
    pub gps_datum: String,
    pub firmware_version: String,
    pub hardware_version: String,
    pub flight_recorder: String,
    pub gps_receiver: String,
    pub pressure_sensor: String,
    pub competition_id: String,
    pub competition_class: String,
    /// UTC offset in seconds, from the TZN header (decimal hours × 3600).
    pub utc_offset_secs: i32,
}

impl Header {
    /// The TZN header as a chrono fixed-offset zone. UTC if no TZN was seen
    /// or the stored offset is out of range.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }
}

/// One GNSS position fix from a B record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    /// Time of day; B records carry no date.
    pub time: NaiveTime,
    pub latitude: f64,
    pub longitude: f64,
    pub validity: FixValidity,
    pub pressure_altitude: i64,
    pub gnss_altitude: i64,
    /// Extension-field code → raw substring, per the current I declarations.
    pub extensions: HashMap<String, String>,
    /// Carried forward from the most recent F record, 0 before the first.
    pub num_satellites: usize,
}

/// One waypoint of a task declaration. No altitude or time, unlike a fix.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
}

/// A pre-flight declared task from a C record block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Task {
    /// `None` when the declaration date+time failed to parse; the one
    /// lenient field of the format, together with `flight_date`.
    pub declaration_date: Option<NaiveDateTime>,
    pub flight_date: Option<NaiveDate>,
    pub number: i32,
    pub description: String,
    pub takeoff: TaskPoint,
    pub start: TaskPoint,
    pub turnpoints: Vec<TaskPoint>,
    pub finish: TaskPoint,
    pub landing: TaskPoint,
}

/// One L record: three-letter source code plus free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub kind: String,
    pub text: String,
}

/// The decoded flight log: the accumulator mutated by the parser driver and
/// the value returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Flight {
    pub header: Header,
    /// Fixes in input order.
    pub points: Vec<Point>,
    /// First successfully parsed task declaration; later ones are ignored.
    pub task: Task,
    /// E records: time → event code → free text.
    pub events: HashMap<NaiveTime, HashMap<String, String>>,
    /// F records: time → satellite IDs in line order.
    pub satellites: HashMap<NaiveTime, Vec<u32>>,
    /// K records: time → extension code → raw substring, per J declarations.
    pub periodic: HashMap<NaiveTime, HashMap<String, String>>,
    /// L records in input order.
    pub logbook: Vec<LogEntry>,
    /// All G record payloads concatenated in input order.
    pub signature: String,
    pub dgps_station_id: String,
}

impl Flight {
    pub fn new() -> Flight {
        Flight::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
