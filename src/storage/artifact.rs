//! The on-disk data file format.
//!
//! Keys are Spanish because files written by the earlier console tool use
//! them; keeping them lets those files load unchanged. Timestamps are civil
//! ISO-8601 strings (`2024-05-01T10:23:45.123456`).
//!
//! Decoding is lenient per record: a bad timestamp is dropped and each
//! repair becomes a [`LoadWarning`]. An entry that cannot be typed, or that
//! repeats an earlier ID, is set aside as a [`RawEntry`] and written back
//! unchanged at its original position on every save. Only a file that is not
//! a JSON object of the expected shape fails as a whole.

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, ser::PrettyFormatter};

use crate::model::{DispatchRecord, DispatchStatus, DispatchType};

const STARTED_AT: &str = "fecha_hora_inicio";
const FINISHED_AT: &str = "fecha_hora_fin";

/// A problem with one record, repaired or skipped during load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadWarning {
    #[error("dispatch {id}: invalid {field} {value}; left empty")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("dispatch #{position} ignored ({reason}); kept unchanged in the data file")]
    SkippedRecord { position: usize, reason: String },

    #[error(
        "dispatch {id} ignored: its ID is already used by an earlier dispatch; \
         kept unchanged in the data file"
    )]
    DuplicateId { id: String },

    #[error("dispatch {id} is in progress but had a finish time; cleared")]
    FinishedWhileInProgress { id: String },
}

/// A data file entry the store cannot type, carried through saves as-is.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RawEntry {
    /// 0-based index in the `despachos` array it was read from.
    pub position: usize,
    /// The entry's `id_despacho`, when it has a string one.
    pub id: Option<String>,
    pub value: Value,
}

#[derive(Serialize)]
struct ArtifactOut<'a> {
    despachos: Vec<EntryOut<'a>>,
    next_id_interno: u64,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EntryOut<'a> {
    Record(RecordOut<'a>),
    Raw(&'a Value),
}

#[derive(Serialize)]
struct RecordOut<'a> {
    id_despacho: &'a str,
    tipo_despacho: &'static str,
    estado: &'static str,
    #[serde(serialize_with = "serialize_timestamp")]
    fecha_hora_inicio: Option<DateTime>,
    #[serde(serialize_with = "serialize_timestamp")]
    fecha_hora_fin: Option<DateTime>,
    detalles: &'a str,
}

impl<'a> From<&'a DispatchRecord> for RecordOut<'a> {
    fn from(record: &'a DispatchRecord) -> Self {
        Self {
            id_despacho: &record.id,
            tipo_despacho: record.kind.name(),
            estado: record.status.label(),
            fecha_hora_inicio: record.started_at,
            fecha_hora_fin: record.finished_at,
            detalles: &record.notes,
        }
    }
}

#[derive(Deserialize)]
struct ArtifactIn {
    #[serde(default)]
    despachos: Vec<Value>,
    #[serde(default)]
    next_id_interno: Option<i64>,
}

#[derive(Deserialize)]
struct RecordIn {
    id_despacho: String,
    tipo_despacho: String,
    estado: String,
    #[serde(default)]
    fecha_hora_inicio: Value,
    #[serde(default)]
    fecha_hora_fin: Value,
    #[serde(default)]
    detalles: Option<String>,
}

/// Everything a data file yielded.
pub(super) struct Decoded {
    pub records: Vec<DispatchRecord>,
    pub raw: Vec<RawEntry>,
    pub next_id: u64,
    pub warnings: Vec<LoadWarning>,
}

/// Writes `YYYY-MM-DDTHH:MM:SS`, plus `.ffffff` when there is a fraction.
#[allow(clippy::ref_option)]
fn serialize_timestamp<S: Serializer>(
    at: &Option<DateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => serializer.serialize_str(&format_timestamp(*at)),
        None => serializer.serialize_none(),
    }
}

fn format_timestamp(at: DateTime) -> String {
    let seconds = at.strftime("%Y-%m-%dT%H:%M:%S");
    match at.subsec_nanosecond() / 1_000 {
        0 => seconds.to_string(),
        micros => format!("{seconds}.{micros:06}"),
    }
}

/// Serializes the records, the set-aside entries and the counter,
/// pretty-printed with 4-space indents.
///
/// Each raw entry goes back to its original index, or to the end when the
/// list is shorter than that.
pub(super) fn encode(
    records: &[DispatchRecord],
    raw: &[RawEntry],
    next_id: u64,
) -> serde_json::Result<Vec<u8>> {
    let mut despachos = Vec::with_capacity(records.len() + raw.len());
    let mut raw = raw.iter().peekable();
    for record in records {
        while let Some(entry) = raw.next_if(|e| e.position <= despachos.len()) {
            despachos.push(EntryOut::Raw(&entry.value));
        }
        despachos.push(EntryOut::Record(RecordOut::from(record)));
    }
    despachos.extend(raw.map(|e| EntryOut::Raw(&e.value)));

    let artifact = ArtifactOut {
        despachos,
        next_id_interno: next_id,
    };
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    artifact.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

/// Parses a data file.
///
/// Fails only when the file as a whole is not valid; per-record problems
/// end up in [`Decoded::warnings`].
pub(super) fn decode(contents: &[u8]) -> serde_json::Result<Decoded> {
    // A map first: a derived struct would also accept a top-level array.
    let object: Map<String, Value> = serde_json::from_slice(contents)?;
    let artifact: ArtifactIn = serde_json::from_value(Value::Object(object))?;

    let mut records: Vec<DispatchRecord> = Vec::with_capacity(artifact.despachos.len());
    let mut raw: Vec<RawEntry> = Vec::new();
    let mut warnings = Vec::new();

    for (index, value) in artifact.despachos.into_iter().enumerate() {
        let id = value
            .get("id_despacho")
            .and_then(Value::as_str)
            .map(str::to_string);
        let taken = id.as_deref().is_some_and(|id| {
            records.iter().any(|r| r.id == id) || raw.iter().any(|e| e.id.as_deref() == Some(id))
        });

        if let Some(id) = id.as_deref().filter(|_| taken) {
            warnings.push(LoadWarning::DuplicateId { id: id.to_string() });
        } else if let Some(record) = decode_record(&value, index + 1, &mut warnings) {
            records.push(record);
            continue;
        }
        raw.push(RawEntry {
            position: index,
            id,
            value,
        });
    }

    // Counters below 1 were never handed out; 1 is where numbering starts.
    let next_id = artifact
        .next_id_interno
        .and_then(|n| u64::try_from(n).ok())
        .filter(|&n| n >= 1)
        .unwrap_or(1);

    Ok(Decoded {
        records,
        raw,
        next_id,
        warnings,
    })
}

fn decode_record(
    value: &Value,
    position: usize,
    warnings: &mut Vec<LoadWarning>,
) -> Option<DispatchRecord> {
    let skip = |reason: String| LoadWarning::SkippedRecord { position, reason };

    let raw: RecordIn = match RecordIn::deserialize(value) {
        Ok(raw) => raw,
        Err(e) => {
            warnings.push(skip(e.to_string()));
            return None;
        }
    };
    let kind = match raw.tipo_despacho.parse::<DispatchType>() {
        Ok(kind) => kind,
        Err(e) => {
            warnings.push(skip(e.to_string()));
            return None;
        }
    };
    let Some(status) = DispatchStatus::from_label(&raw.estado) else {
        warnings.push(skip(format!("unknown status '{}'", raw.estado)));
        return None;
    };

    let id = raw.id_despacho;
    let started_at = decode_timestamp(raw.fecha_hora_inicio, &id, STARTED_AT, warnings);
    let mut finished_at = decode_timestamp(raw.fecha_hora_fin, &id, FINISHED_AT, warnings);

    if status == DispatchStatus::InProgress && finished_at.is_some() {
        warnings.push(LoadWarning::FinishedWhileInProgress { id: id.clone() });
        finished_at = None;
    }

    Some(DispatchRecord {
        id,
        kind,
        status,
        started_at,
        finished_at,
        notes: raw.detalles.unwrap_or_default(),
    })
}

/// Null and empty strings mean "no timestamp"; anything else must parse.
fn decode_timestamp(
    value: Value,
    id: &str,
    field: &'static str,
    warnings: &mut Vec<LoadWarning>,
) -> Option<DateTime> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => match s.parse::<DateTime>() {
            Ok(at) => Some(at),
            Err(_) => {
                warnings.push(LoadWarning::InvalidTimestamp {
                    id: id.to_string(),
                    field,
                    value: Value::String(s).to_string(),
                });
                None
            }
        },
        other => {
            warnings.push(LoadWarning::InvalidTimestamp {
                id: id.to_string(),
                field,
                value: other.to_string(),
            });
            None
        }
    }
}
