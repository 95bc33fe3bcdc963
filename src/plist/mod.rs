//! Property list decoding.
//!
//! Manifests ship as binary (`bplist00`) or XML property lists. The `plist`
//! crate reads either form as a stream of events; this module folds that
//! stream into a [`ManifestNode`] tree with an explicit stack, so nesting
//! depth and total size are bounded without recursion.

mod node;

pub use node::{Dictionary, ManifestNode};

use ::plist::stream::{BinaryReader, Event, OwnedEvent, XmlReader};
use chrono::{DateTime, Utc};
use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Leading bytes of a binary property list.
pub const BINARY_MAGIC: &[u8] = b"bplist00";

/// Maximum container nesting accepted before giving up.
pub const MAX_DEPTH: usize = 512;

/// Upper bound on events folded from one document. Binary documents may
/// reference one container from many places and every reference is
/// expanded, so a small file can otherwise describe an enormous tree.
const MAX_NODES: u64 = 1 << 20;

enum Frame {
    Array(Vec<ManifestNode>),
    Dictionary {
        dict: Dictionary,
        key: Option<String>,
    },
}

/// Decode a property list in either serialization.
///
/// Anything without the binary magic is read as XML. Every decoding failure,
/// including recursive object references, excess nesting and values outside
/// the node model, is reported as [`Error::MalformedManifest`].
pub fn parse(data: &[u8]) -> Result<ManifestNode> {
    if data.starts_with(BINARY_MAGIC) {
        fold(BinaryReader::new(Cursor::new(data)))
    } else {
        fold(XmlReader::new(Cursor::new(data)))
    }
}

fn fold<I>(events: I) -> Result<ManifestNode>
where
    I: Iterator<Item = std::result::Result<OwnedEvent, ::plist::Error>>,
{
    let mut stack: Vec<Frame> = Vec::new();
    let mut count = 0u64;

    for event in events {
        let event = event.map_err(|e| Error::malformed(e.to_string()))?;
        count += 1;
        if count > MAX_NODES {
            return Err(Error::malformed(format!(
                "property list expands past {MAX_NODES} nodes"
            )));
        }

        let value = match event {
            Event::StartArray(_) => {
                push(&mut stack, Frame::Array(Vec::new()))?;
                continue;
            }
            Event::StartDictionary(_) => {
                let frame = Frame::Dictionary {
                    dict: Dictionary::new(),
                    key: None,
                };
                push(&mut stack, frame)?;
                continue;
            }
            Event::EndCollection => match stack.pop() {
                Some(Frame::Array(items)) => ManifestNode::Array(items),
                Some(Frame::Dictionary { dict, key: None }) => ManifestNode::Dictionary(dict),
                Some(Frame::Dictionary { key: Some(key), .. }) => {
                    return Err(Error::malformed(format!("key {key:?} has no value")));
                }
                None => return Err(Error::malformed("unbalanced end of collection")),
            },
            Event::String(text) => {
                if let Some(Frame::Dictionary { key, .. }) = stack.last_mut() {
                    if key.is_none() {
                        *key = Some(text.into_owned());
                        continue;
                    }
                }
                ManifestNode::String(text.into_owned())
            }
            Event::Boolean(b) => ManifestNode::Boolean(b),
            Event::Integer(n) => match n.as_signed() {
                Some(n) => ManifestNode::Integer(n),
                None => return Err(Error::malformed(format!("integer {n:?} out of range"))),
            },
            // UIDs only appear in keyed archives; keep the raw index.
            Event::Uid(uid) => match i64::try_from(uid.get()) {
                Ok(n) => ManifestNode::Integer(n),
                Err(_) => return Err(Error::malformed("UID out of range")),
            },
            Event::Real(f) => ManifestNode::Real(f),
            Event::Date(date) => match to_utc(SystemTime::from(date)) {
                Some(date) => ManifestNode::Date(date),
                None => return Err(Error::malformed("date out of range")),
            },
            Event::Data(bytes) => ManifestNode::Data(bytes.into_owned()),
            _ => return Err(Error::malformed("unsupported property list value")),
        };

        match stack.last_mut() {
            None => return Ok(value),
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Dictionary { dict, key }) => match key.take() {
                Some(key) => dict.insert(key, value),
                None => {
                    return Err(Error::malformed(format!(
                        "dictionary key must be a string, found {}",
                        value.kind()
                    )));
                }
            },
        }
    }

    Err(Error::malformed(if stack.is_empty() {
        "empty property list"
    } else {
        "property list ends inside a collection"
    }))
}

fn push(stack: &mut Vec<Frame>, frame: Frame) -> Result<()> {
    if stack.len() >= MAX_DEPTH {
        return Err(Error::malformed(format!(
            "nesting deeper than {MAX_DEPTH} levels"
        )));
    }
    stack.push(frame);
    Ok(())
}

fn to_utc(time: SystemTime) -> Option<DateTime<Utc>> {
    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => (i64::try_from(after.as_secs()).ok()?, after.subsec_nanos()),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => (-secs, 0),
                nanos => (-secs - 1, 1_000_000_000 - nanos),
            }
        }
    };
    DateTime::from_timestamp(secs, nanos)
}
