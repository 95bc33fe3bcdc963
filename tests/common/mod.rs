//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Build an in-memory zip. Names ending in `/` become directory entries.
pub fn zip_archive(files: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);

    for (name, data) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// A deflated IPA with a single manifest at `Payload/<bundle>.app/Info.plist`.
pub fn ipa(bundle: &str, manifest: &[u8]) -> Vec<u8> {
    let payload = format!("Payload/{bundle}.app/");
    let manifest_path = format!("{payload}Info.plist");
    let binary_path = format!("{payload}{bundle}");
    zip_archive(
        &[
            ("Payload/", b""),
            (&payload, b""),
            (&binary_path, b"\xcf\xfa\xed\xfe fake mach-o"),
            (&manifest_path, manifest),
        ],
        CompressionMethod::Deflated,
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// XML property list with a root dictionary of string values.
pub fn xml_plist(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
         \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
         <plist version=\"1.0\">\n<dict>\n",
    );
    for (key, value) in pairs {
        out.push_str(&format!(
            "\t<key>{}</key>\n\t<string>{}</string>\n",
            escape(key),
            escape(value)
        ));
    }
    out.push_str("</dict>\n</plist>\n");
    out.into_bytes()
}

/// Marker byte plus length, spilling into a following integer object when
/// the length does not fit the low nibble.
fn push_header(out: &mut Vec<u8>, kind: u8, len: usize) {
    if len < 15 {
        out.push(kind | len as u8);
    } else if len <= u8::MAX as usize {
        out.extend_from_slice(&[kind | 0x0f, 0x10, len as u8]);
    } else {
        out.extend_from_slice(&[kind | 0x0f, 0x11]);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    }
}

fn push_string(out: &mut Vec<u8>, text: &str) {
    if text.is_ascii() {
        push_header(out, 0x50, text.len());
        out.extend_from_slice(text.as_bytes());
    } else {
        let units: Vec<u16> = text.encode_utf16().collect();
        push_header(out, 0x60, units.len());
        for unit in units {
            out.extend_from_slice(&unit.to_be_bytes());
        }
    }
}

fn push_ref(out: &mut Vec<u8>, index: usize, ref_size: usize) {
    if ref_size == 1 {
        out.push(index as u8);
    } else {
        out.extend_from_slice(&(index as u16).to_be_bytes());
    }
}

/// `bplist00` document with a root dictionary of string values.
///
/// Object 0 is the dictionary, followed by every key and then every value.
pub fn binary_plist(pairs: &[(&str, &str)]) -> Vec<u8> {
    let object_count = 1 + pairs.len() * 2;
    let ref_size = if object_count <= u8::MAX as usize { 1 } else { 2 };

    let mut out = b"bplist00".to_vec();
    let mut offsets = Vec::with_capacity(object_count);

    offsets.push(out.len());
    push_header(&mut out, 0xd0, pairs.len());
    for i in 0..pairs.len() {
        push_ref(&mut out, 1 + i, ref_size);
    }
    for i in 0..pairs.len() {
        push_ref(&mut out, 1 + pairs.len() + i, ref_size);
    }

    for (key, _) in pairs {
        offsets.push(out.len());
        push_string(&mut out, key);
    }
    for (_, value) in pairs {
        offsets.push(out.len());
        push_string(&mut out, value);
    }

    let table_offset = out.len();
    for offset in &offsets {
        out.extend_from_slice(&(*offset as u32).to_be_bytes());
    }

    // Trailer: 6 unused bytes, sort version, offset width, ref width, then
    // object count, root index and table offset as u64.
    out.extend_from_slice(&[0; 6]);
    out.push(0);
    out.push(4);
    out.push(ref_size as u8);
    out.extend_from_slice(&(object_count as u64).to_be_bytes());
    out.extend_from_slice(&0u64.to_be_bytes());
    out.extend_from_slice(&(table_offset as u64).to_be_bytes());
    out
}

/// Catalog response body with a single result.
pub fn search_body(track: &str) -> serde_json::Value {
    serde_json::json!({
        "resultCount": 1,
        "results": [{
            "trackName": track,
            "artworkUrl512": "https://example.com/icon512.png",
            "artworkUrl100": "https://example.com/icon100.png",
            "averageUserRating": 4.5,
            "description": "Keeps your todos in order.",
            "artistName": "Acme Inc.",
            "primaryGenreName": "Productivity",
            "formattedPrice": "Free",
            "fileSizeBytes": "10485760"
        }]
    })
}
