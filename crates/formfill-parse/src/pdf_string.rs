//! PDF text string encoding and decoding.

/// Decode a PDF text string.
///
/// A UTF-16 BE or UTF-8 byte order mark selects that encoding; any other
/// string is single-byte text, decoded byte by byte so that it reads back
/// exactly what [`encode_pdf_string`] wrote.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Encode a value for a `/V` text string.
///
/// ASCII and Latin-1 text is written as single bytes; anything else becomes
/// UTF-16 BE with a byte order mark. Single-byte text that would start with
/// a byte order mark is written as UTF-16 too.
pub fn encode_pdf_string(text: &str) -> Vec<u8> {
    let looks_like_bom =
        text.starts_with("\u{FE}\u{FF}") || text.starts_with("\u{EF}\u{BB}\u{BF}");
    if !looks_like_bom && text.chars().all(is_single_byte) {
        text.chars().map(|c| c as u32 as u8).collect()
    } else {
        let mut out = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        out
    }
}

// 0x80..0xA0 differs between PDFDocEncoding and Latin-1.
fn is_single_byte(c: char) -> bool {
    let code = c as u32;
    code < 0x80 || (0xA0..=0xFF).contains(&code)
}

/// Bytes for showing `text` with a WinAnsi-encoded standard font.
///
/// Characters outside Latin-1 have no glyph in the standard fonts and are
/// replaced with `?`.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if is_single_byte(c) { c as u32 as u8 } else { b'?' })
        .collect()
}

/// Escape bytes for a literal string `( … )` inside a content stream.
pub fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(b),
        }
    }
    out
}
