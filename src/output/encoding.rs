//! Subprocess text decoding.
//!
//! Windows tools frequently emit UTF-16-LE, everything else is read as UTF-8.

const BOM: char = '\u{feff}';

/// Encoding of raw subprocess output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, decoded lossily.
    Utf8,
    /// UTF-16 little-endian, with CRLF line endings normalized.
    Utf16Le,
}

impl TextEncoding {
    /// Encoding of subprocess output on the current platform.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Utf16Le
        } else {
            Self::Utf8
        }
    }

    /// Decode raw bytes into text.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Utf16Le => normalize_newlines(&decode_utf16le(bytes)),
        }
    }
}

/// Decode UTF-16-LE bytes.
///
/// A leading byte order mark is dropped, unpaired surrogates become U+FFFD and
/// a trailing odd byte is ignored.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

    let mut text: String = char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();

    if text.starts_with(BOM) {
        text.remove(0);
    }
    text
}

/// Replace every `\r\n` with `\n`.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Split text into lines.
///
/// `\r\n` counts as a line break and one trailing empty line (from a final
/// newline) is dropped.
pub fn split_lines(text: &str) -> Vec<String> {
    let normalized = normalize_newlines(text);
    let mut lines: Vec<String> = normalized.split('\n').map(str::to_owned).collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_decode_utf16le_plain() {
        assert_eq!(decode_utf16le(&utf16le("hello")), "hello");
    }

    #[test]
    fn test_decode_utf16le_drops_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(utf16le("héllo"));
        assert_eq!(decode_utf16le(&bytes), "héllo");
    }

    #[test]
    fn test_decode_utf16le_non_bmp() {
        assert_eq!(decode_utf16le(&utf16le("ok \u{1F980}")), "ok \u{1F980}");
    }

    #[test]
    fn test_decode_utf16le_odd_trailing_byte() {
        let mut bytes = utf16le("ab");
        bytes.push(0x41);
        assert_eq!(decode_utf16le(&bytes), "ab");
    }

    #[test]
    fn test_decode_utf16le_unpaired_surrogate() {
        let bytes = [0x00, 0xD8, 0x41, 0x00];
        assert_eq!(decode_utf16le(&bytes), "\u{FFFD}A");
    }

    #[test]
    fn test_utf16_decode_normalizes_crlf() {
        let decoded = TextEncoding::Utf16Le.decode(&utf16le("a\r\nb\r\n"));
        assert_eq!(decoded, "a\nb\n");
    }

    #[test]
    fn test_utf8_decode_keeps_crlf() {
        assert_eq!(TextEncoding::Utf8.decode(b"a\r\nb"), "a\r\nb");
    }

    #[test]
    fn test_utf8_decode_lossy() {
        assert_eq!(TextEncoding::Utf8.decode(&[b'o', b'k', 0xFF]), "ok\u{FFFD}");
    }

    #[test]
    fn test_native_encoding() {
        #[cfg(windows)]
        assert_eq!(TextEncoding::native(), TextEncoding::Utf16Le);
        #[cfg(not(windows))]
        assert_eq!(TextEncoding::native(), TextEncoding::Utf8);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("\n"), vec![""]);
    }
}
