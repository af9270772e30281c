//! Reading and writing script files in a configurable text encoding.

use crate::error::ScriptError;
use crate::utils::split_lines_keep_ends;
use encoding_rs::Encoding;
use std::path::Path;

/// Text codec for script files.
///
/// Decoding is lossy: bytes that are invalid in the configured encoding are
/// dropped instead of failing the run.
#[derive(Debug, Clone, Copy)]
pub struct ScriptCodec {
    encoding: &'static Encoding,
}

impl Default for ScriptCodec {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl ScriptCodec {
    /// Resolve an encoding label such as `UTF-8`, `Shift_JIS` or `sjis`.
    pub fn for_label(label: &str) -> Result<Self, ScriptError> {
        Encoding::for_label(label.trim().as_bytes())
            .map(|encoding| Self { encoding })
            .ok_or_else(|| ScriptError::UnknownEncoding(label.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, had_errors) = self.encoding.decode_with_bom_removal(bytes);
        if had_errors {
            text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect()
        } else {
            text.into_owned()
        }
    }

    /// Encode text for writing.
    ///
    /// Fails with the first character the encoding cannot represent.
    fn encode(&self, text: &str) -> Result<Vec<u8>, char> {
        if self.encoding == encoding_rs::UTF_16LE {
            return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
        }
        if self.encoding == encoding_rs::UTF_16BE {
            return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
        }

        let (bytes, _, had_unmappable) = self.encoding.encode(text);
        if !had_unmappable {
            return Ok(bytes.into_owned());
        }

        let mut buf = [0u8; 4];
        let unmappable = text
            .chars()
            .find(|c| self.encoding.encode(c.encode_utf8(&mut buf)).2)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        Err(unmappable)
    }

    /// Read a script as lines, each keeping its terminator.
    pub fn read_lines(&self, path: &Path) -> Result<Vec<String>, ScriptError> {
        let bytes = std::fs::read(path).map_err(|source| ScriptError::ReadError {
            path: path.display().to_string(),
            source,
        })?;

        Ok(split_lines_keep_ends(&self.decode(&bytes)))
    }

    /// Write all lines to `path` in a single operation.
    ///
    /// Nothing is written if any character cannot be encoded.
    pub fn write_lines(&self, path: &Path, lines: &[String]) -> Result<(), ScriptError> {
        let bytes = self
            .encode(&lines.concat())
            .map_err(|character| ScriptError::Unencodable {
                path: path.display().to_string(),
                encoding: self.name(),
                character,
            })?;

        std::fs::write(path, bytes).map_err(|source| ScriptError::WriteError {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_label() {
        assert!(ScriptCodec::for_label("klingon").is_err());
        assert_eq!(ScriptCodec::for_label("sjis").unwrap().name(), "Shift_JIS");
    }

    #[test]
    fn test_invalid_bytes_are_dropped() {
        let codec = ScriptCodec::default();
        let text = codec.decode(b"ab\xffcd\n");
        assert_eq!(text, "abcd\n");
    }

    #[test]
    fn test_shift_jis_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.ks");
        let codec = ScriptCodec::for_label("Shift_JIS").unwrap();

        let lines = vec!["「こんにちは」\n".to_string(), "\n".to_string()];
        codec.write_lines(&path, &lines).unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert!(std::str::from_utf8(&raw).is_err());
        assert_eq!(codec.read_lines(&path).unwrap(), lines);
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let result = ScriptCodec::default().read_lines(&dir.path().join("missing.ks"));
        assert!(matches!(result, Err(ScriptError::ReadError { .. })));
    }

    #[test]
    fn test_unencodable_character_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.ks");
        let codec = ScriptCodec::for_label("Shift_JIS").unwrap();

        let lines = vec!["«Привет» — сказала она.\n".to_string()];
        let result = codec.write_lines(&path, &lines);

        match result {
            Err(ScriptError::Unencodable { character, encoding, .. }) => {
                assert_eq!(character, '«');
                assert_eq!(encoding, "Shift_JIS");
            }
            other => panic!("expected Unencodable, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_utf16le_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.ks");
        let codec = ScriptCodec::for_label("UTF-16LE").unwrap();

        let lines = vec!["Привет\n".to_string(), "\n".to_string()];
        codec.write_lines(&path, &lines).unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(raw.len(), 16);
        assert_eq!(&raw[..2], &[0x1f, 0x04]);
        assert_eq!(codec.read_lines(&path).unwrap(), lines);
    }

    #[test]
    fn test_utf16be_byte_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.ks");
        let codec = ScriptCodec::for_label("UTF-16BE").unwrap();

        codec.write_lines(&path, &["a\n".to_string()]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x00, b'a', 0x00, b'\n']);
    }
}
