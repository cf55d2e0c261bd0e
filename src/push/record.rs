// ABOUTME: Decoded records of an image engine's newline-delimited JSON push stream.
// ABOUTME: Detects embedded errors and the pushed manifest digest.

use super::PushError;
use crate::types::Digest;
use serde::Deserialize;

/// One progress/status record from a push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "errorDetail")]
    pub error_detail: Option<ErrorDetail>,
    #[serde(default)]
    pub aux: Option<PushAux>,
    /// Podman's libpod API reports progress as raw text lines.
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default, rename = "manifestdigest")]
    pub manifest_digest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Trailing record Docker emits once the manifest is pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushAux {
    #[serde(default, rename = "Tag")]
    pub tag: Option<String>,
    #[serde(default, rename = "Digest")]
    pub digest: Option<String>,
    #[serde(default, rename = "Size")]
    pub size: Option<u64>,
}

impl PushRecord {
    /// Registry-supplied error message, if this record reports a failure.
    pub fn error_message(&self) -> Option<&str> {
        let detail = self
            .error_detail
            .as_ref()
            .and_then(|d| d.message.as_deref());
        self.error
            .as_deref()
            .filter(|m| !m.is_empty())
            .or(detail.filter(|m| !m.is_empty()))
    }

    /// Manifest digest announced by this record, if any.
    pub fn pushed_digest(&self) -> Option<Digest> {
        self.aux
            .as_ref()
            .and_then(|aux| aux.digest.as_deref())
            .or(self.manifest_digest.as_deref())
            .and_then(|d| Digest::parse(d).ok())
    }

    /// Short human-readable summary for logging.
    pub fn describe(&self) -> String {
        let text = self
            .status
            .as_deref()
            .or(self.stream.as_deref())
            .unwrap_or_default()
            .trim();
        match (&self.id, &self.progress) {
            (Some(id), Some(progress)) => format!("{}: {} {}", id, text, progress),
            (Some(id), None) => format!("{}: {}", id, text),
            _ => text.to_string(),
        }
    }
}

/// Longest record line accepted before the decoder gives up on it.
pub const MAX_RECORD_LEN: usize = 1 << 20;

/// Incremental decoder for newline-delimited JSON records split across chunks.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    buffer: Vec<u8>,
    // Set after an oversized line; bytes are dropped up to the next newline.
    overflowed: bool,
}

impl RecordDecoder {
    /// Feed a chunk and return every record completed by it.
    ///
    /// A line longer than [`MAX_RECORD_LEN`] yields one decode error and is
    /// discarded instead of buffered.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<PushRecord, PushError>> {
        let mut records = Vec::new();
        let mut chunk = chunk;

        if self.overflowed {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(newline) => {
                    chunk = &chunk[newline + 1..];
                    self.overflowed = false;
                }
                None => return records,
            }
        }

        self.buffer.extend_from_slice(chunk);
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(record) = decode_line(&line) {
                records.push(record);
            }
        }

        if self.buffer.len() > MAX_RECORD_LEN {
            records.push(Err(PushError::Decode(format!(
                "record exceeds {} bytes without a newline",
                MAX_RECORD_LEN
            ))));
            self.buffer.clear();
            self.overflowed = true;
        }
        records
    }

    /// Decode whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Option<Result<PushRecord, PushError>> {
        let rest = std::mem::take(&mut self.buffer);
        if std::mem::take(&mut self.overflowed) {
            return None;
        }
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Option<Result<PushRecord, PushError>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_slice(line).map_err(|e| PushError::Decode(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> PushRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn error_field_wins() {
        let rec = record(r#"{"error":"denied","errorDetail":{"message":"other"}}"#);
        assert_eq!(rec.error_message(), Some("denied"));
    }

    #[test]
    fn error_detail_alone_is_an_error() {
        let rec = record(r#"{"errorDetail":{"message":"unauthorized: authentication required"}}"#);
        assert_eq!(
            rec.error_message(),
            Some("unauthorized: authentication required")
        );
    }

    #[test]
    fn empty_error_is_not_an_error() {
        let rec = record(r#"{"status":"Pushed","error":""}"#);
        assert!(rec.error_message().is_none());
    }

    #[test]
    fn aux_digest_is_extracted() {
        let rec = record(
            r#"{"progressDetail":{},"aux":{"Tag":"v1","Digest":"sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855","Size":528}}"#,
        );
        let digest = rec.pushed_digest().unwrap();
        assert_eq!(digest.algorithm(), "sha256");
    }

    #[test]
    fn decoder_handles_split_chunks() {
        let mut decoder = RecordDecoder::default();
        assert!(decoder.feed(br#"{"status":"Prepa"#).is_empty());
        let records = decoder.feed(b"ring\"}\n\n{\"status\":\"Pushed\"}\n{\"id\":");
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1].as_ref().unwrap().status.as_deref(),
            Some("Pushed")
        );
        decoder.feed(b"\"abc\"}");
        let last = decoder.finish().unwrap().unwrap();
        assert_eq!(last.id.as_deref(), Some("abc"));
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn garbage_line_is_a_decode_error() {
        let mut decoder = RecordDecoder::default();
        let records = decoder.feed(b"not json\n");
        assert!(matches!(records[0], Err(PushError::Decode(_))));
    }

    #[test]
    fn describe_includes_layer_id() {
        let rec = record(r#"{"id":"5f70bf18a086","status":"Pushing","progress":"[==>  ]"}"#);
        assert_eq!(rec.describe(), "5f70bf18a086: Pushing [==>  ]");
    }

    #[test]
    fn oversized_line_is_reported_once_and_skipped() {
        let mut decoder = RecordDecoder::default();
        let filler = vec![b'x'; MAX_RECORD_LEN + 1];

        let records = decoder.feed(&filler);
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], Err(PushError::Decode(_))));

        assert!(decoder.feed(b"xxxx").is_empty());
        let records = decoder.feed(b"xx\n{\"status\":\"Pushed\"}\n");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].as_ref().unwrap().status.as_deref(),
            Some("Pushed")
        );
        assert!(decoder.finish().is_none());
    }
}
