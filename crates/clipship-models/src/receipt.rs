//! Part receipts and the multipart completion manifest.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Receipt for one uploaded part.
///
/// `part_number` is 1-based, matching storage-provider numbering. The
/// ETag is kept exactly as received, surrounding quotes included; the
/// completion endpoint matches it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PartReceipt {
    pub part_number: u32,
    pub etag: String,
}

impl PartReceipt {
    pub fn new(part_number: u32, etag: impl Into<String>) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }
}

/// Ordered set of part receipts, ready to finalize a multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionManifest {
    parts: Vec<PartReceipt>,
}

impl CompletionManifest {
    /// Build a manifest. Parts are ordered by ascending part number no
    /// matter the order they arrive in; the completion endpoint
    /// requires it.
    pub fn from_receipts(mut parts: Vec<PartReceipt>) -> Self {
        parts.sort_by_key(|part| part.part_number);
        Self { parts }
    }

    pub fn parts(&self) -> &[PartReceipt] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Render the CompleteMultipartUpload XML body.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<CompleteMultipartUpload>");
        for part in &self.parts {
            xml.push_str("<Part><ETag>");
            xml.push_str(&escape_xml(&part.etag));
            xml.push_str("</ETag><PartNumber>");
            xml.push_str(&part.part_number.to_string());
            xml.push_str("</PartNumber></Part>");
        }
        xml.push_str("</CompleteMultipartUpload>");
        xml
    }
}

/// Escape text content for XML. ETags are quoted hex in practice, but
/// the manifest must stay well-formed for any value.
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_xml_shape() {
        let manifest = CompletionManifest::from_receipts(vec![
            PartReceipt::new(1, "\"etag-1\""),
            PartReceipt::new(2, "\"etag-2\""),
        ]);

        assert_eq!(
            manifest.to_xml(),
            "<CompleteMultipartUpload>\
             <Part><ETag>\"etag-1\"</ETag><PartNumber>1</PartNumber></Part>\
             <Part><ETag>\"etag-2\"</ETag><PartNumber>2</PartNumber></Part>\
             </CompleteMultipartUpload>"
        );
    }

    #[test]
    fn test_manifest_sorts_out_of_order_receipts() {
        let manifest = CompletionManifest::from_receipts(vec![
            PartReceipt::new(3, "\"c\""),
            PartReceipt::new(1, "\"a\""),
            PartReceipt::new(2, "\"b\""),
        ]);

        let numbers: Vec<u32> = manifest.parts().iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = CompletionManifest::default();
        assert!(manifest.is_empty());
        assert_eq!(
            manifest.to_xml(),
            "<CompleteMultipartUpload></CompleteMultipartUpload>"
        );
    }

    #[test]
    fn test_xml_escaping() {
        let manifest = CompletionManifest::from_receipts(vec![PartReceipt::new(1, "a&b<c>")]);
        assert!(manifest.to_xml().contains("<ETag>a&amp;b&lt;c&gt;</ETag>"));
    }

    #[test]
    fn test_etag_kept_verbatim() {
        let receipt = PartReceipt::new(4, "\"0f343b0931126a20f133d67c2b018a3b\"");
        assert!(receipt.etag.starts_with('"'));
        assert!(receipt.etag.ends_with('"'));
    }
}
