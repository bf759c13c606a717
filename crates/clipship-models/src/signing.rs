//! Signing decision wire types and boundary validation.
//!
//! The signing endpoint replies with an untyped JSON object whose
//! `multipart` flag discriminates two shapes. Deserialization runs
//! through [`RawSigningResponse`] and validates the shape here, so a
//! malformed response never reaches an uploader.

use std::collections::HashMap;

use serde::Deserialize;

/// Errors produced when a signing response fails shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantError {
    /// A field required by the declared strategy is missing
    MissingField(&'static str),
    /// Multipart grant carried no part URLs
    EmptyPartUrls,
    /// Multipart grant declared a zero part size
    ZeroPartSize,
}

impl std::fmt::Display for GrantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantError::MissingField(field) => {
                write!(f, "signing response is missing `{}`", field)
            }
            GrantError::EmptyPartUrls => write!(f, "multipart grant has an empty `part_urls` list"),
            GrantError::ZeroPartSize => write!(f, "multipart grant declares `part_mb` of zero"),
        }
    }
}

impl std::error::Error for GrantError {}

/// Result type for grant validation.
pub type GrantResult<T> = Result<T, GrantError>;

/// Grant for a single multipart/form-data POST upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinglePostGrant {
    /// Form POST endpoint at the storage provider.
    pub url: String,

    /// Signed policy fields; every one must be forwarded verbatim,
    /// ahead of the file content. May be empty.
    pub fields: HashMap<String, String>,

    /// Object key the upload lands under.
    pub s3_key: String,
}

/// Grant for a multipart PUT upload with a presigned completion URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartGrant {
    /// One presigned PUT URL per part, in part order.
    pub part_urls: Vec<String>,

    /// Presigned POST URL for the completion manifest.
    pub complete_url: String,

    /// Part size in whole mebibytes, as the backend sliced it.
    pub part_mb: u64,

    /// Object key the upload lands under.
    pub s3_key: String,

    /// Storage-side multipart upload id. Informational only; the
    /// presigned URLs already embed it.
    pub upload_id: Option<String>,
}

impl MultipartGrant {
    /// Part size in bytes.
    pub fn part_size_bytes(&self) -> u64 {
        self.part_mb * 1024 * 1024
    }

    /// Number of parts, defined by the URL list length.
    pub fn total_parts(&self) -> usize {
        self.part_urls.len()
    }
}

/// Upload strategy decided by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSigningResponse")]
pub enum SigningDecision {
    SinglePost(SinglePostGrant),
    Multipart(MultipartGrant),
}

impl SigningDecision {
    /// Object key the upload lands under, whichever the strategy.
    pub fn s3_key(&self) -> &str {
        match self {
            SigningDecision::SinglePost(grant) => &grant.s3_key,
            SigningDecision::Multipart(grant) => &grant.s3_key,
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, SigningDecision::Multipart(_))
    }
}

/// Untyped signing response as it comes off the wire.
#[derive(Debug, Deserialize)]
struct RawSigningResponse {
    multipart: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    fields: Option<HashMap<String, String>>,
    #[serde(default)]
    s3_key: Option<String>,
    #[serde(default)]
    part_urls: Option<Vec<String>>,
    #[serde(default)]
    complete_url: Option<String>,
    #[serde(default)]
    part_mb: Option<u64>,
    #[serde(default)]
    upload_id: Option<String>,
}

impl TryFrom<RawSigningResponse> for SigningDecision {
    type Error = GrantError;

    fn try_from(raw: RawSigningResponse) -> GrantResult<Self> {
        let s3_key = raw.s3_key.ok_or(GrantError::MissingField("s3_key"))?;

        if raw.multipart {
            let part_urls = raw.part_urls.ok_or(GrantError::MissingField("part_urls"))?;
            if part_urls.is_empty() {
                return Err(GrantError::EmptyPartUrls);
            }
            let complete_url = raw
                .complete_url
                .ok_or(GrantError::MissingField("complete_url"))?;
            let part_mb = raw.part_mb.ok_or(GrantError::MissingField("part_mb"))?;
            if part_mb == 0 {
                return Err(GrantError::ZeroPartSize);
            }

            Ok(SigningDecision::Multipart(MultipartGrant {
                part_urls,
                complete_url,
                part_mb,
                s3_key,
                upload_id: raw.upload_id,
            }))
        } else {
            let url = raw.url.ok_or(GrantError::MissingField("url"))?;
            let fields = raw.fields.ok_or(GrantError::MissingField("fields"))?;

            Ok(SigningDecision::SinglePost(SinglePostGrant {
                url,
                fields,
                s3_key,
            }))
        }
    }
}
