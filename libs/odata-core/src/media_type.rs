use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";

const METADATA_PARAM: &str = "odata.metadata";
const STREAMING_PARAM: &str = "odata.streaming";
const CHARSET_PARAM: &str = "charset";

/// Value of the `odata.metadata` media-type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataLevel {
    Minimal,
    Full,
    None,
}

impl MetadataLevel {
    /// Registration order of the JSON variants.
    pub const ALL: [MetadataLevel; 3] = [MetadataLevel::Minimal, MetadataLevel::Full, MetadataLevel::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataLevel::Minimal => "minimal",
            MetadataLevel::Full => "full",
            MetadataLevel::None => "none",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "minimal" => Some(MetadataLevel::Minimal),
            "full" => Some(MetadataLevel::Full),
            "none" => Some(MetadataLevel::None),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed media type.
///
/// The OData parameters are lifted out of the generic parameter list so that
/// [`MediaType::to_canonical`] can render them in a fixed order. `charset` is
/// kept separately and never appears in the canonical token: encodings are
/// negotiated through the registry's encoding list instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaType {
    main: String,
    sub: String,
    metadata: Option<MetadataLevel>,
    streaming: Option<bool>,
    charset: Option<String>,
    params: Vec<(String, String)>,
}

impl MediaType {
    pub fn new(main: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            main: main.into().to_ascii_lowercase(),
            sub: sub.into().to_ascii_lowercase(),
            metadata: None,
            streaming: None,
            charset: None,
            params: Vec::new(),
        }
    }

    pub fn json() -> Self {
        Self::new("application", "json")
    }

    pub fn xml() -> Self {
        Self::new("application", "xml")
    }

    pub fn with_metadata(mut self, level: MetadataLevel) -> Self {
        self.metadata = Some(level);
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = Some(streaming);
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into().to_ascii_lowercase());
        self
    }

    /// Parse a header value such as `application/json;odata.metadata=full;charset=utf-8`.
    ///
    /// Parameter names are case-insensitive; the OData 4.01 short forms
    /// `metadata` and `streaming` are accepted as aliases.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidMediaType("empty media type".into()));
        }

        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        let (main, sub) = match essence.split_once('/') {
            Some((m, s)) if is_token(m) && is_token(s) => (m, s),
            _ => {
                return Err(Error::InvalidMediaType(format!(
                    "expected type/subtype, got '{}'",
                    essence
                )))
            }
        };

        let mut mt = MediaType::new(main, sub);
        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, value) = part.split_once('=').ok_or_else(|| {
                Error::InvalidMediaType(format!("parameter without value: '{}'", part))
            })?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"');
            if name.is_empty() || value.is_empty() {
                return Err(Error::InvalidMediaType(format!(
                    "malformed parameter: '{}'",
                    part
                )));
            }

            match name.as_str() {
                METADATA_PARAM | "metadata" => {
                    let level = MetadataLevel::parse(value).ok_or_else(|| {
                        Error::InvalidMediaType(format!("unknown odata.metadata value '{}'", value))
                    })?;
                    mt.metadata = Some(level);
                }
                STREAMING_PARAM | "streaming" => {
                    let flag = match value.to_ascii_lowercase().as_str() {
                        "true" => true,
                        "false" => false,
                        other => {
                            return Err(Error::InvalidMediaType(format!(
                                "unknown odata.streaming value '{}'",
                                other
                            )))
                        }
                    };
                    mt.streaming = Some(flag);
                }
                CHARSET_PARAM => mt.charset = Some(value.to_ascii_lowercase()),
                _ => mt.params.push((name, value.to_string())),
            }
        }

        Ok(mt)
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    pub fn main_type(&self) -> &str {
        &self.main
    }

    pub fn sub_type(&self) -> &str {
        &self.sub
    }

    pub fn metadata(&self) -> Option<MetadataLevel> {
        self.metadata
    }

    pub fn streaming(&self) -> Option<bool> {
        self.streaming
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Parameters other than the OData ones and `charset`, in input order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_json(&self) -> bool {
        self.main == "application" && (self.sub == "json" || self.sub.ends_with("+json"))
    }

    pub fn is_xml(&self) -> bool {
        (self.main == "application" || self.main == "text")
            && (self.sub == "xml" || self.sub.ends_with("+xml"))
    }

    /// Render the exact token registered in the formatter registry:
    /// `type/subtype[;odata.metadata=..][;odata.streaming=..][;other=..]`.
    pub fn to_canonical(&self) -> String {
        let mut out = self.essence();
        if let Some(level) = self.metadata {
            out.push(';');
            out.push_str(METADATA_PARAM);
            out.push('=');
            out.push_str(level.as_str());
        }
        if let Some(streaming) = self.streaming {
            out.push(';');
            out.push_str(STREAMING_PARAM);
            out.push('=');
            out.push_str(if streaming { "true" } else { "false" });
        }
        for (name, value) in &self.params {
            out.push(';');
            out.push_str(name);
            out.push('=');
            out.push_str(value);
        }
        out
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MediaType::parse(s)
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+*".contains(&b))
}

/// The JSON media types in negotiation-preference order: every metadata level
/// with `streaming=true`, `streaming=false` and no streaming flag, followed by
/// the same three streaming variants without a metadata level.
pub fn json_media_types() -> Vec<MediaType> {
    let mut out = Vec::with_capacity(12);
    for level in MetadataLevel::ALL {
        out.push(MediaType::json().with_metadata(level).with_streaming(true));
        out.push(MediaType::json().with_metadata(level).with_streaming(false));
        out.push(MediaType::json().with_metadata(level));
    }
    out.push(MediaType::json().with_streaming(true));
    out.push(MediaType::json().with_streaming(false));
    out.push(MediaType::json());
    out
}
