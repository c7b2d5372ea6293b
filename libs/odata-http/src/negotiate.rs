//! `Accept` / `$format` handling.
//!
//! Candidates come from the formatter registry in registration order. The
//! winner is the candidate with the highest q-value, where each candidate
//! takes the q of the most specific range that matches it (RFC 9110 §12.5.1).
//! Ties go to the earlier candidate.

use odata_core::{MediaType, MetadataLevel};

/// One entry of an `Accept` header.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptRange {
    pub media: MediaType,
    pub q: f32,
}

impl AcceptRange {
    /// Specificity of the match, or `None` if the range does not cover the
    /// candidate. Parameters listed in the range must be present on the
    /// candidate; extra candidate parameters are fine.
    fn match_specificity(&self, candidate: &MediaType) -> Option<usize> {
        let range = &self.media;
        let mut score = match (range.main_type(), range.sub_type()) {
            ("*", "*") => 0,
            (main, "*") if main == candidate.main_type() => 1,
            (main, sub) if main == candidate.main_type() && sub == candidate.sub_type() => 2,
            _ => return None,
        };

        if let Some(level) = range.metadata() {
            if candidate.metadata() != Some(level) {
                return None;
            }
            score += 1;
        }
        if let Some(streaming) = range.streaming() {
            if candidate.streaming() != Some(streaming) {
                return None;
            }
            score += 1;
        }
        for param in range.params() {
            if !candidate.params().contains(param) {
                return None;
            }
            score += 1;
        }
        Some(score)
    }
}

/// `qvalue = ( "0" [ "." 0*3DIGIT ] ) / ( "1" [ "." 0*3("0") ] )`
fn parse_qvalue(raw: &str) -> Option<f32> {
    let (int, frac) = raw.split_once('.').unwrap_or((raw, ""));
    if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match int {
        "0" => format!("0.{}", frac).parse::<f32>().ok(),
        "1" if frac.bytes().all(|b| b == b'0') => Some(1.0),
        _ => None,
    }
}

/// Parse an `Accept` header. Malformed ranges are skipped.
pub fn parse_accept(header: &str) -> Vec<AcceptRange> {
    header
        .split(',')
        .filter_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            let mut q = 1.0f32;
            let mut rest = Vec::new();
            for (i, part) in raw.split(';').enumerate() {
                let trimmed = part.trim();
                if i > 0 {
                    if let Some(v) = trimmed
                        .strip_prefix("q=")
                        .or_else(|| trimmed.strip_prefix("Q="))
                    {
                        q = parse_qvalue(v.trim())?;
                        continue;
                    }
                }
                rest.push(trimmed);
            }
            match MediaType::parse(&rest.join(";")) {
                Ok(media) => Some(AcceptRange { media, q }),
                Err(e) => {
                    tracing::debug!(range = raw, error = %e, "skipping malformed Accept range");
                    None
                }
            }
        })
        .collect()
}

/// What the client asked for: `$format` wins over `Accept`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatPreference {
    pub format: Option<String>,
    pub accept: Option<String>,
}

impl FormatPreference {
    pub fn from_accept(accept: impl Into<String>) -> Self {
        Self {
            format: None,
            accept: Some(accept.into()),
        }
    }

    pub fn from_format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            accept: None,
        }
    }

    /// The effective ranges. An invalid `$format` is an error; an invalid
    /// `Accept` degrades to "anything".
    pub fn ranges(&self) -> Result<Vec<AcceptRange>, String> {
        if let Some(format) = self.format.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
            let media = match format.to_ascii_lowercase().as_str() {
                "json" => MediaType::json(),
                "xml" => MediaType::xml(),
                _ => MediaType::parse(format).map_err(|e| e.to_string())?,
            };
            return Ok(vec![AcceptRange { media, q: 1.0 }]);
        }

        Ok(self
            .accept
            .as_deref()
            .map(parse_accept)
            .unwrap_or_default())
    }
}

/// Pick the best candidate for `ranges`.
///
/// No ranges means "anything": the first candidate wins. Candidates carrying
/// `preferred` metadata are tried before the others; with the registry's
/// default of `minimal` this leaves the registration order unchanged.
pub fn negotiate(
    ranges: &[AcceptRange],
    candidates: &[String],
    preferred: MetadataLevel,
) -> Option<MediaType> {
    let mut parsed: Vec<MediaType> = candidates
        .iter()
        .filter_map(|c| MediaType::parse(c).ok())
        .collect();
    // stable: keeps registry order within each group
    parsed.sort_by_key(|m| m.metadata() != Some(preferred));

    if ranges.is_empty() {
        return parsed.into_iter().next();
    }

    let mut best: Option<(f32, MediaType)> = None;
    for candidate in parsed {
        let q = ranges
            .iter()
            .filter_map(|r| r.match_specificity(&candidate).map(|s| (s, r.q)))
            .max_by_key(|(s, _)| *s)
            .map(|(_, q)| q)
            .unwrap_or(0.0);
        if q <= 0.0 {
            continue;
        }
        if best.as_ref().map_or(true, |(bq, _)| q > *bq) {
            best = Some((q, candidate));
        }
    }
    best.map(|(_, m)| m)
}
