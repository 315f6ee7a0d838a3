//! Raw response shapes, as the service has emitted them over time.
//!
//! Nothing here escapes [`crate::pipeline::reconcile`]. Decoding is
//! deliberately loose: every field is optional, scalars accept the string
//! forms older service versions produced, and each collection entry is
//! decoded on its own so one bad entry cannot sink the rest. A `null` or
//! mistyped nested object or list decodes as empty and keeps its entry.
//!
//! ## Known shapes
//!
//! | Shape | Fields |
//! |-------|--------|
//! | current | `total_pages`, `pages[]`, `observations[]`, `final_verdict` |
//! | split image checks | `logo[]` (keyed by `page_num`), `signatures[]` (keyed by `metadata.page_number`) |
//! | combined image checks | `validation_images[]` (keyed by `page_num`) |
//! | legacy single-document | `validation_results { valid_data, signatures }` |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Top-level fields whose presence marks a body as a current-shape report.
pub const CURRENT_REPORT_FIELDS: [&str; 3] = ["final_verdict", "pages", "total_pages"];

/// Top-level field of the legacy single-document report.
pub const LEGACY_REPORT_FIELD: &str = "validation_results";

/// Minimal shape check: a JSON object carrying at least one current or
/// legacy report field.
pub fn has_report_fields(body: &Value) -> bool {
    match body.as_object() {
        Some(obj) => {
            CURRENT_REPORT_FIELDS.iter().any(|f| obj.contains_key(*f))
                || obj.contains_key(LEGACY_REPORT_FIELD)
        }
        None => false,
    }
}

// ── Loose scalars ────────────────────────────────────────────────────────

/// A boolean that also accepts `"true"` / `"false"` strings.
///
/// Anything else (null, numbers, other strings) decodes as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LooseBool(pub Option<bool>);

impl<'de> Deserialize<'de> for LooseBool {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(LooseBool(match v {
            Value::Bool(b) => Some(b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }))
    }
}

/// Free text that also accepts numbers (policy numbers are sometimes numeric).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LooseText(pub Option<String>);

impl<'de> Deserialize<'de> for LooseText {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(LooseText(match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }))
    }
}

/// A non-negative integer that also accepts integral floats and numeric strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LooseCount(pub Option<u64>);

impl<'de> Deserialize<'de> for LooseCount {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(LooseCount(value_as_count(&v)))
    }
}

fn value_as_count(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl LooseCount {
    /// Interpret as a 1-based page number; zero is not a page.
    pub fn page(self) -> Option<usize> {
        self.0
            .filter(|n| *n >= 1)
            .and_then(|n| usize::try_from(n).ok())
    }

    pub fn as_u32(self) -> Option<u32> {
        self.0.and_then(|n| u32::try_from(n).ok())
    }
}

/// Field deserializer for nested objects and lists: `null` or a value of
/// the wrong type becomes `T::default()` instead of failing the whole entry.
fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let v = Value::deserialize(d)?;
    if v.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(&v).unwrap_or_else(|e| {
        debug!("Ignoring malformed nested field: {}", e);
        T::default()
    }))
}

/// The page-number keys seen across collections and service versions.
///
/// Kept as separate fields so an entry carrying more than one of them still
/// decodes; [`PageKeys::page`] picks `page_number`, then `page_num`, then `page`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PageKeys {
    pub page_number: LooseCount,
    pub page_num: LooseCount,
    pub page: LooseCount,
}

impl PageKeys {
    pub fn page(self) -> Option<usize> {
        self.page_number
            .page()
            .or(self.page_num.page())
            .or(self.page.page())
    }
}

// ── Collection entries ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPageEntry {
    #[serde(flatten)]
    pub keys: PageKeys,
    #[serde(deserialize_with = "lenient")]
    pub diagnostics: RawDiagnostics,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDiagnostics {
    #[serde(deserialize_with = "lenient")]
    pub valid_info: Option<RawValidInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawValidInfo {
    pub validity: LooseText,
    pub company: LooseText,
    /// Legacy name for `company`.
    pub enterprise: LooseText,
    pub policy_number: LooseText,
    pub date_of_issuance: LooseText,
    #[serde(deserialize_with = "lenient")]
    pub person_by_policy: Option<RawPerson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPerson {
    pub name: LooseText,
    pub policy_number: LooseText,
    pub company: LooseText,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawObservation {
    #[serde(flatten)]
    pub keys: PageKeys,
    pub verdict: LooseBool,
    pub reason: LooseText,
    #[serde(deserialize_with = "lenient")]
    pub details: RawObservationDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawObservationDetails {
    pub validity_validation_passed: LooseBool,
    pub policy_validation_passed: LooseBool,
    pub person_validation_passed: LooseBool,
}

/// Entry of the split `logo[]` array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLogoEntry {
    #[serde(flatten)]
    pub keys: PageKeys,
    pub logo: LooseText,
    pub logo_status: LooseBool,
    pub diagnostics: LooseText,
}

/// Entry of the split `signatures[]` array.
///
/// The page number normally lives under `metadata`; a top-level one is
/// accepted as a fallback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSignatureEntry {
    #[serde(flatten)]
    pub keys: PageKeys,
    pub signature: LooseText,
    pub signature_status: LooseBool,
    #[serde(deserialize_with = "lenient")]
    pub metadata: RawSignatureMetadata,
}

impl RawSignatureEntry {
    pub fn page(&self) -> Option<usize> {
        self.metadata.keys.page().or(self.keys.page())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSignatureMetadata {
    #[serde(flatten)]
    pub keys: PageKeys,
    pub signatures_found: LooseCount,
    #[serde(deserialize_with = "lenient")]
    pub signatures_details: Vec<Value>,
}

/// Entry of the combined `validation_images[]` array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawImageEntry {
    #[serde(flatten)]
    pub keys: PageKeys,
    pub logo: LooseText,
    pub logo_status: LooseBool,
    pub signature_status: LooseBool,
    pub diagnostics: LooseText,
    pub signatures_found: LooseCount,
    #[serde(deserialize_with = "lenient")]
    pub signatures_details: Vec<Value>,
}

/// Bounding box of one detected signature. Coordinates may arrive as floats.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct RawRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFinalVerdict {
    pub verdict: LooseBool,
    pub reason: LooseText,
    #[serde(deserialize_with = "lenient")]
    pub details: RawVerdictDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVerdictDetails {
    pub logo_validation_passed: LooseBool,
    pub signature_validation_passed: LooseBool,
    pub document_validity_approved: LooseBool,
    /// Older name for `document_validity_approved`.
    pub validity_validation_passed: LooseBool,
    pub person_validation_passed: LooseBool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLegacyResults {
    #[serde(deserialize_with = "lenient")]
    pub valid_data: Option<RawValidInfo>,
    #[serde(deserialize_with = "lenient")]
    pub signatures: Option<RawLegacySignatures>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLegacySignatures {
    pub total_found: LooseCount,
    #[serde(deserialize_with = "lenient")]
    pub details: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLegacySignatureDetail {
    #[serde(flatten)]
    pub keys: PageKeys,
    pub signatures_found: LooseCount,
}

// ── Whole report ─────────────────────────────────────────────────────────

/// How per-page image checks were delivered.
#[derive(Debug, Clone, Default)]
pub enum ImageShape {
    /// Neither image-check collection is present.
    #[default]
    Absent,
    /// Separate `logo[]` and `signatures[]` arrays.
    Split {
        logos: Vec<RawLogoEntry>,
        signatures: Vec<RawSignatureEntry>,
    },
    /// A single `validation_images[]` array.
    Combined(Vec<RawImageEntry>),
    /// Both forms at once. Combined entries take precedence per page.
    Mixed {
        combined: Vec<RawImageEntry>,
        logos: Vec<RawLogoEntry>,
        signatures: Vec<RawSignatureEntry>,
    },
}

/// The raw report, split into its independently-indexed collections.
#[derive(Debug, Clone, Default)]
pub struct RawReport {
    pub total_pages: Option<usize>,
    pub pages: Vec<RawPageEntry>,
    pub observations: Vec<RawObservation>,
    pub images: ImageShape,
    pub final_verdict: Option<RawFinalVerdict>,
    pub legacy: Option<RawLegacyResults>,
}

impl RawReport {
    /// Decode a response body. Never fails: unknown or broken parts are
    /// dropped and logged at debug level.
    pub fn from_value(body: &Value) -> Self {
        let Some(obj) = body.as_object() else {
            debug!("Response body is not an object; reconciling as empty");
            return Self::default();
        };

        let total_pages = obj
            .get("total_pages")
            .and_then(value_as_count)
            .and_then(|n| usize::try_from(n).ok());

        let has_split = obj.contains_key("logo") || obj.contains_key("signatures");
        let images = match (obj.get("validation_images"), has_split) {
            (None, false) => ImageShape::Absent,
            (None, true) => ImageShape::Split {
                logos: decode_list(obj.get("logo"), "logo"),
                signatures: decode_list(obj.get("signatures"), "signatures"),
            },
            (Some(v), false) => ImageShape::Combined(decode_list(Some(v), "validation_images")),
            (Some(v), true) => ImageShape::Mixed {
                combined: decode_list(Some(v), "validation_images"),
                logos: decode_list(obj.get("logo"), "logo"),
                signatures: decode_list(obj.get("signatures"), "signatures"),
            },
        };

        Self {
            total_pages,
            pages: decode_list(obj.get("pages"), "pages"),
            observations: decode_list(obj.get("observations"), "observations"),
            images,
            final_verdict: decode_one(obj.get("final_verdict"), "final_verdict"),
            legacy: decode_one(obj.get(LEGACY_REPORT_FIELD), LEGACY_REPORT_FIELD),
        }
    }
}

/// Decode each element of an array independently, skipping failures.
pub fn decode_list<T: DeserializeOwned>(value: Option<&Value>, field: &str) -> Vec<T> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match T::deserialize(item) {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!("Skipping {}[{}]: {}", field, i, e);
                    None
                }
            })
            .collect(),
        Some(_) => {
            debug!("Ignoring '{}': not an array", field);
            Vec::new()
        }
    }
}

fn decode_one<T: DeserializeOwned>(value: Option<&Value>, field: &str) -> Option<T> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => match T::deserialize(v) {
            Ok(t) => Some(t),
            Err(e) => {
                debug!("Ignoring '{}': {}", field, e);
                None
            }
        },
    }
}
