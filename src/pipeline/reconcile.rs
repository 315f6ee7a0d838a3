//! Response reconciliation: page-indexed collections → one record per page.
//!
//! The service reports each kind of finding as its own array, keyed by a
//! page-number field whose name differs between arrays and versions. This
//! stage joins them into [`PageRecord`]s for `1..=total_pages` and copies the
//! overall verdict across.
//!
//! ## Rules
//!
//! - Every page in range gets a record, even when no collection mentions it.
//! - Entries outside `1..=total_pages` are ignored.
//! - Duplicate page numbers within one collection: the last entry wins.
//! - Image checks are normalised to one [`ImageChecks`] shape whichever way
//!   they were delivered; a combined entry beats split entries for the
//!   same page.
//! - Reconciliation never fails. It is a pure function of the body.

use crate::pipeline::raw::{
    ImageShape, RawFinalVerdict, RawImageEntry, RawLegacyResults, RawLegacySignatureDetail,
    RawLogoEntry, RawObservation, RawPageEntry, RawRegion, RawReport, RawSignatureEntry,
    RawValidInfo, decode_list,
};
use crate::report::{
    DocumentInfo, FinalVerdict, ImageChecks, InsuredPerson, Observation, PageRecord,
    SignatureRegion, ValidationReport,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Upper bound on the page count accepted from a response.
///
/// A corrupt `total_pages` must not make us allocate millions of records.
pub const MAX_PAGES: usize = 10_000;

/// Reconcile a raw response body into a [`ValidationReport`].
pub fn reconcile(body: &Value) -> ValidationReport {
    reconcile_raw(RawReport::from_value(body))
}

/// Reconcile an already-decoded [`RawReport`].
pub fn reconcile_raw(raw: RawReport) -> ValidationReport {
    let mut info: HashMap<usize, DocumentInfo> = HashMap::new();
    for entry in &raw.pages {
        if let Some((page, di)) = page_info(entry) {
            info.insert(page, di);
        }
    }

    let mut observations: HashMap<usize, Observation> = HashMap::new();
    for entry in &raw.observations {
        match entry.keys.page() {
            Some(page) => {
                observations.insert(page, observation(entry));
            }
            None => debug!("Skipping observation without a page number"),
        }
    }

    let mut images = image_checks(&raw.images);

    if let Some(ref legacy) = raw.legacy {
        apply_legacy(legacy, &mut info, &mut images);
    }

    let total_pages = resolve_total_pages(raw.total_pages, &info, &observations, &images);

    let pages = (1..=total_pages)
        .map(|n| PageRecord {
            page_number: n,
            document_info: info.remove(&n),
            observation: observations.remove(&n),
            image_checks: images.remove(&n),
        })
        .collect();

    let leftover = info.len() + observations.len() + images.len();
    if leftover > 0 {
        debug!(
            "Ignored {} page entries outside 1..={}",
            leftover, total_pages
        );
    }

    let final_verdict = match raw.final_verdict {
        Some(ref v) => final_verdict(v),
        None => {
            debug!("Response carries no final_verdict; defaulting to a failed verdict");
            FinalVerdict::default()
        }
    };

    let total_signatures = raw
        .legacy
        .as_ref()
        .and_then(|l| l.signatures.as_ref())
        .and_then(|s| s.total_found.as_u32());

    ValidationReport {
        total_pages,
        pages,
        final_verdict,
        total_signatures,
    }
}

/// Declared page count, or the highest page number seen when it is absent.
fn resolve_total_pages(
    declared: Option<usize>,
    info: &HashMap<usize, DocumentInfo>,
    observations: &HashMap<usize, Observation>,
    images: &HashMap<usize, ImageChecks>,
) -> usize {
    let total = match declared {
        Some(n) => n,
        None => {
            let derived = info
                .keys()
                .chain(observations.keys())
                .chain(images.keys())
                .copied()
                .max()
                .unwrap_or(0);
            debug!("total_pages absent; derived {} from page entries", derived);
            derived
        }
    };
    if total > MAX_PAGES {
        warn!("Page count {} exceeds {}; truncating", total, MAX_PAGES);
        return MAX_PAGES;
    }
    total
}

fn page_info(entry: &RawPageEntry) -> Option<(usize, DocumentInfo)> {
    let Some(page) = entry.keys.page() else {
        debug!("Skipping page entry without a page number");
        return None;
    };
    let di = entry
        .diagnostics
        .valid_info
        .as_ref()
        .map(document_info)
        .unwrap_or_default();
    Some((page, di))
}

fn document_info(v: &RawValidInfo) -> DocumentInfo {
    DocumentInfo {
        validity: v.validity.0.clone(),
        company: v.company.0.clone().or_else(|| v.enterprise.0.clone()),
        policy_number: v.policy_number.0.clone(),
        issuance_date: v.date_of_issuance.0.clone(),
        insured_person: v.person_by_policy.as_ref().map(|p| InsuredPerson {
            name: p.name.0.clone(),
            policy_number: p.policy_number.0.clone(),
            company: p.company.0.clone(),
        }),
    }
}

fn observation(o: &RawObservation) -> Observation {
    Observation {
        verdict: o.verdict.0,
        reason: o.reason.0.clone(),
        validity_passed: o.details.validity_validation_passed.0,
        policy_passed: o.details.policy_validation_passed.0,
        person_passed: o.details.person_validation_passed.0,
    }
}

// ── Image checks ─────────────────────────────────────────────────────────

fn image_checks(shape: &ImageShape) -> HashMap<usize, ImageChecks> {
    match shape {
        ImageShape::Absent => HashMap::new(),
        ImageShape::Split { logos, signatures } => from_split(logos, signatures),
        ImageShape::Combined(entries) => from_combined(entries),
        ImageShape::Mixed {
            combined,
            logos,
            signatures,
        } => {
            let mut merged = from_split(logos, signatures);
            merged.extend(from_combined(combined));
            merged
        }
    }
}

fn from_combined(entries: &[RawImageEntry]) -> HashMap<usize, ImageChecks> {
    let mut out = HashMap::new();
    for e in entries {
        let Some(page) = e.keys.page() else {
            debug!("Skipping validation_images entry without a page number");
            continue;
        };
        out.insert(
            page,
            ImageChecks {
                logo_detected: e.logo_status.0,
                logo_label: e.logo.0.clone(),
                signature_detected: e.signature_status.0,
                signatures_found: e.signatures_found.as_u32(),
                signature_regions: regions(&e.signatures_details),
                diagnostic: e.diagnostics.0.clone(),
            },
        );
    }
    out
}

fn from_split(
    logos: &[RawLogoEntry],
    signatures: &[RawSignatureEntry],
) -> HashMap<usize, ImageChecks> {
    let mut logo_by_page: HashMap<usize, &RawLogoEntry> = HashMap::new();
    for l in logos {
        match l.keys.page() {
            Some(page) => {
                logo_by_page.insert(page, l);
            }
            None => debug!("Skipping logo entry without a page number"),
        }
    }

    let mut sig_by_page: HashMap<usize, &RawSignatureEntry> = HashMap::new();
    for s in signatures {
        match s.page() {
            Some(page) => {
                sig_by_page.insert(page, s);
            }
            None => debug!("Skipping signature entry without a page number"),
        }
    }

    let mut out = HashMap::new();
    for page in logo_by_page.keys().chain(sig_by_page.keys()).copied() {
        if out.contains_key(&page) {
            continue;
        }
        let logo = logo_by_page.get(&page);
        let sig = sig_by_page.get(&page);
        out.insert(
            page,
            ImageChecks {
                logo_detected: logo.and_then(|l| l.logo_status.0),
                logo_label: logo.and_then(|l| l.logo.0.clone()),
                signature_detected: sig.and_then(|s| s.signature_status.0),
                signatures_found: sig.and_then(|s| s.metadata.signatures_found.as_u32()),
                signature_regions: sig
                    .map(|s| regions(&s.metadata.signatures_details))
                    .unwrap_or_default(),
                diagnostic: logo.and_then(|l| l.diagnostics.0.clone()),
            },
        );
    }
    out
}

fn regions(details: &[Value]) -> Vec<SignatureRegion> {
    decode_list::<RawRegion>(Some(&Value::Array(details.to_vec())), "signatures_details")
        .into_iter()
        .map(|r| SignatureRegion {
            left: r.left.round() as i64,
            top: r.top.round() as i64,
            width: r.width.round() as i64,
            height: r.height.round() as i64,
        })
        .collect()
}

// ── Legacy single-document shape ─────────────────────────────────────────

/// Fold the legacy `validation_results` block into the per-page maps.
///
/// Legacy data only fills gaps; current-shape entries for the same page
/// are left untouched.
fn apply_legacy(
    legacy: &RawLegacyResults,
    info: &mut HashMap<usize, DocumentInfo>,
    images: &mut HashMap<usize, ImageChecks>,
) {
    if let Some(ref valid) = legacy.valid_data {
        info.entry(1).or_insert_with(|| document_info(valid));
    }

    let Some(ref sigs) = legacy.signatures else {
        return;
    };
    let details: Vec<RawLegacySignatureDetail> =
        decode_list(Some(&Value::Array(sigs.details.clone())), "signatures.details");
    for d in details {
        let (Some(page), Some(found)) = (d.keys.page(), d.signatures_found.as_u32()) else {
            continue;
        };
        let checks = images.entry(page).or_default();
        if checks.signatures_found.is_none() {
            checks.signatures_found = Some(found);
        }
        if checks.signature_detected.is_none() {
            checks.signature_detected = Some(found > 0);
        }
    }
}

// ── Final verdict ────────────────────────────────────────────────────────

fn final_verdict(v: &RawFinalVerdict) -> FinalVerdict {
    let d = &v.details;
    FinalVerdict {
        verdict: v.verdict.0.unwrap_or(false),
        reason: v.reason.0.clone().unwrap_or_default(),
        logo_passed: d.logo_validation_passed.0,
        validity_passed: d
            .document_validity_approved
            .0
            .or(d.validity_validation_passed.0),
        signature_passed: d.signature_validation_passed.0,
        person_passed: d.person_validation_passed.0,
    }
}
