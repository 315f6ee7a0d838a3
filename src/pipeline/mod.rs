//! Pipeline stages for one validation attempt.
//!
//! Each submodule implements exactly one step. Only [`submit`] touches the
//! network; the rest are pure or local-file only.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ request ──▶ submit ──▶ raw ──▶ reconcile
//! (path)    (checks)    (POST)     (JSON)  (per-page report)
//! ```
//!
//! 1. [`input`]     — read a local file and sniff its MIME type
//! 2. [`request`]   — enforce local preconditions and normalise the reference
//!    date before anything is sent
//! 3. [`submit`]    — multipart POST under a timeout; folds every failure
//!    into a [`crate::ClassifiedError`]
//! 4. [`raw`]       — tolerant view of the service's JSON, both image shapes
//!    and the legacy layout
//! 5. [`reconcile`] — join the raw collections into one record per page

pub mod input;
pub mod raw;
pub mod reconcile;
pub mod request;
pub mod submit;
