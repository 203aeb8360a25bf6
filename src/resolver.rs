//! Variant Resolver - Ascending Scan For The Best Allowed Rendition
//!
//! A page's image family is `{path}_0.jpg` (master) through `{path}_8.jpg`
//! (smallest). The resolver walks the family in ascending index order and
//! returns the first variant the archive's rule set permits, so the largest
//! allowed rendition always wins.

use std::path::Path;

use tracing::{debug, error};

use crate::inspect::{FsInspector, ImageInspector, InspectError};
use crate::policy::{Allowance, Violation};
use crate::rules::{Downloadable, RepositoryRule};
use crate::{DEFAULT_DPI, MAX_VARIANT};

/// Find the first allowed image variant for one page, reading from the
/// filesystem under `root`.
pub fn find_allowed_facsimile(root: &Path, path: &str, rule: &RepositoryRule) -> Allowance {
    resolve(&FsInspector, root, path, rule)
}

/// Resolver core over an arbitrary [`ImageInspector`].
///
/// Never returns an error: unreadable or missing images are an expected
/// per-page condition in a corpus with incomplete holdings and map to a
/// `not-found` allowance.
pub fn resolve<I: ImageInspector>(
    inspector: &I,
    root: &Path,
    path: &str,
    rule: &RepositoryRule,
) -> Allowance {
    if rule.downloadable != Downloadable::Yes {
        debug!(path, ?rule, "downloadable != yes");
        return Allowance::denied("no-download");
    }
    if rule.reduced() {
        debug!(path, "reduced resolution forced by policy");
        return Allowance::reduced(path);
    }
    match scan_variants(inspector, root, path, rule) {
        Ok(allowance) => allowance,
        Err(err) => {
            error!(path, root = %root.display(), error = %err, "Failed to read image");
            Allowance::denied("not-found")
        }
    }
}

fn scan_variants<I: ImageInspector>(
    inspector: &I,
    root: &Path,
    path: &str,
    rule: &RepositoryRule,
) -> Result<Allowance, InspectError> {
    // Variant 0 calibrates the dpi scale for the whole family.
    let master = root.join(format!("{path}_0.jpg"));
    let orig_width = inspector.width(&master)?;
    let orig_dpi = inspector.dpi(&master).unwrap_or(DEFAULT_DPI);

    let mut last_violation: Option<Violation> = None;
    for variant in 0..=MAX_VARIANT {
        let filename = format!("{path}_{variant}.jpg");
        let width = inspector.width(&root.join(&filename))?;
        let dpi = (f64::from(orig_dpi) * f64::from(width) / f64::from(orig_width)).round() as u32;
        match rule.check(width, dpi) {
            None => {
                return Ok(Allowance::found(
                    filename,
                    variant,
                    last_violation,
                    width,
                    dpi,
                ))
            }
            Some(violation) => last_violation = Some(violation),
        }
    }

    // Every variant rejected: surface why the smallest one still failed.
    Ok(Allowance::denied(
        last_violation.map(|v| v.to_string()).unwrap_or_default(),
    ))
}
