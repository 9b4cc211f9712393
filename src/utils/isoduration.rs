// src/utils/isoduration.rs

//! ISO-8601 duration parsing for manifest `mediaPresentationDuration` values.

use crate::error::{Error, Result};

/// Parse an ISO-8601 duration string into total seconds.
///
/// `"PT3H2M59.989333S"` is 3 hours, 2 minutes and 59.989333 seconds. The
/// `PT` prefix is required; each of the H/M/S fields is optional and
/// defaults to zero; fractional values are permitted.
pub fn total_seconds(iso: &str) -> Result<f64> {
    let rest = iso
        .strip_prefix("PT")
        .ok_or_else(|| Error::malformed("iso duration", format!("missing PT prefix in {iso:?}")))?;

    let mut remaining = rest;
    let mut total = 0.0;
    for (sep, factor) in [('H', 3600.0), ('M', 60.0), ('S', 1.0)] {
        if let Some(idx) = remaining.find(sep) {
            let field = &remaining[..idx];
            let value: f64 = field.parse().map_err(|_| {
                Error::malformed("iso duration", format!("bad {sep} field {field:?} in {iso:?}"))
            })?;
            total += value * factor;
            remaining = &remaining[idx + 1..];
        }
    }
    if !remaining.is_empty() {
        return Err(Error::malformed(
            "iso duration",
            format!("unparsed trailing {remaining:?} in {iso:?}"),
        ));
    }
    Ok(total)
}
