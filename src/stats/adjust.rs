//! Multiple-comparison correction across the fitted batch.
//!
//! Every (entity, crop) group contributes one hypothesis test, so the raw
//! p-values are only comparable after a global correction. The method is the
//! Benjamini–Hochberg false-discovery-rate step-up procedure, chosen
//! explicitly (it is the common default in statistical tooling):
//!
//! 1. sort the m raw p-values ascending, remembering original positions
//! 2. for ascending rank i (1-based), candidate `adj_i = raw_i · m / i`
//! 3. enforce monotonicity from the largest rank down:
//!    `adj_i = min(adj_i, adj_{i+1})`
//! 4. clamp to at most 1
//! 5. scatter back to original positions
//!
//! The correction couples all groups together: it is the pipeline's
//! synchronization barrier and must only run once every group has finished.

use crate::domain::SlopeRecord;
use crate::error::AppError;

/// Benjamini–Hochberg adjusted p-values, position-for-position.
///
/// Guarantees: elementwise `adjusted[i] >= raw[i]`, all outputs in [0, 1],
/// and the rank order of the inputs is preserved (ties stay ties).
///
/// Fails with a configuration error on an empty collection or on a raw value
/// outside [0, 1].
pub fn benjamini_hochberg(raw: &[f64]) -> Result<Vec<f64>, AppError> {
    let m = raw.len();
    if m == 0 {
        return Err(AppError::configuration(
            "Cannot adjust an empty p-value collection.",
        ));
    }
    for (i, &p) in raw.iter().enumerate() {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(AppError::configuration(format!(
                "Raw p-value out of range at position {i}: {p}"
            )));
        }
    }

    // Sort positions by p ascending; break ties by original position so the
    // pass is deterministic for any input order.
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| {
        raw[a]
            .partial_cmp(&raw[b])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut adjusted = vec![0.0; m];
    let mut running = f64::INFINITY;
    for rank in (1..=m).rev() {
        let pos = order[rank - 1];
        let candidate = raw[pos] * m as f64 / rank as f64;
        running = running.min(candidate);
        adjusted[pos] = running.min(1.0);
    }

    Ok(adjusted)
}

/// Overwrite each record's p-value with its adjusted value, in place,
/// one-to-one by position.
pub fn adjust_records_in_place(records: &mut [SlopeRecord]) -> Result<(), AppError> {
    let raw: Vec<f64> = records.iter().map(|r| r.p_value).collect();
    let adjusted = benjamini_hochberg(&raw)?;
    for (record, adj) in records.iter_mut().zip(adjusted) {
        record.p_value = adj;
    }
    Ok(())
}
