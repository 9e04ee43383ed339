//! Grouped model fitting: one independent regression per (entity, crop).
//!
//! The tidy table is partitioned into groups keyed by (entity, crop) in
//! **order of first appearance**; that order is fixed and determines the
//! order of the output records. Each group's regression is independent, so
//! groups are fitted in parallel; results are collected back in group order
//! regardless of scheduling.
//!
//! Groups that cannot be fit are skipped and reported; one bad group never
//! aborts the batch.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::domain::{GroupKey, Observation, SkippedGroup, SlopeRecord};
use crate::fit::linreg::fit_trend;

/// Fan-out result: one record per valid group plus the skipped remainder.
///
/// `records` hold **raw** p-values here; the corrector overwrites them once
/// the whole batch exists.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub records: Vec<SlopeRecord>,
    pub skipped: Vec<SkippedGroup>,
}

/// Partition observations into (entity, crop) groups, preserving the order
/// in which each key first appears.
pub fn group_observations(observations: &[Observation]) -> Vec<(GroupKey, Vec<Observation>)> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<Observation>)> = Vec::new();

    for obs in observations {
        let key = GroupKey {
            entity: obs.entity.clone(),
            crop: obs.crop.clone(),
        };
        match index.get(&key) {
            Some(&i) => groups[i].1.push(obs.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![obs.clone()]));
            }
        }
    }

    groups
}

/// Fit every group and extract the year-term record from each fit.
pub fn fit_groups(observations: &[Observation]) -> FitOutcome {
    let groups = group_observations(observations);

    // Each group is independent; rayon preserves input order on collect, so
    // the output stays in group order.
    let results: Vec<Result<SlopeRecord, SkippedGroup>> = groups
        .par_iter()
        .map(|(key, members)| {
            let years: Vec<i32> = members.iter().map(|o| o.year).collect();
            let values: Vec<f64> = members.iter().map(|o| o.yield_).collect();

            match fit_trend(&years, &values) {
                Ok(fit) => Ok(SlopeRecord {
                    entity: key.entity.clone(),
                    crop: key.crop.clone(),
                    estimate: fit.slope,
                    std_error: fit.slope_se,
                    t_value: fit.t_value,
                    p_value: fit.p_value,
                }),
                Err(reason) => Err(SkippedGroup {
                    key: key.clone(),
                    reason,
                }),
            }
        })
        .collect();

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(skip) => skipped.push(skip),
        }
    }

    FitOutcome { records, skipped }
}
