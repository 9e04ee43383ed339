//! Cohort selection: the top-N entities by population.
//!
//! The land-use table has one row per (entity, year). Ranking uses one
//! representative row per entity (its most recent year) so that entities
//! with longer histories are not double counted.
//!
//! Eligibility rules:
//! - the row must carry a country code (OWID aggregates like continents ship
//!   without one)
//! - the `World` pseudo-entity is excluded even though it has a code
//! - the ranking value must be present and finite

use std::collections::HashMap;

use crate::error::AppError;
use crate::io::ingest::LandUseRow;

/// Aggregate pseudo-entity that carries a code but is not a country.
const AGGREGATE_ENTITY: &str = "World";

/// Return the `top_n` entity names with the largest population, in
/// descending population order.
///
/// Determinism: the representative row per entity is its maximum year (the
/// first-read row wins among equal years), and ranking ties are broken by
/// the order entities first appear in the input.
///
/// `top_n == 0` is a configuration error. If fewer than `top_n` entities are
/// eligible, the full eligible set is returned (clamping, not an error).
pub fn select_top_entities(rows: &[LandUseRow], top_n: usize) -> Result<Vec<String>, AppError> {
    if top_n == 0 {
        return Err(AppError::configuration(
            "Cohort size must be > 0 (got top_n=0).",
        ));
    }

    struct Latest {
        first_seen: usize,
        year: i32,
        population: f64,
    }

    let mut by_entity: HashMap<&str, Latest> = HashMap::new();
    let mut entity_order: Vec<&str> = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        if row.code.is_none() || row.entity == AGGREGATE_ENTITY {
            continue;
        }
        let Some(population) = row.population.filter(|p| p.is_finite()) else {
            continue;
        };

        match by_entity.get_mut(row.entity.as_str()) {
            Some(latest) => {
                if row.year > latest.year {
                    latest.year = row.year;
                    latest.population = population;
                }
            }
            None => {
                by_entity.insert(
                    row.entity.as_str(),
                    Latest {
                        first_seen: idx,
                        year: row.year,
                        population,
                    },
                );
                entity_order.push(row.entity.as_str());
            }
        }
    }

    let mut ranked: Vec<(&str, &Latest)> = entity_order
        .iter()
        .map(|&entity| (entity, &by_entity[entity]))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.population
            .partial_cmp(&a.1.population)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.first_seen.cmp(&b.1.first_seen))
    });

    Ok(ranked
        .into_iter()
        .take(top_n)
        .map(|(entity, _)| entity.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entity: &str, code: Option<&str>, year: i32, population: Option<f64>) -> LandUseRow {
        LandUseRow {
            entity: entity.to_string(),
            code: code.map(str::to_string),
            year,
            population,
        }
    }

    #[test]
    fn returns_top_n_in_descending_rank_order() {
        // Ranking values [50, 10, 90, 30] for [A, B, C, D], N=2 -> [C, A].
        let rows = vec![
            row("A", Some("AAA"), 2019, Some(50.0)),
            row("B", Some("BBB"), 2019, Some(10.0)),
            row("C", Some("CCC"), 2019, Some(90.0)),
            row("D", Some("DDD"), 2019, Some(30.0)),
        ];
        let cohort = select_top_entities(&rows, 2).unwrap();
        assert_eq!(cohort, vec!["C", "A"]);
    }

    #[test]
    fn ranks_by_the_most_recent_year_per_entity() {
        // A's old population dwarfs everything, but its most recent row is
        // small; the old row must not be used.
        let rows = vec![
            row("A", Some("AAA"), 1960, Some(1e12)),
            row("A", Some("AAA"), 2019, Some(5.0)),
            row("B", Some("BBB"), 2019, Some(10.0)),
        ];
        let cohort = select_top_entities(&rows, 2).unwrap();
        assert_eq!(cohort, vec!["B", "A"]);
    }

    #[test]
    fn excludes_aggregates_and_codeless_rows() {
        let rows = vec![
            row("World", Some("OWID_WRL"), 2019, Some(7.7e9)),
            row("Asia", None, 2019, Some(4.6e9)),
            row("India", Some("IND"), 2019, Some(1.4e9)),
        ];
        let cohort = select_top_entities(&rows, 3).unwrap();
        assert_eq!(cohort, vec!["India"]);
    }

    #[test]
    fn missing_population_makes_an_entity_ineligible() {
        let rows = vec![
            row("A", Some("AAA"), 2019, None),
            row("B", Some("BBB"), 2019, Some(10.0)),
        ];
        let cohort = select_top_entities(&rows, 2).unwrap();
        assert_eq!(cohort, vec!["B"]);
    }

    #[test]
    fn clamps_when_n_exceeds_eligible_count() {
        let rows = vec![row("A", Some("AAA"), 2019, Some(1.0))];
        let cohort = select_top_entities(&rows, 30).unwrap();
        assert_eq!(cohort, vec!["A"]);
    }

    #[test]
    fn zero_n_is_a_configuration_error() {
        let rows = vec![row("A", Some("AAA"), 2019, Some(1.0))];
        let err = select_top_entities(&rows, 0).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn ties_break_by_first_appearance() {
        let rows = vec![
            row("A", Some("AAA"), 2019, Some(10.0)),
            row("B", Some("BBB"), 2019, Some(10.0)),
        ];
        let cohort = select_top_entities(&rows, 2).unwrap();
        assert_eq!(cohort, vec!["A", "B"]);
    }
}
