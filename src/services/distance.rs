//! Distance lookups between named locations
//!
//! The matrix may be stored as a lower triangle only; lookups are symmetric.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DistanceError {
    #[error("no location matches address '{0}'")]
    UnknownLocation(String),
    #[error("location index {index} out of range ({size} locations)")]
    IndexOutOfRange { index: usize, size: usize },
    #[error("no distance recorded between locations {0} and {1}")]
    MissingEntry(usize, usize),
    #[error("distance matrix has {rows} rows for {locations} locations")]
    ShapeMismatch { rows: usize, locations: usize },
    #[error("distance matrix row {row} has {cells} cells for {locations} locations")]
    RowTooLong {
        row: usize,
        cells: usize,
        locations: usize,
    },
    #[error("distance {from}->{to} is {forward} but {to}->{from} is {backward}")]
    Asymmetric {
        from: usize,
        to: usize,
        forward: f64,
        backward: f64,
    },
}

/// A named location; index 0 is the hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: usize,
    pub name: String,
    /// Full address text, matched against street fragments
    pub address: String,
}

/// Locations plus the distance matrix between them, in miles
#[derive(Debug, Clone)]
pub struct DistanceIndex {
    locations: Vec<Location>,
    /// `None` marks an empty cell
    distances: Vec<Vec<Option<f64>>>,
}

impl DistanceIndex {
    pub fn new(
        locations: Vec<Location>,
        distances: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, DistanceError> {
        let size = locations.len();
        if distances.len() != size {
            return Err(DistanceError::ShapeMismatch {
                rows: distances.len(),
                locations: size,
            });
        }
        if let Some((row, cells)) = distances.iter().enumerate().find(|(_, r)| r.len() > size) {
            return Err(DistanceError::RowTooLong {
                row,
                cells: cells.len(),
                locations: size,
            });
        }

        let index = Self {
            locations,
            distances,
        };
        for from in 0..size {
            for to in 0..from {
                if let (Some(forward), Some(backward)) = (index.cell(from, to), index.cell(to, from)) {
                    if forward != backward {
                        return Err(DistanceError::Asymmetric {
                            from,
                            to,
                            forward,
                            backward,
                        });
                    }
                }
            }
        }

        Ok(index)
    }

    pub fn size(&self) -> usize {
        self.locations.len()
    }

    /// Index of the first location whose address contains `fragment`
    pub fn location_index(&self, fragment: &str) -> Result<usize, DistanceError> {
        self.locations
            .iter()
            .position(|loc| loc.address.contains(fragment))
            .ok_or_else(|| DistanceError::UnknownLocation(fragment.to_string()))
    }

    fn cell(&self, from: usize, to: usize) -> Option<f64> {
        self.distances.get(from)?.get(to).copied().flatten()
    }

    /// Distance between two location indices, falling back to the mirrored cell.
    pub fn distance(&self, from: usize, to: usize) -> Result<f64, DistanceError> {
        let size = self.size();
        for index in [from, to] {
            if index >= size {
                return Err(DistanceError::IndexOutOfRange { index, size });
            }
        }

        self.cell(from, to)
            .or_else(|| self.cell(to, from))
            .ok_or(DistanceError::MissingEntry(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn location(index: usize, address: &str) -> Location {
        Location {
            index,
            name: format!("Location {}", index),
            address: address.to_string(),
        }
    }

    /// Hub plus two stops, lower triangle only
    fn small_index() -> DistanceIndex {
        DistanceIndex::new(
            vec![
                location(0, "4001 South 700 East, Salt Lake City, UT 84107"),
                location(1, "1060 Dalton Ave S (84104)"),
                location(2, "1330 2100 S (84106)"),
            ],
            vec![
                vec![Some(0.0), None, None],
                vec![Some(7.2), Some(0.0), None],
                vec![Some(3.8), Some(7.1), Some(0.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_location_index_by_fragment() {
        let index = small_index();
        assert_eq!(index.location_index("4001 South 700 East"), Ok(0));
        assert_eq!(index.location_index("1330 2100 S"), Ok(2));
        assert_eq!(index.location_index("(84104)"), Ok(1));
    }

    #[test]
    fn test_location_index_unknown() {
        let index = small_index();
        assert_eq!(
            index.location_index("999 Nowhere Rd"),
            Err(DistanceError::UnknownLocation("999 Nowhere Rd".to_string()))
        );
    }

    #[test]
    fn test_location_index_first_match_wins() {
        let index = DistanceIndex::new(
            vec![location(0, "410 S State St"), location(1, "410 S State St Annex")],
            vec![vec![Some(0.0)], vec![Some(0.5), Some(0.0)]],
        )
        .unwrap();
        assert_eq!(index.location_index("410 S State St"), Ok(0));
    }

    #[test]
    fn test_distance_uses_mirrored_cell() {
        let index = small_index();
        assert_eq!(index.distance(1, 0), Ok(7.2));
        assert_eq!(index.distance(0, 1), Ok(7.2));
        assert_eq!(index.distance(2, 1), Ok(7.1));
        assert_eq!(index.distance(1, 2), Ok(7.1));
        assert_eq!(index.distance(2, 2), Ok(0.0));
    }

    #[test]
    fn test_full_symmetric_matrix_accepted() {
        let index = DistanceIndex::new(
            vec![location(0, "a"), location(1, "b")],
            vec![vec![Some(0.0), Some(4.5)], vec![Some(4.5), Some(0.0)]],
        )
        .unwrap();
        assert_eq!(index.distance(0, 1), Ok(4.5));
        assert_eq!(index.distance(1, 0), Ok(4.5));
    }

    #[test]
    fn test_disagreeing_mirror_cells_rejected() {
        let result = DistanceIndex::new(
            vec![location(0, "a"), location(1, "b")],
            vec![vec![Some(0.0), Some(5.0)], vec![Some(3.0), Some(0.0)]],
        );
        assert_eq!(
            result.err(),
            Some(DistanceError::Asymmetric {
                from: 1,
                to: 0,
                forward: 3.0,
                backward: 5.0,
            })
        );
    }

    #[test]
    fn test_row_longer_than_location_count_rejected() {
        let result = DistanceIndex::new(
            vec![location(0, "a"), location(1, "b")],
            vec![
                vec![Some(0.0), None, None, None, Some(9.0)],
                vec![Some(3.0)],
            ],
        );
        assert_eq!(
            result.err(),
            Some(DistanceError::RowTooLong {
                row: 0,
                cells: 5,
                locations: 2,
            })
        );
    }

    #[test]
    fn test_missing_both_cells_is_error() {
        let index = DistanceIndex::new(
            vec![location(0, "a"), location(1, "b")],
            vec![vec![Some(0.0), None], vec![None, Some(0.0)]],
        )
        .unwrap();
        assert_eq!(index.distance(0, 1), Err(DistanceError::MissingEntry(0, 1)));
    }

    #[test]
    fn test_out_of_range_index() {
        let index = small_index();
        assert_eq!(
            index.distance(0, 3),
            Err(DistanceError::IndexOutOfRange { index: 3, size: 3 })
        );
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = DistanceIndex::new(vec![location(0, "a"), location(1, "b")], vec![vec![Some(0.0)]]);
        assert_eq!(
            result.err(),
            Some(DistanceError::ShapeMismatch { rows: 1, locations: 2 })
        );
    }

    #[test]
    fn test_random_lower_triangle_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 12;
        let locations = (0..n).map(|i| location(i, &format!("{} Main St", 100 + i))).collect();
        let mut rows = vec![vec![None; n]; n];
        for i in 0..n {
            for j in 0..=i {
                rows[i][j] = Some(if i == j { 0.0 } else { rng.gen_range(0.1..15.0) });
            }
        }
        let index = DistanceIndex::new(locations, rows).unwrap();

        for i in 0..n {
            for j in 0..n {
                assert_eq!(index.distance(i, j), index.distance(j, i));
                assert!(index.distance(i, j).unwrap() >= 0.0);
            }
        }
    }
}
