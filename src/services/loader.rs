//! CSV loaders for the parcel, location and distance tables
//!
//! Rows are validated here; the dispatch code assumes well-formed records.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::services::distance::{DistanceError, DistanceIndex, Location};
use crate::services::parcel_store::ParcelStore;
use crate::types::{Address, Deadline, Parcel, ParcelId};

const PACKAGE_COLUMNS: usize = 8;
const LOCATION_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Packages,
    Locations,
    Distances,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Packages => "package",
            Table::Locations => "location",
            Table::Distances => "distance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {table} table '{path}': {source}")]
    Io {
        table: Table,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{table} table, row {row}: {source}")]
    Csv {
        table: Table,
        row: u64,
        #[source]
        source: csv::Error,
    },
    #[error("{table} table, row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        table: Table,
        row: u64,
        expected: usize,
        found: usize,
    },
    #[error("{table} table, row {row}: invalid {field} '{value}'")]
    InvalidField {
        table: Table,
        row: u64,
        field: &'static str,
        value: String,
    },
    #[error("package table, row {row}: duplicate parcel id {id}")]
    DuplicateId { row: u64, id: ParcelId },
    #[error(transparent)]
    Shape(#[from] DistanceError),
}

/// One row of the package table, columns in file order
#[derive(Debug, Deserialize)]
struct PackageRow {
    id: String,
    street: String,
    city: String,
    state: String,
    zip: String,
    deadline: String,
    weight: String,
    notes: String,
}

#[derive(Debug, Deserialize)]
struct LocationRow {
    index: String,
    name: String,
    address: String,
}

fn read_file(table: Table, path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        table,
        path: path.display().to_string(),
        source,
    })
}

fn reader(content: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(content.as_bytes())
}

/// Records with their 1-based line numbers
fn records(
    table: Table,
    content: &str,
    has_headers: bool,
) -> Result<Vec<(u64, csv::StringRecord)>, LoadError> {
    let first_line = if has_headers { 2 } else { 1 };
    let mut rows = Vec::new();

    for (i, result) in reader(content, has_headers).records().enumerate() {
        let fallback = first_line + i as u64;
        let record = result.map_err(|source| LoadError::Csv {
            table,
            row: source.position().map(|p| p.line()).unwrap_or(fallback),
            source,
        })?;
        let row = record.position().map(|p| p.line()).unwrap_or(fallback);
        rows.push((row, record));
    }

    Ok(rows)
}

fn expect_columns(
    table: Table,
    row: u64,
    record: &csv::StringRecord,
    expected: usize,
) -> Result<(), LoadError> {
    if record.len() != expected {
        return Err(LoadError::ColumnCount {
            table,
            row,
            expected,
            found: record.len(),
        });
    }
    Ok(())
}

fn invalid(table: Table, row: u64, field: &'static str, value: &str) -> LoadError {
    LoadError::InvalidField {
        table,
        row,
        field,
        value: value.to_string(),
    }
}

/// Parse the package table (header row first) into a parcel store.
pub fn parse_parcels(content: &str, bucket_count: usize) -> Result<ParcelStore, LoadError> {
    let table = Table::Packages;
    let mut store = ParcelStore::with_buckets(bucket_count);

    for (row, record) in records(table, content, true)? {
        expect_columns(table, row, &record, PACKAGE_COLUMNS)?;
        let fields: PackageRow = record
            .deserialize(None)
            .map_err(|source| LoadError::Csv { table, row, source })?;

        let id = fields
            .id
            .trim()
            .parse::<ParcelId>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| invalid(table, row, "parcel id", &fields.id))?;
        let weight = fields
            .weight
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite())
            .ok_or_else(|| invalid(table, row, "weight", &fields.weight))?;
        let deadline = Deadline::parse(&fields.deadline)
            .ok_or_else(|| invalid(table, row, "deadline", &fields.deadline))?;
        if fields.street.trim().is_empty() {
            return Err(invalid(table, row, "street", &fields.street));
        }

        if store.search(id).is_some() {
            return Err(LoadError::DuplicateId { row, id });
        }

        let address = Address {
            street: fields.street.trim().to_string(),
            city: fields.city.trim().to_string(),
            state: fields.state.trim().to_string(),
            zip: fields.zip.trim().to_string(),
        };
        store.insert(id, Parcel::new(id, address, deadline, weight, fields.notes));
    }

    debug!("Parsed {} parcels", store.len());
    Ok(store)
}

/// Parse the location table (no header). Row `n` must carry index `n`.
pub fn parse_locations(content: &str) -> Result<Vec<Location>, LoadError> {
    let table = Table::Locations;
    let mut locations = Vec::new();

    for (row, record) in records(table, content, false)? {
        expect_columns(table, row, &record, LOCATION_COLUMNS)?;
        let fields: LocationRow = record
            .deserialize(None)
            .map_err(|source| LoadError::Csv { table, row, source })?;

        let index = fields
            .index
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|index| *index == locations.len())
            .ok_or_else(|| invalid(table, row, "location index", &fields.index))?;

        locations.push(Location {
            index,
            name: fields.name.trim().to_string(),
            address: fields.address.trim().to_string(),
        });
    }

    Ok(locations)
}

/// Parse the distance matrix (no header). Empty cells are kept as `None`.
pub fn parse_distances(content: &str) -> Result<Vec<Vec<Option<f64>>>, LoadError> {
    let table = Table::Distances;
    let mut matrix = Vec::new();

    for (row, record) in records(table, content, false)? {
        let cells = record
            .iter()
            .map(|cell| {
                let cell = cell.trim();
                if cell.is_empty() {
                    return Ok(None);
                }
                cell.parse::<f64>()
                    .ok()
                    .filter(|d| d.is_finite() && *d >= 0.0)
                    .map(Some)
                    .ok_or_else(|| invalid(table, row, "distance", cell))
            })
            .collect::<Result<Vec<_>, _>>()?;
        matrix.push(cells);
    }

    Ok(matrix)
}

pub fn load_parcels(path: &Path, bucket_count: usize) -> Result<ParcelStore, LoadError> {
    let store = parse_parcels(&read_file(Table::Packages, path)?, bucket_count)?;
    info!("Loaded {} parcels from {}", store.len(), path.display());
    Ok(store)
}

/// Build a distance index from location and distance table contents.
pub fn parse_distance_index(locations: &str, distances: &str) -> Result<DistanceIndex, LoadError> {
    Ok(DistanceIndex::new(
        parse_locations(locations)?,
        parse_distances(distances)?,
    )?)
}

pub fn load_distance_index(
    locations_path: &Path,
    distances_path: &Path,
) -> Result<DistanceIndex, LoadError> {
    let index = parse_distance_index(
        &read_file(Table::Locations, locations_path)?,
        &read_file(Table::Distances, distances_path)?,
    )?;
    info!(
        "Loaded {} locations from {}",
        index.size(),
        locations_path.display()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::path::PathBuf;

    const HEADER: &str = "Package ID,Address,City,State,Zip,Delivery Deadline,Weight KILO,Special Notes\n";

    fn data_file(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
    }

    #[test]
    fn test_parse_parcels() {
        let content = format!(
            "{}1,195 W Oakland Ave,Salt Lake City,UT,84115,10:30 AM,21,\n\
             9,300 State St,Salt Lake City,UT,84103,EOD,2,Wrong address listed\n",
            HEADER
        );
        let store = parse_parcels(&content, 40).unwrap();

        assert_eq!(store.len(), 2);
        let p = store.search(1).unwrap();
        assert_eq!(p.address.street, "195 W Oakland Ave");
        assert_eq!(p.address.zip, "84115");
        assert_eq!(p.deadline, Deadline::By(NaiveTime::from_hms_opt(10, 30, 0).unwrap()));
        assert_eq!(p.weight, 21.0);
        assert!(p.stamp().is_none());

        let p = store.search(9).unwrap();
        assert_eq!(p.deadline, Deadline::EndOfDay);
        assert_eq!(p.notes, "Wrong address listed");
    }

    #[test]
    fn test_parse_parcels_wrong_column_count() {
        let content = format!("{}1,195 W Oakland Ave,Salt Lake City,UT,84115,EOD\n", HEADER);
        let err = parse_parcels(&content, 40).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ColumnCount {
                table: Table::Packages,
                row: 2,
                expected: 8,
                found: 6
            }
        ));
    }

    #[test]
    fn test_parse_parcels_non_numeric_id() {
        let content = format!(
            "{}1,a,b,UT,1,EOD,2,\nx7,a,b,UT,1,EOD,2,\n",
            HEADER
        );
        let err = parse_parcels(&content, 40).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidField { row: 3, field: "parcel id", .. }
        ));
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn test_parse_parcels_zero_id_rejected() {
        let content = format!("{}0,a,b,UT,1,EOD,2,\n", HEADER);
        assert!(matches!(
            parse_parcels(&content, 40),
            Err(LoadError::InvalidField { field: "parcel id", .. })
        ));
    }

    #[test]
    fn test_parse_parcels_bad_weight() {
        let content = format!("{}1,a,b,UT,1,EOD,heavy,\n", HEADER);
        assert!(matches!(
            parse_parcels(&content, 40),
            Err(LoadError::InvalidField { field: "weight", row: 2, .. })
        ));
    }

    #[test]
    fn test_parse_parcels_bad_deadline() {
        let content = format!("{}1,a,b,UT,1,tomorrow,2,\n", HEADER);
        assert!(matches!(
            parse_parcels(&content, 40),
            Err(LoadError::InvalidField { field: "deadline", .. })
        ));
    }

    #[test]
    fn test_parse_parcels_duplicate_id() {
        let content = format!("{}4,a,b,UT,1,EOD,2,\n4,c,d,UT,1,EOD,2,\n", HEADER);
        assert!(matches!(
            parse_parcels(&content, 40),
            Err(LoadError::DuplicateId { row: 3, id: 4 })
        ));
    }

    #[test]
    fn test_parse_locations() {
        let content = "0,Hub,\"4001 South 700 East, Salt Lake City\"\n1,Park,1060 Dalton Ave S (84104)\n";
        let locations = parse_locations(content).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].address, "4001 South 700 East, Salt Lake City");
        assert_eq!(locations[1].name, "Park");
    }

    #[test]
    fn test_parse_locations_out_of_order_index() {
        let content = "0,Hub,a\n2,Park,b\n";
        assert!(matches!(
            parse_locations(content),
            Err(LoadError::InvalidField { row: 2, field: "location index", .. })
        ));
    }

    #[test]
    fn test_parse_distances_keeps_empty_cells() {
        let matrix = parse_distances("0,,\n7.2,0,\n3.8,7.1,0\n").unwrap();
        assert_eq!(matrix[0], vec![Some(0.0), None, None]);
        assert_eq!(matrix[2], vec![Some(3.8), Some(7.1), Some(0.0)]);
    }

    #[test]
    fn test_parse_distances_rejects_garbage() {
        assert!(matches!(
            parse_distances("0,\nfar,0\n"),
            Err(LoadError::InvalidField { row: 2, field: "distance", .. })
        ));
        assert!(matches!(
            parse_distances("0,\n-1.0,0\n"),
            Err(LoadError::InvalidField { field: "distance", .. })
        ));
    }

    #[test]
    fn test_distance_index_rejects_asymmetric_table() {
        let err = parse_distance_index("0,Hub,1 Hub Rd\n1,Stop,2 Stop St\n", "0,5.0\n3.0,0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Shape(DistanceError::Asymmetric { from: 1, to: 0, .. })
        ));
    }

    #[test]
    fn test_distance_index_rejects_wide_row() {
        let err = parse_distance_index("0,Hub,1 Hub Rd\n1,Stop,2 Stop St\n", "0,,,,9\n3.0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Shape(DistanceError::RowTooLong { row: 0, cells: 5, locations: 2 })
        ));
    }

    #[test]
    fn test_parse_parcels_blank_street_rejected() {
        let content = format!("{}4,  ,Salt Lake City,UT,84115,EOD,4,\n", HEADER);
        assert!(matches!(
            parse_parcels(&content, 40),
            Err(LoadError::InvalidField { row: 2, field: "street", .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_parcels(Path::new("/nonexistent/packages.csv"), 40).unwrap_err();
        assert!(matches!(err, LoadError::Io { table: Table::Packages, .. }));
    }

    #[test]
    fn test_bundled_data_round_trip() {
        let content = std::fs::read_to_string(data_file("packages.csv")).unwrap();
        let store = load_parcels(&data_file("packages.csv"), 40).unwrap();
        assert_eq!(store.len(), 40);

        let mut rows = csv::Reader::from_reader(content.as_bytes());
        for record in rows.records() {
            let record = record.unwrap();
            let id: ParcelId = record[0].parse().unwrap();
            let p = store.search(id).unwrap();
            assert_eq!(p.address.street, &record[1]);
            assert_eq!(p.address.city, &record[2]);
            assert_eq!(p.address.state, &record[3]);
            assert_eq!(p.address.zip, &record[4]);
            assert_eq!(Some(p.deadline), Deadline::parse(&record[5]));
            assert_eq!(p.weight, record[6].parse::<f64>().unwrap());
            assert_eq!(p.notes, &record[7]);
            assert!(p.stamp().is_none());
        }
    }

    #[test]
    fn test_bundled_distance_index_resolves_every_parcel() {
        let index =
            load_distance_index(&data_file("locations.csv"), &data_file("distances.csv")).unwrap();
        let store = load_parcels(&data_file("packages.csv"), 40).unwrap();

        assert_eq!(index.location_index("4001 South 700 East"), Ok(0));
        for parcel in store.iter() {
            let i = index.location_index(&parcel.address.street).unwrap();
            assert_eq!(index.distance(0, i), index.distance(i, 0));
        }
    }
}
