/// Projection of input tables onto the lookup API schema.
///
/// 1. Resolve every mapped source column (missing ones fail the dataset)
/// 2. Copy cells into typed `PlacekeyQuery` rows
/// 3. Force the country code to `US`
use crate::errors::AppError;
use crate::models::{PlacekeyField, PlacekeyQuery};
use crate::table::DataTable;

/// Country code sent with every query, overriding any mapped column.
pub const ISO_COUNTRY_CODE: &str = "US";

/// Ordered `source column -> API field` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    entries: Vec<(String, PlacekeyField)>,
}

impl ColumnMap {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, PlacekeyField)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(source, field)| (source.into(), field))
                .collect(),
        }
    }

    /// Maps every API field name onto itself, for tables that are already
    /// in API shape.
    pub fn identity() -> Self {
        Self::new(PlacekeyField::ALL.map(|f| (f.as_str(), f)))
    }

    pub fn entries(&self) -> &[(String, PlacekeyField)] {
        &self.entries
    }

    /// Source column mapped to `field`. When several sources target the same
    /// field the last one wins, as with a column rename.
    pub fn source_for(&self, field: PlacekeyField) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(_, f)| *f == field)
            .map(|(source, _)| source.as_str())
    }
}

/// Builds one API query per table row.
///
/// Identifier, region and postal code keep their verbatim text: a postal
/// code written as `2108` is sent as `"2108"`, never zero-padded.
pub fn map_for_api(table: &DataTable, map: &ColumnMap) -> Result<Vec<PlacekeyQuery>, AppError> {
    for (source, _) in map.entries() {
        table.require_column(source)?;
    }

    let query_id_col = map
        .source_for(PlacekeyField::QueryId)
        .ok_or_else(|| AppError::MissingColumn(PlacekeyField::QueryId.to_string()))
        .and_then(|source| table.require_column(source))?;
    let col = |field: PlacekeyField| -> Option<usize> {
        map.source_for(field)
            .and_then(|source| table.column_index(source))
    };
    let street_col = col(PlacekeyField::StreetAddress);
    let city_col = col(PlacekeyField::City);
    let region_col = col(PlacekeyField::Region);
    let postal_col = col(PlacekeyField::PostalCode);
    let lat_col = col(PlacekeyField::Latitude);
    let lon_col = col(PlacekeyField::Longitude);

    let mut queries = Vec::with_capacity(table.len());
    for (row_idx, row) in table.rows().iter().enumerate() {
        let text = |idx: Option<usize>| idx.and_then(|i| non_blank(&row[i]));
        let number = |idx: Option<usize>, field: PlacekeyField| -> Result<Option<f64>, AppError> {
            match text(idx) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(Some)
                    .ok_or_else(|| {
                        AppError::InvalidInput(format!(
                            "row {}: {} value '{}' is not a number",
                            row_idx + 1,
                            field,
                            raw
                        ))
                    }),
            }
        };

        queries.push(PlacekeyQuery {
            query_id: row[query_id_col].clone(),
            street_address: text(street_col),
            city: text(city_col),
            region: text(region_col),
            postal_code: text(postal_col),
            latitude: number(lat_col, PlacekeyField::Latitude)?,
            longitude: number(lon_col, PlacekeyField::Longitude)?,
            iso_country_code: ISO_COUNTRY_CODE.to_string(),
        });
    }

    tracing::debug!("Mapped {} rows for the lookup API", queries.len());
    Ok(queries)
}

/// Renders queries back into a table whose headers are the API field names.
pub fn queries_to_table(queries: &[PlacekeyQuery]) -> DataTable {
    let mut table = DataTable::new(
        PlacekeyField::ALL
            .iter()
            .map(|f| f.as_str().to_string())
            .collect(),
    );
    for q in queries {
        table.push_row(vec![
            q.query_id.clone(),
            q.street_address.clone().unwrap_or_default(),
            q.city.clone().unwrap_or_default(),
            q.region.clone().unwrap_or_default(),
            q.postal_code.clone().unwrap_or_default(),
            q.latitude.map(|v| v.to_string()).unwrap_or_default(),
            q.longitude.map(|v| v.to_string()).unwrap_or_default(),
            q.iso_country_code.clone(),
        ]);
    }
    table
}

fn non_blank(cell: &str) -> Option<String> {
    if cell.trim().is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}
