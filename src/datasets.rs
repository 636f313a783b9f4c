use crate::mapper::ColumnMap;
use crate::models::PlacekeyField;

/// Where a dataset lives and how its columns map onto the lookup API.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    /// Base name; files are `<name>.csv`, `placekeys_<name>.csv` and
    /// `<name>_w_placekeys.csv`.
    pub name: &'static str,
    /// Identifier column, also the join key.
    pub key_column: &'static str,
    pub column_map: ColumnMap,
}

impl DatasetSpec {
    pub fn input_file(&self) -> String {
        format!("{}.csv", self.name)
    }

    pub fn results_file(&self) -> String {
        format!("placekeys_{}.csv", self.name)
    }

    pub fn output_file(&self) -> String {
        format!("{}_w_placekeys.csv", self.name)
    }
}

/// Municipal blight violation tickets.
pub fn blight_violations() -> DatasetSpec {
    DatasetSpec {
        name: "Blight_Violations",
        key_column: "ticket_id",
        column_map: ColumnMap::new([
            ("ticket_id", PlacekeyField::QueryId),
            ("violation_address", PlacekeyField::StreetAddress),
            ("state", PlacekeyField::Region),
            ("zip_code", PlacekeyField::PostalCode),
            ("X", PlacekeyField::Latitude),
            ("Y", PlacekeyField::Longitude),
            ("country", PlacekeyField::IsoCountryCode),
            ("city", PlacekeyField::City),
        ]),
    }
}

/// Property sale records.
pub fn property_sales() -> DatasetSpec {
    DatasetSpec {
        name: "Property_Sales",
        key_column: "sale_id",
        column_map: ColumnMap::new([
            ("sale_id", PlacekeyField::QueryId),
            ("address", PlacekeyField::StreetAddress),
            ("X", PlacekeyField::Latitude),
            ("Y", PlacekeyField::Longitude),
        ]),
    }
}

/// Both datasets, in processing order.
pub fn all() -> Vec<DatasetSpec> {
    vec![blight_violations(), property_sales()]
}
