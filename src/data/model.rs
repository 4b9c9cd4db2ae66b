use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DataLoadError;

/// Separator between facility names inside the `facilities` cell.
pub const FACILITY_SEPARATOR: &str = ", ";

// ---------------------------------------------------------------------------
// Attribute – the typed column schema
// ---------------------------------------------------------------------------

/// Semantic kind of a column, fixed by the schema rather than inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Identity,
    Categorical,
    Numeric,
    FacilitySet,
}

/// Every column a listing table must carry.  The snake_case serde name is
/// the column header in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Url,
    City,
    District,
    Address,
    Certificate,
    PropertyCondition,
    BuildingOrientation,
    Furnishing,
    Electricity,
    PropertyType,
    PriceInRp,
    LandSizeM2,
    BuildingSizeM2,
    BuildingAge,
    YearBuilt,
    Bedrooms,
    Bathrooms,
    Floors,
    Carports,
    Garages,
    MaidBedrooms,
    MaidBathrooms,
    Lat,
    Long,
    Facilities,
}

impl Attribute {
    pub const ALL: [Attribute; 25] = [
        Attribute::Url,
        Attribute::City,
        Attribute::District,
        Attribute::Address,
        Attribute::Certificate,
        Attribute::PropertyCondition,
        Attribute::BuildingOrientation,
        Attribute::Furnishing,
        Attribute::Electricity,
        Attribute::PropertyType,
        Attribute::PriceInRp,
        Attribute::LandSizeM2,
        Attribute::BuildingSizeM2,
        Attribute::BuildingAge,
        Attribute::YearBuilt,
        Attribute::Bedrooms,
        Attribute::Bathrooms,
        Attribute::Floors,
        Attribute::Carports,
        Attribute::Garages,
        Attribute::MaidBedrooms,
        Attribute::MaidBathrooms,
        Attribute::Lat,
        Attribute::Long,
        Attribute::Facilities,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Attribute::Url => "url",
            Attribute::City => "city",
            Attribute::District => "district",
            Attribute::Address => "address",
            Attribute::Certificate => "certificate",
            Attribute::PropertyCondition => "property_condition",
            Attribute::BuildingOrientation => "building_orientation",
            Attribute::Furnishing => "furnishing",
            Attribute::Electricity => "electricity",
            Attribute::PropertyType => "property_type",
            Attribute::PriceInRp => "price_in_rp",
            Attribute::LandSizeM2 => "land_size_m2",
            Attribute::BuildingSizeM2 => "building_size_m2",
            Attribute::BuildingAge => "building_age",
            Attribute::YearBuilt => "year_built",
            Attribute::Bedrooms => "bedrooms",
            Attribute::Bathrooms => "bathrooms",
            Attribute::Floors => "floors",
            Attribute::Carports => "carports",
            Attribute::Garages => "garages",
            Attribute::MaidBedrooms => "maid_bedrooms",
            Attribute::MaidBathrooms => "maid_bathrooms",
            Attribute::Lat => "lat",
            Attribute::Long => "long",
            Attribute::Facilities => "facilities",
        }
    }

    pub fn kind(self) -> AttrKind {
        match self {
            Attribute::Url => AttrKind::Identity,
            Attribute::City
            | Attribute::District
            | Attribute::Address
            | Attribute::Certificate
            | Attribute::PropertyCondition
            | Attribute::BuildingOrientation
            | Attribute::Furnishing
            | Attribute::Electricity
            | Attribute::PropertyType => AttrKind::Categorical,
            Attribute::Facilities => AttrKind::FacilitySet,
            _ => AttrKind::Numeric,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .iter()
            .copied()
            .find(|a| a.column_name() == s)
            .ok_or_else(|| format!("unknown attribute '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// AttrValue – a single cell
// ---------------------------------------------------------------------------

/// A cell value.  Text and numbers never compare equal to each other; nulls
/// sort first and are excluded from every distinct-value list.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Null,
}

// -- Manual Eq/Ord/Hash so AttrValue can key BTreeSet / HashMap --

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for AttrValue {}

impl PartialOrd for AttrValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttrValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use AttrValue::*;
        fn discriminant(v: &AttrValue) -> u8 {
            match v {
                Null => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for AttrValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttrValue::Text(s) => s.hash(state),
            AttrValue::Number(v) => v.to_bits().hash(state),
            AttrValue::Null => {}
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{s}"),
            AttrValue::Number(v) => write!(f, "{}", format_number(*v)),
            AttrValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

/// Whole numbers print without a fractional part (`3`, not `3.0`).
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

/// Split a raw `facilities` cell into its facility names, dropping empties.
pub fn split_facilities(raw: &str) -> Vec<String> {
    raw.split(FACILITY_SEPARATOR)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Listing – one row of the table
// ---------------------------------------------------------------------------

/// A single property listing.  Missing numeric cells stay `None`; they are
/// never coerced to zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub url: String,

    pub city: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub certificate: Option<String>,
    pub property_condition: Option<String>,
    pub building_orientation: Option<String>,
    pub furnishing: Option<String>,
    pub electricity: Option<String>,
    pub property_type: Option<String>,

    pub price_in_rp: Option<f64>,
    pub land_size_m2: Option<f64>,
    pub building_size_m2: Option<f64>,
    pub building_age: Option<f64>,
    pub year_built: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub floors: Option<f64>,
    pub carports: Option<f64>,
    pub garages: Option<f64>,
    pub maid_bedrooms: Option<f64>,
    pub maid_bathrooms: Option<f64>,
    pub lat: Option<f64>,
    pub long: Option<f64>,

    /// Parsed facility names, in source order.
    pub facilities: Vec<String>,
}

impl Listing {
    /// Text of an identity or categorical column.
    pub fn text(&self, attr: Attribute) -> Option<&str> {
        let slot = match attr {
            Attribute::Url => return Some(self.url.as_str()),
            Attribute::City => &self.city,
            Attribute::District => &self.district,
            Attribute::Address => &self.address,
            Attribute::Certificate => &self.certificate,
            Attribute::PropertyCondition => &self.property_condition,
            Attribute::BuildingOrientation => &self.building_orientation,
            Attribute::Furnishing => &self.furnishing,
            Attribute::Electricity => &self.electricity,
            Attribute::PropertyType => &self.property_type,
            _ => return None,
        };
        slot.as_deref()
    }

    /// Value of a numeric column.
    pub fn number(&self, attr: Attribute) -> Option<f64> {
        match attr {
            Attribute::PriceInRp => self.price_in_rp,
            Attribute::LandSizeM2 => self.land_size_m2,
            Attribute::BuildingSizeM2 => self.building_size_m2,
            Attribute::BuildingAge => self.building_age,
            Attribute::YearBuilt => self.year_built,
            Attribute::Bedrooms => self.bedrooms,
            Attribute::Bathrooms => self.bathrooms,
            Attribute::Floors => self.floors,
            Attribute::Carports => self.carports,
            Attribute::Garages => self.garages,
            Attribute::MaidBedrooms => self.maid_bedrooms,
            Attribute::MaidBathrooms => self.maid_bathrooms,
            Attribute::Lat => self.lat,
            Attribute::Long => self.long,
            _ => None,
        }
    }

    /// Generic cell access.  `facilities` yields the re-joined cell text.
    pub fn value(&self, attr: Attribute) -> AttrValue {
        match attr.kind() {
            AttrKind::Identity | AttrKind::Categorical => self
                .text(attr)
                .map(|s| AttrValue::Text(s.to_string()))
                .unwrap_or(AttrValue::Null),
            AttrKind::Numeric => self.number(attr).map(AttrValue::Number).unwrap_or(AttrValue::Null),
            AttrKind::FacilitySet => AttrValue::Text(self.facilities_cell()),
        }
    }

    pub fn has_facility(&self, name: &str) -> bool {
        self.facilities.iter().any(|f| f == name)
    }

    pub fn facilities_cell(&self) -> String {
        self.facilities.join(FACILITY_SEPARATOR)
    }

    /// Store a raw cell into the typed slot for `attr`, coercing by kind.
    /// Numeric cells that do not parse become `None` with a warning.
    pub(crate) fn set_cell(&mut self, attr: Attribute, cell: AttrValue, row: usize) {
        match attr.kind() {
            AttrKind::Identity => self.url = cell_text(cell).unwrap_or_default(),
            AttrKind::Categorical => {
                let text = cell_text(cell);
                let slot = match attr {
                    Attribute::City => &mut self.city,
                    Attribute::District => &mut self.district,
                    Attribute::Address => &mut self.address,
                    Attribute::Certificate => &mut self.certificate,
                    Attribute::PropertyCondition => &mut self.property_condition,
                    Attribute::BuildingOrientation => &mut self.building_orientation,
                    Attribute::Furnishing => &mut self.furnishing,
                    Attribute::Electricity => &mut self.electricity,
                    _ => &mut self.property_type,
                };
                *slot = text;
            }
            AttrKind::Numeric => {
                let number = match cell {
                    AttrValue::Number(v) if v.is_nan() => None,
                    AttrValue::Number(v) => Some(v),
                    AttrValue::Null => None,
                    AttrValue::Text(s) if s.trim().is_empty() => None,
                    AttrValue::Text(s) => match s.trim().parse::<f64>() {
                        Ok(v) if !v.is_nan() => Some(v),
                        _ => {
                            log::warn!("row {row}: '{s}' in {attr} is not a number; treated as missing");
                            None
                        }
                    },
                };
                let slot = match attr {
                    Attribute::PriceInRp => &mut self.price_in_rp,
                    Attribute::LandSizeM2 => &mut self.land_size_m2,
                    Attribute::BuildingSizeM2 => &mut self.building_size_m2,
                    Attribute::BuildingAge => &mut self.building_age,
                    Attribute::YearBuilt => &mut self.year_built,
                    Attribute::Bedrooms => &mut self.bedrooms,
                    Attribute::Bathrooms => &mut self.bathrooms,
                    Attribute::Floors => &mut self.floors,
                    Attribute::Carports => &mut self.carports,
                    Attribute::Garages => &mut self.garages,
                    Attribute::MaidBedrooms => &mut self.maid_bedrooms,
                    Attribute::MaidBathrooms => &mut self.maid_bathrooms,
                    Attribute::Lat => &mut self.lat,
                    _ => &mut self.long,
                };
                *slot = number;
            }
            AttrKind::FacilitySet => {
                self.facilities = cell_text(cell).map(|s| split_facilities(&s)).unwrap_or_default();
            }
        }
    }
}

fn cell_text(cell: AttrValue) -> Option<String> {
    match cell {
        AttrValue::Text(s) if s.is_empty() => None,
        AttrValue::Text(s) => Some(s),
        AttrValue::Number(v) if v.is_nan() => None,
        AttrValue::Number(v) => Some(format_number(v)),
        AttrValue::Null => None,
    }
}

// ---------------------------------------------------------------------------
// RawTable – loader output before schema checking
// ---------------------------------------------------------------------------

/// Untyped table as read from a file: header names and row cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<AttrValue>>,
}

// ---------------------------------------------------------------------------
// Dataset – the immutable loaded table
// ---------------------------------------------------------------------------

/// The loaded listings.  Built once, never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    listings: Vec<Listing>,
}

impl Dataset {
    /// Wrap already-typed listings, enforcing the non-empty `url` invariant.
    pub fn from_listings(listings: Vec<Listing>) -> Result<Self, DataLoadError> {
        if let Some(row) = listings.iter().position(|l| l.url.is_empty()) {
            return Err(DataLoadError::MissingUrl { row });
        }
        Ok(Dataset { listings })
    }

    /// Check the header against the schema and type every cell.
    pub fn from_table(table: RawTable) -> Result<Self, DataLoadError> {
        let mut positions = Vec::with_capacity(Attribute::ALL.len());
        for attr in Attribute::ALL {
            let idx = table
                .columns
                .iter()
                .position(|c| c.trim() == attr.column_name())
                .ok_or_else(|| DataLoadError::MissingColumn(attr.column_name().to_string()))?;
            positions.push((attr, idx));
        }

        let mut listings = Vec::with_capacity(table.rows.len());
        for (row_no, row) in table.rows.into_iter().enumerate() {
            let mut cells: Vec<Option<AttrValue>> = row.into_iter().map(Some).collect();
            let mut listing = Listing::default();
            for &(attr, idx) in &positions {
                let cell = cells.get_mut(idx).and_then(Option::take).unwrap_or(AttrValue::Null);
                listing.set_cell(attr, cell, row_no);
            }
            listings.push(listing);
        }

        Dataset::from_listings(listings)
    }

    pub fn rows(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Indices of every row, in dataset order.
    pub fn all_indices(&self) -> Vec<usize> {
        (0..self.listings.len()).collect()
    }

    /// Iterate the listings at `within`, skipping out-of-range indices.
    pub fn select<'a>(&'a self, within: &'a [usize]) -> impl Iterator<Item = &'a Listing> + 'a {
        within.iter().filter_map(move |&i| self.listings.get(i))
    }

    /// Sorted distinct non-null values of `attr` among the rows `within`.
    /// For `facilities` these are the individual facility names.
    pub fn distinct_values(&self, attr: Attribute, within: &[usize]) -> Vec<AttrValue> {
        let mut set = BTreeSet::new();
        for listing in self.select(within) {
            if attr.kind() == AttrKind::FacilitySet {
                set.extend(listing.facilities.iter().map(|f| AttrValue::Text(f.clone())));
                continue;
            }
            let value = listing.value(attr);
            if !value.is_null() {
                set.insert(value);
            }
        }
        set.into_iter().collect()
    }

    /// Observed `[min, max]` of a numeric column, `None` if no row has a value.
    pub fn numeric_span(&self, attr: Attribute, within: &[usize]) -> Option<(f64, f64)> {
        self.select(within)
            .filter_map(|l| l.number(attr))
            .fold(None, |span, v| match span {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
