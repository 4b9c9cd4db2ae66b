use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::aggregate::{CrossTab, GroupedTable, Summary};
use super::model::{format_number, AttrValue, Dataset, Listing};

// ---------------------------------------------------------------------------
// CSV export of derived tables
// ---------------------------------------------------------------------------

/// A complete, self-contained table that can be written as CSV.
pub trait CsvTable {
    fn header(&self) -> Vec<String>;
    fn records(&self) -> Vec<Vec<String>>;
}

/// Write `table` as UTF-8 CSV, header first.
pub fn write_csv<W: Write>(table: &dyn CsvTable, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.header())?;
    for record in table.records() {
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn export_to_file(table: &dyn CsvTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(table, file).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} rows to {}", table.records().len(), path.display());
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn label(value: &AttrValue) -> String {
    match value {
        AttrValue::Null => String::new(),
        other => other.to_string(),
    }
}

impl CsvTable for GroupedTable {
    fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = self.key.attributes().iter().map(|a| a.to_string()).collect();
        header.push(self.measure.label());
        header
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record: Vec<String> = row.key.iter().map(label).collect();
                record.push(cell(row.value));
                record
            })
            .collect()
    }
}

/// Long format: one record per present cell.
impl CsvTable for CrossTab {
    fn header(&self) -> Vec<String> {
        vec![self.row_key.to_string(), self.col_key.to_string(), self.measure.label()]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.entries()
            .into_iter()
            .map(|(r, c, v)| vec![label(r), label(c), format_number(v)])
            .collect()
    }
}

impl CsvTable for Summary {
    fn header(&self) -> Vec<String> {
        ["count", "mean_price_in_rp", "max_price_in_rp", "min_price_in_rp"]
            .map(String::from)
            .to_vec()
    }

    fn records(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.count.to_string(),
            cell(self.mean_price),
            cell(self.max_price),
            cell(self.min_price),
        ]]
    }
}

// ---------------------------------------------------------------------------
// Filtered rows
// ---------------------------------------------------------------------------

/// Flat row shape for exporting listings; `facilities` is re-joined.
#[derive(Debug, Serialize)]
struct ListingRow<'a> {
    url: &'a str,
    city: Option<&'a str>,
    district: Option<&'a str>,
    address: Option<&'a str>,
    certificate: Option<&'a str>,
    property_condition: Option<&'a str>,
    building_orientation: Option<&'a str>,
    furnishing: Option<&'a str>,
    electricity: Option<&'a str>,
    property_type: Option<&'a str>,
    price_in_rp: Option<f64>,
    land_size_m2: Option<f64>,
    building_size_m2: Option<f64>,
    building_age: Option<f64>,
    year_built: Option<f64>,
    bedrooms: Option<f64>,
    bathrooms: Option<f64>,
    floors: Option<f64>,
    carports: Option<f64>,
    garages: Option<f64>,
    maid_bedrooms: Option<f64>,
    maid_bathrooms: Option<f64>,
    lat: Option<f64>,
    long: Option<f64>,
    facilities: String,
}

impl<'a> From<&'a Listing> for ListingRow<'a> {
    fn from(l: &'a Listing) -> Self {
        ListingRow {
            url: &l.url,
            city: l.city.as_deref(),
            district: l.district.as_deref(),
            address: l.address.as_deref(),
            certificate: l.certificate.as_deref(),
            property_condition: l.property_condition.as_deref(),
            building_orientation: l.building_orientation.as_deref(),
            furnishing: l.furnishing.as_deref(),
            electricity: l.electricity.as_deref(),
            property_type: l.property_type.as_deref(),
            price_in_rp: l.price_in_rp,
            land_size_m2: l.land_size_m2,
            building_size_m2: l.building_size_m2,
            building_age: l.building_age,
            year_built: l.year_built,
            bedrooms: l.bedrooms,
            bathrooms: l.bathrooms,
            floors: l.floors,
            carports: l.carports,
            garages: l.garages,
            maid_bedrooms: l.maid_bedrooms,
            maid_bathrooms: l.maid_bathrooms,
            lat: l.lat,
            long: l.long,
            facilities: l.facilities_cell(),
        }
    }
}

/// Write the listings at `view` with the source column layout.
pub fn write_listings<W: Write>(dataset: &Dataset, view: &[usize], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for listing in dataset.select(view) {
        out.serialize(ListingRow::from(listing))?;
    }
    out.flush()?;
    Ok(())
}
