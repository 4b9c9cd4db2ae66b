use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo + 1)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// `None` with probability `p`.
    fn maybe<T>(&mut self, p: f64, value: T) -> Option<T> {
        if self.next_f64() < p {
            None
        } else {
            Some(value)
        }
    }
}

const CITIES: &[(&str, &[&str], (f64, f64))] = &[
    ("Jakarta Selatan", &["Kebayoran Baru", "Cilandak", "Jagakarsa", "Pasar Minggu"], (-6.26, 106.81)),
    ("Bekasi", &["Bekasi Barat", "Tambun", "Cikarang", "Jatiasih"], (-6.24, 107.00)),
    ("Bogor", &["Cibinong", "Sentul", "Bogor Barat"], (-6.59, 106.80)),
    ("Depok", &["Cimanggis", "Sawangan", "Beji"], (-6.40, 106.82)),
    ("Tangerang", &["BSD", "Ciledug", "Karawaci"], (-6.18, 106.63)),
];
const CERTIFICATES: &[&str] = &["shm - sertifikat hak milik", "hgb - hak guna bangunan", "lainnya (ppjb,girik,adat,dll)"];
const CONDITIONS: &[&str] = &["bagus", "baru", "bagus sekali", "butuh renovasi"];
const ORIENTATIONS: &[&str] = &["utara", "selatan", "timur", "barat"];
const FURNISHING: &[&str] = &["unfurnished", "semi furnished", "furnished"];
const ELECTRICITY: &[&str] = &["1300 mah", "2200 mah", "3500 mah", "4400 mah"];
const FACILITIES: &[&str] = &[
    "AC", "Taman", "Keamanan 24 jam", "Kolam Renang", "Jogging Track", "CCTV", "Masjid", "Taman Bermain",
];

fn main() -> anyhow::Result<()> {
    let n: usize = std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(500);
    let output_path = std::env::args().nth(2).unwrap_or_else(|| "sample_listings.parquet".into());
    let mut rng = SimpleRng::new(42);

    let text_cols = [
        "url",
        "city",
        "district",
        "address",
        "certificate",
        "property_condition",
        "building_orientation",
        "furnishing",
        "electricity",
        "property_type",
        "facilities",
    ];
    let num_cols = [
        "price_in_rp",
        "land_size_m2",
        "building_size_m2",
        "building_age",
        "year_built",
        "bedrooms",
        "bathrooms",
        "floors",
        "carports",
        "garages",
        "maid_bedrooms",
        "maid_bathrooms",
        "lat",
        "long",
    ];
    let mut text: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(n); text_cols.len()];
    let mut nums: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(n); num_cols.len()];

    for i in 0..n {
        let (city, districts, (lat, long)) = CITIES[i % CITIES.len()];
        let district = rng.pick(districts);
        let land = rng.range(60, 400) as f64;
        let building = (land * (0.6 + rng.next_f64() * 0.8)).round();
        let year = rng.range(1995, 2024) as f64;
        let bedrooms = rng.range(1, 6) as f64;
        let price_per_m2 = match city {
            "Jakarta Selatan" => 25_000_000.0,
            "Tangerang" => 14_000_000.0,
            _ => 9_000_000.0,
        };
        let price = ((land * price_per_m2 + building * 4_000_000.0) / 1e6).round() * 1e6;

        let facility_count = rng.range(0, 4) as usize;
        let mut facilities: Vec<&str> = Vec::new();
        for _ in 0..facility_count {
            let f = rng.pick(FACILITIES);
            if !facilities.contains(&f) {
                facilities.push(f);
            }
        }

        let certificate = rng.pick(CERTIFICATES).to_string();
        let condition = rng.pick(CONDITIONS).to_string();
        let orientation = rng.pick(ORIENTATIONS).to_string();
        let furnishing = rng.pick(FURNISHING).to_string();
        let row_text = [
            Some(format!("https://listings.example/{i}")),
            Some(city.to_string()),
            Some(district.to_string()),
            Some(format!("{district}, {city}")),
            rng.maybe(0.05, certificate),
            rng.maybe(0.1, condition),
            rng.maybe(0.2, orientation),
            rng.maybe(0.1, furnishing),
            Some(rng.pick(ELECTRICITY).to_string()),
            Some("rumah".to_string()),
            Some(facilities.join(", ")),
        ];
        let row_nums = [
            rng.maybe(0.02, price),
            Some(land),
            Some(building),
            Some(2024.0 - year),
            Some(year),
            Some(bedrooms),
            Some((bedrooms - rng.range(0, 1) as f64).max(1.0)),
            Some(rng.range(1, 3) as f64),
            Some(rng.range(0, 2) as f64),
            Some(rng.range(0, 1) as f64),
            Some(rng.range(0, 1) as f64),
            Some(rng.range(0, 1) as f64),
            Some(lat + (rng.next_f64() - 0.5) * 0.08),
            Some(long + (rng.next_f64() - 0.5) * 0.08),
        ];
        for (col, value) in text.iter_mut().zip(row_text) {
            col.push(value);
        }
        for (col, value) in nums.iter_mut().zip(row_nums) {
            col.push(value);
        }
    }

    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for (name, values) in text_cols.iter().zip(text) {
        fields.push(Field::new(*name, DataType::Utf8, true));
        arrays.push(Arc::new(StringArray::from(values)));
    }
    for (name, values) in num_cols.iter().zip(nums) {
        fields.push(Field::new(*name, DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(values)));
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = std::fs::File::create(&output_path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!("{}", pretty_format_batches(&[batch.slice(0, n.min(5))])?);
    println!("Wrote {n} listings to {output_path}");
    Ok(())
}
