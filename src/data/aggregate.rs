//! Grouped statistics over a filtered view.
//!
//! Everything here works on raw units (rupiah, m²); scaling to millions or
//! billions is left to whoever displays the numbers.  Empty input never
//! panics: absent statistics come back as `None`.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::model::{AttrValue, Attribute, Dataset};

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Headline numbers for the current view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Distinct listing URLs.
    pub count: usize,
    pub mean_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_price: Option<f64>,
}

pub fn summary(dataset: &Dataset, view: &[usize]) -> Summary {
    let count = dataset
        .select(view)
        .map(|l| l.url.as_str())
        .collect::<HashSet<_>>()
        .len();
    let stats = NumericStats::compute(dataset.select(view).filter_map(|l| l.price_in_rp));
    Summary {
        count,
        mean_price: stats.as_ref().map(|s| s.mean),
        max_price: stats.as_ref().map(|s| s.max),
        min_price: stats.as_ref().map(|s| s.min),
    }
}

// ---------------------------------------------------------------------------
// Numeric distribution (box / violin inputs)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericStats {
    /// `None` when there are no values.  Quartiles use linear interpolation.
    pub fn compute<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        Some(NumericStats {
            count,
            mean,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Distribution of `measure` for each value of `key`, in first-seen order.
pub fn stats_by(dataset: &Dataset, view: &[usize], key: Attribute, measure: Attribute) -> Vec<(AttrValue, NumericStats)> {
    let mut order: Vec<AttrValue> = Vec::new();
    let mut buckets: HashMap<AttrValue, Vec<f64>> = HashMap::new();
    for listing in dataset.select(view) {
        let k = listing.value(key);
        if k.is_null() {
            continue;
        }
        let bucket = buckets.entry(k.clone()).or_insert_with(|| {
            order.push(k);
            Vec::new()
        });
        bucket.extend(listing.number(measure));
    }
    order
        .into_iter()
        .filter_map(|k| {
            let values = buckets.remove(&k)?;
            NumericStats::compute(values).map(|s| (k, s))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Group-by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Sum of a numeric column; missing values are skipped, an all-missing group sums to 0.
    Sum(Attribute),
    /// Mean of a numeric column; `None` for an all-missing group.
    Mean(Attribute),
    /// Number of rows in the group.
    Count,
}

impl Measure {
    pub fn label(&self) -> String {
        match self {
            Measure::Sum(attr) => format!("sum_{attr}"),
            Measure::Mean(attr) => format!("mean_{attr}"),
            Measure::Count => "count".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    One(Attribute),
    Two(Attribute, Attribute),
}

impl GroupKey {
    pub fn attributes(&self) -> Vec<Attribute> {
        match *self {
            GroupKey::One(a) => vec![a],
            GroupKey::Two(a, b) => vec![a, b],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: Vec<AttrValue>,
    pub value: Option<f64>,
}

/// Result of a group-by: one row per key combination.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
    pub key: GroupKey,
    pub measure: Measure,
    pub rows: Vec<GroupRow>,
}

#[derive(Default)]
struct Accumulator {
    rows: usize,
    sum: f64,
    present: usize,
}

/// Group the view by `key` and reduce each group with `measure`.
///
/// Rows whose key has a missing component are left out.  Groups appear in
/// the order their key combination is first seen in the view.
pub fn group_by(dataset: &Dataset, view: &[usize], key: GroupKey, measure: Measure) -> GroupedTable {
    let attrs = key.attributes();
    let mut order: Vec<Vec<AttrValue>> = Vec::new();
    let mut accs: HashMap<Vec<AttrValue>, Accumulator> = HashMap::new();

    for listing in dataset.select(view) {
        let k: Vec<AttrValue> = attrs.iter().map(|&a| listing.value(a)).collect();
        if k.iter().any(AttrValue::is_null) {
            continue;
        }
        let acc = accs.entry(k.clone()).or_insert_with(|| {
            order.push(k);
            Accumulator::default()
        });
        acc.rows += 1;
        if let Measure::Sum(attr) | Measure::Mean(attr) = measure {
            if let Some(v) = listing.number(attr) {
                acc.sum += v;
                acc.present += 1;
            }
        }
    }

    let rows = order
        .into_iter()
        .map(|k| {
            let acc = accs.remove(&k).unwrap_or_default();
            let value = match measure {
                Measure::Sum(_) => Some(acc.sum),
                Measure::Mean(_) if acc.present == 0 => None,
                Measure::Mean(_) => Some(acc.sum / acc.present as f64),
                Measure::Count => Some(acc.rows as f64),
            };
            GroupRow { key: k, value }
        })
        .collect();

    GroupedTable { key, measure, rows }
}

impl GroupedTable {
    /// Stable sort by value; groups without a value go last either way.
    pub fn sorted(mut self, order: Order) -> Self {
        self.rows.sort_by(|a, b| match (a.value, b.value) {
            (Some(x), Some(y)) => match order {
                Order::Ascending => x.total_cmp(&y),
                Order::Descending => y.total_cmp(&x),
            },
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The `n` best groups by value.  Ties keep first-seen order.
pub fn top_n(table: GroupedTable, n: usize, order: Order) -> GroupedTable {
    let mut table = table.sorted(order);
    table.rows.truncate(n);
    table
}

/// Count per value, most frequent first.
pub fn value_counts(dataset: &Dataset, view: &[usize], attr: Attribute) -> GroupedTable {
    group_by(dataset, view, GroupKey::One(attr), Measure::Count).sorted(Order::Descending)
}

// ---------------------------------------------------------------------------
// Cross-tabulation
// ---------------------------------------------------------------------------

/// Sparse two-key table.  Combinations that never occur are not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab {
    pub row_key: Attribute,
    pub col_key: Attribute,
    pub measure: Measure,
    /// Row labels in first-seen order.
    pub row_labels: Vec<AttrValue>,
    /// Column labels in first-seen order.
    pub col_labels: Vec<AttrValue>,
    cells: HashMap<(usize, usize), Option<f64>>,
}

impl CrossTab {
    pub fn get(&self, row: &AttrValue, col: &AttrValue) -> Option<f64> {
        let r = self.row_labels.iter().position(|v| v == row)?;
        let c = self.col_labels.iter().position(|v| v == col)?;
        self.cells.get(&(r, c)).copied().flatten()
    }

    /// Present cells as `(row, col, value)`, row-major in label order.
    pub fn entries(&self) -> Vec<(&AttrValue, &AttrValue, f64)> {
        let mut keys: Vec<&(usize, usize)> = self.cells.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|&(r, c)| {
                let value = self.cells.get(&(r, c)).copied().flatten()?;
                Some((&self.row_labels[r], &self.col_labels[c], value))
            })
            .collect()
    }
}

pub fn cross_tab(dataset: &Dataset, view: &[usize], row_key: Attribute, col_key: Attribute, measure: Measure) -> CrossTab {
    let grouped = group_by(dataset, view, GroupKey::Two(row_key, col_key), measure);

    let mut row_labels: Vec<AttrValue> = Vec::new();
    let mut col_labels: Vec<AttrValue> = Vec::new();
    let mut cells = HashMap::new();
    for GroupRow { key, value } in grouped.rows {
        let mut parts = key.into_iter();
        let (Some(r), Some(c)) = (parts.next(), parts.next()) else {
            continue;
        };
        let r = position_or_push(&mut row_labels, r);
        let c = position_or_push(&mut col_labels, c);
        cells.insert((r, c), value);
    }

    CrossTab {
        row_key,
        col_key,
        measure,
        row_labels,
        col_labels,
        cells,
    }
}

fn position_or_push(labels: &mut Vec<AttrValue>, value: AttrValue) -> usize {
    match labels.iter().position(|v| *v == value) {
        Some(i) => i,
        None => {
            labels.push(value);
            labels.len() - 1
        }
    }
}

// ---------------------------------------------------------------------------
// Facilities
// ---------------------------------------------------------------------------

/// Sorted distinct facility names appearing in the view.
pub fn facility_vocabulary(dataset: &Dataset, view: &[usize]) -> Vec<String> {
    dataset
        .select(view)
        .flat_map(|l| l.facilities.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::model::Listing;

    fn row(url: &str, city: &str, district: &str, price: Option<f64>) -> Listing {
        Listing {
            url: url.into(),
            city: Some(city.into()),
            district: Some(district.into()),
            price_in_rp: price,
            ..Default::default()
        }
    }

    fn keys(table: &GroupedTable) -> Vec<String> {
        table
            .rows
            .iter()
            .map(|r| r.key.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("/"))
            .collect()
    }

    #[test]
    fn sum_by_city() {
        let ds = Dataset::from_listings(vec![
            row("a", "Bekasi", "Tambun", Some(1_000_000_000.0)),
            row("b", "Depok", "Cimanggis", Some(7.0)),
            row("c", "Bekasi", "Cikarang", Some(2_000_000_000.0)),
        ])
        .unwrap();
        let table = group_by(&ds, &ds.all_indices(), GroupKey::One(Attribute::City), Measure::Sum(Attribute::PriceInRp));
        assert_eq!(
            table.rows,
            vec![
                GroupRow { key: vec!["Bekasi".into()], value: Some(3_000_000_000.0) },
                GroupRow { key: vec!["Depok".into()], value: Some(7.0) },
            ]
        );
    }

    #[test]
    fn mean_skips_missing_and_reports_none_for_all_missing() {
        let ds = Dataset::from_listings(vec![
            row("a", "Bogor", "X", Some(2.0)),
            row("b", "Bogor", "X", None),
            row("c", "Bogor", "X", Some(4.0)),
            row("d", "Depok", "Y", None),
        ])
        .unwrap();
        let table = group_by(&ds, &ds.all_indices(), GroupKey::One(Attribute::City), Measure::Mean(Attribute::PriceInRp));
        assert_eq!(table.rows[0].value, Some(3.0));
        assert_eq!(table.rows[1].value, None);

        let sums = group_by(&ds, &ds.all_indices(), GroupKey::One(Attribute::City), Measure::Sum(Attribute::PriceInRp));
        assert_eq!(sums.rows[1].value, Some(0.0));
    }

    #[test]
    fn two_key_groups_in_first_seen_order_skipping_null_keys() {
        let mut rows = vec![
            row("a", "Bogor", "Sentul", None),
            row("b", "Jakarta", "Kemang", None),
            row("c", "Bogor", "Sentul", None),
            row("d", "Bogor", "Cibinong", None),
        ];
        rows[3].district = None;
        let ds = Dataset::from_listings(rows).unwrap();
        let table = group_by(&ds, &ds.all_indices(), GroupKey::Two(Attribute::City, Attribute::District), Measure::Count);
        assert_eq!(keys(&table), vec!["Bogor/Sentul", "Jakarta/Kemang"]);
        assert_eq!(table.rows[0].value, Some(2.0));
    }

    #[test]
    fn top_n_breaks_ties_by_first_seen() {
        let ds = Dataset::from_listings(vec![
            row("a", "C1", "D", Some(5.0)),
            row("b", "C2", "D", Some(5.0)),
            row("c", "C3", "D", Some(5.0)),
        ])
        .unwrap();
        for _ in 0..3 {
            let table = group_by(&ds, &ds.all_indices(), GroupKey::One(Attribute::City), Measure::Sum(Attribute::PriceInRp));
            assert_eq!(keys(&top_n(table.clone(), 2, Order::Descending)), vec!["C1", "C2"]);
            assert_eq!(keys(&top_n(table, 2, Order::Ascending)), vec!["C1", "C2"]);
        }
    }

    #[test]
    fn top_n_orders_by_value() {
        let ds = Dataset::from_listings(vec![
            row("a", "Bogor", "D", Some(1.0)),
            row("b", "Jakarta", "D", Some(9.0)),
            row("c", "Depok", "D", Some(4.0)),
        ])
        .unwrap();
        let table = group_by(&ds, &ds.all_indices(), GroupKey::One(Attribute::City), Measure::Sum(Attribute::PriceInRp));
        assert_eq!(keys(&top_n(table, 2, Order::Descending)), vec!["Jakarta", "Depok"]);
    }

    #[test]
    fn summary_counts_distinct_urls() {
        let ds = Dataset::from_listings(vec![
            row("same", "Bogor", "D", Some(1e9)),
            row("same", "Bogor", "D", Some(3e9)),
            row("other", "Bogor", "D", None),
        ])
        .unwrap();
        let s = summary(&ds, &ds.all_indices());
        assert_eq!(s.count, 2);
        assert_eq!(s.mean_price, Some(2e9));
        assert_eq!(s.max_price, Some(3e9));
        assert_eq!(s.min_price, Some(1e9));
    }

    #[test]
    fn summary_of_empty_view_is_absent() {
        let ds = Dataset::from_listings(vec![row("a", "Bogor", "D", Some(1.0))]).unwrap();
        assert_eq!(summary(&ds, &[]), Summary::default());
    }

    #[test]
    fn cross_tab_is_sparse() {
        let ds = Dataset::from_listings(vec![
            Listing { certificate: Some("SHM".into()), ..row("a", "Bogor", "D", Some(1.0)) },
            Listing { certificate: Some("HGB".into()), ..row("b", "Jakarta", "D", Some(2.0)) },
            Listing { certificate: Some("SHM".into()), ..row("c", "Bogor", "D", Some(3.0)) },
        ])
        .unwrap();
        let tab = cross_tab(&ds, &ds.all_indices(), Attribute::City, Attribute::Certificate, Measure::Sum(Attribute::PriceInRp));
        assert_eq!(tab.row_labels, vec![AttrValue::from("Bogor"), AttrValue::from("Jakarta")]);
        assert_eq!(tab.col_labels, vec![AttrValue::from("SHM"), AttrValue::from("HGB")]);
        assert_eq!(tab.get(&"Bogor".into(), &"SHM".into()), Some(4.0));
        assert_eq!(tab.get(&"Bogor".into(), &"HGB".into()), None);
        assert_eq!(tab.entries().len(), 2);
    }

    #[test]
    fn vocabulary_follows_the_view() {
        let ds = Dataset::from_listings(vec![
            Listing { facilities: vec!["Pool".into(), "Gym".into()], ..row("a", "X", "Y", None) },
            Listing { facilities: vec!["AC".into(), "Pool".into()], ..row("b", "X", "Y", None) },
        ])
        .unwrap();
        assert_eq!(facility_vocabulary(&ds, &ds.all_indices()), vec!["AC", "Gym", "Pool"]);
        assert_eq!(facility_vocabulary(&ds, &[0]), vec!["Gym", "Pool"]);
        assert!(facility_vocabulary(&ds, &[]).is_empty());
    }

    #[test]
    fn quartiles_interpolate() {
        let stats = NumericStats::compute([4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.max, 4.0);
        assert!(NumericStats::compute(Vec::new()).is_none());
    }

    #[test]
    fn value_counts_most_frequent_first() {
        let ds = Dataset::from_listings(vec![
            row("a", "Bogor", "D", None),
            row("b", "Depok", "D", None),
            row("c", "Depok", "D", None),
        ])
        .unwrap();
        assert_eq!(keys(&value_counts(&ds, &ds.all_indices(), Attribute::City)), vec!["Depok", "Bogor"]);
    }
}
