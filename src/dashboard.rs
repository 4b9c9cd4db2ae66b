use crate::data::aggregate::{
    cross_tab, facility_vocabulary, group_by, stats_by, summary, top_n, value_counts, CrossTab, GroupKey,
    GroupedTable, Measure, NumericStats, Order, Summary,
};
use crate::data::model::{AttrValue, Attribute, Dataset};

// ---------------------------------------------------------------------------
// Dashboard – every derived table the pages show, for one filtered view
// ---------------------------------------------------------------------------

/// Snapshot of derived tables.  Rebuilt whole after every filter change.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub summary: Summary,
    pub top_districts_by_price: GroupedTable,
    pub top_districts_by_count: GroupedTable,
    pub city_counts: GroupedTable,
    pub certificate_counts: GroupedTable,
    pub orientation_counts: GroupedTable,
    pub condition_counts: GroupedTable,
    pub furnishing_counts: GroupedTable,
    pub mean_price_by_city: GroupedTable,
    pub price_by_year_built: GroupedTable,
    pub listings_by_city_district: GroupedTable,
    pub listings_by_location: GroupedTable,
    pub city_by_certificate: CrossTab,
    pub city_by_condition: CrossTab,
    pub price_stats_by_city: Vec<(AttrValue, NumericStats)>,
    pub facilities: Vec<String>,
}

impl Dashboard {
    pub fn compute(dataset: &Dataset, view: &[usize], top: usize) -> Self {
        use Attribute::*;

        let price_sum = Measure::Sum(PriceInRp);
        Dashboard {
            summary: summary(dataset, view),
            top_districts_by_price: top_n(
                group_by(dataset, view, GroupKey::One(District), price_sum),
                top,
                Order::Descending,
            ),
            top_districts_by_count: top_n(
                group_by(dataset, view, GroupKey::One(District), Measure::Count),
                top,
                Order::Descending,
            ),
            city_counts: value_counts(dataset, view, City),
            certificate_counts: value_counts(dataset, view, Certificate),
            orientation_counts: value_counts(dataset, view, BuildingOrientation),
            condition_counts: value_counts(dataset, view, PropertyCondition),
            furnishing_counts: value_counts(dataset, view, Furnishing),
            mean_price_by_city: group_by(dataset, view, GroupKey::One(City), Measure::Mean(PriceInRp))
                .sorted(Order::Descending),
            price_by_year_built: group_by(dataset, view, GroupKey::One(YearBuilt), price_sum),
            listings_by_city_district: group_by(dataset, view, GroupKey::Two(City, District), Measure::Count),
            listings_by_location: group_by(dataset, view, GroupKey::Two(Lat, Long), Measure::Count),
            city_by_certificate: cross_tab(dataset, view, City, Certificate, Measure::Count),
            city_by_condition: cross_tab(dataset, view, City, PropertyCondition, Measure::Count),
            price_stats_by_city: stats_by(dataset, view, City, PriceInRp),
            facilities: facility_vocabulary(dataset, view),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Listing;

    #[test]
    fn empty_view_produces_empty_tables() {
        let ds = Dataset::from_listings(vec![Listing {
            url: "u".into(),
            city: Some("Bogor".into()),
            price_in_rp: Some(1.0),
            ..Default::default()
        }])
        .unwrap();
        let dash = Dashboard::compute(&ds, &[], 5);
        assert_eq!(dash.summary.count, 0);
        assert!(dash.summary.mean_price.is_none());
        assert!(dash.city_counts.is_empty());
        assert!(dash.city_by_certificate.entries().is_empty());
        assert!(dash.price_stats_by_city.is_empty());
    }

    #[test]
    fn top_tables_respect_limit() {
        let listings = (0..8)
            .map(|i| Listing {
                url: format!("u{i}"),
                district: Some(format!("D{i}")),
                price_in_rp: Some(i as f64),
                ..Default::default()
            })
            .collect();
        let ds = Dataset::from_listings(listings).unwrap();
        let dash = Dashboard::compute(&ds, &ds.all_indices(), 5);
        assert_eq!(dash.top_districts_by_price.len(), 5);
        assert_eq!(dash.top_districts_by_price.rows[0].key, vec![AttrValue::from("D7")]);
        assert_eq!(dash.top_districts_by_count.len(), 5);
    }
}
