use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::aggregate::facility_vocabulary;
use super::model::{AttrKind, AttrValue, Attribute, Dataset};
use crate::error::{ConfigError, FilterIssue};

// ---------------------------------------------------------------------------
// Pipeline declaration: which attributes are filterable, how, in what order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Keep rows whose value is one of the chosen values.
    SetMembership,
    /// Keep rows whose number lies in inclusive `[min, max]`.
    Range,
    /// Keep rows whose facility set contains every chosen name.
    AllOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterGroup {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub attribute: Attribute,
    pub kind: FilterKind,
    #[serde(default)]
    pub group: FilterGroup,
    /// Lower bound used when a range filter has no explicit minimum.
    /// `None` falls back to the observed minimum.
    #[serde(default)]
    pub default_min: Option<f64>,
}

impl FilterSpec {
    pub fn new(attribute: Attribute, kind: FilterKind) -> Self {
        FilterSpec {
            attribute,
            kind,
            group: FilterGroup::Basic,
            default_min: None,
        }
    }

    pub fn advanced(mut self) -> Self {
        self.group = FilterGroup::Advanced;
        self
    }

    pub fn with_default_min(mut self, min: f64) -> Self {
        self.default_min = Some(min);
        self
    }
}

/// Ordered list of filter stages.  Order matters: each stage's candidate
/// values come from the rows left by the stages before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub filters: Vec<FilterSpec>,
}

impl Default for PipelineConfig {
    /// The sidebar layout of the listings dashboard, top to bottom.
    fn default() -> Self {
        use Attribute::*;
        use FilterKind::*;

        let mut filters = vec![
            FilterSpec::new(City, SetMembership),
            FilterSpec::new(District, SetMembership),
            FilterSpec::new(Address, SetMembership),
            FilterSpec::new(Certificate, SetMembership),
            FilterSpec::new(Facilities, AllOf),
            FilterSpec::new(PriceInRp, Range).with_default_min(0.0),
        ];
        for attr in [
            BuildingAge,
            YearBuilt,
            LandSizeM2,
            BuildingSizeM2,
            Floors,
            Electricity,
            PropertyCondition,
            BuildingOrientation,
            Furnishing,
            Bedrooms,
            Bathrooms,
            Carports,
            MaidBedrooms,
            MaidBathrooms,
            Garages,
        ] {
            filters.push(FilterSpec::new(attr, SetMembership).advanced());
        }
        PipelineConfig { filters }
    }
}

impl PipelineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject duplicate attributes and kinds the attribute cannot support.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for spec in &self.filters {
            if !seen.insert(spec.attribute) {
                return Err(ConfigError::InvalidPipeline(format!(
                    "{} is declared more than once",
                    spec.attribute
                )));
            }
            let ok = match (spec.kind, spec.attribute.kind()) {
                (FilterKind::AllOf, AttrKind::FacilitySet) => true,
                (FilterKind::Range, AttrKind::Numeric) => true,
                (FilterKind::SetMembership, AttrKind::Categorical | AttrKind::Numeric) => true,
                _ => false,
            };
            if !ok {
                return Err(ConfigError::InvalidPipeline(format!(
                    "{:?} filter is not applicable to {}",
                    spec.kind, spec.attribute
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Selections: the user-chosen constraint per attribute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeSelection {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RangeSelection {
    pub fn is_unset(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Members(BTreeSet<AttrValue>),
    Range(RangeSelection),
    AllOf(BTreeSet<String>),
}

impl Selection {
    /// Whether this selection constrains nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Selection::Members(set) => set.is_empty(),
            Selection::Range(range) => range.is_unset(),
            Selection::AllOf(set) => set.is_empty(),
        }
    }
}

/// Current selection per attribute.  An attribute with no entry, or an
/// empty entry, never excludes a row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelections {
    by_attribute: BTreeMap<Attribute, Selection>,
}

impl FilterSelections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attr: Attribute) -> Option<&Selection> {
        self.by_attribute.get(&attr)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.by_attribute.values().all(Selection::is_empty)
    }

    pub fn set_members<I>(&mut self, attr: Attribute, values: I)
    where
        I: IntoIterator<Item = AttrValue>,
    {
        let set: BTreeSet<AttrValue> = values.into_iter().filter(|v| !v.is_null()).collect();
        self.store(attr, Selection::Members(set));
    }

    /// Add `value` if absent, remove it if present.
    pub fn toggle_member(&mut self, attr: Attribute, value: AttrValue) {
        let mut set = match self.by_attribute.remove(&attr) {
            Some(Selection::Members(set)) => set,
            _ => BTreeSet::new(),
        };
        if !set.remove(&value) {
            set.insert(value);
        }
        self.store(attr, Selection::Members(set));
    }

    pub fn set_range(&mut self, attr: Attribute, min: Option<f64>, max: Option<f64>) {
        self.store(attr, Selection::Range(RangeSelection { min, max }));
    }

    pub fn set_facilities<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = names.into_iter().map(Into::into).collect();
        self.store(Attribute::Facilities, Selection::AllOf(set));
    }

    pub fn toggle_facility(&mut self, name: &str) {
        let mut set = match self.by_attribute.remove(&Attribute::Facilities) {
            Some(Selection::AllOf(set)) => set,
            _ => BTreeSet::new(),
        };
        if !set.remove(name) {
            set.insert(name.to_string());
        }
        self.store(Attribute::Facilities, Selection::AllOf(set));
    }

    pub fn clear(&mut self, attr: Attribute) {
        self.by_attribute.remove(&attr);
    }

    pub fn clear_all(&mut self) {
        self.by_attribute.clear();
    }

    fn store(&mut self, attr: Attribute, selection: Selection) {
        if selection.is_empty() {
            self.by_attribute.remove(&attr);
        } else {
            self.by_attribute.insert(attr, selection);
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome: the filtered view plus what every stage offered the user
// ---------------------------------------------------------------------------

/// Indices into the dataset, in dataset order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    indices: Vec<usize>,
}

impl FilteredView {
    pub fn new(indices: Vec<usize>) -> Self {
        FilteredView { indices }
    }

    pub fn all(dataset: &Dataset) -> Self {
        FilteredView::new(dataset.all_indices())
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// The choices a stage offered, computed from the rows entering it.
#[derive(Debug, Clone, PartialEq)]
pub enum StageDomain {
    Values(Vec<AttrValue>),
    Facilities(Vec<String>),
    Bounds {
        /// Observed `[min, max]` of the entering rows.
        observed: Option<(f64, f64)>,
        /// Bounds actually applied: explicit selection, else the defaults.
        effective: Option<(f64, f64)>,
    },
    /// An earlier stage left no rows; nothing was computed.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub spec: FilterSpec,
    pub domain: StageDomain,
    pub rows_in: usize,
    pub rows_out: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutcome {
    pub view: FilteredView,
    pub stages: Vec<StageReport>,
    pub issues: Vec<FilterIssue>,
}

impl PipelineOutcome {
    pub fn stage(&self, attr: Attribute) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.spec.attribute == attr)
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FilterPipeline
// ---------------------------------------------------------------------------

/// Applies the declared stages in order.  Holds no state between calls:
/// every `apply` recomputes from the unmodified dataset.
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    config: PipelineConfig,
}

impl FilterPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        FilterPipeline { config }
    }

    pub fn apply(&self, dataset: &Dataset, selections: &FilterSelections) -> PipelineOutcome {
        let mut retained = dataset.all_indices();
        let mut stages = Vec::with_capacity(self.config.filters.len());
        let mut issues = Vec::new();

        if retained.is_empty() {
            issues.push(FilterIssue::EmptyFilterResult { after: None });
        }

        for spec in &self.config.filters {
            let rows_in = retained.len();
            if rows_in == 0 {
                stages.push(StageReport {
                    spec: spec.clone(),
                    domain: StageDomain::Exhausted,
                    rows_in,
                    rows_out: 0,
                });
                continue;
            }

            let (domain, next) = evaluate_stage(dataset, spec, selections.get(spec.attribute), retained, &mut issues);
            retained = next;
            log::debug!("filter {}: {} -> {} rows", spec.attribute, rows_in, retained.len());

            if retained.is_empty() {
                issues.push(FilterIssue::EmptyFilterResult {
                    after: Some(spec.attribute),
                });
            }
            stages.push(StageReport {
                spec: spec.clone(),
                domain,
                rows_in,
                rows_out: retained.len(),
            });
        }

        PipelineOutcome {
            view: FilteredView::new(retained),
            stages,
            issues,
        }
    }
}

/// Compute one stage's domain from the entering rows, then narrow them.
fn evaluate_stage(
    dataset: &Dataset,
    spec: &FilterSpec,
    selection: Option<&Selection>,
    retained: Vec<usize>,
    issues: &mut Vec<FilterIssue>,
) -> (StageDomain, Vec<usize>) {
    let attr = spec.attribute;
    match spec.kind {
        FilterKind::SetMembership => {
            let candidates = dataset.distinct_values(attr, &retained);
            let chosen = match selection {
                None => None,
                Some(Selection::Members(set)) if set.is_empty() => None,
                Some(Selection::Members(set)) => Some(set),
                Some(_) => {
                    reject_mismatch(attr, issues);
                    None
                }
            };
            let Some(chosen) = chosen else {
                return (StageDomain::Values(candidates), retained);
            };
            for value in chosen {
                if candidates.binary_search(value).is_err() {
                    reject_value(attr, value.to_string(), issues);
                }
            }
            let next = retained
                .into_iter()
                .filter(|&i| dataset.rows()[i].value(attr).is_in(chosen))
                .collect();
            (StageDomain::Values(candidates), next)
        }

        FilterKind::AllOf => {
            let vocabulary = facility_vocabulary(dataset, &retained);
            let chosen = match selection {
                None => None,
                Some(Selection::AllOf(set)) if set.is_empty() => None,
                Some(Selection::AllOf(set)) => Some(set),
                Some(_) => {
                    reject_mismatch(attr, issues);
                    None
                }
            };
            let Some(chosen) = chosen else {
                return (StageDomain::Facilities(vocabulary), retained);
            };
            for name in chosen {
                if vocabulary.binary_search(name).is_err() {
                    reject_value(attr, name.clone(), issues);
                }
            }
            let next = retained
                .into_iter()
                .filter(|&i| {
                    let listing = &dataset.rows()[i];
                    !listing.facilities.is_empty() && chosen.iter().all(|f| listing.has_facility(f))
                })
                .collect();
            (StageDomain::Facilities(vocabulary), next)
        }

        FilterKind::Range => {
            let observed = dataset.numeric_span(attr, &retained);
            let range = match selection {
                None => RangeSelection::default(),
                Some(Selection::Range(range)) => range.clone(),
                Some(_) => {
                    reject_mismatch(attr, issues);
                    RangeSelection::default()
                }
            };

            let default_lo = spec.default_min.or(observed.map(|(lo, _)| lo));
            let default_hi = observed.map(|(_, hi)| hi);
            let effective = match (range.min.or(default_lo), range.max.or(default_hi)) {
                (Some(lo), Some(hi)) => Some((lo, hi)),
                _ => None,
            };
            let domain = StageDomain::Bounds { observed, effective };

            if range.is_unset() {
                return (domain, retained);
            }
            for bound in [range.min, range.max].into_iter().flatten() {
                if bound.is_nan() {
                    reject_value(attr, bound.to_string(), issues);
                }
            }

            // Bounds covering the whole column's span are a no-op; the span is
            // taken over every row so stage order cannot change membership.
            let covers_span = match dataset.numeric_span(attr, &dataset.all_indices()) {
                Some((all_lo, all_hi)) => {
                    range.min.map_or(true, |m| m <= all_lo) && range.max.map_or(true, |m| m >= all_hi)
                }
                None => true,
            };
            if covers_span {
                return (domain, retained);
            }

            let lo = range.min.or(default_lo).unwrap_or(f64::NEG_INFINITY);
            let hi = range.max.or(default_hi).unwrap_or(f64::INFINITY);
            let next = retained
                .into_iter()
                .filter(|&i| matches!(dataset.rows()[i].number(attr), Some(v) if lo <= v && v <= hi))
                .collect();
            (domain, next)
        }
    }
}

fn reject_value(attribute: Attribute, value: String, issues: &mut Vec<FilterIssue>) {
    log::warn!("{value:?} is not an available choice for {attribute}; it matches nothing");
    issues.push(FilterIssue::InvalidFilterValue { attribute, value });
}

fn reject_mismatch(attribute: Attribute, issues: &mut Vec<FilterIssue>) {
    log::warn!("selection for {attribute} has the wrong shape; ignored");
    issues.push(FilterIssue::SelectionMismatch { attribute });
}

impl AttrValue {
    fn is_in(&self, chosen: &BTreeSet<AttrValue>) -> bool {
        !self.is_null() && chosen.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::model::Listing;

    fn listing(url: &str, city: &str, district: &str, price: Option<f64>, facilities: &[&str]) -> Listing {
        Listing {
            url: url.into(),
            city: Some(city.into()),
            district: Some(district.into()),
            price_in_rp: price,
            facilities: facilities.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    fn sample() -> Dataset {
        let mut rows = vec![
            listing("u0", "Jakarta", "Menteng", Some(5e9), &["Pool", "Gym"]),
            listing("u1", "Bogor", "Cibinong", Some(2e9), &[]),
            listing("u2", "Jakarta", "Kemang", Some(8e9), &["AC", "Garden"]),
            listing("u3", "Bekasi", "Tambun", None, &["AC"]),
            listing("u4", "Bogor", "Sentul", Some(1e9), &["AC", "Garden", "Pool"]),
        ];
        rows[3].bedrooms = Some(3.0);
        rows[4].bedrooms = Some(2.0);
        Dataset::from_listings(rows).unwrap()
    }

    fn apply(ds: &Dataset, sel: &FilterSelections) -> PipelineOutcome {
        FilterPipeline::default().apply(ds, sel)
    }

    #[test]
    fn default_pipeline_validates() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_selections_keep_every_row_in_order() {
        let ds = sample();
        let out = apply(&ds, &FilterSelections::new());
        assert_eq!(out.view, FilteredView::all(&ds));
        assert!(out.issues.is_empty());
    }

    #[test]
    fn full_span_range_keeps_rows_with_missing_price() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_range(Attribute::PriceInRp, Some(0.0), Some(8e9));
        let out = apply(&ds, &sel);
        assert_eq!(out.view.indices(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn explicit_range_is_inclusive_and_drops_missing() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_range(Attribute::PriceInRp, Some(2e9), Some(5e9));
        let out = apply(&ds, &sel);
        assert_eq!(out.view.indices(), &[0, 1]);
    }

    #[test]
    fn only_min_uses_current_max_as_upper_bound() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Bogor")]);
        sel.set_range(Attribute::PriceInRp, Some(1.5e9), None);
        let out = apply(&ds, &sel);
        assert_eq!(out.view.indices(), &[1]);

        let stage = out.stage(Attribute::PriceInRp).unwrap();
        assert_eq!(
            stage.domain,
            StageDomain::Bounds {
                observed: Some((1e9, 2e9)),
                effective: Some((1.5e9, 2e9)),
            }
        );
    }

    #[test]
    fn unset_price_bound_follows_earlier_filters() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Jakarta")]);
        let out = apply(&ds, &sel);
        let stage = out.stage(Attribute::PriceInRp).unwrap();
        assert_eq!(
            stage.domain,
            StageDomain::Bounds {
                observed: Some((5e9, 8e9)),
                effective: Some((0.0, 8e9)),
            }
        );
    }

    #[test]
    fn later_candidates_narrow_to_earlier_result() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Bogor")]);
        let out = apply(&ds, &sel);

        let city = out.stage(Attribute::City).unwrap();
        assert_eq!(
            city.domain,
            StageDomain::Values(vec!["Bekasi".into(), "Bogor".into(), "Jakarta".into()])
        );
        let district = out.stage(Attribute::District).unwrap();
        assert_eq!(district.domain, StageDomain::Values(vec!["Cibinong".into(), "Sentul".into()]));
        let facilities = out.stage(Attribute::Facilities).unwrap();
        assert_eq!(
            facilities.domain,
            StageDomain::Facilities(vec!["AC".into(), "Garden".into(), "Pool".into()])
        );
    }

    #[test]
    fn facilities_require_every_chosen_name() {
        let ds = Dataset::from_listings(vec![
            listing("a", "X", "Y", Some(1.0), &["AC", "Garden"]),
            listing("b", "X", "Y", Some(1.0), &[]),
        ])
        .unwrap();

        let matches = |names: &[&str]| {
            let mut sel = FilterSelections::new();
            sel.set_facilities(names.iter().copied());
            apply(&ds, &sel).view.indices().to_vec()
        };

        assert_eq!(matches(&["AC"]), vec![0]);
        assert_eq!(matches(&["AC", "Garden"]), vec![0]);
        assert_eq!(matches(&["AC", "Pool"]), Vec::<usize>::new());
        assert_eq!(matches(&[]), vec![0, 1]);
    }

    #[test]
    fn facility_match_is_exact_not_substring() {
        let ds = Dataset::from_listings(vec![listing("a", "X", "Y", None, &["Swimming Pool"])]).unwrap();
        let mut sel = FilterSelections::new();
        sel.set_facilities(["Pool"]);
        assert!(apply(&ds, &sel).view.is_empty());
    }

    #[test]
    fn empty_intermediate_result_short_circuits() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Bekasi")]);
        sel.set_range(Attribute::PriceInRp, Some(1.5e9), None);
        let out = apply(&ds, &sel);

        assert!(out.view.is_empty());
        assert!(out.issues.contains(&FilterIssue::EmptyFilterResult {
            after: Some(Attribute::PriceInRp)
        }));
        let bedrooms = out.stage(Attribute::Bedrooms).unwrap();
        assert_eq!(bedrooms.domain, StageDomain::Exhausted);
        assert_eq!(bedrooms.rows_in, 0);
    }

    #[test]
    fn unknown_value_matches_nothing_without_failing() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Surabaya")]);
        let out = apply(&ds, &sel);
        assert!(out.view.is_empty());
        assert!(out.issues.contains(&FilterIssue::InvalidFilterValue {
            attribute: Attribute::City,
            value: "Surabaya".into(),
        }));
    }

    #[test]
    fn value_removed_by_earlier_filter_is_reported() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Jakarta")]);
        sel.set_members(Attribute::District, [AttrValue::from("Kemang"), AttrValue::from("Sentul")]);
        let out = apply(&ds, &sel);
        assert_eq!(out.view.indices(), &[2]);
        assert_eq!(
            out.issues,
            vec![FilterIssue::InvalidFilterValue {
                attribute: Attribute::District,
                value: "Sentul".into(),
            }]
        );
    }

    #[test]
    fn mismatched_selection_is_ignored() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_range(Attribute::City, Some(0.0), Some(1.0));
        let out = apply(&ds, &sel);
        assert_eq!(out.view.len(), ds.len());
        assert_eq!(out.issues, vec![FilterIssue::SelectionMismatch { attribute: Attribute::City }]);
    }

    #[test]
    fn numeric_set_membership_uses_exact_values() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::Bedrooms, [AttrValue::Number(3.0)]);
        assert_eq!(apply(&ds, &sel).view.indices(), &[3]);
    }

    #[test]
    fn repeated_application_is_identical() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Bogor"), AttrValue::from("Jakarta")]);
        sel.set_facilities(["Pool"]);
        let pipeline = FilterPipeline::default();
        assert_eq!(pipeline.apply(&ds, &sel), pipeline.apply(&ds, &sel));
    }

    #[test]
    fn stage_order_does_not_change_membership() {
        let ds = sample();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Bogor"), AttrValue::from("Jakarta")]);
        sel.set_range(Attribute::PriceInRp, Some(1.5e9), Some(9e9));

        let forward = FilterPipeline::new(PipelineConfig {
            filters: vec![
                FilterSpec::new(Attribute::City, FilterKind::SetMembership),
                FilterSpec::new(Attribute::PriceInRp, FilterKind::Range),
            ],
        });
        let backward = FilterPipeline::new(PipelineConfig {
            filters: vec![
                FilterSpec::new(Attribute::PriceInRp, FilterKind::Range),
                FilterSpec::new(Attribute::City, FilterKind::SetMembership),
            ],
        });
        let a = forward.apply(&ds, &sel).view;
        let b = backward.apply(&ds, &sel).view;
        assert_eq!(a, b);
        assert_eq!(a.indices(), &[0, 1, 2]);

        // Bounds that happen to cover what the city filter left behind still
        // drop the listing without a price.
        let ds = Dataset::from_listings(vec![
            listing("r0", "Jakarta", "Menteng", Some(5e9), &[]),
            listing("r1", "Jakarta", "Kemang", None, &[]),
            listing("r2", "Bogor", "Sentul", Some(9e9), &[]),
        ])
        .unwrap();
        let mut sel = FilterSelections::new();
        sel.set_members(Attribute::City, [AttrValue::from("Jakarta")]);
        sel.set_range(Attribute::PriceInRp, Some(0.0), Some(5e9));
        let a = forward.apply(&ds, &sel).view;
        let b = backward.apply(&ds, &sel).view;
        assert_eq!(a, b);
        assert_eq!(a.indices(), &[0]);
    }

    #[test]
    fn toggling_twice_clears_the_selection() {
        let mut sel = FilterSelections::new();
        sel.toggle_member(Attribute::City, "Bogor".into());
        assert!(!sel.is_unconstrained());
        sel.toggle_member(Attribute::City, "Bogor".into());
        assert!(sel.is_unconstrained());
        assert_eq!(sel.get(Attribute::City), None);
    }

    #[test]
    fn config_rejects_all_of_on_scalar_column() {
        let err = PipelineConfig::from_json(r#"{"filters":[{"attribute":"city","kind":"all_of"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPipeline(_)));
    }

    #[test]
    fn config_rejects_duplicates() {
        let json = r#"{"filters":[
            {"attribute":"city","kind":"set_membership"},
            {"attribute":"city","kind":"set_membership","group":"advanced"}
        ]}"#;
        assert!(PipelineConfig::from_json(json).is_err());
    }

    #[test]
    fn config_parses_range_with_default_min() {
        let json = r#"{"filters":[{"attribute":"price_in_rp","kind":"range","default_min":0}]}"#;
        let config = PipelineConfig::from_json(json).unwrap();
        assert_eq!(config.filters[0], FilterSpec::new(Attribute::PriceInRp, FilterKind::Range).with_default_min(0.0));
    }
}
