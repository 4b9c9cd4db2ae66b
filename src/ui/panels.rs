use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use rusty_estate::data::filter::{FilterGroup, Selection, StageDomain, StageReport};
use rusty_estate::data::model::{format_number, AttrValue, Attribute};
use rusty_estate::state::AppState;

// ---------------------------------------------------------------------------
// Pending edits – collected while drawing, applied once drawing is done
// ---------------------------------------------------------------------------

enum Edit {
    Toggle(Attribute, AttrValue),
    ToggleFacility(String),
    Range(Attribute, Option<f64>, Option<f64>),
    Clear(Attribute),
    ClearAll,
}

fn apply_edit(state: &mut AppState, edit: Edit) {
    match edit {
        Edit::Toggle(attr, value) => state.toggle_value(attr, value),
        Edit::ToggleFacility(name) => state.toggle_facility(&name),
        Edit::Range(attr, min, max) => state.set_range(attr, min, max),
        Edit::Clear(attr) => state.clear_filter(attr),
        Edit::ClearAll => state.clear_all_filters(),
    }
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the filter stages top to bottom, each offering the choices left
/// by the stages above it.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let mut edits = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if ui.button("Clear All Filters").clicked() {
                edits.push(Edit::ClearAll);
            }
            ui.separator();

            let mut in_advanced = false;
            for stage in &state.outcome.stages {
                if stage.spec.group == FilterGroup::Advanced && !in_advanced {
                    in_advanced = true;
                    ui.add_space(6.0);
                    ui.strong("Advanced Filters");
                    ui.separator();
                }
                stage_widget(ui, stage, state.selections.get(stage.spec.attribute), &mut edits);
            }
        });

    for edit in edits {
        apply_edit(state, edit);
    }
}

fn stage_widget(ui: &mut Ui, stage: &StageReport, selection: Option<&Selection>, edits: &mut Vec<Edit>) {
    let attr = stage.spec.attribute;
    let header_text = format!("{attr}  ({}/{})", stage.rows_out, stage.rows_in);

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(attr.column_name())
        .default_open(false)
        .show(ui, |ui: &mut Ui| match &stage.domain {
            StageDomain::Values(values) => {
                let chosen = match selection {
                    Some(Selection::Members(set)) => Some(set),
                    _ => None,
                };
                if ui.small_button("None").clicked() {
                    edits.push(Edit::Clear(attr));
                }
                for value in values {
                    let mut checked = chosen.is_some_and(|set| set.contains(value));
                    if ui.checkbox(&mut checked, value.to_string()).changed() {
                        edits.push(Edit::Toggle(attr, value.clone()));
                    }
                }
            }
            StageDomain::Facilities(names) => {
                let chosen = match selection {
                    Some(Selection::AllOf(set)) => Some(set),
                    _ => None,
                };
                if ui.small_button("None").clicked() {
                    edits.push(Edit::Clear(attr));
                }
                for name in names {
                    let mut checked = chosen.is_some_and(|set| set.contains(name));
                    if ui.checkbox(&mut checked, name.as_str()).changed() {
                        edits.push(Edit::ToggleFacility(name.clone()));
                    }
                }
            }
            StageDomain::Bounds { observed, effective } => {
                range_widget(ui, attr, *observed, *effective, selection, edits);
            }
            StageDomain::Exhausted => {
                ui.label(RichText::new("No listings left to filter.").italics());
            }
        });
}

fn range_widget(
    ui: &mut Ui,
    attr: Attribute,
    observed: Option<(f64, f64)>,
    effective: Option<(f64, f64)>,
    selection: Option<&Selection>,
    edits: &mut Vec<Edit>,
) {
    let Some((obs_lo, obs_hi)) = observed else {
        ui.label("No values in the current listings.");
        return;
    };
    ui.label(format!("Observed: {} – {}", format_number(obs_lo), format_number(obs_hi)));

    let (set_min, set_max) = match selection {
        Some(Selection::Range(range)) => (range.min, range.max),
        _ => (None, None),
    };
    let (mut lo, mut hi) = effective.unwrap_or((obs_lo, obs_hi));
    let speed = ((obs_hi - obs_lo) / 200.0).max(1.0);

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Min");
        if ui.add(egui::DragValue::new(&mut lo).speed(speed)).changed() {
            edits.push(Edit::Range(attr, Some(lo), set_max));
        }
        ui.label("Max");
        if ui.add(egui::DragValue::new(&mut hi).speed(speed)).changed() {
            edits.push(Edit::Range(attr, set_min, Some(hi)));
        }
    });
    if (set_min.is_some() || set_max.is_some()) && ui.small_button("Reset").clicked() {
        edits.push(Edit::Clear(attr));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Export", |ui: &mut Ui| {
            if ui.button("Filtered listings (CSV)").clicked() {
                state.export_filtered_rows();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} listings loaded, {} visible",
            state.dataset.len(),
            state.outcome.view.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::LIGHT_GREEN
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}
