use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use rusty_estate::dashboard::Dashboard;
use rusty_estate::data::aggregate::{CrossTab, GroupedTable, Summary};
use rusty_estate::data::export::CsvTable;
use rusty_estate::data::filter::PipelineOutcome;
use rusty_estate::data::model::format_number;
use rusty_estate::state::AppState;

type PendingExport = (&'static str, Box<dyn CsvTable>);

// ---------------------------------------------------------------------------
// Central panel – summary metrics and derived tables
// ---------------------------------------------------------------------------

pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let mut pending: Option<PendingExport> = None;

    summary_row(ui, &state.dashboard.summary, &mut pending);
    issue_list(ui, &state.outcome);
    ui.separator();

    let dash = &state.dashboard;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |cols| {
                left_column(&mut cols[0], dash, &mut pending);
                right_column(&mut cols[1], dash, &mut pending);
            });
        });

    if let Some((name, table)) = pending {
        state.export_table(name, table.as_ref());
    }
}

fn left_column(ui: &mut Ui, dash: &Dashboard, pending: &mut Option<PendingExport>) {
    grouped(ui, "Top districts by total price", "top_districts_by_price", &dash.top_districts_by_price, pending);
    grouped(ui, "Listings per city", "city_counts", &dash.city_counts, pending);
    grouped(ui, "Building orientation", "orientation_counts", &dash.orientation_counts, pending);
    grouped(ui, "Furnishing", "furnishing_counts", &dash.furnishing_counts, pending);
    grouped(ui, "Total price per year built", "price_by_year_built", &dash.price_by_year_built, pending);
    crosstab(ui, "City × certificate", "city_by_certificate", &dash.city_by_certificate, pending);
    price_stats(ui, dash);
}

fn right_column(ui: &mut Ui, dash: &Dashboard, pending: &mut Option<PendingExport>) {
    grouped(ui, "Top districts by listing count", "top_districts_by_count", &dash.top_districts_by_count, pending);
    grouped(ui, "Certificate type", "certificate_counts", &dash.certificate_counts, pending);
    grouped(ui, "Property condition", "condition_counts", &dash.condition_counts, pending);
    grouped(ui, "Mean price per city", "mean_price_by_city", &dash.mean_price_by_city, pending);
    grouped(ui, "Listings per city and district", "listings_by_city_district", &dash.listings_by_city_district, pending);
    grouped(ui, "Listings per location", "listings_by_location", &dash.listings_by_location, pending);
    crosstab(ui, "City × condition", "city_by_condition", &dash.city_by_condition, pending);

    ui.strong(format!("Facilities ({})", dash.facilities.len()));
    ui.label(dash.facilities.join(", "));
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

fn summary_row(ui: &mut Ui, summary: &Summary, pending: &mut Option<PendingExport>) {
    // Display-only scaling; the summary itself stays in rupiah.
    let billions = |v: Option<f64>| v.map(|v| format!("{:.2}B", v / 1e9)).unwrap_or_else(|| "–".into());
    let millions = |v: Option<f64>| v.map(|v| format!("{:.2}M", v / 1e6)).unwrap_or_else(|| "–".into());

    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Listings", summary.count.to_string());
        metric(ui, "Average price", billions(summary.mean_price));
        metric(ui, "Highest price", billions(summary.max_price));
        metric(ui, "Lowest price", millions(summary.min_price));
        if ui.small_button("CSV").clicked() {
            *pending = Some(("summary", Box::new(summary.clone()) as Box<dyn CsvTable>));
        }
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(label);
            ui.heading(value);
        });
    });
}

fn issue_list(ui: &mut Ui, outcome: &PipelineOutcome) {
    for issue in &outcome.issues {
        ui.label(RichText::new(issue.to_string()).color(Color32::ORANGE));
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn grouped(ui: &mut Ui, title: &str, name: &'static str, table: &GroupedTable, pending: &mut Option<PendingExport>) {
    if title_row(ui, title) {
        *pending = Some((name, Box::new(table.clone()) as Box<dyn CsvTable>));
    }
    text_table(ui, name, &table.header(), &table.records());
}

fn crosstab(ui: &mut Ui, title: &str, name: &'static str, table: &CrossTab, pending: &mut Option<PendingExport>) {
    if title_row(ui, title) {
        *pending = Some((name, Box::new(table.clone()) as Box<dyn CsvTable>));
    }
    text_table(ui, name, &table.header(), &table.records());
}

fn price_stats(ui: &mut Ui, dash: &Dashboard) {
    ui.strong("Price distribution per city");
    let header: Vec<String> = ["city", "count", "min", "q1", "median", "q3", "max"]
        .map(String::from)
        .to_vec();
    let records: Vec<Vec<String>> = dash
        .price_stats_by_city
        .iter()
        .map(|(city, s)| {
            vec![
                city.to_string(),
                s.count.to_string(),
                format_number(s.min),
                format_number(s.q1),
                format_number(s.median),
                format_number(s.q3),
                format_number(s.max),
            ]
        })
        .collect();
    text_table(ui, "price_stats_by_city", &header, &records);
}

/// Title with an export button; returns whether the button was clicked.
fn title_row(ui: &mut Ui, title: &str) -> bool {
    ui.add_space(8.0);
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(title);
        ui.small_button("CSV").clicked()
    })
    .inner
}

fn text_table(ui: &mut Ui, id: &str, header: &[String], records: &[Vec<String>]) {
    if records.is_empty() {
        ui.label(RichText::new("No data").italics());
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        let mut builder = TableBuilder::new(ui).striped(true).max_scroll_height(220.0);
        for _ in header {
            builder = builder.column(Column::auto().at_least(60.0));
        }
        builder
            .header(20.0, |mut row| {
                for title in header {
                    row.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for record in records {
                    body.row(18.0, |mut row| {
                        for cell in record {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell);
                            });
                        }
                    });
                }
            });
    });
}
