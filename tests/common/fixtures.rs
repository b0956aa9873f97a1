//! Shared crosstab definitions and event streams for the integration tests.
//!
//! The canonical scenario is a sales pivot: regions down the side, quarters
//! across the top, one numeric value per crossing, with per-quarter sums, a
//! per-region sum column and a grand total in the corner.

use crossgrid::model::{
    Band, CrosstabCell, CrosstabCellBody, CrosstabDefinition, DetailMode, GroupBody,
    GroupDefinition, GroupKind, TableLayout,
};
use crossgrid::EventKind;
use serde_json::{json, Value};

use super::EventStream;

pub fn group(kind: GroupKind, field: &str, body: GroupBody) -> GroupDefinition {
    GroupDefinition {
        kind,
        field: field.into(),
        print_summary: false,
        header: Some(Band::field(field)),
        title_header: None,
        summary_header: None,
        footer: None,
        body,
    }
}

pub fn definition(body: GroupDefinition) -> CrosstabDefinition {
    CrosstabDefinition {
        body,
        detail_mode: DetailMode::default(),
        generate_measure_headers: false,
        generate_column_title_headers: false,
        table_layout: TableLayout::Auto,
        measure_header: None,
    }
}

fn cell(row_field: Option<&str>, column_field: Option<&str>, value_field: &str) -> CrosstabCell {
    CrosstabCell {
        row_field: row_field.map(Into::into),
        column_field: column_field.map(Into::into),
        band: Band::field(value_field),
    }
}

/// Region rows against quarter columns, with summaries on both axes.
///
/// `with_quarter_total` controls whether the (row: none, column: quarter)
/// aggregate cell is defined; omitting it exercises the missing-aggregate
/// degradation path.
pub fn region_quarter(with_quarter_total: bool) -> CrosstabDefinition {
    let mut cells = vec![
        cell(None, None, "value"),
        cell(Some("region"), None, "region_total"),
        cell(Some("region"), Some("quarter"), "grand_total"),
    ];
    if with_quarter_total {
        cells.insert(1, cell(None, Some("quarter"), "quarter_total"));
    }

    let mut quarter = group(
        GroupKind::Column,
        "quarter",
        GroupBody::CellBody(CrosstabCellBody { cells }),
    );
    quarter.print_summary = true;
    quarter.summary_header = Some(Band::label("Sum"));

    let mut region = group(GroupKind::Row, "region", GroupBody::Group(Box::new(quarter)));
    region.print_summary = true;
    region.summary_header = Some(Band::label("Sum"));

    definition(region)
}

/// Region and country row levels, a single quarter column level, no summaries.
pub fn region_country_quarter() -> CrosstabDefinition {
    let quarter = group(
        GroupKind::Column,
        "quarter",
        GroupBody::CellBody(CrosstabCellBody {
            cells: vec![cell(None, None, "value")],
        }),
    );
    let country = group(GroupKind::Row, "country", GroupBody::Group(Box::new(quarter)));
    let region = group(GroupKind::Row, "region", GroupBody::Group(Box::new(country)));
    definition(region)
}

/// Region rows against year/quarter column levels, both with sum columns.
pub fn region_year_quarter() -> CrosstabDefinition {
    let mut quarter = group(
        GroupKind::Column,
        "quarter",
        GroupBody::CellBody(CrosstabCellBody {
            cells: vec![
                cell(None, None, "value"),
                cell(None, Some("quarter"), "quarter_total"),
                cell(None, Some("year"), "year_total"),
            ],
        }),
    );
    quarter.print_summary = true;
    quarter.summary_header = Some(Band::label("Sum"));

    let mut year = group(GroupKind::Column, "year", GroupBody::Group(Box::new(quarter)));
    year.print_summary = true;
    year.summary_header = Some(Band::label("Sum"));

    let region = group(GroupKind::Row, "region", GroupBody::Group(Box::new(year)));
    definition(region)
}

/// The region/quarter fixture with title and measure header rows enabled.
pub fn region_quarter_titled() -> CrosstabDefinition {
    let mut def = region_quarter(true);
    def.generate_column_title_headers = true;
    def.generate_measure_headers = true;
    def.measure_header = Some(Band::label("Value"));
    if let GroupBody::Group(quarter) = &mut def.body.body {
        quarter.title_header = Some(Band::label("Quarter"));
    }
    def
}

/// One detail cell per crossing, no summaries; for detail-mode tests.
pub fn region_quarter_plain(mode: DetailMode) -> CrosstabDefinition {
    let quarter = group(
        GroupKind::Column,
        "quarter",
        GroupBody::CellBody(CrosstabCellBody {
            cells: vec![cell(None, None, "value")],
        }),
    );
    let region = group(GroupKind::Row, "region", GroupBody::Group(Box::new(quarter)));
    let mut def = definition(region);
    def.detail_mode = mode;
    def
}

fn ev(kind: EventKind, group_index: usize, context: Value) -> (EventKind, usize, Value) {
    (kind, group_index, context)
}

/// One quarter's worth of detail events: start, a single value, finish.
pub fn quarter_pass(quarter: &str, value: i64) -> EventStream {
    use EventKind::*;
    vec![
        ev(GroupStarted, 2, json!({ "quarter": quarter })),
        ev(ItemsStarted, 2, json!({})),
        ev(ItemsAdvanced, 2, json!({ "value": value })),
        ev(ItemsFinished, 2, json!({})),
        ev(GroupFinished, 2, json!({ "quarter": quarter })),
    ]
}

/// The full worked example: EMEA over Q1/Q2, APAC over Q1 only, a grand-total
/// summary row, then table teardown.
pub fn region_quarter_stream() -> EventStream {
    use EventKind::*;
    let mut events = vec![
        ev(GroupStarted, 0, json!({})),
        ev(GroupStarted, 1, json!({ "region": "EMEA" })),
    ];
    events.extend(quarter_pass("Q1", 10));
    events.extend(quarter_pass("Q2", 20));
    events.push(ev(
        GroupFinished,
        1,
        json!({ "region": "EMEA", "quarter_total": 30 }),
    ));

    events.push(ev(GroupStarted, 1, json!({ "region": "APAC" })));
    events.extend(quarter_pass("Q1", 5));
    events.push(ev(
        GroupFinished,
        1,
        json!({ "region": "APAC", "quarter_total": 5 }),
    ));

    // Grand-total summary row, replayed through the column dimension with
    // the per-region aggregates in context.
    events.push(ev(SummaryRowStart, 0, json!({})));
    events.push(ev(SummaryRow, 0, json!({})));
    for (quarter, total) in [("Q1", 15), ("Q2", 20)] {
        events.push(ev(GroupStarted, 2, json!({ "quarter": quarter })));
        events.push(ev(ItemsStarted, 2, json!({})));
        events.push(ev(
            ItemsAdvanced,
            2,
            json!({ "region_total": total }),
        ));
        events.push(ev(ItemsFinished, 2, json!({})));
        events.push(ev(GroupFinished, 2, json!({ "quarter": quarter })));
    }
    events.push(ev(SummaryRowEnd, 0, json!({ "grand_total": 35 })));

    events.push(ev(GroupBodyFinished, 0, json!({})));
    events.push(ev(GroupFinished, 0, json!({})));
    events
}
