//! Windowed rendering of large record sets.
//!
//! Only the rows intersecting the scroll viewport, plus an overscan margin on
//! each side, are materialized. Rows share one uniform height, so every
//! position is `index * row_height` and nothing needs measuring.
//!
//! Records come from a loosely-typed upstream API, so cell resolution never
//! fails: missing fields, non-object intermediates and non-numeric quantities
//! all degrade to [`PLACEHOLDER`].

use serde_json::{Number, Value};

use crate::models::{Column, RenderedRow, VisibleRow};

pub const DEFAULT_ROW_HEIGHT: f64 = 50.0;
pub const DEFAULT_CONTAINER_HEIGHT: f64 = 400.0;
pub const DEFAULT_OVERSCAN: usize = 5;

/// Rendered in place of null, missing or empty values.
pub const PLACEHOLDER: &str = "-";

/// Computed column: ordered minus in-progress minus completed quantity.
pub const REMAINDER_COLUMN: &str = "Reliquat";
const ORDERED_QTY_PATH: &str = "prestation.qteBc";
const IN_PROGRESS_QTY_PATH: &str = "qteEncours";
const COMPLETED_QTY_PATH: &str = "qteRealise";

/// Row indices to materialize for a viewport, each with its top offset.
///
/// The strictly visible rows are `floor(scroll / row_height)` through the row
/// containing the bottom edge; the range is then widened by `overscan` rows on
/// each side and clamped to the record set.
pub fn compute_visible_range(
    scroll_offset: f64,
    container_height: f64,
    row_height: f64,
    record_count: usize,
    overscan: usize,
) -> Vec<VisibleRow> {
    if record_count == 0 || !row_height.is_finite() || row_height <= 0.0 {
        return Vec::new();
    }

    let scroll = if scroll_offset.is_finite() { scroll_offset.max(0.0) } else { 0.0 };
    let height = if container_height.is_finite() { container_height.max(0.0) } else { 0.0 };
    let last_row = record_count - 1;

    let first_visible = ((scroll / row_height).floor() as usize).min(last_row);
    let last_visible = (((scroll + height) / row_height).ceil() as usize)
        .saturating_sub(1)
        .clamp(first_visible, last_row);

    let start = first_visible.saturating_sub(overscan);
    let end = last_visible.saturating_add(overscan).min(last_row);

    (start..=end)
        .map(|index| VisibleRow {
            index,
            offset_top: index as f64 * row_height,
        })
        .collect()
}

/// Walk a dotted path. Object members are looked up by name and array
/// elements by numeric segment; anything else ends the walk with `None`.
pub fn resolve_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Lenient numeric coercion: absent, null and blank strings count as zero,
/// numeric strings are parsed, booleans are 1/0. Anything else is `None`.
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64()?,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().ok()?
            }
        }
        Some(Value::Array(_)) | Some(Value::Object(_)) => return None,
    };
    number.is_finite().then_some(number)
}

/// Remaining quantity of a fulfillment row, if all three operands are numeric.
pub fn remainder(record: &Value) -> Option<f64> {
    let ordered = coerce_number(resolve_path(record, ORDERED_QTY_PATH))?;
    let in_progress = coerce_number(resolve_path(record, IN_PROGRESS_QTY_PATH))?;
    let completed = coerce_number(resolve_path(record, COMPLETED_QTY_PATH))?;
    Some(ordered - in_progress - completed)
}

pub fn cell_text(record: &Value, column: &Column) -> String {
    if column.key == REMAINDER_COLUMN {
        return match remainder(record) {
            Some(value) => format!("{:.2}", value),
            None => PLACEHOLDER.to_string(),
        };
    }

    match resolve_path(record, &column.key) {
        None | Some(Value::Null) => PLACEHOLDER.to_string(),
        Some(Value::String(s)) if s.is_empty() => PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => number_text(n),
        Some(other) => other.to_string(),
    }
}

/// Shortest decimal form, with no trailing `.0` on whole floats: upstream
/// quantities are doubles and `100.0` should read as `100`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

type RowClick<'a> = Box<dyn Fn(usize, &Value) + 'a>;

/// A record set bound to its columns and viewport geometry.
pub struct VirtualTable<'a> {
    records: &'a [Value],
    columns: &'a [Column],
    row_height: f64,
    container_height: f64,
    overscan: usize,
    on_row_click: Option<RowClick<'a>>,
}

impl<'a> VirtualTable<'a> {
    pub fn new(records: &'a [Value], columns: &'a [Column]) -> Self {
        Self {
            records,
            columns,
            row_height: DEFAULT_ROW_HEIGHT,
            container_height: DEFAULT_CONTAINER_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            on_row_click: None,
        }
    }

    pub fn with_row_height(mut self, row_height: f64) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn with_container_height(mut self, container_height: f64) -> Self {
        self.container_height = container_height;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    #[allow(dead_code)]
    pub fn on_row_click(mut self, callback: impl Fn(usize, &Value) + 'a) -> Self {
        self.on_row_click = Some(Box::new(callback));
        self
    }

    pub fn headers(&self) -> &[Column] {
        self.columns
    }

    /// Full scroll extent of the record set.
    pub fn total_height(&self) -> f64 {
        if self.row_height.is_finite() && self.row_height > 0.0 {
            self.records.len() as f64 * self.row_height
        } else {
            0.0
        }
    }

    pub fn visible_rows(&self, scroll_offset: f64) -> Vec<VisibleRow> {
        compute_visible_range(
            scroll_offset,
            self.container_height,
            self.row_height,
            self.records.len(),
            self.overscan,
        )
    }

    pub fn render(&self, scroll_offset: f64) -> Vec<RenderedRow> {
        self.visible_rows(scroll_offset)
            .into_iter()
            .map(|row| {
                let record = &self.records[row.index];
                RenderedRow {
                    index: row.index,
                    offset_top: row.offset_top,
                    cells: self.columns.iter().map(|c| cell_text(record, c)).collect(),
                }
            })
            .collect()
    }

    /// Hand the clicked record to the callback. Returns `false` for an index
    /// outside the record set.
    #[allow(dead_code)]
    pub fn click(&self, index: usize) -> bool {
        match self.records.get(index) {
            Some(record) => {
                if let Some(callback) = &self.on_row_click {
                    callback(index, record);
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table::ColumnKind;
    use serde_json::json;
    use std::cell::RefCell;

    fn indices(rows: &[VisibleRow]) -> Vec<usize> {
        rows.iter().map(|r| r.index).collect()
    }

    #[test]
    fn test_visible_range_mid_scroll() {
        let rows = compute_visible_range(5000.0, 400.0, 50.0, 1000, 5);

        assert_eq!(rows.first().unwrap().index, 95);
        assert_eq!(rows.last().unwrap().index, 112);
        assert_eq!(rows.len(), 18);
        assert_eq!(rows[0].offset_top, 4750.0);
        assert!(rows.windows(2).all(|w| w[1].index == w[0].index + 1));
    }

    #[test]
    fn test_visible_range_partial_row_at_bottom() {
        // 5010..5410 touches row 108 at the bottom edge.
        let rows = compute_visible_range(5010.0, 400.0, 50.0, 1000, 0);
        assert_eq!(indices(&rows), (100..=108).collect::<Vec<_>>());
    }

    #[test]
    fn test_visible_range_clamped_at_top() {
        let rows = compute_visible_range(0.0, 400.0, 50.0, 1000, 5);
        assert_eq!(indices(&rows), (0..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_visible_range_clamped_at_bottom() {
        let rows = compute_visible_range(49_800.0, 400.0, 50.0, 1000, 5);
        assert_eq!(rows.first().unwrap().index, 991);
        assert_eq!(rows.last().unwrap().index, 999);
    }

    #[test]
    fn test_visible_range_scrolled_past_end() {
        let rows = compute_visible_range(1_000_000.0, 400.0, 50.0, 20, 2);
        assert_eq!(indices(&rows), vec![17, 18, 19]);
    }

    #[test]
    fn test_visible_range_small_record_set() {
        let rows = compute_visible_range(0.0, 400.0, 50.0, 3, 5);
        assert_eq!(indices(&rows), vec![0, 1, 2]);
    }

    #[test]
    fn test_visible_range_degenerate_inputs() {
        assert!(compute_visible_range(0.0, 400.0, 50.0, 0, 5).is_empty());
        assert!(compute_visible_range(0.0, 400.0, 0.0, 10, 5).is_empty());
        assert!(compute_visible_range(0.0, 400.0, f64::NAN, 10, 5).is_empty());
        assert_eq!(indices(&compute_visible_range(-300.0, 100.0, 50.0, 10, 0)), vec![0, 1]);
        assert_eq!(indices(&compute_visible_range(f64::NAN, 0.0, 50.0, 10, 1)), vec![0, 1]);
    }

    #[test]
    fn test_resolve_nested_path() {
        let record = json!({"a": {"b": 5}});

        assert_eq!(resolve_path(&record, "a.b"), Some(&json!(5)));
        assert_eq!(resolve_path(&record, "a.c"), None);
        assert_eq!(resolve_path(&record, "a.b.c"), None);
        assert_eq!(resolve_path(&record, "a..b"), None);
        assert_eq!(resolve_path(&record, ""), None);
    }

    #[test]
    fn test_resolve_array_segments() {
        let record = json!({"sites": [{"code": "S1"}, {"code": "S2"}]});

        assert_eq!(resolve_path(&record, "sites.1.code"), Some(&json!("S2")));
        assert_eq!(resolve_path(&record, "sites.7.code"), None);
        assert_eq!(resolve_path(&record, "sites.first.code"), None);
    }

    #[test]
    fn test_cell_text_placeholders() {
        let record = json!({"a": {"b": 5}, "name": "", "remark": null, "zero": 0, "ok": true});

        assert_eq!(cell_text(&record, &Column::new("a.b", "B")), "5");
        assert_eq!(cell_text(&record, &Column::new("a.c", "C")), PLACEHOLDER);
        assert_eq!(cell_text(&record, &Column::new("name", "Name")), PLACEHOLDER);
        assert_eq!(cell_text(&record, &Column::new("remark", "Remark")), PLACEHOLDER);
        assert_eq!(cell_text(&record, &Column::new("zero", "Zero")), "0");
        assert_eq!(cell_text(&record, &Column::new("ok", "Ok")), "true");
        assert_eq!(cell_text(&json!("scalar"), &Column::new("a.b", "B")), PLACEHOLDER);
    }

    #[test]
    fn test_cell_text_whole_floats_drop_fraction() {
        let record: Value =
            serde_json::from_str(r#"{"qteEncours": 100.0, "pu": 12.50, "neg": -0.0, "big": 9007199254740993}"#)
                .unwrap();

        assert_eq!(cell_text(&record, &Column::new("qteEncours", "En cours")), "100");
        assert_eq!(cell_text(&record, &Column::new("pu", "PU")), "12.5");
        assert_eq!(cell_text(&record, &Column::new("neg", "Neg")), "0");
        assert_eq!(cell_text(&record, &Column::new("big", "Big")), "9007199254740993");
    }

    #[test]
    fn test_cell_text_strings_unquoted() {
        let record = json!({"site": "CAS-001", "zone": {"name": "Nord"}});

        assert_eq!(cell_text(&record, &Column::new("site", "Site")), "CAS-001");
        assert_eq!(cell_text(&record, &Column::new("zone", "Zone")), r#"{"name":"Nord"}"#);
    }

    #[test]
    fn test_remainder_column() {
        let column = Column::new(REMAINDER_COLUMN, "Reliquat").with_kind(ColumnKind::Qty);

        let record = json!({"prestation": {"qteBc": 100}, "qteEncours": 20, "qteRealise": 30});
        assert_eq!(cell_text(&record, &column), "50.00");

        let record = json!({"prestation": {"qteBc": "12.5"}, "qteEncours": "2", "qteRealise": 0.25});
        assert_eq!(cell_text(&record, &column), "10.25");

        let record = json!({"prestation": {"qteBc": "n/a"}, "qteEncours": 20, "qteRealise": 30});
        assert_eq!(cell_text(&record, &column), PLACEHOLDER);

        let record = json!({"prestation": {"qteBc": 10}, "qteEncours": {"x": 1}, "qteRealise": 0});
        assert_eq!(cell_text(&record, &column), PLACEHOLDER);
    }

    #[test]
    fn test_remainder_treats_missing_quantities_as_zero() {
        let record = json!({"prestation": {"qteBc": 40}, "qteRealise": null});
        assert_eq!(remainder(&record), Some(40.0));
    }

    #[test]
    fn test_render_materializes_only_window() {
        let records: Vec<Value> = (0..1000)
            .map(|i| json!({"numLigne": i, "prestation": {"qteBc": i}, "qteEncours": 1, "qteRealise": 1}))
            .collect();
        let columns = vec![
            Column::new("numLigne", "Ligne"),
            Column::new(REMAINDER_COLUMN, "Reliquat"),
        ];
        let table = VirtualTable::new(&records, &columns);

        let rows = table.render(5000.0);

        assert_eq!(rows.len(), 18);
        assert_eq!(rows[0].index, 95);
        assert_eq!(rows[0].offset_top, 4750.0);
        assert_eq!(rows[0].cells, vec!["95".to_string(), "93.00".to_string()]);
        assert_eq!(table.total_height(), 50_000.0);
    }

    #[test]
    fn test_row_click_receives_record() {
        let records = vec![json!({"id": "a"}), json!({"id": "b"})];
        let columns = vec![Column::new("id", "Id")];
        let clicked = RefCell::new(Vec::new());

        let table = VirtualTable::new(&records, &columns)
            .on_row_click(|index, record| clicked.borrow_mut().push((index, record.clone())));

        assert!(table.click(1));
        assert!(!table.click(5));
        assert_eq!(*clicked.borrow(), vec![(1, json!({"id": "b"}))]);
        assert_eq!(table.render(0.0).len(), 2);
    }
}
