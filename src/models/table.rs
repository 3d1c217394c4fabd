use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display hint carried from the column definition to the rendered header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Qty,
    Montant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Dotted path into the record, or the computed `Reliquat` column.
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnKind>,
}

#[allow(dead_code)]
impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// A row index that has to be materialized, with its vertical position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleRow {
    pub index: usize,
    pub offset_top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    pub index: usize,
    pub offset_top: f64,
    pub cells: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableViewRequest {
    #[serde(default)]
    pub records: Vec<Value>,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub scroll_top: f64,
    pub container_height: Option<f64>,
    pub row_height: Option<f64>,
    pub overscan: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub headers: Vec<Column>,
    pub total_height: f64,
    pub rows: Vec<RenderedRow>,
}
