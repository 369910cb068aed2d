//! Tabular model produced by every normalizer
//!
//! A [`Table`] is an ordered list of [`Row`]s. A row keeps its columns in
//! insertion order so the workbook and the normalized JSON present them the
//! way the collector declared them.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// One table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Bool(bool),
    List(Vec<String>),
    Null,
}

impl Cell {
    /// Text shown in a spreadsheet cell
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Integer(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::List(items) => items.join(", "),
            Cell::Null => String::new(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Cell::Text).unwrap_or(Cell::Null)
    }
}

impl From<Option<&str>> for Cell {
    fn from(value: Option<&str>) -> Self {
        value.map(Cell::from).unwrap_or(Cell::Null)
    }
}

impl From<Option<&Value>> for Cell {
    fn from(value: Option<&Value>) -> Self {
        value.map(Cell::from).unwrap_or(Cell::Null)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<Vec<String>> for Cell {
    fn from(value: Vec<String>) -> Self {
        Cell::List(value)
    }
}

/// Raw JSON values map onto the closest cell kind; objects keep their JSON text
impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => Cell::Text(n.to_string()),
            },
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(items) => Cell::List(
                items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Object(_) => Cell::Text(value.to_string()),
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        Cell::from(&value)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Integer(n) => serializer.serialize_i64(*n),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            },
            Cell::Null => serializer.serialize_unit(),
        }
    }
}

/// One record, columns in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Vec<(&'static str, Cell)>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn cell(mut self, column: &'static str, value: impl Into<Cell>) -> Self {
        self.0.push((column, value.into()));
        self
    }

    /// Prepend a column (used to tag rows with their region)
    pub fn with_leading(mut self, column: &'static str, value: impl Into<Cell>) -> Self {
        self.0.insert(0, (column, value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(c, _)| *c)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.0.iter().map(|(_, v)| v)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, value) in &self.0 {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Ordered rows with a fixed column set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column headers, taken from the first row
    pub fn columns(&self) -> Vec<&'static str> {
        self.rows
            .first()
            .map(|row| row.columns().collect())
            .unwrap_or_default()
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl Extend<Row> for Table {
    fn extend<I: IntoIterator<Item = Row>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

impl IntoIterator for Table {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = Row::new()
            .cell("Zeta", "z")
            .cell("Alpha", 1i64)
            .cell("Mid", Cell::Null);
        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"Zeta":"z","Alpha":1,"Mid":null}"#);
    }

    #[test]
    fn test_table_columns_from_first_row() {
        let table: Table = vec![
            Row::new().cell("A", "1").cell("B", true),
            Row::new().cell("A", "2").cell("B", false),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.columns(), vec!["A", "B"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!([{"A": "1", "B": true}, {"A": "2", "B": false}])
        );
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(Cell::from(&json!(42)), Cell::Integer(42));
        assert_eq!(Cell::from(&json!(null)), Cell::Null);
        assert_eq!(
            Cell::from(&json!(["a", "b"])),
            Cell::List(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(Cell::from(&json!(1.5)).display(), "1.5");
    }

    #[test]
    fn test_leading_column() {
        let row = Row::new().cell("GroupId", "sg-1").with_leading("Region", "us-east-1");
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["Region", "GroupId"]);
    }
}
