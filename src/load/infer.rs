// src/load/infer.rs

use rusqlite::types::Value;
use tracing::debug;

/// Cell spellings that load as NULL, in any column.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_VALUES: &[&str] = &["True", "TRUE", "true"];
const FALSE_VALUES: &[&str] = &["False", "FALSE", "false"];

/// Storage class picked for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Boolean,
    Text,
}

impl ColumnType {
    /// Declared type used in `CREATE TABLE`.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// `str::parse::<f64>` also takes `NAN`, `Nan` and friends; only the exact
/// spellings in [`MISSING_MARKERS`] mean missing, everything else is text.
fn parse_float(v: &str) -> Option<f64> {
    v.parse::<f64>().ok().filter(|f| !f.is_nan())
}

/// Pick a type for one column by looking at every cell:
///  - all cells missing ⇒ Real
///  - all present cells are integers ⇒ Integer, widened to Real if any cell is missing
///  - all present cells are numbers ⇒ Real
///  - all present cells are true/false literals ⇒ Boolean
///  - anything else ⇒ Text
pub fn infer_column_type<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut saw_missing = false;
    let mut saw_value = false;
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;

    for cell in cells {
        let Some(raw) = cell else {
            saw_missing = true;
            continue;
        };
        saw_value = true;
        let v = raw.trim();

        if all_int && v.parse::<i64>().is_err() {
            all_int = false;
        }
        if all_float && parse_float(v).is_none() {
            all_float = false;
        }
        if all_bool && !TRUE_VALUES.contains(&v) && !FALSE_VALUES.contains(&v) {
            all_bool = false;
        }
        if !all_int && !all_float && !all_bool {
            return ColumnType::Text;
        }
    }

    match (saw_value, all_int, all_float, all_bool) {
        (false, _, _, _) => ColumnType::Real,
        (true, true, _, _) if saw_missing => ColumnType::Real,
        (true, true, _, _) => ColumnType::Integer,
        (true, false, true, _) => ColumnType::Real,
        (true, false, false, true) => ColumnType::Boolean,
        _ => ColumnType::Text,
    }
}

/// Convert a cell into the value stored for a column of type `ty`.
///
/// `ty` must come from [`infer_column_type`] over the same column; a cell
/// that no longer fits is kept as text rather than dropped.
pub fn convert_cell(cell: Option<&str>, ty: ColumnType) -> Value {
    let Some(raw) = cell else {
        return Value::Null;
    };
    let v = raw.trim();

    match ty {
        ColumnType::Integer => v
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(raw.to_string())),
        ColumnType::Real => parse_float(v)
            .map(Value::Real)
            .unwrap_or_else(|| Value::Text(raw.to_string())),
        ColumnType::Boolean => {
            if TRUE_VALUES.contains(&v) {
                Value::Integer(1)
            } else if FALSE_VALUES.contains(&v) {
                Value::Integer(0)
            } else {
                Value::Text(raw.to_string())
            }
        }
        ColumnType::Text => Value::Text(raw.to_string()),
    }
}

/// Infer every column of `rows` (row-major, already padded to `width`).
pub fn infer_types(table_name: &str, headers: &[String], rows: &[Vec<Option<String>>]) -> Vec<ColumnType> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let ty = infer_column_type(rows.iter().map(|r| r[idx].as_deref()));
            debug!("infer_types: `{}`.`{}` → {:?}", table_name, name, ty);
            ty
        })
        .collect()
}
