use crate::error::{ProcessingError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Utf8,
    Int64,
    Float64,
    Date,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Utf8 => "Utf8",
            ColumnType::Int64 => "Int64",
            ColumnType::Float64 => "Float64",
            ColumnType::Date => "Date",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub column_type: ColumnType,
}

impl Field {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered, named and typed columns of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSchema {
    fields: Vec<Field>,
}

impl TableSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Schema where every column holds text, as produced by delimited readers.
    pub fn utf8<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(
            names
                .iter()
                .map(|n| Field::new(n.as_ref(), ColumnType::Utf8))
                .collect(),
        )
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| ProcessingError::missing_column(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// A single scalar cell.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to `target`, failing on values that have no faithful representation.
    pub fn cast(self, target: ColumnType, column: &str) -> Result<Value> {
        let coercion_error = |value: &Value| ProcessingError::TypeCoercion {
            column: column.to_string(),
            value: value.to_string(),
            target: target.to_string(),
        };

        let converted = match (target, &self) {
            (_, Value::Null) => Some(Value::Null),
            (ColumnType::Utf8, Value::Str(_)) => Some(self.clone()),
            (ColumnType::Utf8, other) => Some(Value::Str(other.to_string())),

            (ColumnType::Int64, Value::Int(_)) => Some(self.clone()),
            (ColumnType::Int64, Value::Float(v)) if v.is_nan() => Some(Value::Null),
            (ColumnType::Int64, Value::Float(v)) => integral(*v).map(Value::Int),
            (ColumnType::Int64, Value::Str(s)) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(v) => Some(Value::Int(v)),
                    Err(_) => s.parse::<f64>().ok().and_then(|v| {
                        if v.is_nan() {
                            Some(Value::Null)
                        } else {
                            integral(v).map(Value::Int)
                        }
                    }),
                }
            }

            (ColumnType::Float64, Value::Float(_)) => Some(self.clone()),
            (ColumnType::Float64, Value::Int(v)) => Some(Value::Float(*v as f64)),
            (ColumnType::Float64, Value::Str(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .map(|v| if v.is_nan() { Value::Null } else { Value::Float(v) }),

            (ColumnType::Date, Value::Date(_)) => Some(self.clone()),
            (ColumnType::Date, Value::Str(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .map(Value::Date),

            _ => None,
        };

        converted.ok_or_else(|| coercion_error(&self))
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

// Floats compare by bit pattern so exact-duplicate detection is total.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Str(s) => s.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

pub type Row = Vec<Value>;

/// Read-only view of one row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    schema: &'a TableSchema,
    values: &'a [Value],
}

impl<'a> RowView<'a> {
    pub fn get(&self, column: &str) -> Result<&'a Value> {
        let idx = self.schema.require(column)?;
        Ok(&self.values[idx])
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn opt_str(&self, column: &str) -> Result<Option<String>> {
        match self.get(column)? {
            Value::Null => Ok(None),
            Value::Str(s) => Ok(Some(s.clone())),
            other => Ok(Some(other.to_string())),
        }
    }

    pub fn str(&self, column: &str) -> Result<String> {
        self.opt_str(column)?
            .ok_or_else(|| null_in_required(column, ColumnType::Utf8))
    }

    pub fn opt_f64(&self, column: &str) -> Result<Option<f64>> {
        match self.get(column)?.clone().cast(ColumnType::Float64, column)? {
            Value::Float(v) => Ok(Some(v)),
            _ => Ok(None),
        }
    }

    pub fn f64(&self, column: &str) -> Result<f64> {
        self.opt_f64(column)?
            .ok_or_else(|| null_in_required(column, ColumnType::Float64))
    }

    pub fn opt_i64(&self, column: &str) -> Result<Option<i64>> {
        match self.get(column)?.clone().cast(ColumnType::Int64, column)? {
            Value::Int(v) => Ok(Some(v)),
            _ => Ok(None),
        }
    }

    pub fn i64(&self, column: &str) -> Result<i64> {
        self.opt_i64(column)?
            .ok_or_else(|| null_in_required(column, ColumnType::Int64))
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate> {
        match self.get(column)?.clone().cast(ColumnType::Date, column)? {
            Value::Date(d) => Ok(d),
            _ => Err(null_in_required(column, ColumnType::Date)),
        }
    }
}

fn null_in_required(column: &str, target: ColumnType) -> ProcessingError {
    ProcessingError::TypeCoercion {
        column: column.to_string(),
        value: "null".to_string(),
        target: format!("non-null {}", target),
    }
}

/// An in-memory tabular dataset: ordered typed columns and rows of scalars.
///
/// All reshaping operations consume the table and return the new one, so a
/// processor reads as a straight chain of cleaning steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: TableSchema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(schema: TableSchema, rows: Vec<Row>) -> Result<Self> {
        let mut table = Self::new(schema);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Row has {} values but schema has {} columns",
                row.len(),
                self.schema.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowView<'_>> {
        self.rows.get(index).map(|values| RowView {
            schema: &self.schema,
            values,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |values| RowView {
            schema: &self.schema,
            values,
        })
    }

    /// Drop rows holding a null in any column.
    pub fn drop_nulls(self) -> Self {
        let Table { schema, rows } = self;
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().all(|v| !v.is_null()))
            .collect();
        Table { schema, rows }
    }

    /// Drop rows holding a null in any of `subset`.
    pub fn drop_nulls_in(self, subset: &[&str]) -> Result<Self> {
        let indices: Vec<usize> = subset
            .iter()
            .map(|c| self.schema.require(c))
            .collect::<Result<_>>()?;

        let Table { schema, rows } = self;
        let rows = rows
            .into_iter()
            .filter(|row| indices.iter().all(|&i| !row[i].is_null()))
            .collect();
        Ok(Table { schema, rows })
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&RowView<'_>) -> bool,
    {
        let Table { schema, rows } = self;
        let rows = rows
            .into_iter()
            .filter(|values| {
                predicate(&RowView {
                    schema: &schema,
                    values,
                })
            })
            .collect();
        Table { schema, rows }
    }

    /// Remove exact-duplicate rows, keeping the first occurrence in place.
    pub fn dedup(self) -> Self {
        let keep: Vec<bool> = {
            let mut seen: HashSet<&Row> = HashSet::with_capacity(self.rows.len());
            self.rows.iter().map(|row| seen.insert(row)).collect()
        };

        let Table { schema, rows } = self;
        let rows = rows
            .into_iter()
            .zip(keep)
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect();
        Table { schema, rows }
    }

    /// Keep only `columns`, in the given order.
    pub fn select(self, columns: &[&str]) -> Result<Self> {
        let indices: Vec<usize> = columns
            .iter()
            .map(|c| self.schema.require(c))
            .collect::<Result<_>>()?;
        Ok(self.take_columns(&indices))
    }

    pub fn drop_columns(self, columns: &[&str]) -> Result<Self> {
        for column in columns {
            self.schema.require(column)?;
        }
        let indices: Vec<usize> = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !columns.contains(&f.name.as_str()))
            .map(|(i, _)| i)
            .collect();
        Ok(self.take_columns(&indices))
    }

    fn take_columns(self, indices: &[usize]) -> Self {
        let fields = indices
            .iter()
            .map(|&i| self.schema.fields()[i].clone())
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                indices
                    .iter()
                    .map(|&i| std::mem::replace(&mut row[i], Value::Null))
                    .collect()
            })
            .collect();
        Table {
            schema: TableSchema::new(fields),
            rows,
        }
    }

    pub fn rename(mut self, mapping: &[(&str, &str)]) -> Result<Self> {
        for (from, to) in mapping {
            let idx = self.schema.require(from)?;
            self.schema.fields[idx].name = to.to_string();
        }
        Ok(self)
    }

    /// Coerce every value of `column` to `target`; the first failure is fatal.
    pub fn cast(mut self, column: &str, target: ColumnType) -> Result<Self> {
        let idx = self.schema.require(column)?;
        for row in &mut self.rows {
            let value = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = value.cast(target, column)?;
        }
        self.schema.fields[idx].column_type = target;
        Ok(self)
    }

    /// Append a column computed from each row.
    pub fn with_column<F>(mut self, field: Field, derive: F) -> Result<Self>
    where
        F: Fn(&RowView<'_>) -> Result<Value>,
    {
        if self.schema.contains(&field.name) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Column '{}' already exists",
                field.name
            )));
        }
        let mut derived = Vec::with_capacity(self.rows.len());
        for values in &self.rows {
            derived.push(derive(&RowView {
                schema: &self.schema,
                values,
            })?);
        }
        for (row, value) in self.rows.iter_mut().zip(derived) {
            row.push(value);
        }
        self.schema.fields.push(field);
        Ok(self)
    }

    /// Project onto `canonical`, returning the names of the columns that were dropped.
    ///
    /// Every canonical column must exist with the same type; otherwise the
    /// offending names are reported in a [`ProcessingError::SchemaMismatch`].
    pub fn project_to(self, canonical: &TableSchema, source_name: &str) -> Result<(Self, Vec<String>)> {
        let mut missing = Vec::new();
        let mut conflicting = Vec::new();
        for field in canonical.fields() {
            match self.schema.field(&field.name) {
                None => missing.push(field.name.clone()),
                Some(found) if found.column_type != field.column_type => conflicting.push(format!(
                    "{} ({} != {})",
                    field.name, found.column_type, field.column_type
                )),
                Some(_) => {}
            }
        }
        if !missing.is_empty() || !conflicting.is_empty() {
            return Err(ProcessingError::SchemaMismatch {
                source_name: source_name.to_string(),
                missing,
                conflicting,
            });
        }

        let extra: Vec<String> = self
            .schema
            .fields()
            .iter()
            .filter(|f| !canonical.contains(&f.name))
            .map(|f| f.name.clone())
            .collect();

        let names = canonical.names();
        let projected = self.select(&names)?;
        Ok((projected, extra))
    }

    /// Row-wise union with a table of the identical schema.
    pub fn append(&mut self, other: Table) -> Result<()> {
        if self.schema != other.schema {
            return Err(ProcessingError::SchemaMismatch {
                source_name: "union".to_string(),
                missing: self
                    .schema
                    .names()
                    .into_iter()
                    .filter(|n| !other.schema.contains(n))
                    .map(String::from)
                    .collect(),
                conflicting: Vec::new(),
            });
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn distinct_count(&self, column: &str) -> Result<usize> {
        let idx = self.schema.require(column)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect::<HashSet<_>>().len())
    }

    pub fn null_count(&self, column: &str) -> Result<usize> {
        let idx = self.schema.require(column)?;
        Ok(self.rows.iter().filter(|r| r[idx].is_null()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        let schema = TableSchema::new(vec![
            Field::new("city", ColumnType::Utf8),
            Field::new("count", ColumnType::Utf8),
        ]);
        Table::from_rows(
            schema,
            vec![
                vec!["Boston".into(), "10".into()],
                vec!["Austin".into(), Value::Null],
                vec!["Boston".into(), "10".into()],
                vec![Value::Null, "7".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_drop_nulls_subset_and_all() -> Result<()> {
        let only_city = sample().drop_nulls_in(&["city"])?;
        assert_eq!(only_city.num_rows(), 3);

        let all = sample().drop_nulls();
        assert_eq!(all.num_rows(), 2);
        Ok(())
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let table = sample().dedup();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.rows()[0][0], Value::from("Boston"));
        assert_eq!(table.rows()[1][0], Value::from("Austin"));
        assert!(table.rows()[2][0].is_null());
    }

    #[test]
    fn test_float_dedup_is_exact() {
        let schema = TableSchema::new(vec![Field::new("x", ColumnType::Float64)]);
        let table = Table::from_rows(
            schema,
            vec![vec![0.1.into()], vec![(0.3 - 0.2).into()], vec![0.1.into()]],
        )
        .unwrap()
        .dedup();
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn test_cast_integral_text_and_failure() -> Result<()> {
        let table = sample().drop_nulls().cast("count", ColumnType::Int64)?;
        assert_eq!(table.rows()[0][1], Value::Int(10));
        assert_eq!(table.schema().field("count").unwrap().column_type, ColumnType::Int64);

        let err = sample().cast("city", ColumnType::Int64).unwrap_err();
        assert!(matches!(err, ProcessingError::TypeCoercion { .. }));

        assert_eq!(
            Value::from("1204.0").cast(ColumnType::Int64, "n")?,
            Value::Int(1204)
        );
        assert!(Value::from("12.5").cast(ColumnType::Int64, "n").is_err());
        Ok(())
    }

    #[test]
    fn test_nan_text_casts_to_null() -> Result<()> {
        assert_eq!(Value::from("NaN").cast(ColumnType::Float64, "x")?, Value::Null);
        assert_eq!(Value::from("NaN").cast(ColumnType::Int64, "n")?, Value::Null);
        assert_eq!(Value::Float(f64::NAN).cast(ColumnType::Int64, "n")?, Value::Null);
        Ok(())
    }

    #[test]
    fn test_select_rename_drop() -> Result<()> {
        let table = sample()
            .rename(&[("city", "name")])?
            .select(&["count", "name"])?;
        assert_eq!(table.schema().names(), vec!["count", "name"]);

        let dropped = table.drop_columns(&["count"])?;
        assert_eq!(dropped.schema().names(), vec!["name"]);

        assert!(matches!(
            sample().rename(&[("nope", "x")]),
            Err(ProcessingError::MissingColumn { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_project_to_reports_extra_and_missing() -> Result<()> {
        let canonical = TableSchema::utf8(&["count"]);
        let (projected, extra) = sample().project_to(&canonical, "feb")?;
        assert_eq!(projected.schema().names(), vec!["count"]);
        assert_eq!(extra, vec!["city".to_string()]);

        let wider = TableSchema::utf8(&["count", "state"]);
        match sample().project_to(&wider, "feb") {
            Err(ProcessingError::SchemaMismatch { missing, .. }) => {
                assert_eq!(missing, vec!["state".to_string()])
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_project_to_rejects_type_conflict() {
        let canonical = TableSchema::new(vec![Field::new("count", ColumnType::Float64)]);
        assert!(matches!(
            sample().project_to(&canonical, "mar"),
            Err(ProcessingError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_with_column_and_distinct_count() -> Result<()> {
        let table = sample()
            .drop_nulls()
            .with_column(Field::new("flag", ColumnType::Int64), |_| Ok(Value::Int(1)))?;
        assert_eq!(table.schema().len(), 3);
        assert_eq!(table.distinct_count("city")?, 1);
        assert_eq!(sample().null_count("count")?, 1);
        Ok(())
    }
}
