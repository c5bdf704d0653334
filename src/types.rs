//! Conversions between Arrow result chunks and DuckDB values.
//!
//! DuckDB hands query results back as Arrow arrays; rows exposed by the
//! facade carry `duckdb::types::Value`. Staging goes the other direction and
//! needs a DuckDB column type for each caller-supplied value.

use std::any::type_name;

use arrow_array::{
    Array, ArrayRef, BinaryArray, BinaryViewArray, BooleanArray, Date32Array, Date64Array,
    Decimal128Array, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, Int8Array,
    IntervalDayTimeArray, IntervalMonthDayNanoArray, IntervalYearMonthArray, LargeBinaryArray,
    LargeListArray, LargeStringArray, ListArray, StringArray, StringViewArray,
    Time32MillisecondArray, Time32SecondArray, Time64MicrosecondArray, Time64NanosecondArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_schema::{DataType, IntervalUnit, TimeUnit};
use duckdb::types::{TimeUnit as DuckTimeUnit, Value};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{FacadeError, Result};

/// Convert an Arrow array into one DuckDB value per slot.
pub fn arrow_array_to_values(array: &ArrayRef) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(array.len());

    macro_rules! push_values {
        ($array:expr, $values:expr, $arr_type:ty, $variant:path) => {{
            let arr = downcast_array::<$arr_type>($array)?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    $values.push(Value::Null);
                } else {
                    $values.push($variant(arr.value(idx)));
                }
            }
        }};
        ($array:expr, $values:expr, $arr_type:ty, $variant:path, $conv:ident) => {{
            let arr = downcast_array::<$arr_type>($array)?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    $values.push(Value::Null);
                } else {
                    $values.push($variant(arr.value(idx).$conv()));
                }
            }
        }};
    }
    macro_rules! push_unit_values {
        ($array:expr, $values:expr, $arr_type:ty, $variant:path, $duck_unit:expr) => {{
            let arr = downcast_array::<$arr_type>($array)?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    $values.push(Value::Null);
                } else {
                    $values.push($variant($duck_unit, i64::from(arr.value(idx))));
                }
            }
        }};
    }
    macro_rules! push_list_values {
        ($array:expr, $values:expr, $arr_type:ty) => {{
            let arr = downcast_array::<$arr_type>($array)?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    $values.push(Value::Null);
                } else {
                    $values.push(Value::List(arrow_array_to_values(&arr.value(idx))?));
                }
            }
        }};
    }

    match array.data_type() {
        DataType::Null => values.resize(array.len(), Value::Null),
        DataType::Boolean => push_values!(array, values, BooleanArray, Value::Boolean),
        DataType::Int8 => push_values!(array, values, Int8Array, Value::TinyInt),
        DataType::Int16 => push_values!(array, values, Int16Array, Value::SmallInt),
        DataType::Int32 => push_values!(array, values, Int32Array, Value::Int),
        DataType::Int64 => push_values!(array, values, Int64Array, Value::BigInt),
        DataType::UInt8 => push_values!(array, values, UInt8Array, Value::UTinyInt),
        DataType::UInt16 => push_values!(array, values, UInt16Array, Value::USmallInt),
        DataType::UInt32 => push_values!(array, values, UInt32Array, Value::UInt),
        DataType::UInt64 => push_values!(array, values, UInt64Array, Value::UBigInt),
        DataType::Float32 => push_values!(array, values, Float32Array, Value::Float),
        DataType::Float64 => push_values!(array, values, Float64Array, Value::Double),
        DataType::Utf8 => push_values!(array, values, StringArray, Value::Text, to_string),
        DataType::LargeUtf8 => {
            push_values!(array, values, LargeStringArray, Value::Text, to_string)
        }
        DataType::Utf8View => {
            push_values!(array, values, StringViewArray, Value::Text, to_string)
        }
        DataType::Binary => push_values!(array, values, BinaryArray, Value::Blob, to_vec),
        DataType::LargeBinary => {
            push_values!(array, values, LargeBinaryArray, Value::Blob, to_vec)
        }
        DataType::BinaryView => {
            push_values!(array, values, BinaryViewArray, Value::Blob, to_vec)
        }
        DataType::Date32 => push_values!(array, values, Date32Array, Value::Date32),
        DataType::Date64 => {
            let arr = downcast_array::<Date64Array>(array)?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    values.push(Value::Null);
                } else {
                    values.push(Value::Date32((arr.value(idx) / 86_400_000) as i32));
                }
            }
        }
        DataType::Time32(TimeUnit::Second) => push_unit_values!(
            array,
            values,
            Time32SecondArray,
            Value::Time64,
            DuckTimeUnit::Second
        ),
        DataType::Time32(TimeUnit::Millisecond) => push_unit_values!(
            array,
            values,
            Time32MillisecondArray,
            Value::Time64,
            DuckTimeUnit::Millisecond
        ),
        DataType::Time64(TimeUnit::Microsecond) => push_unit_values!(
            array,
            values,
            Time64MicrosecondArray,
            Value::Time64,
            DuckTimeUnit::Microsecond
        ),
        DataType::Time64(TimeUnit::Nanosecond) => push_unit_values!(
            array,
            values,
            Time64NanosecondArray,
            Value::Time64,
            DuckTimeUnit::Nanosecond
        ),
        DataType::Timestamp(TimeUnit::Second, _) => push_unit_values!(
            array,
            values,
            TimestampSecondArray,
            Value::Timestamp,
            DuckTimeUnit::Second
        ),
        DataType::Timestamp(TimeUnit::Millisecond, _) => push_unit_values!(
            array,
            values,
            TimestampMillisecondArray,
            Value::Timestamp,
            DuckTimeUnit::Millisecond
        ),
        DataType::Timestamp(TimeUnit::Microsecond, _) => push_unit_values!(
            array,
            values,
            TimestampMicrosecondArray,
            Value::Timestamp,
            DuckTimeUnit::Microsecond
        ),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => push_unit_values!(
            array,
            values,
            TimestampNanosecondArray,
            Value::Timestamp,
            DuckTimeUnit::Nanosecond
        ),
        DataType::Interval(IntervalUnit::YearMonth) => {
            let arr = downcast_array::<IntervalYearMonthArray>(array)?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    values.push(Value::Null);
                } else {
                    values.push(Value::Interval {
                        months: arr.value(idx),
                        days: 0,
                        nanos: 0,
                    });
                }
            }
        }
        DataType::Interval(IntervalUnit::DayTime) => {
            let arr = downcast_array::<IntervalDayTimeArray>(array)?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    values.push(Value::Null);
                } else {
                    let dt = arr.value(idx);
                    values.push(Value::Interval {
                        months: 0,
                        days: dt.days,
                        nanos: i64::from(dt.milliseconds) * 1_000_000,
                    });
                }
            }
        }
        DataType::Interval(IntervalUnit::MonthDayNano) => {
            let arr = downcast_array::<IntervalMonthDayNanoArray>(array)?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    values.push(Value::Null);
                } else {
                    let mdn = arr.value(idx);
                    values.push(Value::Interval {
                        months: mdn.months,
                        days: mdn.days,
                        nanos: mdn.nanoseconds,
                    });
                }
            }
        }
        // Scale 0 is how DuckDB exports HUGEINT.
        DataType::Decimal128(_, scale) => {
            let arr = downcast_array::<Decimal128Array>(array)?;
            let formatter = ArrayFormatter::try_new(&**array, &FormatOptions::default())?;
            for idx in 0..arr.len() {
                if arr.is_null(idx) {
                    values.push(Value::Null);
                } else if *scale == 0 {
                    values.push(Value::HugeInt(arr.value(idx)));
                } else {
                    let decimal = u32::try_from(*scale).ok().and_then(|scale| {
                        Decimal::try_from_i128_with_scale(arr.value(idx), scale).ok()
                    });
                    values.push(match decimal {
                        Some(decimal) => Value::Decimal(decimal),
                        None => Value::Text(formatter.value(idx).to_string()),
                    });
                }
            }
        }
        DataType::List(_) => push_list_values!(array, values, ListArray),
        DataType::LargeList(_) => push_list_values!(array, values, LargeListArray),
        _ => {
            let formatter = ArrayFormatter::try_new(&**array, &FormatOptions::default())?;
            for idx in 0..array.len() {
                if array.is_null(idx) {
                    values.push(Value::Null);
                } else {
                    values.push(Value::Text(formatter.value(idx).to_string()));
                }
            }
        }
    }

    Ok(values)
}

/// Column type of a staged dataset column.
///
/// A column's type is the widening of the types of all its non-NULL values.
/// Values are converted to that type before binding, so the engine never
/// narrows them on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StageType {
    Boolean,
    /// 8 to 64 bits signed or unsigned, or 128 bits signed.
    Integer { signed: bool, bits: u8 },
    Float,
    Double,
    Decimal { scale: u32 },
    Varchar,
    Blob,
    Date,
    Time,
    Timestamp,
    Interval,
}

impl StageType {
    /// Type of a single value. `Ok(None)` for NULL.
    pub(crate) fn of(value: &Value) -> Result<Option<Self>> {
        let stage_type = match value {
            Value::Null => return Ok(None),
            Value::Boolean(_) => StageType::Boolean,
            Value::TinyInt(_) => StageType::Integer { signed: true, bits: 8 },
            Value::SmallInt(_) => StageType::Integer { signed: true, bits: 16 },
            Value::Int(_) => StageType::Integer { signed: true, bits: 32 },
            Value::BigInt(_) => StageType::Integer { signed: true, bits: 64 },
            Value::HugeInt(_) => StageType::Integer { signed: true, bits: 128 },
            Value::UTinyInt(_) => StageType::Integer { signed: false, bits: 8 },
            Value::USmallInt(_) => StageType::Integer { signed: false, bits: 16 },
            Value::UInt(_) => StageType::Integer { signed: false, bits: 32 },
            Value::UBigInt(_) => StageType::Integer { signed: false, bits: 64 },
            Value::Float(_) => StageType::Float,
            Value::Double(_) => StageType::Double,
            Value::Decimal(d) => StageType::Decimal { scale: d.scale() },
            Value::Text(_) | Value::Enum(_) => StageType::Varchar,
            Value::Blob(_) => StageType::Blob,
            Value::Date32(_) => StageType::Date,
            Value::Time64(..) => StageType::Time,
            Value::Timestamp(..) => StageType::Timestamp,
            Value::Interval { .. } => StageType::Interval,
            other => {
                return Err(FacadeError::Validation(format!(
                    "structured value {other:?} cannot be staged as a table column"
                )))
            }
        };
        Ok(Some(stage_type))
    }

    /// Smallest type holding values of both `self` and `other`.
    ///
    /// Integers widen to a wider integer, mixed integers and floats become
    /// DOUBLE, and decimals keep the larger scale. Anything else becomes VARCHAR.
    pub(crate) fn widen(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (
                Self::Integer { signed: s1, bits: b1 },
                Self::Integer { signed: s2, bits: b2 },
            ) => {
                if s1 == s2 {
                    Self::Integer { signed: s1, bits: b1.max(b2) }
                } else {
                    let (signed_bits, unsigned_bits) = if s1 { (b1, b2) } else { (b2, b1) };
                    Self::Integer {
                        signed: true,
                        bits: signed_bits.max(unsigned_bits.saturating_mul(2)).min(128),
                    }
                }
            }
            (Self::Decimal { scale: a }, Self::Decimal { scale: b }) => {
                Self::Decimal { scale: a.max(b) }
            }
            (Self::Decimal { scale }, Self::Integer { signed, bits })
            | (Self::Integer { signed, bits }, Self::Decimal { scale })
                if fits_i64(signed, bits) =>
            {
                Self::Decimal { scale }
            }
            (a, b) if a.is_numeric() && b.is_numeric() => Self::Double,
            _ => Self::Varchar,
        }
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Integer { .. } | Self::Decimal { .. } | Self::Float | Self::Double
        )
    }

    pub(crate) fn sql_type(self) -> String {
        match self {
            StageType::Boolean => "BOOLEAN".to_string(),
            StageType::Integer { signed: true, bits: 8 } => "TINYINT".to_string(),
            StageType::Integer { signed: true, bits: 16 } => "SMALLINT".to_string(),
            StageType::Integer { signed: true, bits: 32 } => "INTEGER".to_string(),
            StageType::Integer { signed: true, bits: 64 } => "BIGINT".to_string(),
            StageType::Integer { signed: false, bits: 8 } => "UTINYINT".to_string(),
            StageType::Integer { signed: false, bits: 16 } => "USMALLINT".to_string(),
            StageType::Integer { signed: false, bits: 32 } => "UINTEGER".to_string(),
            StageType::Integer { signed: false, bits: 64 } => "UBIGINT".to_string(),
            // 128-bit integers go through DECIMAL so Parquet keeps them exact.
            StageType::Integer { .. } => "DECIMAL(38, 0)".to_string(),
            StageType::Float => "FLOAT".to_string(),
            StageType::Double => "DOUBLE".to_string(),
            StageType::Decimal { scale } => format!("DECIMAL(38, {scale})"),
            StageType::Varchar => "VARCHAR".to_string(),
            StageType::Blob => "BLOB".to_string(),
            StageType::Date => "DATE".to_string(),
            StageType::Time => "TIME".to_string(),
            StageType::Timestamp => "TIMESTAMP".to_string(),
            StageType::Interval => "INTERVAL".to_string(),
        }
    }

    /// Insert expression for one value of this type, with a single `?`.
    ///
    /// Decimals, dates and times have no native parameter binding, so they
    /// are bound as text or integers and rebuilt here exactly.
    pub(crate) fn placeholder(self) -> String {
        match self {
            StageType::Integer { bits: 128, .. } | StageType::Decimal { .. } => {
                format!("CAST(? AS {})", self.sql_type())
            }
            StageType::Date => "CAST('1970-01-01' AS DATE) + CAST(? AS INTEGER)".to_string(),
            StageType::Time => {
                "CAST('00:00:00' AS TIME) + to_microseconds(CAST(? AS BIGINT))".to_string()
            }
            _ => "?".to_string(),
        }
    }

    /// Convert `value` into what [`placeholder`](Self::placeholder) binds.
    pub(crate) fn bind_value(self, value: &Value) -> Result<Value> {
        if matches!(value, Value::Null) {
            return Ok(Value::Null);
        }
        let mismatch = || {
            FacadeError::Validation(format!(
                "value {value:?} cannot be stored in a {} column",
                self.sql_type()
            ))
        };
        let bound = match (self, value) {
            (StageType::Boolean, Value::Boolean(b)) => Value::Boolean(*b),
            (StageType::Integer { signed, bits }, _) => {
                let v = integer_value(value).ok_or_else(mismatch)?;
                integer_of_width(v, signed, bits).ok_or_else(mismatch)?
            }
            (StageType::Float, Value::Float(f)) => Value::Float(*f),
            (StageType::Double, Value::Float(f)) => Value::Double(f64::from(*f)),
            (StageType::Double, Value::Double(d)) => Value::Double(*d),
            (StageType::Double, Value::Decimal(d)) => {
                Value::Double(d.to_f64().ok_or_else(mismatch)?)
            }
            (StageType::Double, _) => {
                Value::Double(integer_value(value).ok_or_else(mismatch)? as f64)
            }
            (StageType::Decimal { .. }, Value::Decimal(d)) => Value::Text(d.to_string()),
            (StageType::Decimal { .. }, _) => {
                Value::Text(integer_value(value).ok_or_else(mismatch)?.to_string())
            }
            (StageType::Varchar, _) => Value::Text(scalar_text(value).ok_or_else(mismatch)?),
            (StageType::Blob, Value::Blob(b)) => Value::Blob(b.clone()),
            (StageType::Date, Value::Date32(days)) => Value::Int(*days),
            (StageType::Time, Value::Time64(unit, v)) => Value::BigInt(unit.to_micros(*v)),
            (StageType::Timestamp, Value::Timestamp(unit, v)) => Value::Timestamp(*unit, *v),
            (StageType::Interval, Value::Interval { months, days, nanos }) => Value::Interval {
                months: *months,
                days: *days,
                nanos: *nanos,
            },
            _ => return Err(mismatch()),
        };
        Ok(bound)
    }
}

fn fits_i64(signed: bool, bits: u8) -> bool {
    if signed {
        bits <= 64
    } else {
        bits <= 32
    }
}

fn integer_value(value: &Value) -> Option<i128> {
    match value {
        Value::TinyInt(v) => Some(i128::from(*v)),
        Value::SmallInt(v) => Some(i128::from(*v)),
        Value::Int(v) => Some(i128::from(*v)),
        Value::BigInt(v) => Some(i128::from(*v)),
        Value::HugeInt(v) => Some(*v),
        Value::UTinyInt(v) => Some(i128::from(*v)),
        Value::USmallInt(v) => Some(i128::from(*v)),
        Value::UInt(v) => Some(i128::from(*v)),
        Value::UBigInt(v) => Some(i128::from(*v)),
        _ => None,
    }
}

fn integer_of_width(v: i128, signed: bool, bits: u8) -> Option<Value> {
    match (signed, bits) {
        (true, 8) => i8::try_from(v).ok().map(Value::TinyInt),
        (true, 16) => i16::try_from(v).ok().map(Value::SmallInt),
        (true, 32) => i32::try_from(v).ok().map(Value::Int),
        (true, 64) => i64::try_from(v).ok().map(Value::BigInt),
        (true, _) => Some(Value::HugeInt(v)),
        (false, 8) => u8::try_from(v).ok().map(Value::UTinyInt),
        (false, 16) => u16::try_from(v).ok().map(Value::USmallInt),
        (false, 32) => u32::try_from(v).ok().map(Value::UInt),
        (false, _) => u64::try_from(v).ok().map(Value::UBigInt),
    }
}

/// Text form of a scalar value placed in a VARCHAR column.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) | Value::Enum(s) => Some(s.clone()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(d) => Some(d.to_string()),
        Value::Decimal(d) => Some(d.to_string()),
        other => integer_value(other).map(|v| v.to_string()),
    }
}

fn downcast_array<T: 'static>(array: &ArrayRef) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        FacadeError::Execution(format!(
            "expected {} but found {}",
            type_name::<T>(),
            array.data_type()
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::types::Int32Type;
    use arrow_array::StructArray;
    use arrow_schema::Field;

    use super::*;

    #[test]
    fn primitive_arrays_keep_nulls_in_place() {
        let array: ArrayRef = Arc::new(Int64Array::from(vec![Some(7), None, Some(-1)]));
        let values = arrow_array_to_values(&array).unwrap();
        assert_eq!(
            values,
            vec![Value::BigInt(7), Value::Null, Value::BigInt(-1)]
        );
    }

    #[test]
    fn strings_and_dates_map_to_text_and_date_values() {
        let strings: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), None]));
        assert_eq!(
            arrow_array_to_values(&strings).unwrap(),
            vec![Value::Text("a".to_string()), Value::Null]
        );

        let dates: ArrayRef = Arc::new(Date32Array::from(vec![19_000]));
        assert_eq!(
            arrow_array_to_values(&dates).unwrap(),
            vec![Value::Date32(19_000)]
        );
    }

    #[test]
    fn decimals_keep_their_scale_and_hugeints_their_precision() {
        let decimals: ArrayRef = Arc::new(
            Decimal128Array::from(vec![Some(1250), None])
                .with_precision_and_scale(10, 2)
                .unwrap(),
        );
        assert_eq!(
            arrow_array_to_values(&decimals).unwrap(),
            vec![Value::Decimal(Decimal::new(1250, 2)), Value::Null]
        );

        let big = 170_141_183_460_469_231_731_687_303_715_884_105_i128;
        let hugeints: ArrayRef = Arc::new(
            Decimal128Array::from(vec![big])
                .with_precision_and_scale(38, 0)
                .unwrap(),
        );
        assert_eq!(
            arrow_array_to_values(&hugeints).unwrap(),
            vec![Value::HugeInt(big)]
        );
    }

    #[test]
    fn lists_convert_recursively() {
        let array: ArrayRef = Arc::new(ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
            Some(vec![Some(1), Some(2)]),
            None,
        ]));
        assert_eq!(
            arrow_array_to_values(&array).unwrap(),
            vec![
                Value::List(vec![Value::Int(1), Value::Int(2)]),
                Value::Null
            ]
        );
    }

    #[test]
    fn unmapped_types_fall_back_to_display_text() {
        let ids: ArrayRef = Arc::new(Int32Array::from(vec![3]));
        let array: ArrayRef = Arc::new(StructArray::from(vec![(
            Arc::new(Field::new("id", DataType::Int32, false)),
            ids,
        )]));
        let values = arrow_array_to_values(&array).unwrap();
        assert!(matches!(&values[0], Value::Text(text) if text.contains('3')));
    }

    fn stage(value: Value) -> StageType {
        StageType::of(&value).unwrap().unwrap()
    }

    #[test]
    fn staging_types_follow_value_variants() {
        assert_eq!(stage(Value::Int(1)).sql_type(), "INTEGER");
        assert_eq!(stage(Value::Text("x".into())).sql_type(), "VARCHAR");
        assert_eq!(stage(Value::HugeInt(1)).sql_type(), "DECIMAL(38, 0)");
        assert_eq!(StageType::of(&Value::Null).unwrap(), None);
        assert!(matches!(
            StageType::of(&Value::List(vec![Value::Int(1)])),
            Err(FacadeError::Validation(_))
        ));
    }

    #[test]
    fn mixed_numeric_columns_widen_without_narrowing() {
        let int = stage(Value::Int(1));
        assert_eq!(int.widen(stage(Value::BigInt(2))).sql_type(), "BIGINT");
        assert_eq!(int.widen(stage(Value::Double(2.5))), StageType::Double);
        assert_eq!(
            stage(Value::UInt(1)).widen(stage(Value::TinyInt(-1))).sql_type(),
            "BIGINT"
        );
        assert_eq!(
            stage(Value::UBigInt(1)).widen(int).sql_type(),
            "DECIMAL(38, 0)"
        );
        assert_eq!(
            stage(Value::Decimal(Decimal::new(15, 1)))
                .widen(stage(Value::Decimal(Decimal::new(125, 2))))
                .sql_type(),
            "DECIMAL(38, 2)"
        );
        assert_eq!(int.widen(stage(Value::Text("abc".into()))), StageType::Varchar);
        assert_eq!(
            stage(Value::Boolean(true)).widen(stage(Value::Date32(1))),
            StageType::Varchar
        );
    }

    #[test]
    fn bound_values_match_the_column_type() {
        assert_eq!(
            StageType::Double.bind_value(&Value::Int(1)).unwrap(),
            Value::Double(1.0)
        );
        assert_eq!(
            stage(Value::BigInt(0)).bind_value(&Value::UTinyInt(7)).unwrap(),
            Value::BigInt(7)
        );
        assert_eq!(
            StageType::Varchar.bind_value(&Value::Int(42)).unwrap(),
            Value::Text("42".to_string())
        );
        assert_eq!(
            StageType::Decimal { scale: 2 }
                .bind_value(&Value::Decimal(Decimal::new(1250, 2)))
                .unwrap(),
            Value::Text("12.50".to_string())
        );
        assert_eq!(
            StageType::Date.bind_value(&Value::Date32(19_000)).unwrap(),
            Value::Int(19_000)
        );
        assert_eq!(
            StageType::Time
                .bind_value(&Value::Time64(DuckTimeUnit::Millisecond, 1_500))
                .unwrap(),
            Value::BigInt(1_500_000)
        );
        assert_eq!(StageType::Date.bind_value(&Value::Null).unwrap(), Value::Null);
        assert!(matches!(
            StageType::Varchar.bind_value(&Value::Date32(1)),
            Err(FacadeError::Validation(_))
        ));
    }

    #[test]
    fn placeholders_rebuild_types_without_native_binding() {
        assert_eq!(StageType::Double.placeholder(), "?");
        assert_eq!(
            StageType::Decimal { scale: 3 }.placeholder(),
            "CAST(? AS DECIMAL(38, 3))"
        );
        assert!(StageType::Date.placeholder().contains("CAST(? AS INTEGER)"));
    }
}
