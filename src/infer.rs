use serde_json::{Number, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Committed type hypothesis for one column.
///
/// Every column starts at `Integer` and only ever narrows toward `Str` as
/// non-conforming values are observed: `Integer -> Float -> Str`. The
/// ordering of the variants encodes that direction, so promotion is simply
/// `max`. `Str` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnType {
    Integer,
    Float,
    Str,
}

impl ColumnType {
    /// Folds one raw cell into the hypothesis. Empty cells are nulls and
    /// never force a promotion.
    pub fn observe(&mut self, raw: &str) {
        if *self == ColumnType::Str || raw.is_empty() {
            return;
        }
        let observed = if raw.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if raw.parse::<f64>().is_ok() {
            ColumnType::Float
        } else {
            ColumnType::Str
        };
        if observed > *self {
            let prev = *self;
            debug!(value = raw, ?prev, ?observed, "column type promoted");
            *self = observed;
        }
    }

    /// Classifies one raw cell under the committed state. The caller must
    /// have observed the value (or a batch containing it) first; a parse
    /// failure here is an invariant violation, not a recoverable input
    /// condition.
    pub fn classify(&self, raw: &str) -> Result<ScalarValue> {
        if raw.is_empty() {
            return Ok(ScalarValue::Null);
        }
        match self {
            ColumnType::Integer => {
                raw.parse::<i64>()
                    .map(ScalarValue::Integer)
                    .map_err(|_| Error::MalformedValue {
                        value: raw.to_string(),
                        expected: "integer",
                    })
            }
            ColumnType::Float => {
                raw.parse::<f64>()
                    .map(ScalarValue::Float)
                    .map_err(|_| Error::MalformedValue {
                        value: raw.to_string(),
                        expected: "float",
                    })
            }
            ColumnType::Str => Ok(ScalarValue::Str(raw.to_string())),
        }
    }

    /// Observes the whole batch, then classifies every value under the
    /// resulting state. This is what the column-oriented JSON layout needs:
    /// a promotion on a late row retypes every earlier cell in the column.
    pub fn classify_all(&mut self, values: &[&str]) -> Result<Vec<ScalarValue>> {
        for raw in values {
            self.observe(raw);
        }
        values.iter().map(|raw| self.classify(raw)).collect()
    }
}

/// A classified cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Integer(i64),
    Float(f64),
    Str(String),
    Null,
}

impl From<ScalarValue> for Value {
    fn from(v: ScalarValue) -> Value {
        match v {
            ScalarValue::Integer(n) => Value::Number(n.into()),
            // JSON cannot carry NaN or infinities
            ScalarValue::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            ScalarValue::Str(s) => Value::String(s),
            ScalarValue::Null => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_is_monotonic() {
        let mut ty = ColumnType::Integer;
        ty.observe("42");
        assert_eq!(ty, ColumnType::Integer);
        ty.observe("2.5");
        assert_eq!(ty, ColumnType::Float);
        ty.observe("7");
        assert_eq!(ty, ColumnType::Float);
        ty.observe("hello");
        assert_eq!(ty, ColumnType::Str);
        // terminal: integers no longer narrow it back
        ty.observe("42");
        assert_eq!(ty, ColumnType::Str);
    }

    #[test]
    fn float_never_demotes_to_integer() {
        let mut ty = ColumnType::Float;
        ty.observe("3");
        assert_eq!(ty, ColumnType::Float);
    }

    #[test]
    fn empty_cells_never_promote() {
        let mut ty = ColumnType::Integer;
        ty.observe("");
        assert_eq!(ty, ColumnType::Integer);
        let mut ty = ColumnType::Float;
        ty.observe("");
        assert_eq!(ty, ColumnType::Float);
    }

    #[test]
    fn classify_under_committed_state() -> anyhow::Result<()> {
        assert_eq!(
            ColumnType::Integer.classify("7")?,
            ScalarValue::Integer(7)
        );
        assert_eq!(ColumnType::Float.classify("7")?, ScalarValue::Float(7.0));
        assert_eq!(
            ColumnType::Str.classify("7")?,
            ScalarValue::Str("7".to_string())
        );
        // empty is null under every state
        assert_eq!(ColumnType::Integer.classify("")?, ScalarValue::Null);
        assert_eq!(ColumnType::Str.classify("")?, ScalarValue::Null);
        Ok(())
    }

    #[test]
    fn classify_unobserved_value_is_an_error() {
        let err = ColumnType::Integer.classify("abc").unwrap_err();
        assert!(matches!(err, Error::MalformedValue { .. }));
    }

    #[test]
    fn classify_all_applies_the_final_state() -> anyhow::Result<()> {
        let mut ty = ColumnType::Integer;
        let values = ty.classify_all(&["1", "2.5", ""])?;
        assert_eq!(
            values,
            vec![
                ScalarValue::Float(1.0),
                ScalarValue::Float(2.5),
                ScalarValue::Null
            ]
        );
        assert_eq!(ty, ColumnType::Float);
        Ok(())
    }

    #[test]
    fn non_finite_floats_become_json_null() {
        assert_eq!(Value::from(ScalarValue::Float(f64::NAN)), Value::Null);
        assert_eq!(Value::from(ScalarValue::Float(42.0)), Value::from(42.0));
    }
}
