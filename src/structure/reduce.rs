use std::cmp::Ordering;

use super::value::Value;

/// Aggregations supported along one axis.
///
/// Missing values are skipped. Numeric reductions ignore non-numeric cells,
/// so a text column reduces to `NaN` (mean, median) or `0` (sum).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reduction {
    /// Arithmetic mean; `NaN` when nothing is numeric.
    Mean,
    /// Sum of numeric values.
    Sum,
    /// Smallest value; null when empty.
    Min,
    /// Largest value; null when empty.
    Max,
    /// Number of present values.
    Count,
    /// Middle numeric value; `NaN` when nothing is numeric.
    Median,
}

impl Reduction {
    /// Name of the matching method.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::Median => "median",
        }
    }

    /// Reduce `values` to one value.
    pub fn apply<'a>(&self, values: impl IntoIterator<Item = &'a Value>) -> Value {
        let present = values.into_iter().filter(|value| !value.is_null());
        match self {
            Self::Count => Value::Int(present.count() as i64),
            Self::Sum => sum(present),
            Self::Mean => {
                let numbers: Vec<f64> = present.filter_map(Value::as_f64).collect();
                if numbers.is_empty() {
                    Value::Float(f64::NAN)
                } else {
                    Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
                }
            }
            Self::Median => {
                let mut numbers: Vec<f64> = present.filter_map(Value::as_f64).collect();
                if numbers.is_empty() {
                    return Value::Float(f64::NAN);
                }
                numbers.sort_by(f64::total_cmp);
                let mid = numbers.len() / 2;
                if numbers.len() % 2 == 0 {
                    Value::Float((numbers[mid - 1] + numbers[mid]) / 2.0)
                } else {
                    Value::Float(numbers[mid])
                }
            }
            Self::Min => extreme(present, Ordering::Less),
            Self::Max => extreme(present, Ordering::Greater),
        }
    }
}

fn sum<'a>(values: impl Iterator<Item = &'a Value>) -> Value {
    let mut int_total: i64 = 0;
    let mut float_total = 0.0;
    let mut saw_float = false;
    for value in values {
        match value {
            Value::Float(v) => {
                saw_float = true;
                float_total += v;
            }
            other => {
                if let Some(v) = other.as_i64() {
                    match int_total.checked_add(v) {
                        Some(total) => int_total = total,
                        None => {
                            saw_float = true;
                            float_total += v as f64;
                        }
                    }
                }
            }
        }
    }
    if saw_float {
        Value::Float(float_total + int_total as f64)
    } else {
        Value::Int(int_total)
    }
}

fn extreme<'a>(values: impl Iterator<Item = &'a Value>, wanted: Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for value in values {
        best = match best {
            None => Some(value),
            Some(current) => match value.compare(current) {
                Some(ordering) if ordering == wanted => Some(value),
                _ => Some(current),
            },
        };
    }
    best.cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(raw: &[Value]) -> Vec<Value> {
        raw.to_vec()
    }

    #[test]
    fn sum_stays_integral_for_integer_input() {
        let ints = values(&[Value::Int(1), Value::Int(2), Value::Null]);
        assert_eq!(Reduction::Sum.apply(&ints), Value::Int(3));
        let mixed = values(&[Value::Int(1), Value::Float(0.5)]);
        assert_eq!(Reduction::Sum.apply(&mixed), Value::Float(1.5));
        assert_eq!(Reduction::Sum.apply(&[]), Value::Int(0));
    }

    #[test]
    fn mean_and_median_skip_missing_values() {
        let data = values(&[
            Value::Float(1.0),
            Value::Float(f64::NAN),
            Value::Int(3),
            Value::Float(10.0),
        ]);
        assert_eq!(
            Reduction::Mean.apply(&data),
            Value::Float(14.0 / 3.0)
        );
        assert_eq!(Reduction::Median.apply(&data), Value::Float(3.0));
        assert_eq!(Reduction::Count.apply(&data), Value::Int(3));
        assert!(Reduction::Mean.apply(&[]).is_null());
    }

    #[test]
    fn min_and_max_compare_within_a_class() {
        let data = values(&[Value::Int(4), Value::Float(-1.5), Value::Int(9)]);
        assert_eq!(Reduction::Min.apply(&data), Value::Float(-1.5));
        assert_eq!(Reduction::Max.apply(&data), Value::Int(9));
        assert_eq!(Reduction::Max.apply(&[Value::Null]), Value::Null);
    }
}
