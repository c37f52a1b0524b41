use super::cube::Cube;
use super::error::StructureError;
use super::frame::Frame;
use super::series::Series;
use super::Structure;

/// Concatenate structures of one kind along their first axis.
///
/// Series are appended end to end, frames are stacked vertically over the
/// union of their columns, and cubes are stacked as additional items. Any
/// other combination, including an empty input, is an error.
pub fn concat(parts: &[Structure]) -> Result<Structure, StructureError> {
    if let Some(series) = collect(parts, |part| match part {
        Structure::Series(series) => Some(series),
        _ => None,
    }) {
        return Ok(Series::concat(&series).into());
    }
    if let Some(frames) = collect(parts, |part| match part {
        Structure::Frame(frame) => Some(frame),
        _ => None,
    }) {
        return Ok(Frame::concat(&frames).into());
    }
    if let Some(cubes) = collect(parts, |part| match part {
        Structure::Cube(cube) => Some(cube),
        _ => None,
    }) {
        return Ok(Cube::concat(&cubes).into());
    }
    Err(StructureError::NotConcatenable {
        kinds: describe(parts),
    })
}

fn collect<'a, T>(
    parts: &'a [Structure],
    pick: impl Fn(&'a Structure) -> Option<&'a T>,
) -> Option<Vec<&'a T>> {
    if parts.is_empty() {
        return None;
    }
    parts.iter().map(pick).collect()
}

fn describe(parts: &[Structure]) -> String {
    if parts.is_empty() {
        return "an empty sequence".to_string();
    }
    let mut names: Vec<&str> = parts.iter().map(Structure::type_name).collect();
    names.dedup();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Label, Value};

    #[test]
    fn concatenates_series_in_order() {
        let first = Series::from_pairs([(1, 1.0), (2, 2.0)]);
        let second = Series::from_pairs([(3, 3.0)]);
        let joined = concat(&[first.into(), second.into()]).unwrap();
        let Structure::Series(joined) = joined else {
            panic!("expected a series");
        };
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.get(&Label::Int(3)), Some(&Value::Float(3.0)));
    }

    #[test]
    fn rejects_mixed_scalar_and_empty_input() {
        let mixed = concat(&[
            Series::from_pairs([(1, 1.0)]).into(),
            Value::Int(1).into(),
        ]);
        assert_eq!(
            mixed,
            Err(StructureError::NotConcatenable {
                kinds: "series, scalar".into()
            })
        );
        let scalars = concat(&[Value::Int(1).into(), Value::Int(2).into()]);
        assert!(scalars.is_err());
        assert!(concat(&[]).is_err());
    }
}
