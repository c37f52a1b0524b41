use indexmap::IndexMap;
use regex::Regex;

use crate::constants::directory::DEFAULT_FIELD_PATTERN;
use crate::errors::AccessError;
use crate::types::{FieldName, FieldValue};

/// Compiled endpoint path template.
///
/// `{site}{year:\d{4}}/NVSPL_{site}{year}_{month}.txt` compiles to an anchored
/// regex with one capture group per placeholder. A field that appears more
/// than once must capture identical text everywhere; a repeat without its own
/// pattern reuses the pattern of the field's first occurrence.
#[derive(Clone, Debug)]
pub struct PathPattern {
    regex: Regex,
    /// Field captured by each group `g0`, `g1`, ...
    groups: Vec<FieldName>,
    /// Distinct fields in first-appearance order.
    fields: Vec<FieldName>,
}

impl PathPattern {
    /// Compile `template`. Unbalanced braces, empty names and invalid patterns
    /// are configuration errors.
    pub fn compile(template: &str) -> Result<Self, AccessError> {
        let mut source = String::from("^");
        let mut groups: Vec<FieldName> = Vec::new();
        let mut patterns: IndexMap<FieldName, String> = IndexMap::new();
        let mut literal = String::new();
        let mut chars = template.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();
                    let (name, explicit) = read_placeholder(&mut chars, template)?;
                    let pattern = match (explicit, patterns.get(&name)) {
                        (Some(pattern), _) => pattern,
                        (None, Some(first)) => first.clone(),
                        (None, None) => DEFAULT_FIELD_PATTERN.to_string(),
                    };
                    source.push_str(&format!("(?P<g{}>{})", groups.len(), pattern));
                    patterns.entry(name.clone()).or_insert(pattern);
                    groups.push(name);
                }
                '}' => return Err(malformed(template, "unmatched '}'")),
                other => literal.push(other),
            }
        }
        source.push_str(&regex::escape(&literal));
        source.push('$');
        let regex = Regex::new(&source)
            .map_err(|err| malformed(template, &format!("invalid pattern: {err}")))?;
        let fields = patterns.into_keys().collect();
        Ok(Self {
            regex,
            groups,
            fields,
        })
    }

    /// Distinct placeholder names in first-appearance order.
    pub fn fields(&self) -> &[FieldName] {
        &self.fields
    }

    /// Field values for a `/`-separated relative path, or `None` when the
    /// path does not match or repeated fields disagree.
    pub fn extract(&self, relative: &str) -> Option<IndexMap<FieldName, FieldValue>> {
        let captures = self.regex.captures(relative)?;
        let mut values: IndexMap<FieldName, FieldValue> = IndexMap::new();
        for (pos, name) in self.groups.iter().enumerate() {
            let text = captures.name(&format!("g{pos}"))?.as_str();
            match values.get(name) {
                Some(previous) if previous != text => return None,
                Some(_) => {}
                None => {
                    values.insert(name.clone(), text.to_string());
                }
            }
        }
        Some(values)
    }
}

fn read_placeholder(
    chars: &mut std::str::Chars<'_>,
    template: &str,
) -> Result<(FieldName, Option<String>), AccessError> {
    let mut name = String::new();
    let mut pattern = String::new();
    let mut in_pattern = false;
    let mut depth = 0usize;
    loop {
        let Some(ch) = chars.next() else {
            return Err(malformed(template, "unterminated placeholder"));
        };
        if !in_pattern {
            match ch {
                '}' => break,
                ':' => in_pattern = true,
                other => name.push(other),
            }
            continue;
        }
        match ch {
            '}' if depth == 0 => break,
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        pattern.push(ch);
    }
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(malformed(template, "placeholder without a field name"));
    }
    Ok((name, (!pattern.is_empty()).then_some(pattern)))
}

fn malformed(template: &str, details: &str) -> AccessError {
    AccessError::Configuration(format!("path template '{template}': {details}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NVSPL: &str = "{site}{year:\\d{4}}/NVSPL_{site}{year}_{month}_{day}_{hour}.txt";

    #[test]
    fn extracts_fields_in_first_appearance_order() {
        let pattern = PathPattern::compile(NVSPL).unwrap();
        assert_eq!(pattern.fields(), ["site", "year", "month", "day", "hour"]);
        let values = pattern
            .extract("TRLA2015/NVSPL_TRLA2015_06_01_13.txt")
            .unwrap();
        assert_eq!(values["site"], "TRLA");
        assert_eq!(values["year"], "2015");
        assert_eq!(values["hour"], "13");
    }

    #[test]
    fn repeated_fields_must_agree() {
        let pattern = PathPattern::compile(NVSPL).unwrap();
        assert!(pattern.extract("TRLA2015/NVSPL_DENA2015_06_01_13.txt").is_none());
        assert!(pattern.extract("TRLA2015/notes.txt").is_none());
    }

    #[test]
    fn repeats_inherit_the_first_pattern() {
        let pattern = PathPattern::compile(r"{site}{year:\d{4}}/{site}{year}.txt").unwrap();
        let values = pattern.extract("TRLA2015/TRLA2015.txt").unwrap();
        assert_eq!(values["site"], "TRLA");
        assert_eq!(values["year"], "2015");
    }

    #[test]
    fn literal_text_is_escaped() {
        let pattern = PathPattern::compile("data.{site}.csv").unwrap();
        assert!(pattern.extract("data.TRLA.csv").is_some());
        assert!(pattern.extract("dataXTRLAXcsv").is_none());
    }

    #[test]
    fn malformed_templates_are_configuration_errors() {
        for template in ["{site", "site}", "{}", "{site:(}"] {
            assert!(
                matches!(PathPattern::compile(template), Err(AccessError::Configuration(_))),
                "{template} should be rejected"
            );
        }
    }
}
