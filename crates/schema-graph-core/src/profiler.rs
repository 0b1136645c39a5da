//! Data Profiler (DP, §4.3)
//!
//! Computes a bounded-sample statistics record for one column. Given the
//! same input sequence, every output here is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::dal::RawValue;
use crate::graph::{ColumnStatistics, CommonStats, FamilyStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeFamily {
    Numeric,
    Textual,
    Temporal,
    Opaque,
}

/// Case-insensitive substring match on the declared type, in priority order
/// (§4.3 "Type-family inference").
fn infer_family(declared_type: &str) -> TypeFamily {
    let t = declared_type.to_uppercase();
    if t.contains("INT") {
        TypeFamily::Numeric
    } else if ["REAL", "FLOA", "DOUB", "DECIMAL", "NUMERIC"]
        .iter()
        .any(|s| t.contains(s))
    {
        TypeFamily::Numeric
    } else if t.contains("BOOL") {
        TypeFamily::Numeric
    } else if t.contains("DATE") || t.contains("TIME") {
        TypeFamily::Temporal
    } else if ["CHAR", "TEXT", "CLOB", "JSON"].iter().any(|s| t.contains(s)) {
        TypeFamily::Textual
    } else {
        TypeFamily::Opaque
    }
}

/// Profile one column's bounded value sample. Returns the merged statistics
/// block and, when the family-specific block could not be computed, a
/// warning describing the cause (non-fatal: the caller degrades the column
/// to common-block-only and records a `ProfilerDegraded` event).
pub fn profile_column(
    declared_type: &str,
    column_name: &str,
    is_primary_key: bool,
    values: &[RawValue],
    config: &PipelineConfig,
) -> (ColumnStatistics, Option<String>) {
    let total = values.len();
    let null_count = values.iter().filter(|v| v.is_null()).count();
    let non_null: Vec<&RawValue> = values.iter().filter(|v| !v.is_null()).collect();
    let non_null_count = non_null.len();

    let data_integrity = if total > 0 {
        format!(
            "{}%",
            (100.0 * non_null_count as f64 / total as f64).round() as i64
        )
    } else {
        "0%".to_string()
    };

    let common = CommonStats {
        samples: build_samples(&non_null, config),
        null_count,
        data_integrity,
    };

    let (family, warning) = match infer_family(declared_type) {
        TypeFamily::Numeric => numeric_stats(&non_null, column_name, is_primary_key),
        TypeFamily::Textual => textual_stats(&non_null, config),
        TypeFamily::Temporal => temporal_stats(&non_null),
        TypeFamily::Opaque => (FamilyStats::Opaque {}, None),
    };

    (ColumnStatistics { common, family }, warning)
}

fn build_samples(non_null: &[&RawValue], config: &PipelineConfig) -> Vec<Value> {
    non_null
        .iter()
        .take(config.sample_size)
        .map(|v| truncate_sample(v, config.truncate_len))
        .collect()
}

fn truncate_sample(value: &RawValue, max_len: usize) -> Value {
    if let RawValue::Text(s) = value {
        if s.chars().count() > max_len {
            let head: String = s.chars().take(max_len).collect();
            return Value::String(format!("{head}..."));
        }
    }
    value.to_json()
}

fn canonical_key(value: &RawValue) -> String {
    match value {
        RawValue::Null => "null".to_string(),
        RawValue::Integer(i) => format!("i:{i}"),
        RawValue::Real(r) => format!("r:{r}"),
        RawValue::Text(s) => format!("t:{s}"),
        RawValue::Blob(b) => format!("b:{}", b.len()),
    }
}

fn numeric_stats(
    non_null: &[&RawValue],
    column_name: &str,
    is_primary_key: bool,
) -> (FamilyStats, Option<String>) {
    let numbers: Vec<f64> = non_null.iter().filter_map(|v| v.as_f64()).collect();
    if numbers.is_empty() {
        let warning = (!non_null.is_empty())
            .then(|| "no numeric values could be parsed for this column".to_string());
        return (
            FamilyStats::Numeric {
                range: None,
                mean: None,
                mode: None,
            },
            warning,
        );
    }

    let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    let mode = compute_mode(non_null, column_name, is_primary_key);

    (
        FamilyStats::Numeric {
            range: Some((min, max)),
            mean: Some(mean),
            mode,
        },
        None,
    )
}

/// Most frequent non-null value, omitted for identifier columns (primary
/// keys or names ending in "id") and whenever the top frequency is 1.
fn compute_mode(non_null: &[&RawValue], column_name: &str, is_primary_key: bool) -> Option<Value> {
    let is_identifier = is_primary_key || column_name.to_lowercase().ends_with("id");
    if is_identifier {
        return None;
    }

    let mut freq: BTreeMap<String, (usize, Value)> = BTreeMap::new();
    for value in non_null {
        let key = canonical_key(value);
        let entry = freq.entry(key).or_insert((0, value.to_json()));
        entry.0 += 1;
    }

    let mut best: Option<&(usize, Value)> = None;
    for entry in freq.values() {
        match best {
            Some((count, _)) if entry.0 <= *count => {}
            _ => best = Some(entry),
        }
    }
    best.filter(|(count, _)| *count > 1).map(|(_, v)| v.clone())
}

fn textual_stats(non_null: &[&RawValue], config: &PipelineConfig) -> (FamilyStats, Option<String>) {
    let texts: Vec<String> = non_null.iter().filter_map(|v| v.as_text()).collect();
    if texts.is_empty() {
        let warning = (!non_null.is_empty())
            .then(|| "no textual values could be read for this column".to_string());
        return (
            FamilyStats::Textual {
                categories: None,
                avg_length: None,
                word_frequency: None,
            },
            warning,
        );
    }

    let distinct: BTreeSet<&String> = texts.iter().collect();
    let categories = if distinct.len() <= config.category_threshold {
        Some(distinct.into_iter().cloned().collect())
    } else {
        None
    };

    let total_chars: usize = texts.iter().map(|s| s.chars().count()).sum();
    let avg_length = Some(round1(total_chars as f64 / texts.len() as f64));

    let word_frequency = Some(compute_word_frequency(&texts, config));

    (
        FamilyStats::Textual {
            categories,
            avg_length,
            word_frequency,
        },
        None,
    )
}

fn compute_word_frequency(texts: &[String], config: &PipelineConfig) -> Vec<(String, usize)> {
    let mut freq: BTreeMap<String, usize> = BTreeMap::new();
    for text in texts {
        for token in text.split_whitespace() {
            *freq.entry(token.to_string()).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<(String, usize)> = freq.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut result = Vec::new();
    let mut singletons_kept = 0usize;
    for (token, count) in entries {
        if count == 1 {
            if singletons_kept >= 3 || token.len() > 20 {
                continue;
            }
            singletons_kept += 1;
        }
        result.push((token, count));
        if result.len() >= config.word_freq_top_k {
            break;
        }
    }
    result
}

fn temporal_stats(non_null: &[&RawValue]) -> (FamilyStats, Option<String>) {
    let parsed: Vec<NaiveDateTime> = non_null
        .iter()
        .filter_map(|v| v.as_text())
        .filter_map(|s| parse_timestamp(&s))
        .collect();

    if parsed.is_empty() {
        return (
            FamilyStats::Temporal { time_span: None },
            Some("no values could be parsed as timestamps".to_string()),
        );
    }

    let min = parsed.iter().min().expect("non-empty");
    let max = parsed.iter().max().expect("non-empty");
    let span = *max - *min;
    let time_span = if span.num_days() >= 1 {
        format!("{}d", span.num_days())
    } else {
        format!("{}h", span.num_hours())
    };

    (
        FamilyStats::Temporal {
            time_span: Some(time_span),
        },
        None,
    )
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<RawValue> {
        values.iter().map(|v| RawValue::Integer(*v)).collect()
    }

    fn texts(values: &[&str]) -> Vec<RawValue> {
        values.iter().map(|v| RawValue::Text(v.to_string())).collect()
    }

    #[test]
    fn null_count_plus_non_null_equals_total() {
        let values = vec![RawValue::Integer(1), RawValue::Null, RawValue::Integer(3)];
        let (stats, _) = profile_column("INTEGER", "value", false, &values, &PipelineConfig::default());
        assert_eq!(stats.common.null_count, 1);
        assert_eq!(stats.common.null_count + 2, values.len());
    }

    #[test]
    fn mode_omitted_for_identifier_columns() {
        let values = ints(&[1, 1, 1, 2]);
        let (stats, _) = profile_column("INTEGER", "id", true, &values, &PipelineConfig::default());
        match stats.family {
            FamilyStats::Numeric { mode, .. } => assert!(mode.is_none()),
            _ => panic!("expected numeric family"),
        }
    }

    #[test]
    fn mode_omitted_when_top_frequency_is_one() {
        let values = ints(&[1, 2, 3]);
        let (stats, _) = profile_column("INTEGER", "score", false, &values, &PipelineConfig::default());
        match stats.family {
            FamilyStats::Numeric { mode, .. } => assert!(mode.is_none()),
            _ => panic!("expected numeric family"),
        }
    }

    #[test]
    fn mode_present_for_non_identifier_repeated_value() {
        let values = ints(&[5, 5, 7]);
        let (stats, _) = profile_column("INTEGER", "score", false, &values, &PipelineConfig::default());
        match stats.family {
            FamilyStats::Numeric { mode, .. } => assert_eq!(mode, Some(Value::from(5))),
            _ => panic!("expected numeric family"),
        }
    }

    #[test]
    fn categories_present_at_or_below_threshold() {
        let values = texts(&["alice", "bob", "alice"]);
        let (stats, _) = profile_column("TEXT", "name", false, &values, &PipelineConfig::default());
        match stats.family {
            FamilyStats::Textual { categories, .. } => {
                assert_eq!(categories, Some(vec!["alice".to_string(), "bob".to_string()]));
            }
            _ => panic!("expected textual family"),
        }
    }

    #[test]
    fn categories_absent_above_threshold() {
        let values = texts(&["a", "b", "c", "d", "e", "f", "g"]);
        let (stats, _) = profile_column("TEXT", "label", false, &values, &PipelineConfig::default());
        match stats.family {
            FamilyStats::Textual { categories, .. } => assert!(categories.is_none()),
            _ => panic!("expected textual family"),
        }
    }

    #[test]
    fn samples_capped_at_six_and_truncated() {
        let long = "x".repeat(40);
        let values: Vec<RawValue> = (0..8)
            .map(|_| RawValue::Text(long.clone()))
            .collect();
        let (stats, _) = profile_column("TEXT", "notes", false, &values, &PipelineConfig::default());
        assert_eq!(stats.common.samples.len(), 6);
        for sample in &stats.common.samples {
            assert_eq!(sample.as_str().unwrap().len(), 33);
        }
    }

    #[test]
    fn word_frequency_caps_singletons_at_three() {
        let mut words = vec!["common".to_string(); 5];
        for i in 0..17 {
            words.push(format!("uniq{i}"));
        }
        let texts: Vec<RawValue> = vec![RawValue::Text(words.join(" "))];
        let (stats, _) = profile_column("TEXT", "body", false, &texts, &PipelineConfig::default());
        match stats.family {
            FamilyStats::Textual {
                word_frequency: Some(freq),
                ..
            } => {
                assert!(freq.len() <= 10);
                let singleton_count = freq.iter().filter(|(_, c)| *c == 1).count();
                assert!(singleton_count <= 3);
                assert!(freq.iter().any(|(w, c)| w == "common" && *c == 5));
            }
            _ => panic!("expected textual family with word frequency"),
        }
    }

    #[test]
    fn temporal_span_in_days() {
        let values = texts(&["2024-01-01", "2024-01-10"]);
        let (stats, _) = profile_column("DATE", "created_at", false, &values, &PipelineConfig::default());
        match stats.family {
            FamilyStats::Temporal { time_span } => assert_eq!(time_span.as_deref(), Some("9d")),
            _ => panic!("expected temporal family"),
        }
    }

    #[test]
    fn unparseable_temporal_values_degrade_with_warning() {
        let values = texts(&["not-a-date", "also-not-a-date"]);
        let (stats, warning) = profile_column("DATETIME", "ts", false, &values, &PipelineConfig::default());
        assert!(warning.is_some());
        match stats.family {
            FamilyStats::Temporal { time_span } => assert!(time_span.is_none()),
            _ => panic!("expected temporal family"),
        }
    }

    #[test]
    fn data_integrity_rounds_to_percentage() {
        let values = vec![RawValue::Integer(1), RawValue::Null, RawValue::Null];
        let (stats, _) = profile_column("INTEGER", "v", false, &values, &PipelineConfig::default());
        assert_eq!(stats.common.data_integrity, "33%");
    }

    #[test]
    fn empty_input_yields_zero_percent_integrity() {
        let values: Vec<RawValue> = vec![];
        let (stats, _) = profile_column("INTEGER", "v", false, &values, &PipelineConfig::default());
        assert_eq!(stats.common.data_integrity, "0%");
    }
}
