//! Parser for the `_result?view=summary` report.
//!
//! The report is pseudo-XML, one `<result>` block per repository and
//! architecture pair. Known XML parsers have a history of entity-expansion
//! vulnerabilities, so this module deliberately scans line by line and
//! never interprets markup beyond the three shapes it recognizes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One repository/architecture result block from the summary report.
///
/// `state` is the repository's publish lifecycle marker (for example
/// `published` or `building`); `status_counts` maps status-code names
/// (`succeeded`, `failed`, `scheduled`, ...) to package counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub project: String,
    pub repository: String,
    pub arch: String,
    pub code: String,
    pub state: String,
    pub status_counts: BTreeMap<String, u64>,
}

/// Parse the raw summary report into result records, in input order.
///
/// Recognized line shapes, anything else is ignored:
/// - `<result key="value" ...>` opens a block,
/// - `<statuscount code="..." count="..."/>` adds one counter to it,
/// - `</result>` closes it.
///
/// Malformed attribute tokens (no `=`) are skipped silently. A closing
/// line only emits a record when the opening line carried at least one
/// attribute, so stray closers produce nothing.
pub fn parse_summary(raw: &str) -> Vec<ResultRecord> {
    let status_count_re = Regex::new(r#"statuscount code="([a-z]+)" count="([0-9]+)""#)
        .expect("status count pattern is valid");

    let mut records = Vec::new();
    let mut current: Option<ResultRecord> = None;
    let mut attrs_captured = 0usize;

    for line in raw.lines() {
        let line = line.trim_start();

        if line.starts_with("<result ") {
            let mut record = ResultRecord::default();
            attrs_captured = 0;

            let inner = line.strip_suffix('>').unwrap_or(line);
            let inner = &inner[1..];
            for token in inner.split(' ') {
                let pair: Vec<&str> = token.split('=').collect();
                if pair.len() != 2 {
                    continue;
                }
                let value = unquote(pair[1]);
                match pair[0] {
                    "project" => record.project = value.to_string(),
                    "repository" => record.repository = value.to_string(),
                    "arch" => record.arch = value.to_string(),
                    "code" => record.code = value.to_string(),
                    "state" => record.state = value.to_string(),
                    _ => (),
                }
                attrs_captured += 1;
            }
            current = Some(record);
        } else if line.starts_with("<statuscount ") {
            if let Some(record) = current.as_mut() {
                if let Some(caps) = status_count_re.captures(line) {
                    if let Ok(count) = caps[2].parse::<u64>() {
                        record.status_counts.insert(caps[1].to_string(), count);
                    }
                }
            }
        } else if line == "</result>" {
            if let Some(record) = current.take() {
                if attrs_captured > 0 {
                    records.push(record);
                }
            }
        }
    }

    records
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY_TWO_REPOS: &str = r#"<resultlist state="6e31736c">
  <result project="home:cathay4t:misc" repository="Fedora_42" arch="x86_64" code="published" state="published">
    <summary>
      <statuscount code="succeeded" count="3"/>
    </summary>
  </result>
  <result project="home:cathay4t:misc" repository="Fedora_42" arch="i586" code="building" state="building">
    <summary>
      <statuscount code="succeeded" count="1"/>
      <statuscount code="scheduled" count="2"/>
    </summary>
  </result>
</resultlist>"#;

    #[test]
    fn test_parses_one_record_per_block() {
        let records = parse_summary(SUMMARY_TWO_REPOS);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_attributes_populate_fields() {
        let records = parse_summary(SUMMARY_TWO_REPOS);
        assert_eq!(records[0].project, "home:cathay4t:misc");
        assert_eq!(records[0].repository, "Fedora_42");
        assert_eq!(records[0].arch, "x86_64");
        assert_eq!(records[0].code, "published");
        assert_eq!(records[0].state, "published");
    }

    #[test]
    fn test_status_counts_attributed_to_their_block() {
        let records = parse_summary(SUMMARY_TWO_REPOS);
        assert_eq!(records[0].status_counts.get("succeeded"), Some(&3));
        assert_eq!(records[0].status_counts.get("scheduled"), None);
        assert_eq!(records[1].status_counts.get("succeeded"), Some(&1));
        assert_eq!(records[1].status_counts.get("scheduled"), Some(&2));
    }

    #[test]
    fn test_records_keep_input_order() {
        let records = parse_summary(SUMMARY_TWO_REPOS);
        assert_eq!(records[0].arch, "x86_64");
        assert_eq!(records[1].arch, "i586");
    }

    #[test]
    fn test_empty_input_yields_no_records() {
        assert!(parse_summary("").is_empty());
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        let raw = "<?xml version=\"1.0\"?>\n<resultlist>\nnoise\n</resultlist>\n";
        assert!(parse_summary(raw).is_empty());
    }

    #[test]
    fn test_spurious_closing_line_emits_nothing() {
        let raw = "</result>\n</result>\n";
        assert!(parse_summary(raw).is_empty());
    }

    #[test]
    fn test_malformed_attribute_skipped_rest_of_block_kept() {
        let raw = concat!(
            "<result project=\"p\" garbage repository=\"Fedora_42\" arch=\"x86_64\" state=\"published\">\n",
            "  <statuscount code=\"succeeded\" count=\"1\"/>\n",
            "</result>\n",
        );
        let records = parse_summary(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].repository, "Fedora_42");
        assert_eq!(records[0].status_counts.get("succeeded"), Some(&1));
    }

    #[test]
    fn test_unrecognized_attributes_discarded() {
        let raw = concat!(
            "<result project=\"p\" repository=\"r\" arch=\"a\" code=\"c\" state=\"s\" dirty=\"true\">\n",
            "</result>\n",
        );
        let records = parse_summary(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, "s");
    }

    #[test]
    fn test_statuscount_outside_block_ignored() {
        let raw = "<statuscount code=\"succeeded\" count=\"1\"/>\n";
        assert!(parse_summary(raw).is_empty());
    }

    #[test]
    fn test_non_numeric_count_line_skipped() {
        let raw = concat!(
            "<result repository=\"r\" arch=\"a\" state=\"published\">\n",
            "  <statuscount code=\"failed\" count=\"many\"/>\n",
            "  <statuscount code=\"succeeded\" count=\"2\"/>\n",
            "</result>\n",
        );
        let records = parse_summary(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status_counts.get("failed"), None);
        assert_eq!(records[0].status_counts.get("succeeded"), Some(&2));
    }
}
