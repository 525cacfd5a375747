//! Result aggregation and CSV export.
//!
//! Votes are grouped twice, both times in first-seen order:
//! 1. by main subject, yielding one "Group Score" row over every vote of it
//! 2. within that, by display subject, yielding one row per label
//!
//! Each main-subject block ends with an empty separator row. Averages are
//! per category over all votes in the row, with unusable scores read as 0.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use tally_protocol::{score_value, Category, Vote, GROUP_EVALUATION_LABEL, GROUP_SCORE_LABEL};

const FIXED_HEADERS: [&str; 3] = ["Group/Subject", "Participant/Detail", "Vote Count"];

/// One aggregated line of the export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    /// Main subject on the "Group Score" row, empty on detail rows.
    pub subject: String,
    pub detail: String,
    pub count: usize,
    /// Per-category averages in category order.
    pub averages: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExportLine {
    Row(ExportRow),
    Separator,
}

/// Group `votes` by `key`, keeping the order in which keys first appear.
fn partition_by<'a, F>(votes: impl IntoIterator<Item = &'a Vote>, key: F) -> Vec<(&'a str, Vec<&'a Vote>)>
where
    F: Fn(&'a Vote) -> &'a str,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Vec<&'a Vote>)> = Vec::new();
    for vote in votes {
        let k = key(vote);
        match index.get(k) {
            Some(&i) => groups[i].1.push(vote),
            None => {
                index.insert(k, groups.len());
                groups.push((k, vec![vote]));
            }
        }
    }
    groups
}

fn averages(categories: &[Category], votes: &[&Vote]) -> Vec<f64> {
    // Groups are only built from at least one vote.
    let count = votes.len().max(1) as f64;
    categories
        .iter()
        .map(|cat| {
            let total: f64 = votes
                .iter()
                .map(|v| score_value(v.scores.get(&cat.id)))
                .sum();
            total / count
        })
        .collect()
}

/// Export label of a display subject within its main subject.
pub fn detail_label(main_subject: &str, subject: &str) -> String {
    if let Some(name) = subject.strip_prefix(&format!("{main_subject} - ")) {
        return name.to_string();
    }
    if subject == main_subject || subject == format!("{main_subject} (Group)") {
        return GROUP_EVALUATION_LABEL.to_string();
    }
    subject.to_string()
}

/// Aggregate the vote log into export lines.
pub fn aggregate(categories: &[Category], votes: &[Vote]) -> Vec<ExportLine> {
    let mut lines = Vec::new();

    for (main_subject, main_votes) in partition_by(votes, |v| v.main_subject.as_str()) {
        lines.push(ExportLine::Row(ExportRow {
            subject: main_subject.to_string(),
            detail: GROUP_SCORE_LABEL.to_string(),
            count: main_votes.len(),
            averages: averages(categories, &main_votes),
        }));

        for (subject, sub_votes) in partition_by(main_votes.iter().copied(), |v| v.subject.as_str()) {
            lines.push(ExportLine::Row(ExportRow {
                subject: String::new(),
                detail: detail_label(main_subject, subject),
                count: sub_votes.len(),
                averages: averages(categories, &sub_votes),
            }));
        }

        lines.push(ExportLine::Separator);
    }

    lines
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn header_cell(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quote(field)
    } else {
        field.to_string()
    }
}

/// Render export lines as CSV text, one line per row, no trailing newline.
pub fn render_csv(categories: &[Category], lines: &[ExportLine]) -> String {
    let width = FIXED_HEADERS.len() + categories.len();
    let mut out = Vec::with_capacity(lines.len() + 1);

    let header: Vec<String> = FIXED_HEADERS
        .iter()
        .copied()
        .chain(categories.iter().map(|c| c.name.as_str()))
        .map(header_cell)
        .collect();
    out.push(header.join(","));

    for line in lines {
        match line {
            ExportLine::Row(row) => {
                let mut fields = vec![quote(&row.subject), quote(&row.detail), row.count.to_string()];
                fields.extend(row.averages.iter().map(|avg| format!("{avg:.2}")));
                out.push(fields.join(","));
            }
            ExportLine::Separator => out.push(",".repeat(width - 1)),
        }
    }

    out.join("\n")
}

/// Aggregate and render in one step.
pub fn export_csv(categories: &[Category], votes: &[Vote]) -> String {
    render_csv(categories, &aggregate(categories, votes))
}

/// Download filename for an export produced on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("grading_results_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_label_variants() {
        assert_eq!(detail_label("Team1", "Team1 - Ada"), "Ada");
        assert_eq!(detail_label("Team1", "Team1"), GROUP_EVALUATION_LABEL);
        assert_eq!(detail_label("Team1", "Team1 (Group)"), GROUP_EVALUATION_LABEL);
        assert_eq!(detail_label("Team1", "Other thing"), "Other thing");
    }

    #[test]
    fn test_quote_doubles_embedded_quotes() {
        assert_eq!(quote(r#"The "A" Team"#), r#""The ""A"" Team""#);
        assert_eq!(header_cell("Clarity"), "Clarity");
        assert_eq!(header_cell("Style, flair"), "\"Style, flair\"");
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(export_filename(date), "grading_results_2026-03-09.csv");
    }

    #[test]
    fn test_empty_log_is_header_only() {
        let categories = vec![Category::new("a", "Clarity"), Category::new("b", "Depth")];
        assert_eq!(
            export_csv(&categories, &[]),
            "Group/Subject,Participant/Detail,Vote Count,Clarity,Depth"
        );
    }
}
