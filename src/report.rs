//! The combined analysis report
//!
//! A [`Report`] is an ordered list of sections: a fixed introduction, the
//! fault tree outline, the ranked FMEA table, and the recommendations. It
//! contains nothing that varies between runs, so identical input always
//! renders to identical text.

use std::fmt::Write as _;

use crate::{
    domain::{Dataset, OutlineStyle},
    render::{outline_text, text_table},
};

const TITLE: &str = "Hybrid Vehicle Electric Cooling System Reliability Analysis Report";

const OVERVIEW: &str = "This report analyses the reliability of the electric cooling system of \
                        a hybrid vehicle,\ncovering key components including the water pump, \
                        radiator fan, temperature sensor and coolant lines.\n";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    title: String,
    body: String,
}

impl Section {
    fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Settings that shape the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Outline style for the fault tree section.
    pub outline_style: OutlineStyle,
    /// RPN above which a failure mode is called out in the recommendations.
    pub action_threshold: u16,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            outline_style: OutlineStyle::default(),
            action_threshold: 100,
        }
    }
}

/// The combined reliability report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    sections: Vec<Section>,
}

impl Report {
    /// Assembles the report for a dataset.
    #[must_use]
    pub fn assemble(dataset: &Dataset, options: ReportOptions) -> Self {
        let sections = vec![
            Section::new("1. System overview", OVERVIEW),
            Section::new(
                "2. Fault tree analysis",
                outline_text(dataset.tree(), options.outline_style),
            ),
            Section::new("3. FMEA results", text_table(dataset.fmea())),
            Section::new(
                "4. Recommendations",
                recommendations(dataset, options.action_threshold),
            ),
        ];
        Self { sections }
    }

    /// Renders the report as a single document.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        push_heading(&mut out, TITLE, '=');

        for section in &self.sections {
            out.push('\n');
            push_heading(&mut out, &section.title, '-');
            out.push_str(&section.body);
            if !section.body.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

fn push_heading(out: &mut String, title: &str, underline: char) {
    out.push_str(title);
    out.push('\n');
    out.extend(std::iter::repeat_n(underline, title.chars().count()));
    out.push('\n');
}

fn recommendations(dataset: &Dataset, threshold: u16) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "1) Prioritise failure modes with an RPN above {threshold}"
    );
    body.push_str("2) Carry out preventive maintenance on critical components\n");
    body.push_str("3) Add system monitoring and alarm functions\n");
    body.push('\n');

    let urgent = dataset.fmea().above_threshold(threshold);
    if urgent.is_empty() {
        body.push_str("No failure mode exceeds the action threshold.\n");
    } else {
        body.push_str("Failure modes above the action threshold:\n");
        for record in urgent {
            let _ = writeln!(
                body,
                "- {}: {} (RPN {}) -> {}",
                record.component(),
                record.failure_mode(),
                record.rpn(),
                record.recommended_action()
            );
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_report() -> String {
        Report::assemble(&Dataset::reference(), ReportOptions::default()).render()
    }

    #[test]
    fn sections_appear_in_order() {
        let report = reference_report();
        let positions: Vec<usize> = [
            TITLE,
            "1. System overview",
            "2. Fault tree analysis",
            "3. FMEA results",
            "4. Recommendations",
        ]
        .iter()
        .map(|heading| report.find(heading).unwrap())
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn contains_the_full_outline() {
        let dataset = Dataset::reference();
        let report = reference_report();
        assert!(report.contains(&outline_text(dataset.tree(), OutlineStyle::Connectors)));
    }

    #[test]
    fn fmea_table_is_ranked() {
        let report = reference_report();
        let sensor = report.find("Temperature sensor  ").unwrap();
        let fan = report.find("Radiator fan  ").unwrap();
        let pump = report.find("Electric water pump  ").unwrap();
        let pipe = report.find("Coolant pipe  ").unwrap();
        assert!(sensor < fan && fan < pump && pump < pipe);
    }

    #[test]
    fn recommendations_call_out_records_above_threshold() {
        let report = reference_report();
        assert!(report.contains(
            "- Temperature sensor: Reading deviation (RPN 210) -> Redundant dual-sensor design\n"
        ));
        assert!(report.contains("- Radiator fan: Abnormal speed (RPN 140)"));
        assert!(!report.contains("(RPN 96)"));

        let strict = Report::assemble(
            &Dataset::reference(),
            ReportOptions {
                action_threshold: 500,
                ..ReportOptions::default()
            },
        )
        .render();
        assert!(strict.contains("No failure mode exceeds the action threshold."));
    }

    #[test]
    fn headings_are_underlined_to_their_width() {
        let report = reference_report();
        let mut lines = report.lines();
        let title = lines.next().unwrap();
        let rule = lines.next().unwrap();
        assert_eq!(title, TITLE);
        assert_eq!(rule.len(), TITLE.len());
        assert!(rule.chars().all(|c| c == '='));
    }

    #[test]
    fn rendering_is_idempotent() {
        assert_eq!(reference_report(), reference_report());
    }
}
