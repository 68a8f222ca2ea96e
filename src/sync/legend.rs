//! Legend derivation from a cycle's classification.

use serde::Serialize;
use utoipa::ToSchema;

use super::classify::Classification;

/// Legend registered on the map surface alongside the marker set.
///
/// Always carries exactly one entry per severity class of the
/// classification it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
}

/// Build the legend for a classification.
///
/// Range labels follow the same inclusive-lower boundary rule as
/// [`Classification::classify`]: the first class covers `0 - breaks[0]`,
/// middle classes cover `breaks[i-1]+1 - breaks[i]`, and the top class is
/// open-ended above the second-to-last breakpoint.
pub fn build_legend(classification: &Classification) -> Legend {
    let breaks = &classification.breaks;
    let classes = classification.classes();

    let entries = classification
        .colors
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let label = if i == 0 {
                format!("0 - {}", breaks[0])
            } else if i == classes - 1 {
                format!("> {}", breaks[classes - 2])
            } else {
                format!("{} - {}", breaks[i - 1] + 1, breaks[i])
            };
            LegendEntry {
                color: color.clone(),
                label,
            }
        })
        .collect();

    Legend {
        title: "Number of people in line".to_string(),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::classify::NEUTRAL_COLOR;

    fn palette3() -> Vec<String> {
        vec![
            "#1a9641".to_string(),
            "#f6f63f".to_string(),
            "#d7191c".to_string(),
        ]
    }

    #[test]
    fn entry_count_always_equals_color_count() {
        let classification = Classification {
            breaks: vec![3, 12, 52],
            colors: palette3(),
        };
        let legend = build_legend(&classification);
        assert_eq!(legend.entries.len(), classification.colors.len());

        let fallback = Classification::fallback(4);
        assert_eq!(build_legend(&fallback).entries.len(), 4);
    }

    #[test]
    fn three_class_labels_cover_below_between_and_above() {
        let classification = Classification {
            breaks: vec![3, 12, 52],
            colors: palette3(),
        };
        let legend = build_legend(&classification);
        assert_eq!(legend.entries[0].label, "0 - 3");
        assert_eq!(legend.entries[1].label, "4 - 12");
        assert_eq!(legend.entries[2].label, "> 12");
    }

    #[test]
    fn labels_agree_with_classification_at_boundaries() {
        let classification = Classification {
            breaks: vec![10, 20, 30],
            colors: palette3(),
        };
        // 10 is labeled into the first range and classifies as class 0;
        // 11 is labeled into the second range and classifies as class 1.
        assert_eq!(classification.classify(10), 0);
        assert_eq!(classification.classify(11), 1);
        let legend = build_legend(&classification);
        assert_eq!(legend.entries[0].label, "0 - 10");
        assert_eq!(legend.entries[1].label, "11 - 20");
    }

    #[test]
    fn entry_colors_follow_palette_order() {
        let classification = Classification {
            breaks: vec![3, 12, 52],
            colors: palette3(),
        };
        let legend = build_legend(&classification);
        let colors: Vec<&str> = legend.entries.iter().map(|e| e.color.as_str()).collect();
        assert_eq!(colors, vec!["#1a9641", "#f6f63f", "#d7191c"]);
    }

    #[test]
    fn fallback_legend_is_uniformly_neutral() {
        let legend = build_legend(&Classification::fallback(3));
        assert!(legend.entries.iter().all(|e| e.color == NEUTRAL_COLOR));
    }

    #[test]
    fn four_class_legend_has_two_middle_ranges() {
        let classification = Classification {
            breaks: vec![5, 15, 30, 60],
            colors: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        };
        let legend = build_legend(&classification);
        let labels: Vec<&str> = legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["0 - 5", "6 - 15", "16 - 30", "> 30"]);
    }
}
