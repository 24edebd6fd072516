use crate::cohort::{EntitySummary, GroupLabel, RosterMetrics};
use crate::util::{entity_label, format_mean, format_total};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
    pub available: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetailView {
    pub entity_id: u32,
    pub title: String,
    pub group: GroupLabel,
    pub rows: Vec<DetailRow>,
}

impl DetailView {
    pub fn build(summary: &EntitySummary, metrics: &RosterMetrics) -> Self {
        let mean_row = |label: &str, value: Option<f64>| DetailRow {
            label: label.to_owned(),
            value: format_mean(value),
            available: value.is_some(),
        };

        Self {
            entity_id: summary.id,
            title: entity_label(summary.id),
            group: summary.group,
            rows: vec![
                DetailRow {
                    label: metrics.primary.label.clone(),
                    value: format_total(summary.primary_total),
                    available: true,
                },
                mean_row(&metrics.secondary.label, summary.secondary_mean),
                mean_row(&metrics.tertiary.label, summary.tertiary_mean),
            ],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rows.iter().all(|row| row.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::NOT_AVAILABLE;

    #[test]
    fn absent_means_render_placeholder_rows() {
        let summary = EntitySummary {
            id: 17,
            group: GroupLabel::GroupC,
            primary_total: 48_213.0,
            secondary_mean: None,
            tertiary_mean: Some(512.04),
        };

        let view = DetailView::build(&summary, &RosterMetrics::default());

        assert_eq!(view.title, "Subject 17");
        assert_eq!(view.rows[0].value, "48,213");
        assert_eq!(view.rows[1].value, NOT_AVAILABLE);
        assert!(!view.rows[1].available);
        assert_eq!(view.rows[2].value, "512.0");
        assert!(!view.is_complete());
    }

    #[test]
    fn row_labels_follow_configured_metric_names() {
        let mut metrics = RosterMetrics::default();
        metrics.tertiary.label = "Mean cadence".to_owned();
        let summary = EntitySummary::unavailable(3, GroupLabel::GroupA);

        let view = DetailView::build(&summary, &metrics);

        assert_eq!(view.rows[2].label, "Mean cadence");
        assert_eq!(view.rows[0].value, "0");
        assert_eq!(view.group, GroupLabel::GroupA);
    }
}
