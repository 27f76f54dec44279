use serde_json::Value;
use tracing::warn;

use tracker_types::api::FilterState;
use tracker_types::{Milestone, TimelineRecord};

/// Where an application stands at the end of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// Neither the eCOPR nor the PR card has arrived.
    Active,
    Ecopr,
    PrCard,
}

impl CompletionStatus {
    /// Unrecognised values yield `None`, which disables the status filter.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "ecopr" => Some(Self::Ecopr),
            "pr-card" => Some(Self::PrCard),
            _ => None,
        }
    }

    pub fn matches(self, record: &TimelineRecord) -> bool {
        let ecopr = record.milestone(Milestone::EcoprReceived).is_some();
        let pr_card = record.milestone(Milestone::PrCardReceived).is_some();
        match self {
            Self::Active => !ecopr && !pr_card,
            Self::Ecopr => ecopr,
            Self::PrCard => pr_card,
        }
    }
}

/// A compiled filter configuration. Every active dimension must hold for a
/// record to be kept; the search term matches if any searchable field
/// contains it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub stream: Option<String>,
    pub visa_office: Option<String>,
    pub application_type: Option<String>,
    /// Matched by substring, e.g. "Foreign Exp" matches "Single, Foreign Exp".
    pub complexity: Option<String>,
    pub completion_status: Option<CompletionStatus>,
    /// Lowercased and trimmed.
    pub search: Option<String>,
}

fn selector(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl Filters {
    pub fn new(state: &FilterState, search: &str) -> Self {
        let search = search.trim();
        Self {
            stream: selector(&state.stream),
            visa_office: selector(&state.visa_office),
            application_type: selector(&state.application_type),
            complexity: selector(&state.complexity),
            completion_status: CompletionStatus::parse(&state.completion_status),
            search: (!search.is_empty()).then(|| search.to_lowercase()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, record: &TimelineRecord) -> bool {
        let details = &record.details;

        if let Some(stream) = &self.stream {
            if details.stream.as_deref() != Some(stream.as_str()) {
                return false;
            }
        }
        if let Some(office) = &self.visa_office {
            if details.primary_visa_office.as_deref() != Some(office.as_str()) {
                return false;
            }
        }
        if let Some(kind) = &self.application_type {
            if details.application_type.as_deref() != Some(kind.as_str()) {
                return false;
            }
        }
        if let Some(complexity) = &self.complexity {
            let contains = details
                .complexity
                .as_deref()
                .is_some_and(|c| c.contains(complexity.as_str()));
            if !contains {
                return false;
            }
        }
        if let Some(status) = self.completion_status {
            if !status.matches(record) {
                return false;
            }
        }

        match &self.search {
            Some(term) => search_fields(record).any(|field| {
                field.is_some_and(|value| value.to_lowercase().contains(term.as_str()))
            }),
            None => true,
        }
    }

    /// Keep the matching records, preserving input order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a TimelineRecord>
    where
        I: IntoIterator<Item = &'a TimelineRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

fn search_fields(record: &TimelineRecord) -> impl Iterator<Item = Option<&str>> {
    let details = &record.details;
    [
        Some(record.username.as_str()),
        details.stream.as_deref(),
        details.primary_visa_office.as_deref(),
        details.secondary_visa_office.as_deref(),
        details.application_type.as_deref(),
    ]
    .into_iter()
}

/// Filter an undecoded payload. Anything that is not a list of timelines
/// yields an empty result.
pub fn filter_value(payload: Value, filters: &Filters) -> Vec<TimelineRecord> {
    if !payload.is_array() {
        warn!("Timeline payload is not a list; showing no records");
        return Vec::new();
    }

    match serde_json::from_value::<Vec<TimelineRecord>>(payload) {
        Ok(records) => records.into_iter().filter(|r| filters.matches(r)).collect(),
        Err(e) => {
            warn!("Malformed timeline payload: {}", e);
            Vec::new()
        }
    }
}

/// Number of discrete selectors in use, for the "Clear N filters" control.
pub fn active_filter_count(state: &FilterState) -> usize {
    [
        &state.stream,
        &state.visa_office,
        &state.application_type,
        &state.complexity,
        &state.completion_status,
    ]
    .into_iter()
    .filter(|v| !v.is_empty())
    .count()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tracker_types::DataSource;

    pub(crate) fn record(id: i64, username: &str) -> TimelineRecord {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TimelineRecord {
            id,
            email: None,
            email_verified: false,
            username: username.into(),
            dates: Default::default(),
            details: Default::default(),
            notes: None,
            ircc_last_update: None,
            last_updated_by_user: None,
            created_at: at,
            updated_at: at,
            data_source: DataSource::Seed,
        }
    }

    fn sample() -> Vec<TimelineRecord> {
        let mut a = record(1, "A");
        a.details.stream = Some("CEC".into());
        a.details.application_type = Some("Inland".into());
        a.details.complexity = Some("Single, No Foreign Exp".into());
        a.details.primary_visa_office = Some("Ottawa".into());

        let mut b = record(2, "B");
        b.details.stream = Some("FSW".into());
        b.details.application_type = Some("Outland".into());
        b.details.complexity = Some("Family, Foreign Exp".into());
        b.details.primary_visa_office = Some("Sydney".into());
        b.dates.ecopr_passport_received_date = Some("2024-01-01".into());

        let mut c = record(3, "carol");
        c.details.stream = Some("PNP".into());
        c.details.secondary_visa_office = Some("Edmonton".into());
        c.dates.ecopr_passport_received_date = Some("2023-11-01".into());
        c.dates.pr_card_received_date = Some("2023-12-15".into());

        vec![a, b, c]
    }

    fn ids(records: &[&TimelineRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    fn status(value: &str) -> FilterState {
        FilterState {
            completion_status: value.into(),
            ..Default::default()
        }
    }

    #[test]
    fn ecopr_status_and_search() {
        let records = sample();
        let by_status = Filters::new(&status("ecopr"), "").apply(&records[..2]);
        assert_eq!(ids(&by_status), vec![2]);

        let by_search = Filters::new(&FilterState::default(), "cec").apply(&records[..2]);
        assert_eq!(ids(&by_search), vec![1]);
    }

    #[test]
    fn completion_statuses() {
        let records = sample();
        assert_eq!(ids(&Filters::new(&status("active"), "").apply(&records)), vec![1]);
        assert_eq!(ids(&Filters::new(&status("ecopr"), "").apply(&records)), vec![2, 3]);
        assert_eq!(ids(&Filters::new(&status("pr-card"), "").apply(&records)), vec![3]);
        // unknown statuses exclude nothing
        assert_eq!(ids(&Filters::new(&status("updated-today"), "").apply(&records)), vec![1, 2, 3]);
        assert_eq!(ids(&Filters::new(&status(""), "").apply(&records)), vec![1, 2, 3]);
    }

    #[test]
    fn discrete_filters_combine_with_and() {
        let records = sample();
        let state = FilterState {
            stream: "FSW".into(),
            application_type: "Outland".into(),
            ..Default::default()
        };
        assert_eq!(ids(&Filters::new(&state, "").apply(&records)), vec![2]);

        let state = FilterState {
            stream: "FSW".into(),
            application_type: "Inland".into(),
            ..Default::default()
        };
        assert!(Filters::new(&state, "").apply(&records).is_empty());

        let state = FilterState {
            visa_office: "Ottawa".into(),
            ..Default::default()
        };
        assert_eq!(ids(&Filters::new(&state, "").apply(&records)), vec![1]);
    }

    #[test]
    fn stream_is_exact_but_complexity_is_substring() {
        let records = sample();
        let state = FilterState {
            stream: "CE".into(),
            ..Default::default()
        };
        assert!(Filters::new(&state, "").apply(&records).is_empty());

        let state = FilterState {
            complexity: "Foreign Exp".into(),
            ..Default::default()
        };
        // "No Foreign Exp" contains "Foreign Exp" too
        assert_eq!(ids(&Filters::new(&state, "").apply(&records)), vec![1, 2]);

        let state = FilterState {
            complexity: "Family".into(),
            ..Default::default()
        };
        assert_eq!(ids(&Filters::new(&state, "").apply(&records)), vec![2]);
    }

    #[test]
    fn search_covers_fields_and_ignores_missing_values() {
        let records = sample();
        let hits = |term: &str| ids(&Filters::new(&FilterState::default(), term).apply(&records));

        assert_eq!(hits("CAROL"), vec![3]);
        assert_eq!(hits("edmonton"), vec![3]);
        assert_eq!(hits("sydney"), vec![2]);
        assert_eq!(hits("land"), vec![1, 2]);
        assert_eq!(hits("  cec  "), vec![1]);
        assert_eq!(hits("   "), vec![1, 2, 3]);
        assert!(hits("toronto").is_empty());
    }

    #[test]
    fn results_are_a_subset_and_filtering_is_idempotent() {
        let records = sample();
        let state = FilterState {
            completion_status: "ecopr".into(),
            ..Default::default()
        };
        let filters = Filters::new(&state, "b");
        let once = filters.apply(&records);
        let twice = filters.apply(once.iter().copied());

        assert_eq!(once, twice);
        assert!(once.iter().all(|r| records.contains(r)));
        assert!(once.iter().all(|r| filters.matches(r)));
    }

    #[test]
    fn malformed_payloads_yield_nothing() {
        let filters = Filters::default();
        assert!(filter_value(json!({"id": 1}), &filters).is_empty());
        assert!(filter_value(Value::Null, &filters).is_empty());
        assert!(filter_value(json!([{"id": "x"}]), &filters).is_empty());

        let payload = serde_json::to_value(sample()).unwrap();
        assert_eq!(filter_value(payload, &filters).len(), 3);
    }

    #[test]
    fn counts_active_selectors() {
        let state = FilterState {
            stream: "CEC".into(),
            completion_status: "active".into(),
            ..Default::default()
        };
        assert_eq!(active_filter_count(&state), 2);
        assert_eq!(active_filter_count(&FilterState::default()), 0);
        assert!(Filters::new(&FilterState::default(), " ").is_empty());
    }
}
