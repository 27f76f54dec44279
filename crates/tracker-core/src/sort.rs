use std::cmp::Ordering;

use chrono::NaiveDateTime;

use tracker_types::api::{PageResponse, SortConfig, SortDirection};
use tracker_types::{Milestone, TimelineRecord};

use crate::format::parse_date;

pub const ROWS_PER_PAGE: usize = 50;

/// Sortable fields holding free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Username,
    Stream,
    ApplicationType,
    Complexity,
    PrimaryVisaOffice,
    SecondaryVisaOffice,
    Country,
}

impl TextField {
    const ALL: [TextField; 7] = [
        Self::Username,
        Self::Stream,
        Self::ApplicationType,
        Self::Complexity,
        Self::PrimaryVisaOffice,
        Self::SecondaryVisaOffice,
        Self::Country,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Stream => "stream",
            Self::ApplicationType => "application_type",
            Self::Complexity => "complexity",
            Self::PrimaryVisaOffice => "primary_visa_office",
            Self::SecondaryVisaOffice => "secondary_visa_office",
            Self::Country => "country",
        }
    }

    fn value(self, record: &TimelineRecord) -> Option<&str> {
        let details = &record.details;
        match self {
            Self::Username => Some(record.username.as_str()),
            Self::Stream => details.stream.as_deref(),
            Self::ApplicationType => details.application_type.as_deref(),
            Self::Complexity => details.complexity.as_deref(),
            Self::PrimaryVisaOffice => details.primary_visa_office.as_deref(),
            Self::SecondaryVisaOffice => details.secondary_visa_office.as_deref(),
            Self::Country => details.country.as_deref(),
        }
    }
}

/// A sort key resolved once from its column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Text(TextField),
    Date(Milestone),
}

impl SortField {
    pub fn parse(key: &str) -> Option<Self> {
        if let Some(milestone) = Milestone::from_column(key) {
            return Some(Self::Date(milestone));
        }
        TextField::ALL
            .into_iter()
            .find(|f| f.key() == key)
            .map(Self::Text)
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Text(field) => field.key(),
            Self::Date(milestone) => milestone.column(),
        }
    }

    fn resolve(self, record: &TimelineRecord) -> Option<SortValue> {
        match self {
            Self::Text(field) => field
                .value(record)
                .filter(|v| !v.is_empty())
                .map(SortValue::text),
            Self::Date(milestone) => record.milestone(milestone).map(|raw| match parse_date(raw) {
                Some(at) => SortValue::Date(at),
                None => SortValue::text(raw),
            }),
        }
    }
}

/// A present sort value. Missing values are `None` and always go last.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SortValue {
    Date(NaiveDateTime),
    Text { folded: String, raw: String },
}

impl SortValue {
    fn text(raw: &str) -> Self {
        Self::Text {
            folded: raw.to_lowercase(),
            raw: raw.to_string(),
        }
    }

    // Dates rank ahead of unparseable text so the order stays total.
    fn cmp_present(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text { folded: fa, raw: ra }, Self::Text { folded: fb, raw: rb }) => {
                fa.cmp(fb).then_with(|| ra.cmp(rb))
            }
            (Self::Date(_), Self::Text { .. }) => Ordering::Less,
            (Self::Text { .. }, Self::Date(_)) => Ordering::Greater,
        }
    }
}

fn compare(a: Option<&SortValue>, b: Option<&SortValue>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            SortDirection::Asc => a.cmp_present(b),
            SortDirection::Desc => a.cmp_present(b).reverse(),
        },
    }
}

/// Stable sort by the configured key. An unknown key leaves the input order.
pub fn sort_records<'a>(records: Vec<&'a TimelineRecord>, config: &SortConfig) -> Vec<&'a TimelineRecord> {
    let Some(field) = SortField::parse(&config.key) else {
        return records;
    };

    let mut keyed: Vec<(Option<SortValue>, &'a TimelineRecord)> = records
        .into_iter()
        .map(|r| (field.resolve(r), r))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a.as_ref(), b.as_ref(), config.direction));
    keyed.into_iter().map(|(_, r)| r).collect()
}

/// Clicking a column header: the same key flips asc to desc, anything else
/// starts ascending.
pub fn toggle_sort(current: &SortConfig, key: &str) -> SortConfig {
    let direction = if current.key == key {
        current.direction.flipped()
    } else {
        SortDirection::Asc
    };
    SortConfig {
        key: key.to_string(),
        direction,
    }
}

pub fn page_count(total: usize) -> usize {
    total.div_ceil(ROWS_PER_PAGE)
}

/// One page of sorted records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub items: Vec<&'a TimelineRecord>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

impl Page<'_> {
    /// 1-based position of the first row, 0 for an empty page.
    pub fn first_row(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * ROWS_PER_PAGE + 1
        }
    }

    pub fn last_row(&self) -> usize {
        (self.first_row() + self.items.len()).saturating_sub(1)
    }

    pub fn to_response(&self) -> PageResponse {
        PageResponse {
            items: self.items.iter().map(|r| (*r).clone()).collect(),
            page: self.page,
            total_pages: self.total_pages,
            total: self.total,
            per_page: ROWS_PER_PAGE,
        }
    }
}

/// Slice out page `page` (1-based). Out-of-range pages come back empty; the
/// caller decides how to clamp.
pub fn paginate<'a>(sorted: &[&'a TimelineRecord], page: usize) -> Page<'a> {
    let total = sorted.len();
    let items = match page.checked_sub(1) {
        Some(index) => {
            let start = index.saturating_mul(ROWS_PER_PAGE).min(total);
            let end = start.saturating_add(ROWS_PER_PAGE).min(total);
            sorted[start..end].to_vec()
        }
        None => Vec::new(),
    };

    Page {
        items,
        page,
        total_pages: page_count(total),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::record;

    fn with_ita(id: i64, username: &str, ita: Option<&str>) -> TimelineRecord {
        let mut r = record(id, username);
        r.dates.ita_date = ita.map(str::to_string);
        r
    }

    fn config(key: &str, direction: SortDirection) -> SortConfig {
        SortConfig {
            key: key.into(),
            direction,
        }
    }

    fn ids(records: &[&TimelineRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    fn sample() -> Vec<TimelineRecord> {
        vec![
            with_ita(1, "dora", Some("2024-03-01")),
            with_ita(2, "Ann", None),
            with_ita(3, "bob", Some("2023-12-20")),
            with_ita(4, "Carl", Some("")),
            with_ita(5, "eve", Some("2024-01-15T10:00:00Z")),
        ]
    }

    #[test]
    fn dates_sort_chronologically_with_missing_last() {
        let records = sample();
        let asc = sort_records(records.iter().collect(), &config("ita_date", SortDirection::Asc));
        assert_eq!(ids(&asc), vec![3, 5, 1, 2, 4]);

        let desc = sort_records(records.iter().collect(), &config("ita_date", SortDirection::Desc));
        assert_eq!(ids(&desc), vec![1, 5, 3, 2, 4]);
    }

    #[test]
    fn text_sorts_case_insensitively() {
        let records = sample();
        let asc = sort_records(records.iter().collect(), &config("username", SortDirection::Asc));
        assert_eq!(ids(&asc), vec![2, 3, 4, 1, 5]);

        let desc = sort_records(records.iter().collect(), &config("username", SortDirection::Desc));
        assert_eq!(ids(&desc), vec![5, 1, 4, 3, 2]);
    }

    #[test]
    fn unparseable_dates_rank_after_real_dates() {
        let records = vec![
            with_ita(1, "a", Some("pending")),
            with_ita(2, "b", Some("2024-02-02")),
            with_ita(3, "c", None),
            with_ita(4, "d", Some("Awaiting")),
        ];
        let asc = sort_records(records.iter().collect(), &config("ita_date", SortDirection::Asc));
        assert_eq!(ids(&asc), vec![2, 4, 1, 3]);
        let desc = sort_records(records.iter().collect(), &config("ita_date", SortDirection::Desc));
        assert_eq!(ids(&desc), vec![1, 4, 2, 3]);
    }

    #[test]
    fn sorting_is_stable_and_repeatable() {
        let mut records = sample();
        records.push(with_ita(6, "fay", Some("2024-03-01")));
        let cfg = config("ita_date", SortDirection::Asc);

        let once = sort_records(records.iter().collect(), &cfg);
        let twice = sort_records(once.clone(), &cfg);
        assert_eq!(once, twice);
        // equal dates keep input order
        let pos = |id| once.iter().position(|r| r.id == id).unwrap();
        assert!(pos(1) < pos(6));
    }

    #[test]
    fn unknown_keys_keep_input_order() {
        let records = sample();
        let sorted = sort_records(records.iter().collect(), &config("notes", SortDirection::Desc));
        assert_eq!(ids(&sorted), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn parses_sort_fields() {
        assert_eq!(SortField::parse("aor_date"), Some(SortField::Date(Milestone::Aor)));
        assert_eq!(SortField::parse("username"), Some(SortField::Text(TextField::Username)));
        assert_eq!(SortField::parse("bogus"), None);
        assert_eq!(SortField::Date(Milestone::PrCardReceived).key(), "pr_card_received_date");
    }

    #[test]
    fn toggling() {
        let start = SortConfig::default();
        let flipped = toggle_sort(&start, "ita_date");
        assert_eq!(flipped, config("ita_date", SortDirection::Desc));
        assert_eq!(toggle_sort(&flipped, "ita_date"), config("ita_date", SortDirection::Asc));
        assert_eq!(toggle_sort(&flipped, "username"), config("username", SortDirection::Asc));
        assert_eq!(SortDirection::Desc.flipped(), SortDirection::Asc);
    }

    #[test]
    fn pages_concatenate_to_the_full_list() {
        let records: Vec<TimelineRecord> = (1..=123)
            .map(|i| with_ita(i, &format!("user{i}"), Some(&format!("2024-01-{:02}", i % 28 + 1))))
            .collect();
        let sorted = sort_records(records.iter().collect(), &SortConfig::default());

        assert_eq!(page_count(sorted.len()), 3);
        let mut joined = Vec::new();
        for n in 1..=3 {
            let page = paginate(&sorted, n);
            assert_eq!(page.total_pages, 3);
            assert_eq!(page.total, 123);
            joined.extend(page.items);
        }
        assert_eq!(joined, sorted);

        let last = paginate(&sorted, 3);
        assert_eq!(last.items.len(), 23);
        assert_eq!((last.first_row(), last.last_row()), (101, 123));
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let records = sample();
        let sorted: Vec<&TimelineRecord> = records.iter().collect();
        assert!(paginate(&sorted, 0).items.is_empty());
        assert!(paginate(&sorted, 2).items.is_empty());
        assert_eq!(paginate(&sorted, 1).items.len(), 5);
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(50), 1);
        assert_eq!(page_count(51), 2);
    }
}
