use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use tracker_types::{Milestone, TimelineRecord};

use crate::format::parse_date;
use crate::ownership::ClaimState;

/// How far back an owner edit still counts as "recently updated".
pub const RECENT_UPDATE_WINDOW_DAYS: i64 = 7;

/// Badges shown next to a timeline row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Badges {
    pub is_claimed: bool,
    pub has_ecopr: bool,
    pub has_pr_card: bool,
    pub eligibility_complete: bool,
    pub background_complete: bool,
    pub both_checks_complete: bool,
    pub updated_today: bool,
    pub is_recently_updated: bool,
}

pub fn badges(record: &TimelineRecord, now: DateTime<Utc>) -> Badges {
    let has = |m| record.milestone(m).is_some();
    let eligibility_complete = has(Milestone::EligibilityCompletion);
    let background_complete = has(Milestone::BackgroundCompletion);

    let last_edit = record
        .last_updated_by_user
        .as_deref()
        .and_then(parse_date)
        .map(|at| at.and_utc());

    Badges {
        is_claimed: ClaimState::of(record).is_claimed(),
        has_ecopr: has(Milestone::EcoprReceived),
        has_pr_card: has(Milestone::PrCardReceived),
        eligibility_complete,
        background_complete,
        both_checks_complete: eligibility_complete && background_complete,
        updated_today: last_edit.is_some_and(|at| at.date_naive() == now.date_naive()),
        is_recently_updated: last_edit.is_some_and(|at| {
            at <= now && now - at <= Duration::days(RECENT_UPDATE_WINDOW_DAYS)
        }),
    }
}
