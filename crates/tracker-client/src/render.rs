//! Plain-text rendering of pages, timelines and comment threads.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use tracker_core::computed::{Badges, badges};
use tracker_core::format::{calculate_days, format_date, format_relative_time};
use tracker_types::api::{Facets, PageResponse};
use tracker_types::{Comment, CommentThread, Milestone, TimelineRecord, UserComment};

const COLUMNS: [(&str, usize); 8] = [
    ("ID", 6),
    ("USERNAME", 18),
    ("STREAM", 10),
    ("OFFICE", 12),
    ("ITA", 10),
    ("AOR", 10),
    ("AOR->eCOPR", 10),
    ("FLAGS", 0),
];

fn cell(value: &str, width: usize) -> String {
    if width == 0 {
        return value.to_string();
    }
    let truncated: String = value.chars().take(width).collect();
    format!("{truncated:<width$} ")
}

fn flags(b: &Badges) -> String {
    let mut out = Vec::new();
    if b.is_claimed {
        out.push("claimed");
    }
    if b.has_ecopr {
        out.push("ecopr");
    }
    if b.has_pr_card {
        out.push("pr-card");
    }
    if b.both_checks_complete {
        out.push("checks-done");
    }
    if b.updated_today {
        out.push("updated-today");
    } else if b.is_recently_updated {
        out.push("recent");
    }
    out.join(",")
}

pub fn page_table(page: &PageResponse, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let header: String = COLUMNS.iter().map(|(name, w)| cell(name, *w)).collect();
    let _ = writeln!(out, "{}", header.trim_end());

    for record in &page.items {
        let row = [
            record.id.to_string(),
            record.username.clone(),
            record.details.stream.clone().unwrap_or_default(),
            record.details.primary_visa_office.clone().unwrap_or_default(),
            format_date(record.milestone(Milestone::Ita)),
            format_date(record.milestone(Milestone::Aor)),
            calculate_days(
                record.milestone(Milestone::Aor),
                record.milestone(Milestone::EcoprReceived),
            ),
            flags(&badges(record, now)),
        ];
        let line: String = row
            .iter()
            .zip(COLUMNS)
            .map(|(value, (_, w))| cell(value, w))
            .collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let first = if page.items.is_empty() {
        0
    } else {
        (page.page - 1) * page.per_page + 1
    };
    let last = (first + page.items.len()).saturating_sub(1);
    let _ = write!(
        out,
        "Rows {}-{} of {} | page {}/{}",
        first,
        last,
        page.total,
        page.page,
        page.total_pages.max(1)
    );
    out
}

pub fn facets(facets: &Facets) -> String {
    let mut out = String::new();
    for (label, values) in [("Streams", &facets.streams), ("Visa offices", &facets.visa_offices)] {
        let list = if values.is_empty() { "-".to_string() } else { values.join(", ") };
        let _ = writeln!(out, "{label:<14}{list}");
    }
    out
}

pub fn timeline_detail(record: &TimelineRecord, can_edit: bool, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", record.id, record.username);

    let d = &record.details;
    for (label, value) in [
        ("Stream", &d.stream),
        ("Type", &d.application_type),
        ("Complexity", &d.complexity),
        ("Visa office", &d.primary_visa_office),
        ("Secondary office", &d.secondary_visa_office),
        ("Country", &d.country),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            let _ = writeln!(out, "  {label:<18}{value}");
        }
    }

    let _ = writeln!(out);
    for milestone in Milestone::ALL {
        let _ = writeln!(
            out,
            "  {:<28}{}",
            milestone.label(),
            format_date(record.milestone(milestone))
        );
    }
    let _ = writeln!(
        out,
        "  {:<28}{}",
        "ITA to eCOPR",
        calculate_days(
            record.milestone(Milestone::Ita),
            record.milestone(Milestone::EcoprReceived)
        )
    );

    if let Some(notes) = record.notes.as_deref().filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "\n  Notes: {notes}");
    }
    if let Some(at) = record.last_updated_by_user.as_deref() {
        let _ = writeln!(out, "  Updated by owner {}", format_relative_time(Some(at), now));
    }

    let flags = flags(&badges(record, now));
    if !flags.is_empty() {
        let _ = writeln!(out, "  [{flags}]");
    }
    if can_edit {
        let _ = writeln!(out, "  You can edit this timeline.");
    }
    out
}

fn comment_line(out: &mut String, comment: &Comment, indent: &str, now: DateTime<Utc>) {
    let owner = if comment.is_timeline_owner { " (owner)" } else { "" };
    let at = comment.created_at.to_rfc3339();
    let _ = writeln!(
        out,
        "{indent}#{} {}{} {}",
        comment.id,
        comment.commenter_username,
        owner,
        format_relative_time(Some(&at), now)
    );
    for line in comment.comment_text.lines() {
        let _ = writeln!(out, "{indent}  {line}");
    }
}

pub fn comment_threads(threads: &[CommentThread], now: DateTime<Utc>) -> String {
    if threads.is_empty() {
        return "No comments yet.\n".into();
    }
    let mut out = String::new();
    for thread in threads {
        comment_line(&mut out, &thread.comment, "", now);
        for reply in &thread.replies {
            comment_line(&mut out, reply, "    ", now);
        }
    }
    out
}

pub fn user_comments(history: &[UserComment], now: DateTime<Utc>) -> String {
    if history.is_empty() {
        return "No comments yet.\n".into();
    }
    let mut out = String::new();
    for entry in history {
        let on = entry
            .timeline
            .as_ref()
            .map(|t| format!("{} (#{})", t.username, t.id))
            .unwrap_or_else(|| format!("#{}", entry.comment.timeline_id));
        let _ = writeln!(out, "On {on}, {} replies", entry.reply_count);
        comment_line(&mut out, &entry.comment, "  ", now);
    }
    out
}
