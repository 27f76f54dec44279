//! Who may edit a timeline.
//!
//! Ownership is an unauthenticated claim: whoever first attaches an email to
//! an unowned timeline owns it. No confirmation is sent and nothing proves the
//! claimant controls the address. Treat it as a convenience, not a security
//! boundary.

use tracker_types::TimelineRecord;

use crate::error::TrackerError;

/// Claim state of a timeline. The only transition is Unclaimed -> Claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState<'a> {
    Unclaimed,
    Claimed { email: &'a str, verified: bool },
}

impl<'a> ClaimState<'a> {
    pub fn of(record: &'a TimelineRecord) -> Self {
        match record.email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => Self::Claimed {
                email,
                verified: record.email_verified,
            },
            None => Self::Unclaimed,
        }
    }

    pub fn is_claimed(self) -> bool {
        matches!(self, Self::Claimed { .. })
    }
}

pub fn validate_email(email: &str) -> Result<(), TrackerError> {
    if email.trim().contains('@') {
        Ok(())
    } else {
        Err(TrackerError::InvalidEmail)
    }
}

// Another username already verified under this email.
fn email_taken_by_other(username: &str, email: &str, holders: &[TimelineRecord]) -> bool {
    holders
        .iter()
        .any(|h| h.verified_email() == Some(email) && h.username != username)
}

/// Check a claim of `target` by `email`. `holders` are the records currently
/// stored under that email.
pub fn authorize_claim(
    target: &TimelineRecord,
    email: &str,
    holders: &[TimelineRecord],
) -> Result<(), TrackerError> {
    validate_email(email)?;

    if ClaimState::of(target).is_claimed() {
        return Err(TrackerError::AlreadyClaimed);
    }
    if email_taken_by_other(&target.username, email, holders) {
        return Err(TrackerError::EmailInUse);
    }
    Ok(())
}

/// Check a new submission. The email is optional; when present it follows
/// the same exclusivity rule as a claim.
pub fn authorize_submission(
    username: &str,
    email: Option<&str>,
    holders: &[TimelineRecord],
) -> Result<(), TrackerError> {
    if username.trim().is_empty() {
        return Err(TrackerError::MissingUsername);
    }
    if let Some(email) = email.filter(|e| !e.is_empty()) {
        validate_email(email)?;
        if email_taken_by_other(username.trim(), email, holders) {
            return Err(TrackerError::EmailInUse);
        }
    }
    Ok(())
}

/// Only the verified owner email may change a timeline.
pub fn authorize_update(record: &TimelineRecord, email: &str) -> Result<(), TrackerError> {
    if record.verified_email() == Some(email) {
        Ok(())
    } else {
        Err(TrackerError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::record;

    fn claimed(id: i64, username: &str, email: &str) -> TimelineRecord {
        let mut r = record(id, username);
        r.email = Some(email.into());
        r.email_verified = true;
        r
    }

    #[test]
    fn claim_state_follows_email() {
        let open = record(1, "a");
        assert_eq!(ClaimState::of(&open), ClaimState::Unclaimed);

        let mut blank = record(2, "b");
        blank.email = Some(String::new());
        assert_eq!(ClaimState::of(&blank), ClaimState::Unclaimed);

        let taken = claimed(3, "c", "c@x.com");
        assert_eq!(
            ClaimState::of(&taken),
            ClaimState::Claimed {
                email: "c@x.com",
                verified: true
            }
        );
    }

    #[test]
    fn claims_only_unowned_timelines() {
        let open = record(1, "alice");
        assert_eq!(authorize_claim(&open, "a@x.com", &[]), Ok(()));

        let taken = claimed(2, "bob", "b@x.com");
        assert_eq!(
            authorize_claim(&taken, "a@x.com", &[]),
            Err(TrackerError::AlreadyClaimed)
        );
        assert_eq!(
            authorize_claim(&taken, "b@x.com", &[taken.clone()]),
            Err(TrackerError::AlreadyClaimed)
        );
    }

    #[test]
    fn email_cannot_span_usernames() {
        let open = record(1, "alice");
        let other = claimed(2, "bob", "a@x.com");
        assert_eq!(
            authorize_claim(&open, "a@x.com", &[other]),
            Err(TrackerError::EmailInUse)
        );

        // same username on another timeline is fine
        let sibling = claimed(3, "alice", "a@x.com");
        assert_eq!(authorize_claim(&open, "a@x.com", &[sibling]), Ok(()));

        // an unverified holder does not block
        let mut pending = claimed(4, "bob", "a@x.com");
        pending.email_verified = false;
        assert_eq!(authorize_claim(&open, "a@x.com", &[pending]), Ok(()));
    }

    #[test]
    fn claim_requires_an_email() {
        let open = record(1, "alice");
        assert_eq!(
            authorize_claim(&open, "alice", &[]),
            Err(TrackerError::InvalidEmail)
        );
    }

    #[test]
    fn submissions() {
        assert_eq!(authorize_submission("  ", None, &[]), Err(TrackerError::MissingUsername));
        assert_eq!(authorize_submission("alice", None, &[]), Ok(()));
        assert_eq!(authorize_submission("alice", Some(""), &[]), Ok(()));
        assert_eq!(
            authorize_submission("alice", Some("nope"), &[]),
            Err(TrackerError::InvalidEmail)
        );
        let other = claimed(2, "bob", "a@x.com");
        assert_eq!(
            authorize_submission("alice", Some("a@x.com"), &[other]),
            Err(TrackerError::EmailInUse)
        );
    }

    #[test]
    fn updates_need_the_verified_owner() {
        let owned = claimed(1, "alice", "a@x.com");
        assert_eq!(authorize_update(&owned, "a@x.com"), Ok(()));
        assert_eq!(authorize_update(&owned, "b@x.com"), Err(TrackerError::NotAuthorized));

        let mut unverified = owned.clone();
        unverified.email_verified = false;
        assert_eq!(authorize_update(&unverified, "a@x.com"), Err(TrackerError::NotAuthorized));
        assert_eq!(authorize_update(&record(2, "x"), ""), Err(TrackerError::NotAuthorized));
    }
}
