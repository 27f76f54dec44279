use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use tracker_types::TimelineRecord;

use crate::storage::DeviceStorage;

pub const IDENTITY_KEY: &str = "immigration_timeline_user";

/// Who this device says it is. Nothing here is authenticated: it is whatever
/// the last claim or submission on this device recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, rename = "claimedTimelineIds", alias = "claimedTimelines")]
    pub claimed_timeline_ids: Vec<i64>,
}

impl LocalIdentity {
    fn normalized(mut self) -> Self {
        self.email = self.email.filter(|e| !e.is_empty());
        self.username = self.username.filter(|u| !u.is_empty());
        self
    }
}

fn last_viewed_key(timeline_id: i64) -> String {
    format!("comments_last_viewed_{timeline_id}")
}

/// Device-local identity over an injected [`DeviceStorage`].
///
/// Storage failures never surface to callers: reads behave as if nothing were
/// stored and writes are dropped, so an unavailable device always looks
/// anonymous and can never gain edit rights.
pub struct IdentityStore<S> {
    storage: S,
}

impl<S: DeviceStorage> IdentityStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn user_data(&self) -> Option<LocalIdentity> {
        let raw = match self.storage.get(IDENTITY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Error reading identity: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<LocalIdentity>(&raw) {
            Ok(identity) => Some(identity.normalized()),
            Err(e) => {
                warn!("Stored identity is unreadable: {}", e);
                None
            }
        }
    }

    /// Merge a claim or submission into the stored identity. Empty email or
    /// username values keep what was there; the timeline id is appended once.
    pub fn save_user_data(
        &self,
        email: &str,
        timeline_id: Option<i64>,
        username: &str,
    ) -> Option<LocalIdentity> {
        let mut identity = self.user_data().unwrap_or_default();

        if !email.is_empty() {
            identity.email = Some(email.to_string());
        }
        if !username.is_empty() {
            identity.username = Some(username.to_string());
        }
        if let Some(id) = timeline_id {
            if !identity.claimed_timeline_ids.contains(&id) {
                identity.claimed_timeline_ids.push(id);
            }
        }

        let encoded = match serde_json::to_string(&identity) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Error encoding identity: {}", e);
                return None;
            }
        };
        match self.storage.set(IDENTITY_KEY, &encoded) {
            Ok(()) => Some(identity),
            Err(e) => {
                warn!("Error saving identity: {}", e);
                None
            }
        }
    }

    pub fn has_claimed(&self, timeline_id: i64) -> bool {
        self.user_data()
            .is_some_and(|identity| identity.claimed_timeline_ids.contains(&timeline_id))
    }

    pub fn user_email(&self) -> Option<String> {
        self.user_data().and_then(|identity| identity.email)
    }

    pub fn claimed_ids(&self) -> Vec<i64> {
        self.user_data()
            .map(|identity| identity.claimed_timeline_ids)
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(IDENTITY_KEY) {
            warn!("Error clearing identity: {}", e);
        }
    }

    /// Whether to offer edit controls for `record`. Requires a stored email;
    /// then either the record is verified to that email or this device
    /// claimed it. Advisory only: the server re-checks ownership on update.
    pub fn can_edit(&self, record: &TimelineRecord) -> bool {
        let Some(identity) = self.user_data() else {
            return false;
        };
        let Some(email) = identity.email.as_deref() else {
            return false;
        };

        record.verified_email() == Some(email) || identity.claimed_timeline_ids.contains(&record.id)
    }

    pub fn mark_comments_viewed(&self, timeline_id: i64, now: DateTime<Utc>) {
        let key = last_viewed_key(timeline_id);
        if let Err(e) = self.storage.set(&key, &now.to_rfc3339()) {
            warn!("Error marking comments as viewed: {}", e);
        }
    }

    pub fn last_viewed_comments(&self, timeline_id: i64) -> Option<DateTime<Utc>> {
        let key = last_viewed_key(timeline_id);
        match self.storage.get(&key) {
            Ok(Some(raw)) => DateTime::parse_from_rfc3339(&raw)
                .map(|at| at.with_timezone(&Utc))
                .map_err(|e| warn!("Unreadable last-viewed time '{}': {}", raw, e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Error getting last viewed time: {}", e);
                None
            }
        }
    }
}
