use chrono::Utc;
use tracing::info;

use tracker_core::comments::unread_count;
use tracker_core::filter::{Filters, filter_value};
use tracker_core::redact::email_fingerprint;
use tracker_core::sort::{paginate, sort_records};
use tracker_core::{DeviceStorage, IdentityStore, LocalIdentity, ViewState};
use tracker_types::api::{
    ClaimResponse, CreateTimelineResponse, MessageResponse, PageResponse, PostCommentRequest,
    TimelineDraft, TimelinePatch,
};
use tracker_types::{Comment, CommentThread, TimelineRecord};

use crate::api::{ClientError, TrackerClient};

/// The API client paired with this device's identity. Successful claims,
/// submissions and updates are remembered locally.
pub struct Session<S> {
    client: TrackerClient,
    identity: IdentityStore<S>,
}

impl<S: DeviceStorage> Session<S> {
    pub fn new(client: TrackerClient, storage: S) -> Self {
        Self {
            client,
            identity: IdentityStore::new(storage),
        }
    }

    pub fn client(&self) -> &TrackerClient {
        &self.client
    }

    pub fn identity(&self) -> &IdentityStore<S> {
        &self.identity
    }

    pub fn whoami(&self) -> Option<LocalIdentity> {
        self.identity.user_data()
    }

    pub fn can_edit(&self, record: &TimelineRecord) -> bool {
        self.identity.can_edit(record)
    }

    pub async fn claim(&self, timeline_id: i64, email: &str) -> Result<ClaimResponse, ClientError> {
        let email = email.trim();
        let resp = self.client.claim_timeline(timeline_id, email).await?;
        self.identity
            .save_user_data(email, Some(timeline_id), &resp.username);
        info!("Claimed timeline {} as {}", timeline_id, email_fingerprint(email));
        Ok(resp)
    }

    pub async fn submit(&self, draft: &TimelineDraft) -> Result<CreateTimelineResponse, ClientError> {
        let resp = self.client.create_timeline(draft).await?;
        if let Some(email) = resp.timeline.verified_email() {
            self.identity
                .save_user_data(email, Some(resp.timeline.id), &resp.timeline.username);
        }
        Ok(resp)
    }

    /// Update a timeline as the stored identity. The server makes the final
    /// ownership decision.
    pub async fn update(&self, timeline_id: i64, patch: &TimelinePatch) -> Result<MessageResponse, ClientError> {
        let email = self.identity.user_email().ok_or(ClientError::NoIdentity)?;
        let resp = self.client.update_timeline(timeline_id, &email, patch).await?;
        self.identity.save_user_data(&email, Some(timeline_id), "");
        Ok(resp)
    }

    /// Post as `email`, or as the stored identity when none is given.
    pub async fn post_comment(
        &self,
        timeline_id: i64,
        email: Option<&str>,
        text: &str,
        parent_comment_id: Option<i64>,
    ) -> Result<Comment, ClientError> {
        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => email.to_string(),
            None => self.identity.user_email().ok_or(ClientError::NoIdentity)?,
        };
        let request = PostCommentRequest {
            email,
            comment_text: text.to_string(),
            parent_comment_id,
        };
        self.client.post_comment(timeline_id, &request).await
    }

    /// Fetch the threads of a timeline and mark them read on this device.
    pub async fn open_comments(&self, timeline_id: i64) -> Result<Vec<CommentThread>, ClientError> {
        let threads = self.client.comments(timeline_id).await?;
        self.identity.mark_comments_viewed(timeline_id, Utc::now());
        Ok(threads)
    }

    pub async fn unread_comments(&self, timeline_id: i64) -> Result<usize, ClientError> {
        let threads = self.client.comments(timeline_id).await?;
        Ok(unread_count(
            &threads,
            self.identity.last_viewed_comments(timeline_id),
        ))
    }

    /// Fetch everything and render one page locally. A malformed listing
    /// shows as an empty table.
    pub async fn view(&self, view: &ViewState) -> Result<PageResponse, ClientError> {
        let payload = self.client.list_timelines_raw().await?;
        let records = filter_value(payload, &Filters::new(&view.filters, &view.search));
        let sorted = sort_records(records.iter().collect(), &view.sort);

        let mut clamped = view.clone();
        let page = clamped.set_page(view.page(), sorted.len());
        Ok(paginate(&sorted, page).to_response())
    }
}
