use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fourteen dated steps of a permanent residence application, in the
/// order they normally happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Milestone {
    /// Invitation to Apply
    #[serde(rename = "ita_date")]
    Ita,
    /// Acknowledgment of Receipt
    #[serde(rename = "aor_date")]
    Aor,
    #[serde(rename = "bio_req_date")]
    BiometricsRequest,
    #[serde(rename = "medical_date")]
    Medical,
    #[serde(rename = "eligibility_check")]
    EligibilityCheck,
    #[serde(rename = "eligibility_completion_date")]
    EligibilityCompletion,
    #[serde(rename = "bg_check")]
    BackgroundCheck,
    #[serde(rename = "bg_completion_date")]
    BackgroundCompletion,
    #[serde(rename = "final_decision_date")]
    FinalDecision,
    /// Passport request (PPR / P1)
    #[serde(rename = "ppr_p1_date")]
    PassportRequest,
    /// Passport sent (P2)
    #[serde(rename = "p2_passport_sent_date")]
    PassportSent,
    /// Passport back with the eCOPR
    #[serde(rename = "ecopr_passport_received_date")]
    EcoprReceived,
    #[serde(rename = "pr_card_sent_date")]
    PrCardSent,
    #[serde(rename = "pr_card_received_date")]
    PrCardReceived,
}

impl Milestone {
    pub const ALL: [Milestone; 14] = [
        Self::Ita,
        Self::Aor,
        Self::BiometricsRequest,
        Self::Medical,
        Self::EligibilityCheck,
        Self::EligibilityCompletion,
        Self::BackgroundCheck,
        Self::BackgroundCompletion,
        Self::FinalDecision,
        Self::PassportRequest,
        Self::PassportSent,
        Self::EcoprReceived,
        Self::PrCardSent,
        Self::PrCardReceived,
    ];

    /// Column name, shared by the database schema, the JSON field and the sort key.
    pub fn column(self) -> &'static str {
        match self {
            Self::Ita => "ita_date",
            Self::Aor => "aor_date",
            Self::BiometricsRequest => "bio_req_date",
            Self::Medical => "medical_date",
            Self::EligibilityCheck => "eligibility_check",
            Self::EligibilityCompletion => "eligibility_completion_date",
            Self::BackgroundCheck => "bg_check",
            Self::BackgroundCompletion => "bg_completion_date",
            Self::FinalDecision => "final_decision_date",
            Self::PassportRequest => "ppr_p1_date",
            Self::PassportSent => "p2_passport_sent_date",
            Self::EcoprReceived => "ecopr_passport_received_date",
            Self::PrCardSent => "pr_card_sent_date",
            Self::PrCardReceived => "pr_card_received_date",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ita => "ITA",
            Self::Aor => "AOR",
            Self::BiometricsRequest => "Bio Req",
            Self::Medical => "Medical",
            Self::EligibilityCheck => "Eligibility Start",
            Self::EligibilityCompletion => "Eligibility",
            Self::BackgroundCheck => "Background Start",
            Self::BackgroundCompletion => "Background",
            Self::FinalDecision => "Final Decision",
            Self::PassportRequest => "PPR/P1",
            Self::PassportSent => "P2 Sent",
            Self::EcoprReceived => "eCOPR",
            Self::PrCardSent => "PR Card Sent",
            Self::PrCardReceived => "PR Card",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.column() == column)
    }
}

/// Optional milestone dates as submitted. Values are kept as the text the
/// user entered; parsing happens where ordering or arithmetic needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneDates {
    pub ita_date: Option<String>,
    pub aor_date: Option<String>,
    pub bio_req_date: Option<String>,
    pub medical_date: Option<String>,
    pub eligibility_check: Option<String>,
    pub eligibility_completion_date: Option<String>,
    pub bg_check: Option<String>,
    pub bg_completion_date: Option<String>,
    pub final_decision_date: Option<String>,
    pub ppr_p1_date: Option<String>,
    pub p2_passport_sent_date: Option<String>,
    pub ecopr_passport_received_date: Option<String>,
    pub pr_card_sent_date: Option<String>,
    pub pr_card_received_date: Option<String>,
}

impl MilestoneDates {
    fn slot(&self, milestone: Milestone) -> &Option<String> {
        match milestone {
            Milestone::Ita => &self.ita_date,
            Milestone::Aor => &self.aor_date,
            Milestone::BiometricsRequest => &self.bio_req_date,
            Milestone::Medical => &self.medical_date,
            Milestone::EligibilityCheck => &self.eligibility_check,
            Milestone::EligibilityCompletion => &self.eligibility_completion_date,
            Milestone::BackgroundCheck => &self.bg_check,
            Milestone::BackgroundCompletion => &self.bg_completion_date,
            Milestone::FinalDecision => &self.final_decision_date,
            Milestone::PassportRequest => &self.ppr_p1_date,
            Milestone::PassportSent => &self.p2_passport_sent_date,
            Milestone::EcoprReceived => &self.ecopr_passport_received_date,
            Milestone::PrCardSent => &self.pr_card_sent_date,
            Milestone::PrCardReceived => &self.pr_card_received_date,
        }
    }

    fn slot_mut(&mut self, milestone: Milestone) -> &mut Option<String> {
        match milestone {
            Milestone::Ita => &mut self.ita_date,
            Milestone::Aor => &mut self.aor_date,
            Milestone::BiometricsRequest => &mut self.bio_req_date,
            Milestone::Medical => &mut self.medical_date,
            Milestone::EligibilityCheck => &mut self.eligibility_check,
            Milestone::EligibilityCompletion => &mut self.eligibility_completion_date,
            Milestone::BackgroundCheck => &mut self.bg_check,
            Milestone::BackgroundCompletion => &mut self.bg_completion_date,
            Milestone::FinalDecision => &mut self.final_decision_date,
            Milestone::PassportRequest => &mut self.ppr_p1_date,
            Milestone::PassportSent => &mut self.p2_passport_sent_date,
            Milestone::EcoprReceived => &mut self.ecopr_passport_received_date,
            Milestone::PrCardSent => &mut self.pr_card_sent_date,
            Milestone::PrCardReceived => &mut self.pr_card_received_date,
        }
    }

    /// The stored value, with empty strings treated as absent.
    pub fn get(&self, milestone: Milestone) -> Option<&str> {
        self.slot(milestone).as_deref().filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, milestone: Milestone, value: Option<String>) {
        *self.slot_mut(milestone) = value;
    }

    /// Raw value including empty strings; used when applying patches.
    pub fn raw(&self, milestone: Milestone) -> Option<&String> {
        self.slot(milestone).as_ref()
    }
}

/// Categorical description of the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseDetails {
    /// Program category, e.g. CEC, FSW, PNP.
    pub stream: Option<String>,
    /// Inland or Outland.
    pub application_type: Option<String>,
    pub complexity: Option<String>,
    pub primary_visa_office: Option<String>,
    pub secondary_visa_office: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Imported in bulk by an operator; starts without an owner.
    #[default]
    Seed,
    UserSubmission,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::UserSubmission => "user_submission",
        }
    }

    /// Anything other than a user submission is treated as seeded data.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("user_submission") => Self::UserSubmission,
            _ => Self::Seed,
        }
    }
}

/// One community-reported immigration case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub username: String,
    #[serde(flatten)]
    pub dates: MilestoneDates,
    #[serde(flatten)]
    pub details: CaseDetails,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ircc_last_update: Option<String>,
    /// Timestamp of the owner's most recent edit.
    #[serde(default)]
    pub last_updated_by_user: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub data_source: DataSource,
}

impl TimelineRecord {
    pub fn milestone(&self, milestone: Milestone) -> Option<&str> {
        self.dates.get(milestone)
    }

    /// The owner email, only when it has been verified.
    pub fn verified_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .filter(|e| self.email_verified && !e.is_empty())
    }
}

/// A reply on a timeline. Replies nest one level at most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub timeline_id: i64,
    pub commenter_email: String,
    pub commenter_username: String,
    pub comment_text: String,
    #[serde(default)]
    pub parent_comment_id: Option<i64>,
    /// Whether the commenter owned the timeline when the comment was posted.
    pub is_timeline_owner: bool,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A top-level comment with its direct replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplySummary {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub commenter_username: String,
}

/// A comment in a user's history, with the timeline it was left on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub timeline: Option<TimelineRecord>,
    pub reply_count: usize,
    pub replies: Vec<ReplySummary>,
}
