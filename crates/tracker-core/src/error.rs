use thiserror::Error;

/// Rejections raised by the domain rules. The display strings are shown to
/// users as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("Timeline not found")]
    TimelineNotFound,

    #[error("This timeline has already been claimed")]
    AlreadyClaimed,

    #[error("This email is already in use by another timeline.")]
    EmailInUse,

    #[error("Not authorized to edit this timeline")]
    NotAuthorized,

    #[error("Valid email is required")]
    InvalidEmail,

    #[error("Username is required")]
    MissingUsername,

    #[error("Comment cannot be empty")]
    EmptyComment,

    #[error("Comment must be less than {max} characters")]
    CommentTooLong { max: usize },

    #[error("Replies can only be posted to a top-level comment on the same timeline")]
    InvalidParentComment,
}

impl TrackerError {
    /// Input problems, as opposed to conflicts with stored state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail
                | Self::MissingUsername
                | Self::EmptyComment
                | Self::CommentTooLong { .. }
                | Self::InvalidParentComment
        )
    }
}
