//! Comment submission.
//!
//! A visitor fills in name, email and comment; a hidden `_id` field carries
//! the target article. Submission is a small state machine:
//!
//! ```text
//!            validation fails / transport fails
//!              ┌──────────┐
//!              ▼          │
//!          Awaiting ──────┘
//!              │ endpoint accepted the draft
//!              ▼
//!        Acknowledged   (terminal for the page's lifetime)
//! ```
//!
//! Validation failures list every empty field at once. Transport failures
//! are logged and put the form back to `Awaiting` with nothing shown to the
//! visitor, so "never submitted" and "submission failed" look the same.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Submission endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// A submission draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub comment: String,
}

/// A required form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Comment,
}

impl Field {
    pub const REQUIRED: [Field; 3] = [Field::Name, Field::Email, Field::Comment];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Comment => "Comment",
        }
    }

    /// Inline message shown when the field is empty.
    pub fn required_message(self) -> String {
        format!("- {} Field is required", self.label())
    }

    fn value(self, input: &FormInput) -> &str {
        match self {
            Field::Name => &input.name,
            Field::Email => &input.email,
            Field::Comment => &input.comment,
        }
    }
}

/// Every required field that is empty or whitespace, in form order.
pub fn validate(input: &FormInput) -> Vec<Field> {
    Field::REQUIRED
        .into_iter()
        .filter(|f| f.value(input).trim().is_empty())
        .collect()
}

/// Where valid drafts are sent.
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn post(&self, draft: &FormInput) -> Result<(), SubmitError>;
}

/// Posts drafts as JSON to the configured endpoint.
pub struct HttpCommentSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCommentSink {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl CommentSink for HttpCommentSink {
    async fn post(&self, draft: &FormInput) -> Result<(), SubmitError> {
        let response = self.client.post(&self.endpoint).json(draft).send().await?;
        if !response.status().is_success() {
            return Err(SubmitError::Status(response.status()));
        }
        Ok(())
    }
}

/// Comment-area state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentAreaState {
    /// Form visible.
    #[default]
    Awaiting,
    /// Form hidden, thank-you message visible.
    Acknowledged,
}

/// What one submit attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Invalid(Vec<Field>),
    Submitted,
    TransportFailed,
}

/// Form controller: current state, inline errors, and the values to refill.
#[derive(Debug, Clone, Default)]
pub struct CommentForm {
    state: CommentAreaState,
    errors: Vec<Field>,
    draft: FormInput,
}

impl CommentForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CommentAreaState {
        self.state
    }

    pub fn submitted(&self) -> bool {
        self.state == CommentAreaState::Acknowledged
    }

    pub fn errors(&self) -> &[Field] {
        &self.errors
    }

    /// Values to show in the inputs when the form is re-rendered.
    pub fn draft(&self) -> &FormInput {
        &self.draft
    }

    /// Validate and send a draft. Never returns an error: transport problems
    /// are logged and leave the form awaiting input.
    pub async fn submit(&mut self, input: FormInput, sink: &dyn CommentSink) -> SubmitOutcome {
        if self.submitted() {
            return SubmitOutcome::Submitted;
        }

        let missing = validate(&input);
        if !missing.is_empty() {
            self.errors = missing.clone();
            self.draft = input;
            return SubmitOutcome::Invalid(missing);
        }
        self.errors.clear();

        match sink.post(&input).await {
            Ok(()) => {
                tracing::info!(article_id = %input.id, "comment submitted for moderation");
                self.state = CommentAreaState::Acknowledged;
                self.draft = FormInput::default();
                SubmitOutcome::Submitted
            }
            Err(e) => {
                tracing::warn!(article_id = %input.id, error = %e, "comment submission failed");
                self.state = CommentAreaState::Awaiting;
                self.draft = input;
                SubmitOutcome::TransportFailed
            }
        }
    }
}
