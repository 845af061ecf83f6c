use std::fmt;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = DrawError> = std::result::Result<T, E>;

/// Step of the token exchange that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// Exchanging email and password for a refresh token.
    Refresh,
    /// Exchanging the refresh token for an ID token.
    IdToken,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refresh => write!(f, "refresh"),
            Self::IdToken => write!(f, "id_token"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to fetch object '{key}' from bucket '{bucket}': {source}")]
    Storage {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to parse spreadsheet: {source}")]
    Parse {
        #[source]
        source: BoxError,
    },

    #[error("No values found in column {column}, rows {first_row}..={last_row} of the first sheet")]
    EmptyRange {
        column: u32,
        first_row: u32,
        last_row: u32,
    },

    #[error("Failed to obtain token (stage: {stage}): {reason}{}", cause_suffix(.source))]
    Auth {
        stage: AuthStage,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Failed to fetch company info: {reason}{}", cause_suffix(.source))]
    Api {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("No company information found for code '{code}'")]
    CompanyNotFound { code: String },

    #[error("{message}: {source}")]
    Transport {
        message: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Render an optional cause as `": <cause>"`.
fn cause_suffix(source: &Option<BoxError>) -> String {
    match source {
        Some(cause) => format!(": {cause}"),
        None => String::new(),
    }
}

impl DrawError {
    pub fn config(msg: impl Into<String>) -> Self {
        DrawError::Config(msg.into())
    }

    pub fn parse(source: impl Into<BoxError>) -> Self {
        DrawError::Parse {
            source: source.into(),
        }
    }

    pub fn storage(
        bucket: impl Into<String>,
        key: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        DrawError::Storage {
            bucket: bucket.into(),
            key: key.into(),
            source: source.into(),
        }
    }

    pub fn auth(stage: AuthStage, reason: impl Into<String>) -> Self {
        DrawError::Auth {
            stage,
            reason: reason.into(),
            source: None,
        }
    }

    pub fn api(reason: impl Into<String>) -> Self {
        DrawError::Api {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn transport(message: &'static str, source: impl Into<BoxError>) -> Self {
        DrawError::Transport {
            message,
            source: source.into(),
        }
    }

    /// Attach an underlying cause to an `Auth` or `Api` error.
    ///
    /// Other variants are returned unchanged.
    pub fn with_source(self, cause: impl Into<BoxError>) -> Self {
        match self {
            DrawError::Auth { stage, reason, .. } => DrawError::Auth {
                stage,
                reason,
                source: Some(cause.into()),
            },
            DrawError::Api { reason, .. } => DrawError::Api {
                reason,
                source: Some(cause.into()),
            },
            other => other,
        }
    }

    /// Stage tag if this is an authentication failure.
    pub fn auth_stage(&self) -> Option<AuthStage> {
        match self {
            DrawError::Auth { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
