use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::warn;
use yatube_common::{model::ModelValidationError, snowflake::SnowflakeTimestampFromDateTimeError};

/// Names of the constraints declared in the migrations. The in-memory store
/// reports violations under the same names.
pub mod constraint {
    pub const USER_PKEY: &str = "users_pkey";
    pub const GROUP_PKEY: &str = "groups_pkey";
    pub const POST_PKEY: &str = "posts_pkey";
    pub const COMMENT_PKEY: &str = "comments_pkey";
    pub const FOLLOW_PKEY: &str = "follows_pkey";
    pub const USER_HANDLE_UNIQUE: &str = "users_handle_unique";
    pub const GROUP_SLUG_UNIQUE: &str = "groups_slug_unique";
    pub const POST_GROUP_FK: &str = "posts_group_fk";
    pub const POST_AUTHOR_FK: &str = "posts_author_fk";
    pub const COMMENT_POST_FK: &str = "comments_post_fk";
    pub const COMMENT_AUTHOR_FK: &str = "comments_author_fk";
    pub const FOLLOW_USER_FK: &str = "follows_user_fk";
    pub const FOLLOW_FOLLOWING_FK: &str = "follows_following_fk";
    pub const UNIQUE_USER_FOLLOWING: &str = "unique_user_following";
}

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Write rejected: {0}")]
    Constraint(ConstraintViolation),
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Could not generate an id: {0}")]
    Snowflake(#[from] SnowflakeTimestampFromDateTimeError),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ConstraintViolation {
    #[error("duplicate value for unique constraint {}", display_name(.constraint))]
    Unique { constraint: Option<String> },
    #[error("referenced row missing for foreign key {}", display_name(.constraint))]
    ForeignKey { constraint: Option<String> },
    #[error("required value missing ({})", display_name(.constraint))]
    NotNull { constraint: Option<String> },
    #[error("check constraint {} failed", display_name(.constraint))]
    Check { constraint: Option<String> },
}

fn display_name(constraint: &Option<String>) -> &str {
    constraint.as_deref().unwrap_or("<unnamed>")
}

impl ConstraintViolation {
    pub(crate) fn unique(constraint: &str) -> Self {
        Self::Unique {
            constraint: Some(constraint.to_owned()),
        }
    }

    pub(crate) fn foreign_key(constraint: &str) -> Self {
        Self::ForeignKey {
            constraint: Some(constraint.to_owned()),
        }
    }

    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::Unique { constraint }
            | Self::ForeignKey { constraint }
            | Self::NotNull { constraint }
            | Self::Check { constraint } => constraint.as_deref(),
        }
    }
}

impl DbError {
    #[must_use]
    pub fn constraint_violation(&self) -> Option<&ConstraintViolation> {
        match self {
            Self::Constraint(violation) => Some(violation),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(
            self.constraint_violation(),
            Some(violation @ ConstraintViolation::Unique { .. })
                if violation.constraint() == Some(constraint)
        )
    }

    #[must_use]
    pub fn is_foreign_key_violation(&self, constraint: &str) -> bool {
        matches!(
            self.constraint_violation(),
            Some(violation @ ConstraintViolation::ForeignKey { .. })
                if violation.constraint() == Some(constraint)
        )
    }
}

impl From<ConstraintViolation> for DbError {
    fn from(violation: ConstraintViolation) -> Self {
        warn!(%violation, "Rejecting write");
        Self::Constraint(violation)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().map(str::to_owned);
            let violation = match db_err.kind() {
                ErrorKind::UniqueViolation => Some(ConstraintViolation::Unique { constraint }),
                ErrorKind::ForeignKeyViolation => {
                    Some(ConstraintViolation::ForeignKey { constraint })
                }
                ErrorKind::NotNullViolation => Some(ConstraintViolation::NotNull { constraint }),
                ErrorKind::CheckViolation => Some(ConstraintViolation::Check { constraint }),
                _ => None,
            };

            if let Some(violation) = violation {
                return violation.into();
            }
        }

        Self::Sqlx(err)
    }
}
