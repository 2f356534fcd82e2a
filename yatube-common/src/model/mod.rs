pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
mod text;
pub mod user;

use crate::{
    model::{
        comment::InvalidCommentTextError,
        group::{InvalidGroupDescriptionError, InvalidGroupSlugError, InvalidGroupTitleError},
        post::{InvalidImagePathError, InvalidPostTextError},
        user::InvalidUserHandleError,
    },
    snowflake::{Epoch, Snowflake, SnowflakeGenerator},
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;
use time::{UtcDateTime, macros::utc_datetime};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    UserHandle(#[from] InvalidUserHandleError),
    #[error(transparent)]
    GroupTitle(#[from] InvalidGroupTitleError),
    #[error(transparent)]
    GroupSlug(#[from] InvalidGroupSlugError),
    #[error(transparent)]
    GroupDescription(#[from] InvalidGroupDescriptionError),
    #[error(transparent)]
    PostText(#[from] InvalidPostTextError),
    #[error(transparent)]
    ImagePath(#[from] InvalidImagePathError),
    #[error(transparent)]
    CommentText(#[from] InvalidCommentTextError),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct YatubeEpoch;
impl Epoch for YatubeEpoch {
    const EPOCH_TIME: UtcDateTime = utc_datetime!(2025-01-01 00:00);
}

pub type YatubeSnowflake = Snowflake<YatubeEpoch>;
pub type YatubeSnowflakeGenerator = SnowflakeGenerator<YatubeEpoch>;

/// Id of an entity, tagged with the entity kind so ids of different tables
/// cannot be mixed up.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(YatubeSnowflake, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(snowflake: YatubeSnowflake) -> Self {
        Self(snowflake, PhantomData)
    }

    #[must_use]
    pub fn snowflake(self) -> YatubeSnowflake {
        self.0
    }

    /// The id as stored in a Postgres `BIGINT` column.
    #[must_use]
    pub fn to_db(self) -> i64 {
        self.0.get().cast_signed()
    }

    #[must_use]
    pub fn from_db(value: i64) -> Self {
        value.cast_unsigned().into()
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<YatubeSnowflake> for Id<Marker> {
    fn from(value: YatubeSnowflake) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for YatubeSnowflake {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(YatubeSnowflake::new(value))
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.snowflake().get()
    }
}
