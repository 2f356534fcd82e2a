use sqlx::FromRow;
use time::{PrimitiveDateTime, UtcDateTime};
use yatube_common::model::{
    Id, ModelValidationError,
    comment::{Comment, CommentText},
    follow::Follow,
    group::{Group, GroupDescription, GroupSlug, GroupTitle},
    post::{ImagePath, PartialPost, Post, PostText},
    user::{User, UserHandle},
};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_snowflake: i64,
    pub handle: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct GroupRecord {
    pub group_snowflake: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullPostRecord {
    pub post_snowflake: i64,
    pub text: String,
    pub pub_date: PrimitiveDateTime,
    pub group_snowflake: Option<i64>,
    pub image: Option<String>,
    pub user_snowflake: i64,
    pub handle: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PartialPostRecord {
    pub post_snowflake: i64,
    pub text: String,
    pub pub_date: PrimitiveDateTime,
    pub group_snowflake: Option<i64>,
    pub image: Option<String>,
    pub user_snowflake: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_snowflake: i64,
    pub post_snowflake: i64,
    pub text: String,
    pub created: PrimitiveDateTime,
    pub user_snowflake: i64,
    pub handle: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct FollowRecord {
    pub follow_snowflake: i64,
    pub user_snowflake: i64,
    pub user_handle: String,
    pub following_snowflake: i64,
    pub following_handle: String,
}

/// Postgres `TIMESTAMP` columns hold UTC wall-clock time.
pub(crate) fn to_timestamp(time: UtcDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(time.date(), time.time())
}

fn user(user_snowflake: i64, handle: String) -> Result<User, ModelValidationError> {
    Ok(User {
        id: Id::from_db(user_snowflake),
        handle: UserHandle::new(handle)?,
    })
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        user(value.user_snowflake, value.handle)
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.group_snowflake),
            title: GroupTitle::new(value.title)?,
            slug: GroupSlug::new(value.slug)?,
            description: GroupDescription::new(value.description)?,
        })
    }
}

impl TryFrom<FullPostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: FullPostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.post_snowflake),
            author: user(value.user_snowflake, value.handle)?,
            text: PostText::new(value.text)?,
            pub_date: value.pub_date.as_utc(),
            group: value.group_snowflake.map(Id::from_db),
            image: value.image.map(ImagePath::new).transpose()?,
        })
    }
}

impl TryFrom<PartialPostRecord> for PartialPost {
    type Error = ModelValidationError;

    fn try_from(value: PartialPostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.post_snowflake),
            author_id: Id::from_db(value.user_snowflake),
            text: PostText::new(value.text)?,
            pub_date: value.pub_date.as_utc(),
            group: value.group_snowflake.map(Id::from_db),
            image: value.image.map(ImagePath::new).transpose()?,
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.comment_snowflake),
            author: user(value.user_snowflake, value.handle)?,
            post: Id::from_db(value.post_snowflake),
            text: CommentText::new(value.text)?,
            created: value.created.as_utc(),
        })
    }
}

impl TryFrom<FollowRecord> for Follow {
    type Error = ModelValidationError;

    fn try_from(value: FollowRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.follow_snowflake),
            user: user(value.user_snowflake, value.user_handle)?,
            following: user(value.following_snowflake, value.following_handle)?,
        })
    }
}
