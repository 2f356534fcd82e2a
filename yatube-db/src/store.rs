use crate::error::Result;
use yatube_common::model::{
    Id,
    comment::{Comment, CommentMarker, CommentText},
    follow::{Follow, FollowMarker},
    group::{Group, GroupContent, GroupMarker, GroupSlug},
    post::{PartialPost, Post, PostContent, PostMarker},
    user::{CreateUser, User, UserHandle, UserMarker},
};

/// Create/read/update/delete access to the content model.
///
/// Implementations enforce the same rules:
/// - deleting a group detaches its posts (`group` becomes `None`)
/// - deleting a user deletes their posts, comments and follow edges in both
///   directions
/// - deleting a post deletes its comments
/// - `(user, following)` pairs, group slugs and user handles are unique
/// - writes referencing missing rows fail with a foreign key violation
///
/// Updates and deletes of rows that do not exist return `None`/`false`.
pub trait ContentStore: Send + Sync {
    fn create_user(&self, user: &CreateUser) -> impl Future<Output = Result<User>> + Send;

    fn fetch_user(&self, user_id: Id<UserMarker>)
    -> impl Future<Output = Result<Option<User>>> + Send;

    fn fetch_user_by_handle(
        &self,
        handle: &UserHandle,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    fn delete_user(&self, user_id: Id<UserMarker>) -> impl Future<Output = Result<bool>> + Send;

    fn create_group(&self, group: &GroupContent) -> impl Future<Output = Result<Group>> + Send;

    fn fetch_group(
        &self,
        group_id: Id<GroupMarker>,
    ) -> impl Future<Output = Result<Option<Group>>> + Send;

    fn fetch_group_by_slug(
        &self,
        slug: &GroupSlug,
    ) -> impl Future<Output = Result<Option<Group>>> + Send;

    /// All groups, ordered by title compared byte-wise (uppercase before
    /// lowercase), independent of the database collation.
    fn fetch_groups(&self) -> impl Future<Output = Result<Vec<Group>>> + Send;

    fn update_group(
        &self,
        group_id: Id<GroupMarker>,
        group: &GroupContent,
    ) -> impl Future<Output = Result<Option<Group>>> + Send;

    fn delete_group(&self, group_id: Id<GroupMarker>)
    -> impl Future<Output = Result<bool>> + Send;

    /// Stamps the post's `pub_date` with the current time.
    fn create_post(
        &self,
        post: &PostContent,
        author: Id<UserMarker>,
    ) -> impl Future<Output = Result<Post>> + Send;

    fn fetch_post(&self, post_id: Id<PostMarker>)
    -> impl Future<Output = Result<Option<Post>>> + Send;

    /// All posts, oldest first.
    fn fetch_posts(&self) -> impl Future<Output = Result<Vec<Post>>> + Send;

    /// Posts filed under the group, oldest first; `None` if the group does
    /// not exist.
    fn fetch_group_posts(
        &self,
        group_id: Id<GroupMarker>,
    ) -> impl Future<Output = Result<Option<Vec<Post>>>> + Send;

    /// Posts by the user, oldest first; `None` if the user does not exist.
    fn fetch_user_posts(
        &self,
        user_id: Id<UserMarker>,
    ) -> impl Future<Output = Result<Option<Vec<PartialPost>>>> + Send;

    /// Replaces text, group and image. `pub_date` and author stay as they were.
    fn update_post(
        &self,
        post_id: Id<PostMarker>,
        post: &PostContent,
    ) -> impl Future<Output = Result<Option<Post>>> + Send;

    fn delete_post(&self, post_id: Id<PostMarker>) -> impl Future<Output = Result<bool>> + Send;

    /// Stamps the comment's `created` with the current time.
    fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        text: &CommentText,
    ) -> impl Future<Output = Result<Comment>> + Send;

    fn fetch_comment(
        &self,
        comment_id: Id<CommentMarker>,
    ) -> impl Future<Output = Result<Option<Comment>>> + Send;

    /// Comments on the post, oldest first; `None` if the post does not exist.
    fn fetch_post_comments(
        &self,
        post_id: Id<PostMarker>,
    ) -> impl Future<Output = Result<Option<Vec<Comment>>>> + Send;

    /// The `limit` newest comments across all posts, newest first.
    fn fetch_recent_comments(&self, limit: u32)
    -> impl Future<Output = Result<Vec<Comment>>> + Send;

    fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        text: &CommentText,
    ) -> impl Future<Output = Result<Option<Comment>>> + Send;

    fn delete_comment(
        &self,
        comment_id: Id<CommentMarker>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Fails with a unique violation if `user` already follows `following`.
    fn create_follow(
        &self,
        user_id: Id<UserMarker>,
        following_id: Id<UserMarker>,
    ) -> impl Future<Output = Result<Follow>> + Send;

    fn fetch_follow(
        &self,
        follow_id: Id<FollowMarker>,
    ) -> impl Future<Output = Result<Option<Follow>>> + Send;

    /// Edges where the user is the follower.
    fn fetch_following(
        &self,
        user_id: Id<UserMarker>,
    ) -> impl Future<Output = Result<Vec<Follow>>> + Send;

    /// Edges where the user is being followed.
    fn fetch_followers(
        &self,
        user_id: Id<UserMarker>,
    ) -> impl Future<Output = Result<Vec<Follow>>> + Send;

    fn delete_follow(
        &self,
        user_id: Id<UserMarker>,
        following_id: Id<UserMarker>,
    ) -> impl Future<Output = Result<bool>> + Send;
}
