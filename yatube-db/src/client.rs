use crate::{
    config::DbConfig,
    error::Result,
    record::{
        CommentRecord, FollowRecord, FullPostRecord, GroupRecord, PartialPostRecord, UserRecord,
        to_timestamp,
    },
    store::ContentStore,
};
use sqlx::{PgPool, migrate::Migrator, postgres::PgPoolOptions, query, query_as, query_scalar};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};
use yatube_common::{
    model::{
        Id, YatubeSnowflakeGenerator,
        comment::{Comment, CommentMarker, CommentText},
        follow::{Follow, FollowMarker},
        group::{Group, GroupContent, GroupMarker, GroupSlug},
        post::{ImagePath, PartialPost, Post, PostContent, PostMarker},
        user::{CreateUser, User, UserHandle, UserMarker},
    },
    snowflake::{ProcessId, WorkerId},
    util::now_micros,
};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

macro_rules! select_posts {
    ($with:literal, $from:literal, $tail:literal) => {
        concat!(
            $with,
            "
            SELECT
                posts.post_snowflake,
                posts.text,
                posts.pub_date,
                posts.group_snowflake,
                posts.image,
                users.user_snowflake,
                users.handle
            FROM
                ",
            $from,
            " AS posts
                JOIN users.users AS users ON users.user_snowflake = posts.user_snowflake
            ",
            $tail
        )
    };
}

macro_rules! select_comments {
    ($with:literal, $from:literal, $tail:literal) => {
        concat!(
            $with,
            "
            SELECT
                comments.comment_snowflake,
                comments.post_snowflake,
                comments.text,
                comments.created,
                users.user_snowflake,
                users.handle
            FROM
                ",
            $from,
            " AS comments
                JOIN users.users AS users ON users.user_snowflake = comments.user_snowflake
            ",
            $tail
        )
    };
}

macro_rules! select_follows {
    ($with:literal, $from:literal, $tail:literal) => {
        concat!(
            $with,
            "
            SELECT
                follows.follow_snowflake,
                follower.user_snowflake AS user_snowflake,
                follower.handle AS user_handle,
                followed.user_snowflake AS following_snowflake,
                followed.handle AS following_handle
            FROM
                ",
            $from,
            " AS follows
                JOIN users.users AS follower ON follower.user_snowflake = follows.user_snowflake
                JOIN users.users AS followed ON followed.user_snowflake = follows.following_snowflake
            ",
            $tail
        )
    };
}

/// [`ContentStore`] backed by Postgres. Cascades, nullification and
/// uniqueness are enforced by the schema in `migrations/`.
#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
    snowflake_generator: Mutex<YatubeSnowflakeGenerator>,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, worker_id: WorkerId, process_id: ProcessId) -> Self {
        let snowflake_generator = Mutex::new(YatubeSnowflakeGenerator::new(worker_id, process_id));

        Self {
            pool,
            snowflake_generator,
        }
    }

    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self::new(pool, config.worker_id, config.process_id))
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("Applying database migrations");
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    fn next_snowflake(&self, time: time::UtcDateTime) -> Result<i64> {
        let snowflake = self
            .snowflake_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate_at(time)?;

        Ok(snowflake.get().cast_signed())
    }

    async fn exists(&self, sql: &'static str, snowflake: i64) -> Result<bool> {
        let exists = query_scalar::<_, bool>(sql)
            .bind(snowflake)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}

impl ContentStore for DbClient {
    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let user_snowflake = self.next_snowflake(now_micros())?;

        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users.users (user_snowflake, handle)
            VALUES ($1, $2)
            RETURNING user_snowflake, handle
            ",
        )
        .bind(user_snowflake)
        .bind(user.handle.get())
        .fetch_one(&self.pool)
        .await?;

        let user = User::try_from(record)?;
        debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_snowflake,
                users.handle
            FROM
                users.users
            WHERE
                users.user_snowflake = $1
            ",
        )
        .bind(user_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_snowflake,
                users.handle
            FROM
                users.users
            WHERE
                users.handle = $1
            ",
        )
        .bind(handle.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn delete_user(&self, user_id: Id<UserMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM users.users WHERE user_snowflake = $1")
            .bind(user_id.to_db())
            .execute(&self.pool)
            .await?
            .rows_affected()
            > 0;

        debug!(%user_id, deleted, "Deleted user");
        Ok(deleted)
    }

    async fn create_group(&self, group: &GroupContent) -> Result<Group> {
        let group_snowflake = self.next_snowflake(now_micros())?;

        let record = query_as::<_, GroupRecord>(
            "
            INSERT INTO posts.groups (group_snowflake, title, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING group_snowflake, title, slug, description
            ",
        )
        .bind(group_snowflake)
        .bind(group.title.get())
        .bind(group.slug.get())
        .bind(group.description.get())
        .fetch_one(&self.pool)
        .await?;

        let group = Group::try_from(record)?;
        debug!(group_id = %group.id, slug = %group.slug, "Created group");
        Ok(group)
    }

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT group_snowflake, title, slug, description
            FROM posts.groups
            WHERE group_snowflake = $1
            ",
        )
        .bind(group_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    async fn fetch_group_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT group_snowflake, title, slug, description
            FROM posts.groups
            WHERE slug = $1
            ",
        )
        .bind(slug.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        let records = query_as::<_, GroupRecord>(
            r#"
            SELECT group_snowflake, title, slug, description
            FROM posts.groups
            ORDER BY title COLLATE "C", group_snowflake
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let groups = records
            .into_iter()
            .map(Group::try_from)
            .collect::<Result<_, _>>()?;
        Ok(groups)
    }

    async fn update_group(
        &self,
        group_id: Id<GroupMarker>,
        group: &GroupContent,
    ) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            UPDATE posts.groups
            SET title = $2, slug = $3, description = $4
            WHERE group_snowflake = $1
            RETURNING group_snowflake, title, slug, description
            ",
        )
        .bind(group_id.to_db())
        .bind(group.title.get())
        .bind(group.slug.get())
        .bind(group.description.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        debug!(%group_id, found = group.is_some(), "Updated group");
        Ok(group)
    }

    async fn delete_group(&self, group_id: Id<GroupMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM posts.groups WHERE group_snowflake = $1")
            .bind(group_id.to_db())
            .execute(&self.pool)
            .await?
            .rows_affected()
            > 0;

        debug!(%group_id, deleted, "Deleted group");
        Ok(deleted)
    }

    async fn create_post(&self, post: &PostContent, author: Id<UserMarker>) -> Result<Post> {
        let pub_date = now_micros();
        let post_snowflake = self.next_snowflake(pub_date)?;

        let record = query_as::<_, FullPostRecord>(select_posts!(
            "
            WITH written AS (
                INSERT INTO posts.posts
                    (post_snowflake, text, pub_date, group_snowflake, user_snowflake, image)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            ",
            "written",
            ""
        ))
        .bind(post_snowflake)
        .bind(post.text.get())
        .bind(to_timestamp(pub_date))
        .bind(post.group.map(Id::to_db))
        .bind(author.to_db())
        .bind(post.image.as_ref().map(ImagePath::get))
        .fetch_one(&self.pool)
        .await?;

        let post = Post::try_from(record)?;
        debug!(post_id = %post.id, author_id = %author, "Created post");
        Ok(post)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, FullPostRecord>(select_posts!(
            "",
            "posts.posts",
            "WHERE posts.post_snowflake = $1"
        ))
        .bind(post_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let records = query_as::<_, FullPostRecord>(select_posts!(
            "",
            "posts.posts",
            "ORDER BY posts.pub_date, posts.post_snowflake"
        ))
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_group_posts(&self, group_id: Id<GroupMarker>) -> Result<Option<Vec<Post>>> {
        if !self
            .exists(
                "SELECT EXISTS (SELECT 1 FROM posts.groups WHERE group_snowflake = $1)",
                group_id.to_db(),
            )
            .await?
        {
            return Ok(None);
        }

        let records = query_as::<_, FullPostRecord>(select_posts!(
            "",
            "posts.posts",
            "
            WHERE posts.group_snowflake = $1
            ORDER BY posts.pub_date, posts.post_snowflake
            "
        ))
        .bind(group_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Some(posts))
    }

    async fn fetch_user_posts(&self, user_id: Id<UserMarker>) -> Result<Option<Vec<PartialPost>>> {
        if !self
            .exists(
                "SELECT EXISTS (SELECT 1 FROM users.users WHERE user_snowflake = $1)",
                user_id.to_db(),
            )
            .await?
        {
            return Ok(None);
        }

        let records = query_as::<_, PartialPostRecord>(
            "
            SELECT
                post_snowflake,
                text,
                pub_date,
                group_snowflake,
                image,
                user_snowflake
            FROM
                posts.posts
            WHERE
                user_snowflake = $1
            ORDER BY pub_date, post_snowflake
            ",
        )
        .bind(user_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(PartialPost::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Some(posts))
    }

    async fn update_post(&self, post_id: Id<PostMarker>, post: &PostContent) -> Result<Option<Post>> {
        let record = query_as::<_, FullPostRecord>(select_posts!(
            "
            WITH written AS (
                UPDATE posts.posts
                SET text = $2, group_snowflake = $3, image = $4
                WHERE post_snowflake = $1
                RETURNING *
            )
            ",
            "written",
            ""
        ))
        .bind(post_id.to_db())
        .bind(post.text.get())
        .bind(post.group.map(Id::to_db))
        .bind(post.image.as_ref().map(ImagePath::get))
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        debug!(%post_id, found = post.is_some(), "Updated post");
        Ok(post)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM posts.posts WHERE post_snowflake = $1")
            .bind(post_id.to_db())
            .execute(&self.pool)
            .await?
            .rows_affected()
            > 0;

        debug!(%post_id, deleted, "Deleted post");
        Ok(deleted)
    }

    async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        text: &CommentText,
    ) -> Result<Comment> {
        let created = now_micros();
        let comment_snowflake = self.next_snowflake(created)?;

        let record = query_as::<_, CommentRecord>(select_comments!(
            "
            WITH written AS (
                INSERT INTO posts.comments
                    (comment_snowflake, post_snowflake, user_snowflake, text, created)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            ",
            "written",
            ""
        ))
        .bind(comment_snowflake)
        .bind(post_id.to_db())
        .bind(author.to_db())
        .bind(text.get())
        .bind(to_timestamp(created))
        .fetch_one(&self.pool)
        .await?;

        let comment = Comment::try_from(record)?;
        debug!(comment_id = %comment.id, %post_id, "Created comment");
        Ok(comment)
    }

    async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let record = query_as::<_, CommentRecord>(select_comments!(
            "",
            "posts.comments",
            "WHERE comments.comment_snowflake = $1"
        ))
        .bind(comment_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let comment = record.map(Comment::try_from).transpose()?;
        Ok(comment)
    }

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Option<Vec<Comment>>> {
        if !self
            .exists(
                "SELECT EXISTS (SELECT 1 FROM posts.posts WHERE post_snowflake = $1)",
                post_id.to_db(),
            )
            .await?
        {
            return Ok(None);
        }

        let records = query_as::<_, CommentRecord>(select_comments!(
            "",
            "posts.comments",
            "
            WHERE comments.post_snowflake = $1
            ORDER BY comments.created, comments.comment_snowflake
            "
        ))
        .bind(post_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Some(comments))
    }

    async fn fetch_recent_comments(&self, limit: u32) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(select_comments!(
            "",
            "posts.comments",
            "
            ORDER BY comments.created DESC, comments.comment_snowflake DESC
            LIMIT $1
            "
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        text: &CommentText,
    ) -> Result<Option<Comment>> {
        let record = query_as::<_, CommentRecord>(select_comments!(
            "
            WITH written AS (
                UPDATE posts.comments
                SET text = $2
                WHERE comment_snowflake = $1
                RETURNING *
            )
            ",
            "written",
            ""
        ))
        .bind(comment_id.to_db())
        .bind(text.get())
        .fetch_optional(&self.pool)
        .await?;

        let comment = record.map(Comment::try_from).transpose()?;
        debug!(%comment_id, found = comment.is_some(), "Updated comment");
        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM posts.comments WHERE comment_snowflake = $1")
            .bind(comment_id.to_db())
            .execute(&self.pool)
            .await?
            .rows_affected()
            > 0;

        debug!(%comment_id, deleted, "Deleted comment");
        Ok(deleted)
    }

    async fn create_follow(
        &self,
        user_id: Id<UserMarker>,
        following_id: Id<UserMarker>,
    ) -> Result<Follow> {
        let follow_snowflake = self.next_snowflake(now_micros())?;

        let record = query_as::<_, FollowRecord>(select_follows!(
            "
            WITH written AS (
                INSERT INTO users.follows (follow_snowflake, user_snowflake, following_snowflake)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            ",
            "written",
            ""
        ))
        .bind(follow_snowflake)
        .bind(user_id.to_db())
        .bind(following_id.to_db())
        .fetch_one(&self.pool)
        .await?;

        let follow = Follow::try_from(record)?;
        debug!(follow_id = %follow.id, %user_id, %following_id, "Created follow");
        Ok(follow)
    }

    async fn fetch_follow(&self, follow_id: Id<FollowMarker>) -> Result<Option<Follow>> {
        let record = query_as::<_, FollowRecord>(select_follows!(
            "",
            "users.follows",
            "WHERE follows.follow_snowflake = $1"
        ))
        .bind(follow_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let follow = record.map(Follow::try_from).transpose()?;
        Ok(follow)
    }

    async fn fetch_following(&self, user_id: Id<UserMarker>) -> Result<Vec<Follow>> {
        let records = query_as::<_, FollowRecord>(select_follows!(
            "",
            "users.follows",
            "
            WHERE follows.user_snowflake = $1
            ORDER BY follows.follow_snowflake
            "
        ))
        .bind(user_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let follows = records
            .into_iter()
            .map(Follow::try_from)
            .collect::<Result<_, _>>()?;
        Ok(follows)
    }

    async fn fetch_followers(&self, user_id: Id<UserMarker>) -> Result<Vec<Follow>> {
        let records = query_as::<_, FollowRecord>(select_follows!(
            "",
            "users.follows",
            "
            WHERE follows.following_snowflake = $1
            ORDER BY follows.follow_snowflake
            "
        ))
        .bind(user_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let follows = records
            .into_iter()
            .map(Follow::try_from)
            .collect::<Result<_, _>>()?;
        Ok(follows)
    }

    async fn delete_follow(
        &self,
        user_id: Id<UserMarker>,
        following_id: Id<UserMarker>,
    ) -> Result<bool> {
        let deleted = query(
            "
            DELETE FROM users.follows
            WHERE user_snowflake = $1 AND following_snowflake = $2
            ",
        )
        .bind(user_id.to_db())
        .bind(following_id.to_db())
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        debug!(%user_id, %following_id, deleted, "Deleted follow");
        Ok(deleted)
    }
}
