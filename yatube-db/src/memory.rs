use crate::{
    error::{ConstraintViolation, Result, constraint},
    store::ContentStore,
};
use std::{
    cmp::Reverse,
    collections::{BTreeMap, btree_map::Entry},
    sync::{Mutex, MutexGuard, PoisonError},
};
use time::UtcDateTime;
use tracing::debug;
use yatube_common::{
    model::{
        Id, YatubeSnowflakeGenerator,
        comment::{Comment, CommentMarker, CommentText},
        follow::{Follow, FollowMarker},
        group::{Group, GroupContent, GroupMarker, GroupSlug},
        post::{PartialPost, Post, PostContent, PostMarker},
        user::{CreateUser, User, UserHandle, UserMarker},
    },
    snowflake::{ProcessId, WorkerId},
    util::now_micros,
};

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
struct CommentRow {
    author: Id<UserMarker>,
    post: Id<PostMarker>,
    text: CommentText,
    created: UtcDateTime,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
struct FollowRow {
    user: Id<UserMarker>,
    following: Id<UserMarker>,
}

#[derive(Debug, Default)]
struct Tables {
    snowflake_generator: YatubeSnowflakeGenerator,
    users: BTreeMap<Id<UserMarker>, User>,
    groups: BTreeMap<Id<GroupMarker>, Group>,
    posts: BTreeMap<Id<PostMarker>, PartialPost>,
    comments: BTreeMap<Id<CommentMarker>, CommentRow>,
    follows: BTreeMap<Id<FollowMarker>, FollowRow>,
}

/// Inserts a freshly generated row, refusing to replace an existing one.
fn insert_new<Marker, Row>(
    table: &mut BTreeMap<Id<Marker>, Row>,
    id: Id<Marker>,
    row: Row,
    primary_key: &str,
) -> Result<()>
where
    Marker: Ord,
{
    match table.entry(id) {
        Entry::Vacant(entry) => {
            entry.insert(row);
            Ok(())
        }
        Entry::Occupied(_) => Err(ConstraintViolation::unique(primary_key).into()),
    }
}

impl Tables {
    fn next_id<Marker>(&mut self, time: UtcDateTime) -> Result<Id<Marker>> {
        Ok(self.snowflake_generator.generate_at(time)?.into())
    }

    fn require_user(&self, user_id: Id<UserMarker>, constraint: &str) -> Result<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(ConstraintViolation::foreign_key(constraint).into())
        }
    }

    fn require_group(&self, group_id: Option<Id<GroupMarker>>) -> Result<()> {
        match group_id {
            Some(group_id) if !self.groups.contains_key(&group_id) => {
                Err(ConstraintViolation::foreign_key(constraint::POST_GROUP_FK).into())
            }
            _ => Ok(()),
        }
    }

    fn require_free_slug(&self, slug: &GroupSlug, except: Option<Id<GroupMarker>>) -> Result<()> {
        let taken = self
            .groups
            .values()
            .any(|group| &group.slug == slug && Some(group.id) != except);

        if taken {
            Err(ConstraintViolation::unique(constraint::GROUP_SLUG_UNIQUE).into())
        } else {
            Ok(())
        }
    }

    fn post(&self, row: &PartialPost) -> Option<Post> {
        Some(Post {
            id: row.id,
            author: self.users.get(&row.author_id)?.clone(),
            text: row.text.clone(),
            pub_date: row.pub_date,
            group: row.group,
            image: row.image.clone(),
        })
    }

    fn comment(&self, id: Id<CommentMarker>, row: &CommentRow) -> Option<Comment> {
        Some(Comment {
            id,
            author: self.users.get(&row.author)?.clone(),
            post: row.post,
            text: row.text.clone(),
            created: row.created,
        })
    }

    fn follow(&self, id: Id<FollowMarker>, row: FollowRow) -> Option<Follow> {
        Some(Follow {
            id,
            user: self.users.get(&row.user)?.clone(),
            following: self.users.get(&row.following)?.clone(),
        })
    }

    fn sorted_posts<'a>(&self, rows: impl Iterator<Item = &'a PartialPost>) -> Vec<Post> {
        let mut posts: Vec<_> = rows.filter_map(|row| self.post(row)).collect();
        posts.sort_by_key(|post| (post.pub_date, post.id));
        posts
    }

    fn follows_where(&self, predicate: impl Fn(&FollowRow) -> bool) -> Vec<Follow> {
        self.follows
            .iter()
            .filter(|&(_, row)| predicate(row))
            .filter_map(|(&id, &row)| self.follow(id, row))
            .collect()
    }

    fn remove_post_comments(&mut self, removed: impl Fn(Id<PostMarker>) -> bool) {
        self.comments.retain(|_, comment| !removed(comment.post));
    }
}

/// [`ContentStore`] that keeps everything in process memory.
///
/// Applies the same cascades and constraints as the Postgres schema and
/// reports violations under the same constraint names.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            tables: Mutex::new(Tables {
                snowflake_generator: YatubeSnowflakeGenerator::new(worker_id, process_id),
                ..Tables::default()
            }),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContentStore for MemoryStore {
    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut tables = self.tables();

        if tables.users.values().any(|other| other.handle == user.handle) {
            return Err(ConstraintViolation::unique(constraint::USER_HANDLE_UNIQUE).into());
        }

        let user = User {
            id: tables.next_id(now_micros())?,
            handle: user.handle.clone(),
        };
        insert_new(&mut tables.users, user.id, user.clone(), constraint::USER_PKEY)?;

        debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        Ok(self.tables().users.get(&user_id).cloned())
    }

    async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>> {
        let tables = self.tables();
        let user = tables.users.values().find(|user| &user.handle == handle);
        Ok(user.cloned())
    }

    async fn delete_user(&self, user_id: Id<UserMarker>) -> Result<bool> {
        let mut tables = self.tables();

        let deleted = tables.users.remove(&user_id).is_some();
        if deleted {
            tables.posts.retain(|_, post| post.author_id != user_id);
            let Tables { posts, comments, .. } = &mut *tables;
            comments.retain(|_, comment| {
                comment.author != user_id && posts.contains_key(&comment.post)
            });
            tables
                .follows
                .retain(|_, follow| follow.user != user_id && follow.following != user_id);
        }

        debug!(%user_id, deleted, "Deleted user");
        Ok(deleted)
    }

    async fn create_group(&self, group: &GroupContent) -> Result<Group> {
        let mut tables = self.tables();
        tables.require_free_slug(&group.slug, None)?;

        let group = Group::from_content(tables.next_id(now_micros())?, group.clone());
        insert_new(&mut tables.groups, group.id, group.clone(), constraint::GROUP_PKEY)?;

        debug!(group_id = %group.id, slug = %group.slug, "Created group");
        Ok(group)
    }

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        Ok(self.tables().groups.get(&group_id).cloned())
    }

    async fn fetch_group_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>> {
        let tables = self.tables();
        let group = tables.groups.values().find(|group| &group.slug == slug);
        Ok(group.cloned())
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        let mut groups: Vec<_> = self.tables().groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn update_group(
        &self,
        group_id: Id<GroupMarker>,
        group: &GroupContent,
    ) -> Result<Option<Group>> {
        let mut tables = self.tables();
        if !tables.groups.contains_key(&group_id) {
            return Ok(None);
        }
        tables.require_free_slug(&group.slug, Some(group_id))?;

        let group = Group::from_content(group_id, group.clone());
        tables.groups.insert(group_id, group.clone());

        debug!(%group_id, "Updated group");
        Ok(Some(group))
    }

    async fn delete_group(&self, group_id: Id<GroupMarker>) -> Result<bool> {
        let mut tables = self.tables();

        let deleted = tables.groups.remove(&group_id).is_some();
        if deleted {
            for post in tables.posts.values_mut() {
                if post.group == Some(group_id) {
                    post.group = None;
                }
            }
        }

        debug!(%group_id, deleted, "Deleted group");
        Ok(deleted)
    }

    async fn create_post(&self, post: &PostContent, author: Id<UserMarker>) -> Result<Post> {
        let mut tables = self.tables();
        tables.require_user(author, constraint::POST_AUTHOR_FK)?;
        tables.require_group(post.group)?;

        let pub_date = now_micros();
        let row = PartialPost {
            id: tables.next_id(pub_date)?,
            author_id: author,
            text: post.text.clone(),
            pub_date,
            group: post.group,
            image: post.image.clone(),
        };
        insert_new(&mut tables.posts, row.id, row.clone(), constraint::POST_PKEY)?;

        debug!(post_id = %row.id, author_id = %author, "Created post");
        tables
            .post(&row)
            .ok_or_else(|| ConstraintViolation::foreign_key(constraint::POST_AUTHOR_FK).into())
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let tables = self.tables();
        Ok(tables.posts.get(&post_id).and_then(|row| tables.post(row)))
    }

    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let tables = self.tables();
        Ok(tables.sorted_posts(tables.posts.values()))
    }

    async fn fetch_group_posts(&self, group_id: Id<GroupMarker>) -> Result<Option<Vec<Post>>> {
        let tables = self.tables();
        if !tables.groups.contains_key(&group_id) {
            return Ok(None);
        }

        let rows = tables
            .posts
            .values()
            .filter(|post| post.group == Some(group_id));
        Ok(Some(tables.sorted_posts(rows)))
    }

    async fn fetch_user_posts(&self, user_id: Id<UserMarker>) -> Result<Option<Vec<PartialPost>>> {
        let tables = self.tables();
        if !tables.users.contains_key(&user_id) {
            return Ok(None);
        }

        let mut posts: Vec<_> = tables
            .posts
            .values()
            .filter(|post| post.author_id == user_id)
            .cloned()
            .collect();
        posts.sort_by_key(|post| (post.pub_date, post.id));
        Ok(Some(posts))
    }

    async fn update_post(&self, post_id: Id<PostMarker>, post: &PostContent) -> Result<Option<Post>> {
        let mut tables = self.tables();
        if !tables.posts.contains_key(&post_id) {
            return Ok(None);
        }
        tables.require_group(post.group)?;

        let Some(row) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        row.text = post.text.clone();
        row.group = post.group;
        row.image = post.image.clone();
        let row = row.clone();

        debug!(%post_id, "Updated post");
        Ok(tables.post(&row))
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let mut tables = self.tables();

        let deleted = tables.posts.remove(&post_id).is_some();
        if deleted {
            tables.remove_post_comments(|post| post == post_id);
        }

        debug!(%post_id, deleted, "Deleted post");
        Ok(deleted)
    }

    async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        text: &CommentText,
    ) -> Result<Comment> {
        let mut tables = self.tables();
        if !tables.posts.contains_key(&post_id) {
            return Err(ConstraintViolation::foreign_key(constraint::COMMENT_POST_FK).into());
        }
        tables.require_user(author, constraint::COMMENT_AUTHOR_FK)?;

        let created = now_micros();
        let comment_id = tables.next_id(created)?;
        let row = CommentRow {
            author,
            post: post_id,
            text: text.clone(),
            created,
        };
        insert_new(&mut tables.comments, comment_id, row.clone(), constraint::COMMENT_PKEY)?;

        debug!(%comment_id, %post_id, "Created comment");
        tables
            .comment(comment_id, &row)
            .ok_or_else(|| ConstraintViolation::foreign_key(constraint::COMMENT_AUTHOR_FK).into())
    }

    async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let tables = self.tables();
        Ok(tables
            .comments
            .get(&comment_id)
            .and_then(|row| tables.comment(comment_id, row)))
    }

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Option<Vec<Comment>>> {
        let tables = self.tables();
        if !tables.posts.contains_key(&post_id) {
            return Ok(None);
        }

        let mut comments: Vec<_> = tables
            .comments
            .iter()
            .filter(|(_, row)| row.post == post_id)
            .filter_map(|(&id, row)| tables.comment(id, row))
            .collect();
        comments.sort_by_key(|comment| (comment.created, comment.id));
        Ok(Some(comments))
    }

    async fn fetch_recent_comments(&self, limit: u32) -> Result<Vec<Comment>> {
        let tables = self.tables();

        let mut comments: Vec<_> = tables
            .comments
            .iter()
            .filter_map(|(&id, row)| tables.comment(id, row))
            .collect();
        comments.sort_by_key(|comment| Reverse((comment.created, comment.id)));
        comments.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(comments)
    }

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        text: &CommentText,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables();

        let Some(row) = tables.comments.get_mut(&comment_id) else {
            return Ok(None);
        };
        row.text = text.clone();
        let row = row.clone();

        debug!(%comment_id, "Updated comment");
        Ok(tables.comment(comment_id, &row))
    }

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let deleted = self.tables().comments.remove(&comment_id).is_some();

        debug!(%comment_id, deleted, "Deleted comment");
        Ok(deleted)
    }

    async fn create_follow(
        &self,
        user_id: Id<UserMarker>,
        following_id: Id<UserMarker>,
    ) -> Result<Follow> {
        let mut tables = self.tables();
        tables.require_user(user_id, constraint::FOLLOW_USER_FK)?;
        tables.require_user(following_id, constraint::FOLLOW_FOLLOWING_FK)?;

        let row = FollowRow {
            user: user_id,
            following: following_id,
        };
        if tables.follows.values().any(|existing| *existing == row) {
            return Err(ConstraintViolation::unique(constraint::UNIQUE_USER_FOLLOWING).into());
        }

        let follow_id = tables.next_id(now_micros())?;
        insert_new(&mut tables.follows, follow_id, row, constraint::FOLLOW_PKEY)?;

        debug!(%follow_id, %user_id, %following_id, "Created follow");
        tables
            .follow(follow_id, row)
            .ok_or_else(|| ConstraintViolation::foreign_key(constraint::FOLLOW_USER_FK).into())
    }

    async fn fetch_follow(&self, follow_id: Id<FollowMarker>) -> Result<Option<Follow>> {
        let tables = self.tables();
        Ok(tables
            .follows
            .get(&follow_id)
            .and_then(|&row| tables.follow(follow_id, row)))
    }

    async fn fetch_following(&self, user_id: Id<UserMarker>) -> Result<Vec<Follow>> {
        Ok(self.tables().follows_where(|row| row.user == user_id))
    }

    async fn fetch_followers(&self, user_id: Id<UserMarker>) -> Result<Vec<Follow>> {
        Ok(self.tables().follows_where(|row| row.following == user_id))
    }

    async fn delete_follow(
        &self,
        user_id: Id<UserMarker>,
        following_id: Id<UserMarker>,
    ) -> Result<bool> {
        let mut tables = self.tables();

        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, row| !(row.user == user_id && row.following == following_id));
        let deleted = tables.follows.len() < before;

        debug!(%user_id, %following_id, deleted, "Deleted follow");
        Ok(deleted)
    }
}
