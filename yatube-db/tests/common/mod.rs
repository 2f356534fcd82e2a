//! Scenarios every `ContentStore` has to pass, run once per backend.

use yatube_common::model::{
    Id,
    comment::CommentText,
    group::{Group, GroupContent, GroupDescription, GroupSlug, GroupTitle},
    post::{ImagePath, PostContent, PostText},
    user::{CreateUser, User, UserHandle},
};
use yatube_db::{ContentStore, constraint};

async fn user(store: &impl ContentStore, handle: &str) -> User {
    store
        .create_user(&CreateUser {
            handle: UserHandle::new(handle).unwrap(),
        })
        .await
        .unwrap()
}

fn group_content(title: &str, slug: &str) -> GroupContent {
    GroupContent {
        title: GroupTitle::new(title).unwrap(),
        slug: GroupSlug::new(slug).unwrap(),
        description: GroupDescription::new("A board about things").unwrap(),
    }
}

async fn group(store: &impl ContentStore, slug: &str) -> Group {
    store
        .create_group(&group_content(&format!("All about {slug}"), slug))
        .await
        .unwrap()
}

fn post_content(text: &str, group: Option<&Group>) -> PostContent {
    PostContent {
        text: PostText::new(text).unwrap(),
        group: group.map(|group| group.id),
        image: None,
    }
}

fn comment_text(text: &str) -> CommentText {
    CommentText::new(text).unwrap()
}

pub async fn follow_twice_is_rejected(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let bob = user(store, "bob").await;

    let follow = store.create_follow(ann.id, bob.id).await.unwrap();
    assert_eq!(follow.user, ann);
    assert_eq!(follow.following, bob);
    assert_eq!(follow.to_string(), "ann follows bob");

    let err = store.create_follow(ann.id, bob.id).await.unwrap_err();
    assert!(err.is_unique_violation(constraint::UNIQUE_USER_FOLLOWING));

    // the reverse direction is a different edge
    store.create_follow(bob.id, ann.id).await.unwrap();
    assert_eq!(store.fetch_following(ann.id).await.unwrap().len(), 1);
    assert_eq!(store.fetch_followers(ann.id).await.unwrap().len(), 1);
}

pub async fn self_follow_is_allowed(store: &impl ContentStore) {
    let ann = user(store, "ann").await;

    let follow = store.create_follow(ann.id, ann.id).await.unwrap();
    assert_eq!(store.fetch_follow(follow.id).await.unwrap(), Some(follow));
}

pub async fn follow_requires_existing_users(store: &impl ContentStore) {
    let ann = user(store, "ann").await;

    let err = store.create_follow(ann.id, 1_u64.into()).await.unwrap_err();
    assert!(err.is_foreign_key_violation(constraint::FOLLOW_FOLLOWING_FK));
}

pub async fn delete_follow_removes_edge(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let bob = user(store, "bob").await;
    store.create_follow(ann.id, bob.id).await.unwrap();

    assert!(store.delete_follow(ann.id, bob.id).await.unwrap());
    assert!(!store.delete_follow(ann.id, bob.id).await.unwrap());
    assert!(store.fetch_following(ann.id).await.unwrap().is_empty());

    // can follow again once unfollowed
    store.create_follow(ann.id, bob.id).await.unwrap();
}

pub async fn group_delete_detaches_posts(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let cats = group(store, "cats").await;
    let post = store
        .create_post(&post_content("Cats are great", Some(&cats)), ann.id)
        .await
        .unwrap();
    assert_eq!(post.group, Some(cats.id));

    assert!(store.delete_group(cats.id).await.unwrap());

    let post = store.fetch_post(post.id).await.unwrap().unwrap();
    assert_eq!(post.group, None);
    assert_eq!(post.text.get(), "Cats are great");
    assert_eq!(store.fetch_group_posts(cats.id).await.unwrap(), None);
}

pub async fn user_delete_cascades(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let bob = user(store, "bob").await;
    let cid = user(store, "cid").await;

    let anns_post = store
        .create_post(&post_content("Ann writes", None), ann.id)
        .await
        .unwrap();
    let bobs_post = store
        .create_post(&post_content("Bob writes", None), bob.id)
        .await
        .unwrap();
    let cid_on_ann = store
        .create_comment(anns_post.id, cid.id, &comment_text("Nice one, Ann"))
        .await
        .unwrap();
    let ann_on_bob = store
        .create_comment(bobs_post.id, ann.id, &comment_text("Nice one, Bob"))
        .await
        .unwrap();
    let cid_on_bob = store
        .create_comment(bobs_post.id, cid.id, &comment_text("Agreed"))
        .await
        .unwrap();
    store.create_follow(ann.id, bob.id).await.unwrap();
    store.create_follow(bob.id, ann.id).await.unwrap();
    store.create_follow(cid.id, bob.id).await.unwrap();

    assert!(store.delete_user(ann.id).await.unwrap());

    assert_eq!(store.fetch_user(ann.id).await.unwrap(), None);
    assert_eq!(store.fetch_user_posts(ann.id).await.unwrap(), None);
    assert_eq!(store.fetch_post(anns_post.id).await.unwrap(), None);
    assert_eq!(store.fetch_comment(cid_on_ann.id).await.unwrap(), None);
    assert_eq!(store.fetch_comment(ann_on_bob.id).await.unwrap(), None);

    assert!(store.fetch_post(bobs_post.id).await.unwrap().is_some());
    assert_eq!(
        store.fetch_comment(cid_on_bob.id).await.unwrap(),
        Some(cid_on_bob)
    );

    assert!(store.fetch_following(bob.id).await.unwrap().is_empty());
    let followers = store.fetch_followers(bob.id).await.unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].user, cid);

    assert!(!store.delete_user(ann.id).await.unwrap());
}

pub async fn post_delete_cascades_comments(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let post = store
        .create_post(&post_content("Short-lived", None), ann.id)
        .await
        .unwrap();
    let comment = store
        .create_comment(post.id, ann.id, &comment_text("First!"))
        .await
        .unwrap();

    assert!(store.delete_post(post.id).await.unwrap());

    assert_eq!(store.fetch_comment(comment.id).await.unwrap(), None);
    assert_eq!(store.fetch_post_comments(post.id).await.unwrap(), None);
    assert!(!store.delete_post(post.id).await.unwrap());
}

pub async fn pub_date_survives_update(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let cats = group(store, "cats").await;
    let post = store
        .create_post(&post_content("Draft", None), ann.id)
        .await
        .unwrap();

    let updated = store
        .update_post(
            post.id,
            &PostContent {
                text: PostText::new("Final version").unwrap(),
                group: Some(cats.id),
                image: Some(ImagePath::new("posts/final.png").unwrap()),
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.pub_date, post.pub_date);
    assert_eq!(updated.author, ann);
    assert_eq!(updated.text.get(), "Final version");
    assert_eq!(updated.group, Some(cats.id));
    assert_eq!(updated.image.as_ref().map(ImagePath::get), Some("posts/final.png"));

    let fetched = store.fetch_post(post.id).await.unwrap().unwrap();
    assert_eq!(fetched, updated);
}

pub async fn posts_ordered_by_pub_date(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let bob = user(store, "bob").await;
    let cats = group(store, "cats").await;

    let mut created = Vec::new();
    for (index, author) in [&ann, &bob, &ann, &bob].into_iter().enumerate() {
        let group = (index % 2 == 0).then_some(&cats);
        let post = store
            .create_post(&post_content(&format!("Post number {index}"), group), author.id)
            .await
            .unwrap();
        created.push(post);
    }

    let fetched = store.fetch_posts().await.unwrap();
    assert_eq!(fetched, created);
    assert!(fetched.windows(2).all(|pair| pair[0].pub_date <= pair[1].pub_date));

    let in_group = store.fetch_group_posts(cats.id).await.unwrap().unwrap();
    assert_eq!(in_group, vec![created[0].clone(), created[2].clone()]);

    let by_ann = store.fetch_user_posts(ann.id).await.unwrap().unwrap();
    assert_eq!(by_ann, vec![created[0].to_partial(), created[2].to_partial()]);
}

pub async fn post_label_is_truncated(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let post = store
        .create_post(&post_content("This is a very long article body", None), ann.id)
        .await
        .unwrap();

    let fetched = store.fetch_post(post.id).await.unwrap().unwrap();
    assert_eq!(fetched.to_string(), "This is a very long ");
}

pub async fn post_requires_existing_references(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let missing_group = Id::from(1_u64);

    let err = store
        .create_post(&post_content("Orphan", None), Id::from(1_u64))
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(constraint::POST_AUTHOR_FK));

    let err = store
        .create_post(
            &PostContent {
                group: Some(missing_group),
                ..post_content("Lost", None)
            },
            ann.id,
        )
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(constraint::POST_GROUP_FK));

    let err = store
        .create_comment(Id::from(1_u64), ann.id, &comment_text("Hello?"))
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(constraint::COMMENT_POST_FK));

    assert!(store.fetch_posts().await.unwrap().is_empty());
}

pub async fn group_slug_is_unique(store: &impl ContentStore) {
    let cats = group(store, "cats").await;
    let dogs = group(store, "dogs").await;

    let err = store
        .create_group(&group_content("Other cats", "cats"))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(constraint::GROUP_SLUG_UNIQUE));

    let err = store
        .update_group(dogs.id, &group_content("Dogs", "cats"))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(constraint::GROUP_SLUG_UNIQUE));

    // keeping its own slug is fine
    let renamed = store
        .update_group(cats.id, &group_content("Cats and kittens", "cats"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.title.get(), "Cats and kittens");
    assert_eq!(
        store
            .fetch_group_by_slug(&GroupSlug::new("cats").unwrap())
            .await
            .unwrap(),
        Some(renamed.clone())
    );

    let titles: Vec<_> = store
        .fetch_groups()
        .await
        .unwrap()
        .into_iter()
        .map(|group| group.title.into_inner())
        .collect();
    assert_eq!(titles, ["All about dogs", "Cats and kittens"]);
}

pub async fn groups_ordered_by_title_bytes(store: &impl ContentStore) {
    for (title, slug) in [("apple", "apple"), ("Banana", "banana"), ("Äpfel", "aepfel")] {
        store.create_group(&group_content(title, slug)).await.unwrap();
    }

    let titles: Vec<_> = store
        .fetch_groups()
        .await
        .unwrap()
        .into_iter()
        .map(|group| group.title.into_inner())
        .collect();
    assert_eq!(titles, ["Banana", "apple", "Äpfel"]);
}

pub async fn user_handle_is_unique(store: &impl ContentStore) {
    let ann = user(store, "ann").await;

    let err = store
        .create_user(&CreateUser {
            handle: UserHandle::new("ann").unwrap(),
        })
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(constraint::USER_HANDLE_UNIQUE));

    let fetched = store.fetch_user_by_handle(&ann.handle).await.unwrap();
    assert_eq!(fetched, Some(ann));
}

pub async fn comments_by_recency(store: &impl ContentStore) {
    let ann = user(store, "ann").await;
    let first = store
        .create_post(&post_content("First post", None), ann.id)
        .await
        .unwrap();
    let second = store
        .create_post(&post_content("Second post", None), ann.id)
        .await
        .unwrap();

    let mut comments = Vec::new();
    for (index, post) in [&first, &second, &first].into_iter().enumerate() {
        let comment = store
            .create_comment(post.id, ann.id, &comment_text(&format!("Comment {index}")))
            .await
            .unwrap();
        comments.push(comment);
    }

    let on_first = store.fetch_post_comments(first.id).await.unwrap().unwrap();
    assert_eq!(on_first, vec![comments[0].clone(), comments[2].clone()]);

    let recent = store.fetch_recent_comments(2).await.unwrap();
    assert_eq!(recent, vec![comments[2].clone(), comments[1].clone()]);
    assert_eq!(recent[0].to_string(), "ann commented Commen");

    let edited = store
        .update_comment(comments[1].id, &comment_text("Edited"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.text.get(), "Edited");
    assert_eq!(edited.created, comments[1].created);

    assert!(store.delete_comment(comments[1].id).await.unwrap());
    assert_eq!(
        store.fetch_post_comments(second.id).await.unwrap(),
        Some(Vec::new())
    );
}

pub async fn missing_rows_are_reported_as_absent(store: &impl ContentStore) {
    let missing = 1_u64;

    assert_eq!(store.fetch_user(missing.into()).await.unwrap(), None);
    assert_eq!(store.fetch_group(missing.into()).await.unwrap(), None);
    assert_eq!(
        store
            .update_group(missing.into(), &group_content("Nothing", "nothing"))
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        store
            .update_post(missing.into(), &post_content("Nothing", None))
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        store
            .update_comment(missing.into(), &comment_text("Nothing"))
            .await
            .unwrap(),
        None
    );
    assert!(!store.delete_group(missing.into()).await.unwrap());
    assert!(!store.delete_comment(missing.into()).await.unwrap());
    assert_eq!(store.fetch_follow(missing.into()).await.unwrap(), None);
}
