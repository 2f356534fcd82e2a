use crate::{
    model::{
        Id,
        group::GroupMarker,
        text::validated_text,
        user::{User, UserMarker},
    },
    util::{LABEL_LEN, truncate_chars},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use time::UtcDateTime;

/// Directory uploaded post images are stored under.
pub const IMAGE_UPLOAD_DIR: &str = "posts/";
pub const IMAGE_PATH_MAX_LEN: usize = 100;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub text: PostText,
    /// Stamped on insert, never touched by updates.
    pub pub_date: UtcDateTime,
    pub group: Option<Id<GroupMarker>>,
    pub image: Option<ImagePath>,
}

/// A post without its author expanded.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PartialPost {
    pub id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub text: PostText,
    pub pub_date: UtcDateTime,
    pub group: Option<Id<GroupMarker>>,
    pub image: Option<ImagePath>,
}

/// The writable fields of a [`Post`]. Author and publication date are fixed
/// at creation and not part of this.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostContent {
    pub text: PostText,
    #[serde(default)]
    pub group: Option<Id<GroupMarker>>,
    #[serde(default)]
    pub image: Option<ImagePath>,
}

fn is_valid_text(value: &str) -> bool {
    !value.trim().is_empty()
}

fn is_valid_image_path(value: &str) -> bool {
    let Some(file) = value.strip_prefix(IMAGE_UPLOAD_DIR) else {
        return false;
    };

    value.chars().count() <= IMAGE_PATH_MAX_LEN
        && !file.is_empty()
        && !file.ends_with('/')
        && file
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

validated_text!(PostText, InvalidPostTextError, "post text", is_valid_text);
validated_text!(
    /// Path of an uploaded image, relative to the media root.
    ImagePath,
    InvalidImagePathError,
    "image path",
    is_valid_image_path
);

impl Post {
    #[must_use]
    pub fn to_partial(&self) -> PartialPost {
        PartialPost {
            id: self.id,
            author_id: self.author.id,
            text: self.text.clone(),
            pub_date: self.pub_date,
            group: self.group,
            image: self.image.clone(),
        }
    }
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(truncate_chars(self.text.get(), LABEL_LEN))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        post::{ImagePath, PartialPost, Post, PostText},
        user::{User, UserHandle},
    };
    use time::macros::utc_datetime;

    #[test]
    fn label_is_first_twenty_characters() {
        let post = Post {
            id: 1_u64.into(),
            author: User {
                id: 2_u64.into(),
                handle: UserHandle::new("leo").unwrap(),
            },
            text: PostText::new("This is a very long article body").unwrap(),
            pub_date: utc_datetime!(2025-06-01 12:00),
            group: None,
            image: None,
        };

        assert_eq!(post.to_string(), "This is a very long ");
        assert_eq!(post.to_partial().author_id, post.author.id);
    }

    #[test]
    fn serde_keeps_publication_date() {
        let post = Post {
            id: 1_u64.into(),
            author: User {
                id: 2_u64.into(),
                handle: UserHandle::new("leo").unwrap(),
            },
            text: PostText::new("Hello").unwrap(),
            pub_date: utc_datetime!(2025-06-01 12:34:56.789012),
            group: Some(3_u64.into()),
            image: Some(ImagePath::new("posts/cat.jpg").unwrap()),
        };

        let json = serde_json::to_string(&post).unwrap();
        assert_eq!(serde_json::from_str::<Post>(&json).unwrap(), post);

        let partial = post.to_partial();
        let json = serde_json::to_string(&partial).unwrap();
        assert_eq!(serde_json::from_str::<PartialPost>(&json).unwrap(), partial);
    }

    #[test]
    fn text_must_not_be_blank() {
        assert!(PostText::new("").is_err());
        assert!(PostText::new("  \n").is_err());
        assert!(PostText::new("x".repeat(100_000)).is_ok());
    }

    #[test]
    fn image_paths_stay_in_upload_dir() {
        assert!(ImagePath::new("posts/cat.jpg").is_ok());
        assert!(ImagePath::new("posts/2025/06/cat.jpg").is_ok());

        assert!(ImagePath::new("posts/").is_err());
        assert!(ImagePath::new("cat.jpg").is_err());
        assert!(ImagePath::new("/posts/cat.jpg").is_err());
        assert!(ImagePath::new("posts/../secrets").is_err());
        assert!(ImagePath::new("posts//cat.jpg").is_err());
        assert!(ImagePath::new(format!("posts/{}", "c".repeat(100))).is_err());
    }
}
