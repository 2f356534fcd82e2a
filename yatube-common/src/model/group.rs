use crate::{
    model::{
        Id,
        text::{has_length, validated_text},
    },
    util::{LABEL_LEN, truncate_chars},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const GROUP_TITLE_MAX_LEN: usize = 200;
pub const GROUP_SLUG_MAX_LEN: usize = 50;
pub const GROUP_DESCRIPTION_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct GroupMarker;

/// A topic board posts can be filed under.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Group {
    pub id: Id<GroupMarker>,
    pub title: GroupTitle,
    pub slug: GroupSlug,
    pub description: GroupDescription,
}

/// The writable fields of a [`Group`], used for both creation and updates.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct GroupContent {
    pub title: GroupTitle,
    pub slug: GroupSlug,
    pub description: GroupDescription,
}

fn is_valid_title(value: &str) -> bool {
    has_length(value, GROUP_TITLE_MAX_LEN)
}

fn is_valid_slug(value: &str) -> bool {
    has_length(value, GROUP_SLUG_MAX_LEN)
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_valid_description(value: &str) -> bool {
    has_length(value, GROUP_DESCRIPTION_MAX_LEN)
}

validated_text!(GroupTitle, InvalidGroupTitleError, "group title", is_valid_title);
validated_text!(
    /// Unique, URL-safe name of a group.
    GroupSlug,
    InvalidGroupSlugError,
    "group slug",
    is_valid_slug
);
validated_text!(
    GroupDescription,
    InvalidGroupDescriptionError,
    "group description",
    is_valid_description
);

impl Group {
    #[must_use]
    pub fn from_content(id: Id<GroupMarker>, content: GroupContent) -> Self {
        let GroupContent {
            title,
            slug,
            description,
        } = content;

        Self {
            id,
            title,
            slug,
            description,
        }
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(truncate_chars(self.title.get(), LABEL_LEN))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::group::{
        GROUP_DESCRIPTION_MAX_LEN, GROUP_SLUG_MAX_LEN, Group, GroupContent, GroupDescription,
        GroupSlug, GroupTitle,
    };

    #[test]
    fn slug_charset() {
        assert!(GroupSlug::new("cats").is_ok());
        assert!(GroupSlug::new("cats-and_dogs-2").is_ok());
        assert!(GroupSlug::new("").is_err());
        assert!(GroupSlug::new("cats and dogs").is_err());
        assert!(GroupSlug::new("кошки").is_err());
        assert!(GroupSlug::new("c".repeat(GROUP_SLUG_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn description_is_required_and_bounded() {
        assert!(GroupDescription::new("").is_err());
        assert!(GroupDescription::new("Pets of all kinds").is_ok());
        assert!(GroupDescription::new("d".repeat(GROUP_DESCRIPTION_MAX_LEN)).is_ok());
        assert!(GroupDescription::new("d".repeat(GROUP_DESCRIPTION_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn label_is_truncated_title() {
        let group = Group::from_content(
            1_u64.into(),
            GroupContent {
                title: GroupTitle::new("Cats, dogs and other household companions").unwrap(),
                slug: GroupSlug::new("pets").unwrap(),
                description: GroupDescription::new("Pets of all kinds").unwrap(),
            },
        );

        assert_eq!(group.to_string(), "Cats, dogs and other");
    }
}
