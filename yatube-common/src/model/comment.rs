use crate::{
    model::{
        Id,
        post::PostMarker,
        text::{has_length, validated_text},
        user::User,
    },
    util::{LABEL_LEN, truncate_chars},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use time::UtcDateTime;

pub const COMMENT_TEXT_MAX_LEN: usize = 300;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub author: User,
    pub post: Id<PostMarker>,
    pub text: CommentText,
    pub created: UtcDateTime,
}

fn is_valid_text(value: &str) -> bool {
    has_length(value, COMMENT_TEXT_MAX_LEN)
}

validated_text!(CommentText, InvalidCommentTextError, "comment text", is_valid_text);

impl Display for Comment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = format!("{} commented {}", self.author, self.text);
        f.write_str(truncate_chars(&label, LABEL_LEN))
    }
}
