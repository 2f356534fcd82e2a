use crate::{
    model::{Id, user::User},
    util::{LABEL_LEN, truncate_chars},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FollowMarker;

/// `user` follows `following`. Each ordered pair exists at most once.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Follow {
    pub id: Id<FollowMarker>,
    pub user: User,
    pub following: User,
}

impl Display for Follow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = format!("{} follows {}", self.user, self.following);
        f.write_str(truncate_chars(&label, LABEL_LEN))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        follow::Follow,
        user::{User, UserHandle},
    };

    fn user(id: u64, handle: &str) -> User {
        User {
            id: id.into(),
            handle: UserHandle::new(handle).unwrap(),
        }
    }

    #[test]
    fn label() {
        let follow = Follow {
            id: 3_u64.into(),
            user: user(1, "ann"),
            following: user(2, "bob"),
        };
        assert_eq!(follow.to_string(), "ann follows bob");

        let follow = Follow {
            id: 4_u64.into(),
            user: user(1, "annabelle"),
            following: user(2, "bartholomew"),
        };
        assert_eq!(follow.to_string(), "annabelle follows ba");
    }
}
