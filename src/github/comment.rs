use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// Pull request review comment as returned by `GET /repos/{o}/{r}/pulls/{n}/comments`.
///
/// `position` and `original_position` are patch positions; `position` is
/// `null` once the comment is outdated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub id: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub original_position: Option<u32>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub in_reply_to_id: Option<u64>,
    pub body: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub created_at: String,
    /// Line in the current head file, filled in by `map_comments_to_head`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_position: Option<u32>,
}

impl ReviewComment {
    /// The anchor line no longer exists in the current diff.
    pub fn is_outdated(&self) -> bool {
        self.position.is_none()
    }

    /// Position used to find the anchor line: the current position, or the
    /// original one for outdated comments.
    pub fn anchor_position(&self) -> Option<u32> {
        self.position
            .filter(|&position| position > 0)
            .or(self.original_position)
    }
}
