use crate::{model::author::Did, tid::Tid};
use time::UtcDateTime;

/// An indexed oekaki post.
///
/// `parent_id` points at the post this one replies to. The parent is not guaranteed
/// to exist in the store, and nothing prevents a chain of parents from looping, so
/// consumers follow it one lookup at a time.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Oekaki {
    pub tid: Tid,
    pub author_did: Did,
    pub indexed_at: UtcDateTime,
    pub record_cid: String,
    pub blob_cid: String,
    pub alt_text: Option<String>,
    pub parent_id: Option<Tid>,
}

impl Oekaki {
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    #[must_use]
    pub fn is_reply_to(&self, parent: Tid) -> bool {
        self.parent_id == Some(parent)
    }
}
