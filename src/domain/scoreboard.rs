// Participant ranking derived from replicated snapshots. Rendering lives elsewhere.

use crate::domain::state::{AuthorityId, EntitySnapshot, SnapshotPayload};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub authority: AuthorityId,
    pub display_name: String,
    pub score: u32,
}

/// Highest score first; equal scores keep ascending authority order.
pub fn rank<'a>(snapshots: impl IntoIterator<Item = &'a EntitySnapshot>) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = snapshots
        .into_iter()
        .filter_map(|s| match (&s.payload, s.owner) {
            (SnapshotPayload::Player { display_name, score, .. }, Some(authority)) => {
                Some(RankEntry {
                    authority,
                    display_name: display_name.clone(),
                    score: *score,
                })
            }
            _ => None,
        })
        .collect();

    entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.authority.cmp(&b.authority)));
    entries
}
