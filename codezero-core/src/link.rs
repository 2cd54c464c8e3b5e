//! Shareable call links: the room id travels as the `roomId` query parameter.

use crate::model::RoomId;
use tracing::warn;
use url::Url;

pub const ROOM_QUERY_PARAM: &str = "roomId";

/// Returns `base` with its `roomId` parameter set to `room`. Other query
/// parameters and the fragment are kept.
pub fn share_link(base: &str, room: &RoomId) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != ROOM_QUERY_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(ROOM_QUERY_PARAM, room.as_str());

    Ok(url.into())
}

/// Extracts the room id from a page URL. Presence of the parameter selects the
/// joiner path; a malformed link or value is treated as absent.
pub fn room_from_link(link: &str) -> Option<RoomId> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(e) => {
            warn!("Ignoring unparsable link {:?}: {}", link, e);
            return None;
        }
    };

    let (_, raw) = url
        .query_pairs()
        .find(|(name, _)| name == ROOM_QUERY_PARAM)?;

    match raw.parse::<RoomId>() {
        Ok(room) => Some(room),
        Err(e) => {
            warn!("Ignoring invalid roomId {:?}: {}", raw, e);
            None
        }
    }
}
