//! Opaque pagination cursors
//!
//! A cursor is the URL-safe base64 encoding of a chat id. It uniquely and
//! stably identifies a chat's position in the recency ordering without
//! embedding any ordering information: the cursor is resolved back to its
//! row, and pagination is computed relative to that row's
//! `(created_at, id)`.

use crate::error::{BackchatError, Result};
use crate::storage::Chat;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ulid::Ulid;

/// Encode a chat into an opaque cursor
///
/// # Examples
///
/// ```
/// use backchat::cursor;
///
/// let cursor = cursor::encode_id("01ARZ3NDEKTSV4RRFFQ69G5FAV");
/// assert_eq!(cursor::decode(&cursor).unwrap(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
/// ```
pub fn encode(chat: &Chat) -> String {
    encode_id(&chat.id)
}

/// Encode a chat id into an opaque cursor
pub fn encode_id(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

/// Decode a cursor back into the chat id it references
///
/// # Errors
///
/// Returns `BackchatError::BadRequest` if the cursor is not valid base64
/// or does not decode to a well-formed chat id. Whether the referenced
/// chat still exists is checked by the query engine, not here.
pub fn decode(cursor: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| BackchatError::BadRequest(format!("malformed cursor: {}", cursor)))?;

    let id = String::from_utf8(bytes)
        .map_err(|_| BackchatError::BadRequest(format!("malformed cursor: {}", cursor)))?;

    Ulid::from_string(&id)
        .map_err(|_| BackchatError::BadRequest(format!("cursor does not reference a chat id: {}", cursor)))?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Visibility;
    use chrono::Utc;

    fn sample_chat(id: &str) -> Chat {
        Chat {
            id: id.to_string(),
            owner_id: "alice".to_string(),
            title: "chat".to_string(),
            visibility: Visibility::Private,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let chat = sample_chat("01ARZ3NDEKTSV4RRFFQ69G5FAV");
        let cursor = encode(&chat);
        let decoded = decode(&cursor).expect("decode failed");
        assert_eq!(decoded, chat.id);
    }

    #[test]
    fn test_encode_is_stable() {
        let chat = sample_chat("01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(encode(&chat), encode(&chat));
    }

    #[test]
    fn test_distinct_chats_get_distinct_cursors() {
        let a = encode(&sample_chat("01ARZ3NDEKTSV4RRFFQ69G5FAV"));
        let b = encode(&sample_chat("01BX5ZZKBKACTAV9WEVGEMMVRZ"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let err = decode("!!not-base64!!").unwrap_err();
        let err = err.downcast::<BackchatError>().expect("downcast failed");
        assert!(matches!(err, BackchatError::BadRequest(_)));
    }

    #[test]
    fn test_decode_rejects_non_chat_payload() {
        let cursor = URL_SAFE_NO_PAD.encode(b"definitely-not-a-ulid");
        let err = decode(&cursor).unwrap_err();
        let err = err.downcast::<BackchatError>().expect("downcast failed");
        assert!(matches!(err, BackchatError::BadRequest(_)));
    }
}
