//! Truncation of payload text before it reaches the printer

use std::borrow::Cow;

/// Marker appended to truncated messages
pub const ELLIPSIS: &str = "...";

/// Default maximum message length, in characters
pub const DEFAULT_MAX_LENGTH: usize = 255;

/// Apply the truncation policy to `text`.
///
/// `max_length` counts characters, not bytes; `0` disables truncation.
/// A truncated result is exactly `max_length` characters long and ends with
/// [`ELLIPSIS`]. Limits too short to hold the marker cut the text hard.
pub fn prepare_message(text: &str, max_length: usize) -> Cow<'_, str> {
    if max_length == 0 {
        return Cow::Borrowed(text);
    }

    let char_count = text.chars().count();
    if char_count <= max_length {
        return Cow::Borrowed(text);
    }

    let marker_len = ELLIPSIS.chars().count();
    if max_length <= marker_len {
        return Cow::Owned(text.chars().take(max_length).collect());
    }

    let mut truncated: String = text.chars().take(max_length - marker_len).collect();
    truncated.push_str(ELLIPSIS);
    Cow::Owned(truncated)
}
