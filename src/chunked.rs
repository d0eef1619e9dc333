mod encoder;

pub(crate) use encoder::{encode_chunk, LAST_CHUNK};

/// Split the value of a `Trailer` header into the field names it declares.
///
/// Names may be separated by commas, whitespace, or both.
pub(crate) fn trailer_names(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
}
