//! `Range` request header parsing.

use hullmedia_storage::ByteRange;

/// Parse a single `bytes=` range.
///
/// Multiple ranges, other units and malformed values yield `None`; the caller then serves the
/// whole object, which is what HTTP allows for a range it does not understand.
pub fn parse_range(value: &str) -> Option<ByteRange> {
    let spec = value.trim().strip_prefix("bytes=")?.trim();
    if spec.contains(',') {
        return None;
    }
    let (start, end) = spec.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        (true, false) => end.parse().ok().map(ByteRange::Suffix),
        (false, true) => start.parse().ok().map(ByteRange::From),
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            (start <= end).then_some(ByteRange::FromTo(start, end))
        }
        (true, true) => None,
    }
}
