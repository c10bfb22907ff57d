use crate::constants::{ENVELOPE_TAG, ENVELOPE_TAG_V1, ENVELOPE_TERMINATOR};
use crate::error::EnvelopeError;

/**
    Strip the optional `GLS/1.<minor>` envelope from a response body.

    Key responses may arrive wrapped in a custom framing header:
    an ASCII `GLS/1.x` version tag, arbitrary header lines, then a blank
    line (`\r\n\r\n`) after which the real drm message begins. Provisioning
    responses are never framed; callers pass `framed = false` and get the
    body back untouched, which also makes unwrapping idempotent on an
    already-unwrapped payload.

    A body without the `GLS/` tag is tolerated as a bare payload. A tagged
    body must carry major version 1 — the version is rejected before the
    terminator is even looked for.
*/
pub fn unwrap(body: &[u8], framed: bool) -> Result<&[u8], EnvelopeError> {
    if !framed {
        return Ok(body);
    }

    let text = std::str::from_utf8(body).map_err(|_| EnvelopeError::NotText)?;
    if !text.starts_with(ENVELOPE_TAG) {
        return Ok(body);
    }
    if !text.starts_with(ENVELOPE_TAG_V1) {
        return Err(EnvelopeError::UnsupportedVersion);
    }

    let offset = find_terminator(body).ok_or(EnvelopeError::MissingTerminator)?;
    Ok(&body[offset + ENVELOPE_TERMINATOR.len()..])
}

fn find_terminator(body: &[u8]) -> Option<usize> {
    body.windows(ENVELOPE_TERMINATOR.len())
        .position(|w| w == ENVELOPE_TERMINATOR)
}
