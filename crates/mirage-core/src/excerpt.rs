/// Lossily decode at most `limit` bytes of `bytes`, never splitting a character
///
/// Used for diagnostic excerpts of upstream error bodies.
pub fn truncate_utf8(bytes: &[u8], limit: usize) -> String {
    let head = &bytes[..bytes.len().min(limit)];

    match std::str::from_utf8(head) {
        Ok(text) => text.to_string(),
        // A multi-byte character cut at the limit leaves an incomplete tail
        Err(e) if e.error_len().is_none() => String::from_utf8_lossy(&head[..e.valid_up_to()]).into_owned(),
        Err(_) => String::from_utf8_lossy(head).into_owned(),
    }
}
