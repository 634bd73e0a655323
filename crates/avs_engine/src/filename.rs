use sha2::{Digest, Sha256};

/// Filesystem-safe, deterministic name for a session's state file:
/// `{sanitized_id}--{short_hash(id)}.ron`. The hash keeps ids that sanitize to
/// the same text apart.
pub fn session_filename(session_id: &str) -> String {
    let sanitized = sanitize(session_id);
    let hash = short_hash(session_id);
    format!("{sanitized}--{hash}.ron")
}

fn sanitize(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.trim().chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        cleaned.push(c);
    }
    let mut cleaned = cleaned.trim_matches('_').to_string();
    if cleaned.is_empty() {
        cleaned = "session".to_string();
    }
    cleaned.truncate(40);
    cleaned
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::session_filename;

    #[test]
    fn session_filename_is_safe_and_stable() {
        let name = session_filename("joão/../etc");
        assert!(name.starts_with("jo_o_etc--"));
        assert!(name.ends_with(".ron"));
        assert_eq!(name, session_filename("joão/../etc"));
        assert_ne!(session_filename("a b"), session_filename("a_b"));
        assert!(session_filename("///").starts_with("session--"));
    }
}
