pub fn sanitize_nick(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() && *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

pub fn sanitize_content(s: &str) -> String {
    s.chars()
        .filter(|c| {
            if c.is_whitespace() {
                return true;
            }
            !c.is_control() && *c != char::REPLACEMENT_CHARACTER && !is_format_char(*c)
        })
        .collect()
}

// Bidi overrides and zero-width characters can disguise message content.
fn is_format_char(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{FEFF}')
}

pub fn canonicalize_newlines(s: &str) -> String {
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    s.trim_end_matches('\n').to_string()
}

pub fn clean_received(s: &str) -> String {
    canonicalize_newlines(&sanitize_content(s))
}

fn mention_position(me: &str, msg: &str) -> Option<usize> {
    if me.is_empty() {
        return None;
    }
    msg.to_uppercase().find(&me.to_uppercase())
}

pub fn has_mention(me: &str, msg: &str) -> bool {
    mention_position(me, msg).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_keeps_whitespace_and_drops_controls() {
        assert_eq!(sanitize_content("hi\tthere\n\u{7}!"), "hi\tthere\n!");
        assert_eq!(sanitize_content("a\u{202E}b"), "ab");
    }

    #[test]
    fn nick_drops_newlines() {
        assert_eq!(sanitize_nick("ali\nce\u{0}"), "alice");
    }

    #[test]
    fn newlines_are_canonical() {
        assert_eq!(canonicalize_newlines("a\r\nb\rc\n\n"), "a\nb\nc");
    }

    #[test]
    fn mentions_are_case_insensitive() {
        assert!(has_mention("Alice", "hey ALICE, look"));
        assert!(!has_mention("alice", "hey bob"));
        assert!(!has_mention("", "anything"));
    }
}
