// src/notify/markdown.rs
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;

use super::Suggestion;

/// Escape Telegram MarkdownV2 special characters.
pub fn escape_markdown(text: &str) -> String {
    static RE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"([_*\[\]()~`>#+\-=|{}.!\\])").unwrap());
    re.replace_all(text, r"\$1").to_string()
}

fn stamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// MarkdownV2 body for a suggestion. Dynamic parts are escaped.
pub fn render_suggestion(s: &Suggestion) -> String {
    format!(
        "🚀 *TRENDING SUGGESTION* 🚀\n\n\
         📊 *Topic:* {}\n\
         📡 *Source:* {}\n\n\
         💡 *Tweet Suggestion:*\n{}\n\n\
         🔗 *Engage Here:*\n{}\n\n\
         ⏰ _Generated: {}_",
        escape_markdown(&s.title),
        escape_markdown(s.source.as_str()),
        escape_markdown(&s.text),
        escape_markdown(&s.link),
        escape_markdown(&stamp(s.generated_at)),
    )
}

/// Same content without markup, used when Telegram rejects the Markdown body.
pub fn render_suggestion_plain(s: &Suggestion) -> String {
    format!(
        "🚀 TRENDING SUGGESTION 🚀\n\n\
         📊 Topic: {}\n\
         📡 Source: {}\n\n\
         💡 Tweet Suggestion:\n{}\n\n\
         🔗 Engage Here:\n{}\n\n\
         ⏰ Generated: {}",
        s.title,
        s.source,
        s.text,
        s.link,
        stamp(s.generated_at),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceKind;
    use chrono::TimeZone;

    #[test]
    fn escapes_every_special_char() {
        assert_eq!(escape_markdown("a_b*c[d]"), r"a\_b\*c\[d\]");
        assert_eq!(escape_markdown("v1.2 (beta)!"), r"v1\.2 \(beta\)\!");
        assert_eq!(escape_markdown("#tag-x"), r"\#tag\-x");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }

    #[test]
    fn rendered_message_escapes_dynamic_parts() {
        let s = Suggestion {
            title: "Oscar night!".into(),
            source: SourceKind::News,
            link: "https://n.example/a_b".into(),
            text: "Wow. #Oscars".into(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        };
        let md = render_suggestion(&s);
        assert!(md.contains(r"Oscar night\!"));
        assert!(md.contains(r"https://n\.example/a\_b"));
        assert!(md.contains(r"Wow\. \#Oscars"));
        assert!(md.contains(r"2026\-03\-01 09:00 UTC"));

        let plain = render_suggestion_plain(&s);
        assert!(plain.contains("Topic: Oscar night!"));
        assert!(plain.contains("Source: news"));
    }
}
