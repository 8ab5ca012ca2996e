//! Prompt text for the completion-backed operations.

pub const TAG_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that suggests relevant tags for web content.";

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarises content into key actionable points.";

pub const MAX_SUGGESTED_TAGS: usize = 4;
pub const TAG_MAX_TOKENS: u32 = 50;

/// Content beyond this many words is dropped before summarising.
pub const SUMMARY_MAX_WORDS: usize = 1000;

pub const TEMPERATURE: f32 = 0.5;

pub fn tag_prompt(url: &str, title: &str, content: &str, existing_tags: &[String]) -> String {
    format!(
        "URL: {url}\n\
         Title: {title}\n\
         Content: {content}\n\
         Existing tags: {existing}\n\n\
         Suggest up to {MAX_SUGGESTED_TAGS} relevant tags for this content. Prioritize using \
         existing tags if they fit well, but also suggest new tags if appropriate. Separate tags \
         with commas.",
        existing = existing_tags.join(", "),
    )
}

/// Splits a completion on `", "` and keeps the first few entries. Entries
/// are neither deduplicated nor checked for emptiness.
pub fn split_tags(completion: &str) -> Vec<String> {
    completion
        .trim()
        .split(", ")
        .take(MAX_SUGGESTED_TAGS)
        .map(String::from)
        .collect()
}

/// Keeps at most `max_words` whitespace separated words, joined by single spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn summary_prompt(url: &str, title: &str, content: &str) -> String {
    format!(
        "Write key take aways and most important insights from the content provided:\n\n\
         Title: {title}\n\
         URL: {url}\n\
         Content: {content}\n\n\
         Summary:",
        content = truncate_words(content, SUMMARY_MAX_WORDS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags_caps_at_four() {
        let tags = split_tags(" rust, async, tokio, web, servers, http \n");
        assert_eq!(tags, vec!["rust", "async", "tokio", "web"]);
    }

    #[test]
    fn test_split_tags_keeps_raw_entries() {
        assert_eq!(split_tags("rust,async"), vec!["rust,async"]);
        assert_eq!(split_tags(""), vec![""]);
        assert_eq!(split_tags("a, a"), vec!["a", "a"]);
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("  one\ttwo \n three  four ", 3), "one two three");
        assert_eq!(truncate_words("short", 10), "short");

        let long = "word ".repeat(1500);
        assert_eq!(truncate_words(&long, SUMMARY_MAX_WORDS).split(' ').count(), 1000);
    }

    #[test]
    fn test_tag_prompt_lists_existing_tags() {
        let prompt = tag_prompt(
            "https://a.com",
            "A",
            "body",
            &["rust".to_string(), "web".to_string()],
        );

        assert!(prompt.starts_with("URL: https://a.com\nTitle: A\nContent: body\n"));
        assert!(prompt.contains("Existing tags: rust, web\n\n"));
        assert!(prompt.contains("Suggest up to 4 relevant tags"));
    }

    #[test]
    fn test_summary_prompt_truncates_content() {
        let content = "w ".repeat(2000);
        let prompt = summary_prompt("https://a.com", "A", &content);

        assert!(prompt.ends_with("Summary:"));
        assert_eq!(prompt.matches(" w").count(), 1000);
    }
}
