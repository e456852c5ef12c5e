//! Prompt assembly for the chat responder and the consistency audit.

/// Separator placed between retrieved chunks in the chat context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Join retrieved chunk texts, in rank order, into one context block.
pub fn join_context<'a, I>(texts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    texts.into_iter().collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}

/// Build the retrieval-augmented chat prompt.
pub fn chat_prompt(context: &str, question: &str) -> String {
    format!("Context: {}\n\nQuestion: {}", context, question)
}

/// Build the audit prompt comparing an old-documentation excerpt against a
/// new-changelog excerpt.
///
/// The model is asked for a bare JSON list of issue objects with the
/// fields `contradiction`, `reason`, `fix`, `severity`, `old_quote` and
/// `new_quote`.
pub fn audit_prompt(old_text: &str, new_text: &str) -> String {
    format!(
        r#"
You are a Senior Technical Writer auditing software documentation.

Compare "Text A" (Old Docs) against "Text B" (New Changelog).

Task: Identify ALL deprecated features, breaking changes, or security warnings.
There might be more than one issue. Find them all.

Text A: {old_text}
Text B: {new_text}

Reply ONLY in a JSON LIST format. Do not add markdown formatting.
Example:
[
  {{
    "contradiction": true,
    "reason": "Description of issue 1",
    "fix": "Fix for issue 1",
    "severity": "High",
    "old_quote": "...",
    "new_quote": "..."
  }},
  {{
    "contradiction": true,
    "reason": "Description of issue 2",
    "fix": "Fix for issue 2",
    "severity": "Medium",
    "old_quote": "...",
    "new_quote": "..."
  }}
]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_prompt_shape() {
        assert_eq!(
            chat_prompt("ctx", "why?"),
            "Context: ctx\n\nQuestion: why?"
        );
    }

    #[test]
    fn test_join_context_uses_blank_line() {
        assert_eq!(join_context(["a", "b", "c"]), "a\n\nb\n\nc");
        assert_eq!(join_context(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_audit_prompt_embeds_both_texts() {
        let p = audit_prompt("print \"Hello\"", "print(\"Hello\")");
        assert!(p.contains("Text A: print \"Hello\""));
        assert!(p.contains("Text B: print(\"Hello\")"));
        for field in ["contradiction", "reason", "fix", "severity", "old_quote", "new_quote"] {
            assert!(p.contains(field), "missing {}", field);
        }
    }
}
