use ammonia::Builder;
use std::collections::HashSet;

/// Reduce backend-supplied HTML to plain text for terminal rendering.
///
/// Every tag is stripped (content of `<script>`/`<style>` is dropped
/// entirely). Named and numeric entities are decoded by ammonia's parser;
/// the replacements below only undo the escaping its serializer applies
/// to text (`&`, `<`, `>`, no-break space) plus quote forms.
pub fn plain_text(input: &str) -> String {
    let cleaned = Builder::default()
        .tags(HashSet::new())
        .clean(input)
        .to_string();

    cleaned
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
