//! Page-body format gate.
//!
//! Confluence stores page bodies in its XHTML-based storage format. Bodies
//! that look like Markdown or legacy wiki markup are rejected with an error
//! that shows the expected format; anything containing at least one
//! well-formed tag passes through byte-for-byte.

use std::sync::LazyLock;

use regex::Regex;

const STORAGE_FORMAT_EXAMPLE: &str = r#"Expected Confluence storage format (XHTML), for example:
  <h1>Heading</h1>
  <p>Paragraph with <strong>bold</strong> and <em>italic</em> text.</p>
  <ul><li>List item</li></ul>
  <ac:structured-macro ac:name="code"><ac:plain-text-body><![CDATA[let x = 1;]]></ac:plain-text-body></ac:structured-macro>"#;

/// Why a body was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentFormatError {
    #[error("Content format error: page body is empty.\n{}", STORAGE_FORMAT_EXAMPLE)]
    Empty,

    #[error("Content format error: body looks like Markdown ({0}); Markdown is not accepted.\n{}", STORAGE_FORMAT_EXAMPLE)]
    Markdown(&'static str),

    #[error("Content format error: body looks like Confluence wiki markup ({0}); wiki markup is not accepted.\n{}", STORAGE_FORMAT_EXAMPLE)]
    WikiMarkup(&'static str),

    #[error("Content format error: body contains no storage-format tags.\n{}", STORAGE_FORMAT_EXAMPLE)]
    NoMarkup,
}

struct Pattern {
    name: &'static str,
    regex: Regex,
}

fn patterns(specs: &[(&'static str, &str)]) -> Vec<Pattern> {
    specs
        .iter()
        .map(|(name, src)| Pattern {
            name,
            regex: Regex::new(src).expect("content pattern must compile"),
        })
        .collect()
}

static MARKDOWN: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    patterns(&[
        ("heading", r"(?m)^\s{0,3}#{1,6}\s+\S"),
        ("bold", r"\*\*[^*\n]+\*\*"),
        ("fenced code block", r"(?m)^\s*```"),
        ("link", r"\[[^\]\n]+\]\([^)\s]+\)"),
        ("inline code", r"`[^`\n]+`"),
        ("bullet list", r"(?m)^\s*[-+*]\s+\S"),
        ("numbered list", r"(?m)^\s*\d+\.\s+\S"),
    ])
});

static WIKI: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    patterns(&[
        ("heading", r"(?m)^h[1-6]\.\s"),
        ("macro", r"\{(code|noformat|panel|quote|info|note|warning|tip)(:[^}]*)?\}"),
        ("monospace", r"\{\{[^}\n]+\}\}"),
        ("link", r"\[[^\]|\n]+\|[^\]\n]+\]"),
    ])
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[a-zA-Z][\w:-]*(\s[^<>]*)?/>|</[a-zA-Z][\w:-]*\s*>")
        .expect("tag pattern must compile")
});

/// Regions whose text is literal content, not markup.
static LITERAL_REGIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?s)<!\[CDATA\[.*?\]\]>",
        r"(?s)<pre(\s[^>]*)?>.*?</pre>",
        r"(?s)<code(\s[^>]*)?>.*?</code>",
        r"(?s)<ac:plain-text-body>.*?</ac:plain-text-body>",
    ]
    .iter()
    .map(|src| Regex::new(src).expect("literal region pattern must compile"))
    .collect()
});

fn mask_literal_regions(body: &str) -> String {
    let mut masked = body.to_string();
    for region in LITERAL_REGIONS.iter() {
        masked = region.replace_all(&masked, "<x/>").into_owned();
    }
    masked
}

fn first_match(patterns: &[Pattern], text: &str) -> Option<&'static str> {
    patterns
        .iter()
        .find(|p| p.regex.is_match(text))
        .map(|p| p.name)
}

/// Check that `body` is Confluence storage format.
///
/// Returns the body unchanged when accepted so callers can forward it as-is.
pub fn validate_storage_format(body: &str) -> Result<&str, ContentFormatError> {
    if body.trim().is_empty() {
        return Err(ContentFormatError::Empty);
    }

    let masked = mask_literal_regions(body);

    if let Some(name) = first_match(&MARKDOWN, &masked) {
        return Err(ContentFormatError::Markdown(name));
    }
    if let Some(name) = first_match(&WIKI, &masked) {
        return Err(ContentFormatError::WikiMarkup(name));
    }
    if !TAG.is_match(body) {
        return Err(ContentFormatError::NoMarkup);
    }

    Ok(body)
}

/// Reference document served as the `confluence://docs/storage-format` resource.
pub const STORAGE_FORMAT_GUIDE: &str = r#"# Confluence storage format

Page bodies passed to `create_page` and `update_page` must be Confluence
storage format: XHTML with Confluence-specific `ac:` and `ri:` elements.
Markdown and legacy wiki markup are rejected.

| Element        | Storage format                                   |
|----------------|--------------------------------------------------|
| Heading        | `<h1>Title</h1>` ... `<h6>Title</h6>`            |
| Paragraph      | `<p>Text</p>`                                    |
| Bold / italic  | `<strong>bold</strong>`, `<em>italic</em>`       |
| Inline code    | `<code>value</code>`                             |
| Lists          | `<ul><li>item</li></ul>`, `<ol><li>item</li></ol>` |
| Link           | `<a href="https://example.com">text</a>`         |
| Page link      | `<ac:link><ri:page ri:content-title="Other page"/></ac:link>` |
| Line break     | `<br/>`                                          |

Code blocks use the code macro; text inside CDATA is literal:

```
<ac:structured-macro ac:name="code">
  <ac:parameter ac:name="language">rust</ac:parameter>
  <ac:plain-text-body><![CDATA[fn main() {}]]></ac:plain-text-body>
</ac:structured-macro>
```

Info panels:

```
<ac:structured-macro ac:name="info">
  <ac:rich-text-body><p>Note text</p></ac:rich-text-body>
</ac:structured-macro>
```
"#;
