//! Markdown to HTML rendering using pulldown-cmark
//!
//! The fragment produced here is what both the live preview and the PDF
//! exporter embed into the page template. Diagrams and math are left for
//! the browser: `mermaid` fences become `<div class="mermaid">` containers
//! and math keeps its TeX delimiters inside `arithmatex` spans.

mod linkify;
mod template;

pub use template::{wrap_page, PageLayout};

use std::collections::HashSet;
use std::path::Path;

use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream,
};

/// Fence language that is turned into a diagram container.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Treat single newlines as line breaks (preview pane behaviour).
    pub hard_breaks: bool,
    /// Give every heading a slug `id` so the page can link to sections.
    pub heading_ids: bool,
    /// Turn bare URLs and e-mail addresses into links.
    pub autolink: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hard_breaks: false,
            heading_ids: true,
            autolink: true,
        }
    }
}

impl RenderOptions {
    pub fn preview() -> Self {
        Self {
            hard_breaks: true,
            ..Self::default()
        }
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_MATH
}

/// Convert markdown to an HTML fragment.
pub fn render_markdown(markdown: &str, options: &RenderOptions) -> String {
    let parser = Parser::new_ext(markdown, parser_options());
    let events: Vec<Event<'_>> = TextMergeStream::new(parser).collect();

    let mut events = rewrite_blocks(events);
    if options.heading_ids {
        events = assign_heading_ids(events);
    }
    if options.autolink {
        events = linkify::autolink(events);
    }

    let hard_breaks = options.hard_breaks;
    let mut html_output = String::with_capacity(markdown.len() + markdown.len() / 2);
    html::push_html(
        &mut html_output,
        events.into_iter().map(|event| match event {
            Event::SoftBreak if hard_breaks => Event::HardBreak,
            other => other,
        }),
    );
    html_output
}

/// Render markdown into a complete printable page.
///
/// `base_dir` is where relative links and images are resolved from,
/// normally the directory of the source file.
pub fn render_page(markdown: &str, options: &RenderOptions, base_dir: Option<&Path>) -> String {
    render_page_with_layout(markdown, options, base_dir, &PageLayout::default())
}

pub fn render_page_with_layout(
    markdown: &str,
    options: &RenderOptions,
    base_dir: Option<&Path>,
    layout: &PageLayout,
) -> String {
    let body = render_markdown(markdown, options);
    let base_href = base_dir.and_then(directory_url);
    wrap_page(&body, base_href.as_deref(), layout)
}

fn directory_url(dir: &Path) -> Option<String> {
    let absolute = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    reqwest::Url::from_directory_path(absolute)
        .ok()
        .map(|url| url.to_string())
}

/// First word of a fence info string, e.g. `rust` for "rust title=main.rs".
fn fence_language(info: &str) -> &str {
    info.split_whitespace().next().unwrap_or("")
}

/// Replace diagram fences with containers and wrap math for MathJax.
fn rewrite_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut diagram: Option<String> = None;

    for event in events {
        if let Some(body) = diagram.as_mut() {
            match event {
                Event::Text(text) => body.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    let html = format!("<div class=\"mermaid\">{}</div>\n", escape_html(body));
                    out.push(Event::Html(CowStr::from(html)));
                    diagram = None;
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info)))
                if fence_language(info).eq_ignore_ascii_case(DIAGRAM_LANGUAGE) =>
            {
                diagram = Some(String::new());
            }
            Event::InlineMath(tex) => {
                let html = format!(
                    "<span class=\"arithmatex\">\\({}\\)</span>",
                    escape_html(&tex)
                );
                out.push(Event::InlineHtml(CowStr::from(html)));
            }
            Event::DisplayMath(tex) => {
                let html = format!(
                    "<span class=\"arithmatex arithmatex-display\">\\[{}\\]</span>",
                    escape_html(&tex)
                );
                out.push(Event::InlineHtml(CowStr::from(html)));
            }
            other => out.push(other),
        }
    }

    out
}

fn assign_heading_ids(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut used: HashSet<String> = HashSet::new();
    let mut pending: Option<Vec<Event<'_>>> = None;

    for event in events {
        if pending.is_none() {
            if matches!(event, Event::Start(Tag::Heading { .. })) {
                pending = Some(vec![event]);
            } else {
                out.push(event);
            }
            continue;
        }

        let is_end = matches!(event, Event::End(TagEnd::Heading(_)));
        if let Some(buffer) = pending.as_mut() {
            buffer.push(event);
        }
        if !is_end {
            continue;
        }
        if let Some(mut heading) = pending.take() {
            let slug = unique_slug(&slugify(&heading_text(&heading)), &mut used);
            if let Some(Event::Start(Tag::Heading { id, .. })) = heading.first_mut() {
                if id.is_none() {
                    *id = Some(CowStr::from(slug));
                }
            }
            out.append(&mut heading);
        }
    }

    // Unterminated heading: keep whatever was buffered.
    if let Some(mut heading) = pending {
        out.append(&mut heading);
    }
    out
}

fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) | Event::InlineMath(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

/// Lowercase, keep alphanumerics, collapse whitespace and hyphens to `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    slug
}

fn unique_slug(slug: &str, used: &mut HashSet<String>) -> String {
    let base = if slug.is_empty() { "section" } else { slug };
    let mut candidate = base.to_string();
    let mut counter = 0;
    while used.contains(&candidate) {
        counter += 1;
        candidate = format!("{}_{}", base, counter);
    }
    used.insert(candidate.clone());
    candidate
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unescape(s: &str) -> String {
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    fn diagram_bodies(html: &str) -> Vec<String> {
        let open = "<div class=\"mermaid\">";
        html.match_indices(open)
            .map(|(start, _)| {
                let rest = &html[start + open.len()..];
                let end = rest.find("</div>").unwrap_or(rest.len());
                unescape(&rest[..end])
            })
            .collect()
    }

    #[test]
    fn test_render_basic() {
        let html = render_markdown("# Hello\n\nWorld", &RenderOptions::default());
        assert!(html.contains("<h1 id=\"hello\">Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_render_code_fence_keeps_language() {
        let html = render_markdown("```rust\nfn main() {}\n```", &RenderOptions::default());
        assert!(html.contains("<pre><code class=\"language-rust\">"));
        assert!(html.contains("fn main() {}"));
    }

    #[test]
    fn test_mermaid_fence_becomes_container() {
        let md = "Intro\n\n```mermaid\ngraph TD;\nA-->B;\n```\n";
        let html = render_markdown(md, &RenderOptions::default());

        assert!(!html.contains("language-mermaid"));
        assert_eq!(diagram_bodies(&html), vec!["graph TD;\nA-->B;\n".to_string()]);
    }

    #[test]
    fn test_one_container_per_diagram_fence() {
        let md = "```mermaid\nA-->B\n```\n\ntext\n\n```mermaid\nsequenceDiagram\n  A->>B: \"hi\" & <bye>\n```\n\n```python\nprint(1)\n```\n";
        let html = render_markdown(md, &RenderOptions::default());

        let bodies = diagram_bodies(&html);
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0], "A-->B\n");
        assert_eq!(bodies[1], "sequenceDiagram\n  A->>B: \"hi\" & <bye>\n");
        assert!(html.contains("language-python"));
    }

    #[test]
    fn test_math_delimiters_left_for_client() {
        let md = "Inline $a^2 + b^2$ here.\n\n$$\\int_0^1 x\\,dx$$\n";
        let html = render_markdown(md, &RenderOptions::default());

        assert!(html.contains("<span class=\"arithmatex\">\\(a^2 + b^2\\)</span>"));
        assert!(html.contains("arithmatex-display\">\\[\\int_0^1 x\\,dx\\]</span>"));
    }

    #[test]
    fn test_math_is_escaped() {
        let html = render_markdown("$a < b$", &RenderOptions::default());
        assert!(html.contains("\\(a &lt; b\\)"));
    }

    #[test]
    fn test_tables_and_tasklists() {
        let md = "| A | B |\n|---|---|\n| 1 | 2 |\n\n- [x] done\n- [ ] todo\n";
        let html = render_markdown(md, &RenderOptions::default());

        assert!(html.contains("<table>"));
        assert!(html.contains("<th>A</th>"));
        assert!(html.contains("<td>2</td>"));
        assert!(html.contains("type=\"checkbox\""));
        assert!(html.contains("checked"));
    }

    #[test]
    fn test_bare_url_is_linked() {
        let html = render_markdown("See https://example.com/docs.", &RenderOptions::default());
        assert!(html.contains("<a href=\"https://example.com/docs\">https://example.com/docs</a>."));
    }

    #[test]
    fn test_autolink_can_be_disabled() {
        let options = RenderOptions {
            autolink: false,
            ..RenderOptions::default()
        };
        let html = render_markdown("See https://example.com", &options);
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_urls_in_code_are_not_linked() {
        let html = render_markdown("`https://example.com`", &RenderOptions::default());
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let html = render_markdown("# Intro\n\n## Intro\n\n# Intro", &RenderOptions::default());
        assert!(html.contains("id=\"intro\""));
        assert!(html.contains("id=\"intro_1\""));
        assert!(html.contains("id=\"intro_2\""));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Multi   space -- dash "), "multi-space-dash");
        assert_eq!(slugify("Çevirici Ayarları"), "çevirici-ayarları");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_preview_uses_hard_breaks() {
        let md = "line one\nline two";
        let export = render_markdown(md, &RenderOptions::default());
        let preview = render_markdown(md, &RenderOptions::preview());

        assert!(!export.contains("<br />"));
        assert!(preview.contains("<br />"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let md = "# T\n\n```mermaid\nA-->B\n```\n\n$x$ and www.example.org\n";
        let options = RenderOptions::default();
        assert_eq!(render_markdown(md, &options), render_markdown(md, &options));
    }

    #[test]
    fn test_render_page_has_base_and_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let page = render_page("# Doc", &RenderOptions::default(), Some(dir.path()));

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<base href=\"file://"));
        assert!(page.contains("mermaid@10.9.1"));
        assert!(page.contains("mathjax@3"));
        assert!(page.contains("<h1 id=\"doc\">Doc</h1>"));
    }
}
