//! Printable page template.

use super::escape_html;

pub const MERMAID_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid@10.9.1/dist/mermaid.min.js";
pub const MATHJAX_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-chtml.js";

/// Paper size and margins of the printed page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// CSS page size keyword.
    pub size: &'static str,
    pub margin_mm: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            size: "A4",
            margin_mm: 15.0,
        }
    }
}

const PAGE_STYLE: &str = r#"
body {
    font-family: 'Segoe UI', 'Helvetica Neue', Arial, sans-serif;
    font-size: 14px;
    line-height: 1.6;
    color: #333;
    max-width: 100%;
    margin: 0;
    padding: 0;
}
h1, h2, h3, h4, h5, h6 {
    color: #2c3e50;
    margin-top: 24px;
    margin-bottom: 16px;
    font-weight: 600;
    line-height: 1.25;
}
h1 { font-size: 2em; border-bottom: 1px solid #eaecef; padding-bottom: .3em; }
h2 { font-size: 1.5em; border-bottom: 1px solid #eaecef; padding-bottom: .3em; }
code {
    padding: .2em .4em;
    font-size: 85%;
    background-color: rgba(27, 31, 35, .05);
    border-radius: 3px;
    font-family: SFMono-Regular, Consolas, 'Liberation Mono', Menlo, monospace;
}
pre {
    padding: 16px;
    overflow: auto;
    font-size: 85%;
    line-height: 1.45;
    background-color: #f6f8fa;
    border-radius: 3px;
    white-space: pre-wrap;
}
pre code { padding: 0; background-color: transparent; font-size: 100%; }
blockquote { padding: 0 1em; color: #6a737d; border-left: .25em solid #dfe2e5; margin: 0; }
table { border-collapse: collapse; margin-bottom: 16px; width: 100%; }
table th, table td { padding: 6px 13px; border: 1px solid #dfe2e5; }
table th { font-weight: 600; background-color: #f6f8fa; }
img { max-width: 100%; }
li input[type="checkbox"] { margin-right: .4em; }
.mermaid { display: flex; justify-content: center; margin: 20px 0; }
.arithmatex-display { display: block; text-align: center; margin: 1em 0; }
"#;

const MATHJAX_CONFIG: &str = r#"
window.MathJax = {
    tex: {
        inlineMath: [['\\(', '\\)']],
        displayMath: [['\\[', '\\]']],
        processEscapes: true
    },
    options: { processHtmlClass: 'arithmatex' },
    startup: {
        pageReady: function () {
            return MathJax.startup.defaultPageReady().then(function () {
                document.documentElement.setAttribute('data-math-rendered', 'true');
            });
        }
    }
};
"#;

const MERMAID_BOOT: &str = r#"
(function () {
    var mark = function () {
        document.documentElement.setAttribute('data-diagrams-rendered', 'true');
    };
    if (!window.mermaid) { mark(); return; }
    mermaid.initialize({ startOnLoad: false, theme: 'default' });
    mermaid.run({ querySelector: '.mermaid' }).then(mark, mark);
})();
"#;

/// Wrap an HTML fragment into a standalone page ready for printing.
pub fn wrap_page(body: &str, base_href: Option<&str>, layout: &PageLayout) -> String {
    let base = base_href
        .map(|href| format!("<base href=\"{}\">\n", escape_html(href)))
        .unwrap_or_default();
    let page_rule = format!(
        "@page {{ size: {}; margin: {}mm; }}",
        layout.size, layout.margin_mm
    );

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
{base}<style>{page_rule}
{style}</style>
<script>{mathjax_config}</script>
<script id="MathJax-script" async src="{mathjax}"></script>
<script src="{mermaid}"></script>
</head>
<body>
{body}
<script>{mermaid_boot}</script>
</body>
</html>
"#,
        base = base,
        page_rule = page_rule,
        style = PAGE_STYLE,
        mathjax_config = MATHJAX_CONFIG,
        mathjax = MATHJAX_SCRIPT_URL,
        mermaid = MERMAID_SCRIPT_URL,
        body = body,
        mermaid_boot = MERMAID_BOOT,
    )
}
