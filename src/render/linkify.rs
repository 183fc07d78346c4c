//! Bare URL and e-mail hyperlinking for text outside links and code.

use std::ops::Range;

use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};

const LEADING_PUNCT: &[char] = &['(', '[', '<', '"', '\''];
const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?', '"', '\'', ']', '>'];

#[derive(Debug, PartialEq)]
struct FoundLink {
    range: Range<usize>,
    href: String,
}

pub(super) fn autolink(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut suppressed = 0usize;

    for event in events {
        match &event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_)) => {
                suppressed += 1;
            }
            Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock) => {
                suppressed = suppressed.saturating_sub(1);
            }
            Event::Text(text) if suppressed == 0 => {
                let links = find_links(text);
                if !links.is_empty() {
                    split_text(text, &links, &mut out);
                    continue;
                }
            }
            _ => {}
        }
        out.push(event);
    }

    out
}

fn split_text(text: &str, links: &[FoundLink], out: &mut Vec<Event<'_>>) {
    let mut cursor = 0;
    for link in links {
        if link.range.start > cursor {
            out.push(Event::Text(CowStr::from(text[cursor..link.range.start].to_string())));
        }
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(link.href.clone()),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        out.push(Event::Text(CowStr::from(text[link.range.clone()].to_string())));
        out.push(Event::End(TagEnd::Link));
        cursor = link.range.end;
    }
    if cursor < text.len() {
        out.push(Event::Text(CowStr::from(text[cursor..].to_string())));
    }
}

fn find_links(text: &str) -> Vec<FoundLink> {
    let mut links = Vec::new();
    for (start, token) in tokens(text) {
        let Some(range) = trim_token(token) else {
            continue;
        };
        let candidate = &token[range.clone()];
        let href = if has_scheme(candidate) {
            Some(candidate.to_string())
        } else if is_www(candidate) {
            Some(format!("http://{}", candidate))
        } else if is_email(candidate) {
            Some(format!("mailto:{}", candidate))
        } else {
            None
        };
        if let Some(href) = href {
            links.push(FoundLink {
                range: start + range.start..start + range.end,
                href,
            });
        }
    }
    links
}

/// Whitespace separated tokens with their byte offsets.
fn tokens(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive(char::is_whitespace).map(move |piece| {
        let start = offset;
        offset += piece.len();
        (start, piece.trim_end())
    })
}

fn trim_token(token: &str) -> Option<Range<usize>> {
    let start = token.len() - token.trim_start_matches(LEADING_PUNCT).len();
    let mut end = token.len();

    while end > start {
        let slice = &token[start..end];
        let Some(last) = slice.chars().next_back() else {
            break;
        };
        let unbalanced_paren =
            last == ')' && slice.matches('(').count() < slice.matches(')').count();
        if TRAILING_PUNCT.contains(&last) || unbalanced_paren {
            end -= last.len_utf8();
        } else {
            break;
        }
    }

    (end > start).then_some(start..end)
}

fn has_scheme(candidate: &str) -> bool {
    let lower = candidate.to_ascii_lowercase();
    ["https://", "http://", "ftp://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

fn is_www(candidate: &str) -> bool {
    let lower = candidate.to_ascii_lowercase();
    lower
        .strip_prefix("www.")
        .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('.'))
}

fn is_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));

    let labels: Vec<&str> = domain.split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };
    let labels_ok = labels.len() >= 2
        && labels
            .iter()
            .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && labels_ok && tld_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hrefs(text: &str) -> Vec<String> {
        find_links(text).into_iter().map(|l| l.href).collect()
    }

    #[test]
    fn test_finds_scheme_urls() {
        assert_eq!(hrefs("go to http://a.io now"), vec!["http://a.io"]);
        assert_eq!(hrefs("HTTPS://A.IO/x?y=1"), vec!["HTTPS://A.IO/x?y=1"]);
        assert!(hrefs("https://").is_empty());
    }

    #[test]
    fn test_www_gets_http_prefix() {
        assert_eq!(hrefs("visit www.rust-lang.org!"), vec!["http://www.rust-lang.org"]);
    }

    #[test]
    fn test_emails() {
        assert_eq!(hrefs("mail me@example.com."), vec!["mailto:me@example.com"]);
        assert!(hrefs("@handle").is_empty());
        assert!(hrefs("a@b").is_empty());
        assert!(hrefs("x@y.c0m").is_empty());
    }

    #[test]
    fn test_trailing_parens() {
        assert_eq!(
            hrefs("(see https://en.wikipedia.org/wiki/Rust_(language))"),
            vec!["https://en.wikipedia.org/wiki/Rust_(language)"]
        );
        assert_eq!(hrefs("(https://a.io)"), vec!["https://a.io"]);
    }

    #[test]
    fn test_ranges_cover_visible_text() {
        let text = "a https://x.io, b";
        let links = find_links(text);
        assert_eq!(links.len(), 1);
        assert_eq!(&text[links[0].range.clone()], "https://x.io");
    }

    #[test]
    fn test_multibyte_text_is_split_on_boundaries() {
        let text = "çok güzel https://örnek.com.tr sayfası";
        let links = find_links(text);
        assert_eq!(&text[links[0].range.clone()], "https://örnek.com.tr");
    }
}
