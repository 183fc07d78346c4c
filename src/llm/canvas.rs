//! Prompt framing and update-block handling for canvas mode.
//!
//! In canvas mode the assistant may rewrite the editor buffer by wrapping
//! the new document in `<<<UPDATE>>>` ... `<<<END>>>`.

pub const UPDATE_OPEN: &str = "<<<UPDATE>>>";
pub const UPDATE_CLOSE: &str = "<<<END>>>";
pub const UPDATED_NOTICE: &str = "[Editor content updated]";

const ASSISTANT_PREAMBLE: &str = "You are an AI assistant built into a Markdown editor. \
Help the user when they ask for edits or new content.";

const CANVAS_ON: &str = "[SYSTEM: Canvas mode ON]\n\
If the user asks for changes, update the document below. \
Put the complete new document only between the <<<UPDATE>>> and <<<END>>> markers. \
Write any explanations outside the markers.";

const CANVAS_OFF: &str = "[SYSTEM: Canvas mode OFF]\n\
Read the user's document but you are NOT allowed to change it. \
Answer in the chat only and make suggestions. \
NEVER use the <<<UPDATE>>> marker.";

/// Replacement document found in a reply, plus the reply text to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasUpdate {
    pub content: String,
    pub display: String,
}

/// Build the user turn sent to the assistant.
pub fn build_prompt(request: &str, document: &str, canvas_mode: bool) -> String {
    let instruction = if canvas_mode { CANVAS_ON } else { CANVAS_OFF };
    format!(
        "{}\n\n{}\n\nUser request: {}\n\nCurrent editor content (reference):\n```markdown\n{}\n```",
        ASSISTANT_PREAMBLE, instruction, request, document
    )
}

/// Find the first complete update block in a reply.
pub fn extract_update(reply: &str) -> Option<CanvasUpdate> {
    let start = reply.find(UPDATE_OPEN)?;
    let content_start = start + UPDATE_OPEN.len();
    let close = reply[content_start..].find(UPDATE_CLOSE)? + content_start;
    let end = close + UPDATE_CLOSE.len();

    let mut display = String::with_capacity(reply.len());
    display.push_str(&reply[..start]);
    display.push_str(UPDATED_NOTICE);
    display.push_str(&reply[end..]);

    Some(CanvasUpdate {
        content: reply[content_start..close].trim().to_string(),
        display,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_trimmed_block() {
        let reply = "Sure, here you go.\n<<<UPDATE>>>\n# New title\n\nBody\n<<<END>>>\nAnything else?";
        let update = extract_update(reply).unwrap();

        assert_eq!(update.content, "# New title\n\nBody");
        assert_eq!(
            update.display,
            "Sure, here you go.\n[Editor content updated]\nAnything else?"
        );
        assert!(!update.display.contains(UPDATE_OPEN));
        assert!(!update.display.contains("# New title"));
    }

    #[test]
    fn test_first_block_wins_and_match_is_shortest() {
        let reply = "<<<UPDATE>>>one<<<END>>> and <<<UPDATE>>>two<<<END>>>";
        let update = extract_update(reply).unwrap();
        assert_eq!(update.content, "one");
        assert_eq!(update.display, "[Editor content updated] and <<<UPDATE>>>two<<<END>>>");
    }

    #[test]
    fn test_incomplete_blocks_are_ignored() {
        assert_eq!(extract_update("no markers at all"), None);
        assert_eq!(extract_update("<<<UPDATE>>> never closed"), None);
        assert_eq!(extract_update("<<<END>>> before <<<UPDATE>>>"), None);
    }

    #[test]
    fn test_empty_block() {
        let update = extract_update("<<<UPDATE>>>  \n <<<END>>>").unwrap();
        assert_eq!(update.content, "");
    }

    #[test]
    fn test_prompt_mentions_mode_and_document() {
        let on = build_prompt("fix typos", "Helo", true);
        assert!(on.contains("Canvas mode ON"));
        assert!(on.contains("User request: fix typos"));
        assert!(on.contains("```markdown\nHelo\n```"));

        let off = build_prompt("fix typos", "Helo", false);
        assert!(off.contains("Canvas mode OFF"));
        assert!(off.contains("NEVER use the <<<UPDATE>>> marker"));
    }
}
