//! Structural blocks for the DOCX writer.
//!
//! Blocks come from one of two places: rendered HTML posted by the client, or the
//! Document / Letter directly when no markup is available. Either way the output keeps
//! heading, paragraph, and list-item semantics and nothing else.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::models::letter::Signature;
use crate::models::{Document, Letter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BlockKind {
    Heading { level: u8 },
    Paragraph,
    ListItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    fn heading(level: u8, text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Heading { level },
            text: text.into(),
        }
    }

    fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
        }
    }

    fn list_item(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::ListItem,
            text: text.into(),
        }
    }
}

/// Description lines starting with this marker render as list items.
const BULLET_MARKER: &str = "• ";

// ────────────────────────────────────────────────────────────────────────────
// From rendered HTML
// ────────────────────────────────────────────────────────────────────────────

/// Walks rendered markup in document order. Elements nested inside an already
/// recorded block are folded into that block's text.
pub fn blocks_from_html(html: &str) -> Vec<Block> {
    let document = Html::parse_fragment(html);
    let mut blocks = Vec::new();
    collect(document.root_element(), &mut blocks);
    blocks
}

fn collect(root: ElementRef<'_>, blocks: &mut Vec<Block>) {
    for child in root.children().filter_map(ElementRef::wrap) {
        let tag = child.value().name();
        if matches!(tag, "script" | "style" | "template" | "noscript" | "svg") {
            continue;
        }

        let kind = match tag {
            "h1" => Some(BlockKind::Heading { level: 1 }),
            "h2" => Some(BlockKind::Heading { level: 2 }),
            "h3" => Some(BlockKind::Heading { level: 3 }),
            "h4" | "h5" | "h6" => Some(BlockKind::Heading { level: 4 }),
            "p" => Some(BlockKind::Paragraph),
            "li" => Some(BlockKind::ListItem),
            _ => None,
        };

        match kind {
            Some(kind) => {
                let text = collapse_whitespace(&child.text().collect::<String>());
                if !text.is_empty() {
                    blocks.push(Block { kind, text });
                }
            }
            None => collect(child, blocks),
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Outer HTML of the first element matching `selector`, used to pick the export root.
pub fn select_root(html: &str, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let document = Html::parse_document(html);
    let root = document.select(&selector).next()?;
    Some(root.html())
}

// ────────────────────────────────────────────────────────────────────────────
// From the Document Model
// ────────────────────────────────────────────────────────────────────────────

pub fn blocks_from_document(document: &Document) -> Vec<Block> {
    let p = &document.personal;
    let mut blocks = Vec::new();

    push_non_empty(&mut blocks, Block::heading(1, p.full_name.trim()));
    push_non_empty(&mut blocks, Block::paragraph(p.title.trim()));
    push_non_empty(
        &mut blocks,
        Block::paragraph(join_present(
            [&p.email, &p.phone, &p.location, &p.linkedin, &p.github],
            " | ",
        )),
    );

    if !p.summary.trim().is_empty() {
        blocks.push(Block::heading(2, "Profile"));
        push_description(&mut blocks, &p.summary);
    }

    if !document.experiences.is_empty() {
        blocks.push(Block::heading(2, "Experience"));
        for exp in &document.experiences {
            push_non_empty(
                &mut blocks,
                Block::heading(3, join_present([&exp.position, &exp.company], ", ")),
            );
            push_non_empty(
                &mut blocks,
                Block::paragraph(join_present([&exp.start_date, &exp.end_date], " - ")),
            );
            push_description(&mut blocks, &exp.description);
        }
    }

    if !document.education.is_empty() {
        blocks.push(Block::heading(2, "Education"));
        for edu in &document.education {
            let subject = join_present([&edu.degree, &edu.field], " in ");
            push_non_empty(
                &mut blocks,
                Block::heading(3, join_present([&subject, &edu.institution], ", ")),
            );
            push_non_empty(
                &mut blocks,
                Block::paragraph(join_present([&edu.start_date, &edu.end_date], " - ")),
            );
            push_non_empty(&mut blocks, Block::paragraph(edu.grade.trim()));
        }
    }

    if !document.skills.is_empty() {
        blocks.push(Block::heading(2, "Skills"));
        blocks.push(Block::paragraph(
            document.skills.iter().collect::<Vec<_>>().join(", "),
        ));
    }

    blocks
}

pub fn blocks_from_letter(letter: &Letter, document: &Document) -> Vec<Block> {
    let contact = letter.effective_contact(document);
    let mut blocks = Vec::new();

    push_non_empty(&mut blocks, Block::heading(1, contact.full_name.trim()));
    push_non_empty(
        &mut blocks,
        Block::paragraph(join_present(
            [
                &contact.email,
                &contact.phone,
                &contact.location,
                &contact.linkedin,
                &contact.github,
            ],
            " | ",
        )),
    );
    push_non_empty(&mut blocks, Block::paragraph(letter.date.trim()));
    push_non_empty(&mut blocks, Block::paragraph(letter.job_title.trim()));
    push_non_empty(&mut blocks, Block::paragraph(letter.recipient_name.trim()));

    for paragraph in letter.body.split("\n\n") {
        push_non_empty(&mut blocks, Block::paragraph(collapse_whitespace(paragraph)));
    }

    push_non_empty(&mut blocks, Block::paragraph(letter.sign_off.trim()));
    let signed_name = match &letter.signature {
        Signature::Typed { text, .. } if !text.trim().is_empty() => text.trim(),
        _ => contact.full_name.trim(),
    };
    push_non_empty(&mut blocks, Block::paragraph(signed_name));

    blocks
}

/// Plain lines join into one paragraph; `• ` lines become list items after it.
fn push_description(blocks: &mut Vec<Block>, description: &str) {
    let lines: Vec<&str> = description.lines().filter(|l| !l.is_empty()).collect();
    let (bullets, plain): (Vec<&str>, Vec<&str>) =
        lines.into_iter().partition(|l| l.starts_with(BULLET_MARKER));

    push_non_empty(blocks, Block::paragraph(plain.join(" ").trim()));
    for bullet in bullets {
        push_non_empty(
            blocks,
            Block::list_item(bullet.trim_start_matches(BULLET_MARKER).trim()),
        );
    }
}

fn push_non_empty(blocks: &mut Vec<Block>, block: Block) {
    if !block.text.is_empty() {
        blocks.push(block);
    }
}

fn join_present<const N: usize>(parts: [&String; N], separator: &str) -> String {
    parts
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
