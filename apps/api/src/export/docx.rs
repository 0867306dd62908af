use std::io::Cursor;

use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, Run, SpecialIndentType, Start,
};

use crate::export::markup::{Block, BlockKind};
use crate::export::ExportError;

const BULLET_NUMBERING_ID: usize = 1;

/// Font sizes are in half-points.
fn heading_size(level: u8) -> usize {
    match level {
        1 => 36,
        2 => 28,
        3 => 24,
        _ => 22,
    }
}

/// Writes blocks as a `.docx` package. Pagination is left to the word processor.
pub fn render_docx(blocks: &[Block], font: &str) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new()
        .default_fonts(docx_rs::RunFonts::new().ascii(font).hi_ansi(font))
        .default_size(22)
        .add_abstract_numbering(
            AbstractNumbering::new(BULLET_NUMBERING_ID).add_level(
                Level::new(
                    0,
                    Start::new(1),
                    NumberFormat::new("bullet"),
                    LevelText::new("•"),
                    LevelJc::new("left"),
                )
                .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None),
            ),
        )
        .add_numbering(Numbering::new(BULLET_NUMBERING_ID, BULLET_NUMBERING_ID));

    for block in blocks {
        docx = docx.add_paragraph(paragraph_for(block));
    }

    let mut bytes = Vec::new();
    docx.build()
        .pack(Cursor::new(&mut bytes))
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}

fn paragraph_for(block: &Block) -> Paragraph {
    let run = Run::new().add_text(&block.text);
    match block.kind {
        BlockKind::Heading { level } => {
            Paragraph::new().add_run(run.bold().size(heading_size(level)))
        }
        BlockKind::Paragraph => Paragraph::new().add_run(run),
        BlockKind::ListItem => Paragraph::new()
            .add_run(run)
            .numbering(NumberingId::new(BULLET_NUMBERING_ID), IndentLevel::new(0)),
    }
}
