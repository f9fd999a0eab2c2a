//! Minimal PDF 1.4 writer for laid-out documents.
//!
//! Only the three standard base fonts are used (no embedding), text is
//! WinAnsi-encoded, and the output depends on nothing but the `Document`, so
//! identical input yields identical bytes.

use super::layout::{Document, Font, Page};

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const INFO_ID: usize = 3;
const FONT_REGULAR_ID: usize = 4;
const FONT_BOLD_ID: usize = 5;
const FONT_MONO_ID: usize = 6;
const FIRST_PAGE_ID: usize = 7;

fn font_resource(font: Font) -> &'static str {
    match font {
        Font::Regular => "F1",
        Font::Bold => "F2",
        Font::Mono => "F3",
    }
}

/// Encode text as a PDF literal string body in WinAnsi.
fn encode_text(text: &str, out: &mut Vec<u8>) {
    for ch in text.chars() {
        let byte = match ch {
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2026}' => 0x85,
            '\u{20AC}' => 0x80,
            c if (c as u32) < 0x100 => c as u32 as u8,
            _ => b'?',
        };
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            0x20..=0x7e => out.push(byte),
            _ => out.extend_from_slice(format!("\\{:03o}", byte).as_bytes()),
        }
    }
}

fn content_stream(page: &Page) -> Vec<u8> {
    let mut out = Vec::new();
    for line in &page.lines {
        if line.text.is_empty() {
            continue;
        }
        out.extend_from_slice(
            format!(
                "BT /{} {:.2} Tf {:.2} {:.2} Td (",
                font_resource(line.font),
                line.size,
                line.x,
                line.y
            )
            .as_bytes(),
        );
        encode_text(&line.text, &mut out);
        out.extend_from_slice(b") Tj ET\n");
    }
    out
}

struct Writer {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl Writer {
    fn object(&mut self, id: usize, body: &[u8]) {
        if self.offsets.len() < id {
            self.offsets.resize(id, 0);
        }
        self.offsets[id - 1] = self.buf.len();
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }
}

fn pdf_date(doc: &Document) -> String {
    doc.created_at.format("D:%Y%m%d%H%M%SZ").to_string()
}

fn literal(text: &str) -> Vec<u8> {
    let mut out = vec![b'('];
    encode_text(text, &mut out);
    out.push(b')');
    out
}

/// Serialise a document to PDF bytes.
pub fn render_pdf(doc: &Document) -> Vec<u8> {
    let mut w = Writer {
        buf: b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec(),
        offsets: Vec::new(),
    };

    let page_ids: Vec<usize> = (0..doc.pages.len())
        .map(|i| FIRST_PAGE_ID + i * 2)
        .collect();

    w.object(
        CATALOG_ID,
        format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID).as_bytes(),
    );
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
    w.object(
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_ids.len()
        )
        .as_bytes(),
    );

    let mut info = b"<< /Title ".to_vec();
    info.extend(literal(&doc.title));
    if let Some(author) = &doc.author {
        info.extend_from_slice(b" /Author ");
        info.extend(literal(author));
    }
    info.extend_from_slice(b" /Producer (Aether) /CreationDate ");
    info.extend(literal(&pdf_date(doc)));
    info.extend_from_slice(b" >>");
    w.object(INFO_ID, &info);

    for (id, base) in [
        (FONT_REGULAR_ID, "Helvetica"),
        (FONT_BOLD_ID, "Helvetica-Bold"),
        (FONT_MONO_ID, "Courier"),
    ] {
        w.object(
            id,
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                base
            )
            .as_bytes(),
        );
    }

    for (page, page_id) in doc.pages.iter().zip(&page_ids) {
        let content_id = page_id + 1;
        w.object(
            *page_id,
            format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 {} 0 R /F2 {} 0 R /F3 {} 0 R >> >> \
                 /Contents {} 0 R >>",
                PAGES_ID,
                doc.width,
                doc.height,
                FONT_REGULAR_ID,
                FONT_BOLD_ID,
                FONT_MONO_ID,
                content_id
            )
            .as_bytes(),
        );
        let stream = content_stream(page);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        w.object(content_id, &body);
    }

    let xref_offset = w.buf.len();
    let count = w.offsets.len() + 1;
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", count);
    for offset in &w.offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
        count, CATALOG_ID, INFO_ID, xref_offset
    ));
    w.buf.extend_from_slice(xref.as_bytes());
    w.buf
}
