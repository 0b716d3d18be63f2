use crate::error::{Result, SyllabusSplitterError};
use lopdf::Document;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Read access to the text of a loaded document, page by page.
pub trait PageTextSource {
    fn page_count(&self) -> usize;

    /// Text of the 0-based page `index`.
    fn page_text(&self, index: usize) -> Result<String>;
}

/// Copies an inclusive, 0-based page range into a new standalone PDF.
pub trait SegmentExtractor {
    fn extract_range(&self, start_page: usize, end_page: usize) -> Result<Vec<u8>>;
}

/// A PDF loaded with `lopdf` for page copies. Page text comes from
/// `pdf-extract`, which lays glyphs out into lines and decodes `ToUnicode`
/// CMaps; `lopdf` text extraction is the fallback when it fails.
pub struct PdfDocument {
    inner: Document,
    page_numbers: Vec<u32>,
    page_texts: Option<Vec<String>>,
}

impl PdfDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(bytes).map_err(|e| SyllabusSplitterError::UnreadableInput {
            reason: e.to_string(),
        })?;

        if inner.is_encrypted() {
            warn!("PDF is encrypted; page text may not be readable");
        }

        // get_pages is keyed by 1-based page number in document order
        let page_numbers: Vec<u32> = inner.get_pages().keys().copied().collect();
        debug!("Loaded PDF with {} pages", page_numbers.len());

        let page_texts = match extract_page_texts(bytes) {
            Ok(texts) if texts.len() == page_numbers.len() => Some(texts),
            Ok(texts) => {
                warn!(
                    "Text extraction returned {} pages for a {} page PDF; using raw text operators",
                    texts.len(),
                    page_numbers.len()
                );
                None
            }
            Err(e) => {
                warn!("{}; using raw text operators", e);
                None
            }
        };

        Ok(Self {
            inner,
            page_numbers,
            page_texts,
        })
    }

    fn page_number(&self, index: usize) -> Result<u32> {
        self.page_numbers
            .get(index)
            .copied()
            .ok_or_else(|| SyllabusSplitterError::InvalidRanges {
                reason: format!(
                    "page {} is outside a document of {} pages",
                    index,
                    self.page_numbers.len()
                ),
            })
    }
}

/// One string per page. `pdf_extract` panics on some malformed input, so the
/// call runs behind `catch_unwind`.
fn extract_page_texts(bytes: &[u8]) -> Result<Vec<String>> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(SyllabusSplitterError::UnreadableInput {
            reason: format!("PDF text extraction failed: {}", e),
        }),
        Err(_) => Err(SyllabusSplitterError::UnreadableInput {
            reason: "PDF text extraction panicked".to_string(),
        }),
    }
}

impl PageTextSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let page_number = self.page_number(index)?;
        if let Some(texts) = &self.page_texts {
            return Ok(texts[index].clone());
        }
        self.inner
            .extract_text(&[page_number])
            .map_err(|e| SyllabusSplitterError::UnreadableInput {
                reason: format!("cannot read text of page {}: {}", index + 1, e),
            })
    }
}

impl SegmentExtractor for PdfDocument {
    fn extract_range(&self, start_page: usize, end_page: usize) -> Result<Vec<u8>> {
        if start_page > end_page || end_page >= self.page_numbers.len() {
            return Err(SyllabusSplitterError::InvalidRanges {
                reason: format!(
                    "range {}-{} does not fit a document of {} pages",
                    start_page,
                    end_page,
                    self.page_numbers.len()
                ),
            });
        }

        let outside: Vec<u32> = self
            .page_numbers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx < start_page || *idx > end_page)
            .map(|(_, number)| *number)
            .collect();

        let mut segment = self.inner.clone();
        segment.delete_pages(&outside);
        segment.prune_objects();
        segment.renumber_objects();
        segment.compress();

        let mut bytes = Vec::new();
        segment
            .save_to(&mut bytes)
            .map_err(|e| SyllabusSplitterError::SegmentWrite {
                name: format!("pages {}-{}", start_page + 1, end_page + 1),
                reason: e.to_string(),
            })?;

        debug!(
            "Copied pages {}-{} into a {} byte PDF",
            start_page + 1,
            end_page + 1,
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
#[derive(Clone, Copy)]
enum FixtureFont {
    /// Standard Helvetica with WinAnsi single-byte codes.
    WinAnsi,
    /// Composite font with 2-byte Identity-H codes and a `ToUnicode` CMap, the
    /// way office suites export embedded TrueType fonts.
    Type0,
}

/// Builds a small Helvetica PDF. Each page is a single text object with one
/// `Td` move per line, like word-processor output.
#[cfg(test)]
pub(crate) fn build_test_pdf(pages: &[&str]) -> Vec<u8> {
    build_fixture_pdf(pages, FixtureFont::WinAnsi)
}

/// Same layout as [`build_test_pdf`], using a Type0 font whose codes only
/// decode through the `ToUnicode` CMap.
#[cfg(test)]
pub(crate) fn build_type0_test_pdf(pages: &[&str]) -> Vec<u8> {
    build_fixture_pdf(pages, FixtureFont::Type0)
}

#[cfg(test)]
fn build_fixture_pdf(pages: &[&str], font: FixtureFont) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream, StringFormat};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    // Code 1.. assigned to each distinct character, in order of appearance
    let mut glyphs: Vec<char> = Vec::new();
    for c in pages.iter().flat_map(|page| page.chars()) {
        if c != '\n' && !glyphs.contains(&c) {
            glyphs.push(c);
        }
    }

    let font_id = match font {
        FixtureFont::WinAnsi => doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        }),
        FixtureFont::Type0 => {
            let mut cmap = String::from(
                "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
                 /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
                 /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
                 1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
            );
            cmap.push_str(&format!("{} beginbfchar\n", glyphs.len()));
            for (idx, c) in glyphs.iter().enumerate() {
                cmap.push_str(&format!("<{:04X}> <{:04X}>\n", idx + 1, *c as u32));
            }
            cmap.push_str(
                "endbfchar\nendcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n",
            );
            let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, cmap.into_bytes()));

            let descriptor_id = doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => "ArialMT",
                "Flags" => 32,
                "FontBBox" => vec![(-665).into(), (-325).into(), 2000.into(), 1006.into()],
                "ItalicAngle" => 0,
                "Ascent" => 905,
                "Descent" => -212,
                "CapHeight" => 716,
                "StemV" => 80,
            });
            let cid_font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "CIDFontType2",
                "BaseFont" => "ArialMT",
                "CIDSystemInfo" => dictionary! {
                    "Registry" => Object::string_literal("Adobe"),
                    "Ordering" => Object::string_literal("Identity"),
                    "Supplement" => 0,
                },
                "FontDescriptor" => descriptor_id,
                "DW" => 600,
            });
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "ArialMT",
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![cid_font_id.into()],
                "ToUnicode" => to_unicode_id,
            })
        }
    };
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let encode_line = |line: &str| -> Object {
        match font {
            // WinAnsi matches Latin-1 for the accented letters used here
            FixtureFont::WinAnsi => Object::String(
                line.chars()
                    .map(|c| if (c as u32) < 256 { c as u32 as u8 } else { b'?' })
                    .collect(),
                StringFormat::Literal,
            ),
            FixtureFont::Type0 => Object::String(
                line.chars()
                    .flat_map(|c| {
                        let code = glyphs.iter().position(|g| *g == c).unwrap_or(0) as u16 + 1;
                        code.to_be_bytes()
                    })
                    .collect(),
                StringFormat::Hexadecimal,
            ),
        }
    };

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 800.into()]),
        ];
        for (idx, line) in text.lines().enumerate() {
            if idx > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            }
            operations.push(Operation::new("Tj", vec![encode_line(line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
