use crate::services::pdf::PageTextSource;
use crate::types::{MarkerHit, MARKER};
use tracing::{debug, info, warn};

/// Lowercase words that identify syllabus template fields rather than titles.
const FIELD_WORDS: [&str; 9] = [
    "código",
    "créditos",
    "horas",
    "ciclo",
    "semestre",
    "requisito",
    "docente",
    "sumilla",
    "competencia",
];

/// A colon preceded by fewer characters than this marks a `Label: value` field.
const FIELD_LABEL_MAX_CHARS: usize = 20;

/// Finds the pages that open a new syllabus.
///
/// The marker is matched as a case-sensitive substring anywhere in the page
/// text, so body text that quotes the marker mid-sentence also starts a new
/// course.
pub struct MarkerScanner {
    marker: &'static str,
}

impl MarkerScanner {
    pub fn new() -> Self {
        Self { marker: MARKER }
    }

    pub fn scan<S: PageTextSource + ?Sized>(&self, source: &S) -> Vec<MarkerHit> {
        let total_pages = source.page_count();
        info!("Scanning {} pages for '{}'", total_pages, self.marker);

        let mut hits = Vec::new();
        // Sequential scan keeps hits in ascending page order
        for page_index in 0..total_pages {
            let text = match source.page_text(page_index) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping page {}: {}", page_index + 1, e);
                    continue;
                }
            };

            if let Some(trailing) = self.trailing_text(&text) {
                let raw_title = NameExtractor::extract_title(trailing);
                debug!(
                    "Marker on page {}, raw title '{}'",
                    page_index + 1,
                    raw_title
                );
                hits.push(MarkerHit {
                    page_index,
                    raw_title,
                });
            }
        }

        info!("Found {} marker pages", hits.len());
        hits
    }

    /// Text after the first marker occurrence, if the page has one.
    pub fn trailing_text<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.find(self.marker)
            .map(|idx| &text[idx + self.marker.len()..])
    }
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NameExtractor;

impl NameExtractor {
    /// First line after the marker that looks like a course title, or an
    /// empty string when none does.
    pub fn extract_title(trailing: &str) -> String {
        trailing
            .split('\n')
            .map(str::trim)
            .find(|line| Self::is_title_candidate(line))
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn is_title_candidate(line: &str) -> bool {
        if line.chars().count() <= 1 {
            return false;
        }

        let lowered = line.to_lowercase();
        if FIELD_WORDS.iter().any(|word| lowered.contains(word)) {
            return false;
        }

        if let Some((label, _)) = line.split_once(':') {
            if label.chars().count() < FIELD_LABEL_MAX_CHARS {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SyllabusSplitterError};

    struct Pages(Vec<&'static str>);

    impl PageTextSource for Pages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_text(&self, index: usize) -> Result<String> {
            match self.0[index] {
                "<unreadable>" => Err(SyllabusSplitterError::UnreadableInput {
                    reason: "broken page".to_string(),
                }),
                text => Ok(text.to_string()),
            }
        }
    }

    #[test]
    fn test_title_on_next_line() {
        assert_eq!(NameExtractor::extract_title("\nALGEBRA\nmore"), "ALGEBRA");
    }

    #[test]
    fn test_field_lines_are_skipped() {
        let trailing = "\nCódigo: 123456\n\nCALCULO I\n";
        assert_eq!(NameExtractor::extract_title(trailing), "CALCULO I");
    }

    #[test]
    fn test_exclusion_words_are_case_insensitive() {
        let trailing = "\nHORAS SEMANALES 4\nCiclo III\nQUIMICA GENERAL";
        assert_eq!(NameExtractor::extract_title(trailing), "QUIMICA GENERAL");
    }

    #[test]
    fn test_single_character_lines_are_skipped() {
        let trailing = "\n-\n \nX\nREDES";
        assert_eq!(NameExtractor::extract_title(trailing), "REDES");
    }

    #[test]
    fn test_long_label_before_colon_is_kept() {
        let trailing = "\nIntroducción a la programación: fundamentos";
        assert_eq!(
            NameExtractor::extract_title(trailing),
            "Introducción a la programación: fundamentos"
        );
    }

    #[test]
    fn test_title_keeps_inner_spacing() {
        let trailing = "\n   DISEÑO   DE   PLANTA  \n";
        assert_eq!(NameExtractor::extract_title(trailing), "DISEÑO   DE   PLANTA");
    }

    #[test]
    fn test_no_candidate_gives_empty_title() {
        let trailing = "\nDocente: Juan\nSumilla\nx\n";
        assert_eq!(NameExtractor::extract_title(trailing), "");
        assert_eq!(NameExtractor::extract_title(""), "");
    }

    #[test]
    fn test_title_on_same_line_as_marker() {
        let scanner = MarkerScanner::new();
        let trailing = scanner.trailing_text("Sílabo del Curso TOPOGRAFIA\nCiclo I").unwrap();
        assert_eq!(NameExtractor::extract_title(trailing), "TOPOGRAFIA");
    }

    #[test]
    fn test_scan_finds_marker_pages_in_order() {
        let pages = Pages(vec![
            "Sílabo del Curso\nALGEBRA",
            "contenido",
            "Tecsup - Sílabo del Curso\nFISICA",
            "sílabo del curso en minúsculas",
        ]);
        let hits = MarkerScanner::new().scan(&pages);

        assert_eq!(
            hits,
            vec![
                MarkerHit {
                    page_index: 0,
                    raw_title: "ALGEBRA".to_string()
                },
                MarkerHit {
                    page_index: 2,
                    raw_title: "FISICA".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_scan_skips_unreadable_pages() {
        let pages = Pages(vec!["Sílabo del Curso\nALGEBRA", "<unreadable>", "Sílabo del Curso\nFISICA"]);
        let hits = MarkerScanner::new().scan(&pages);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].page_index, 2);
    }

    #[test]
    fn test_scan_without_marker() {
        let pages = Pages(vec!["nada", "que ver"]);
        assert!(MarkerScanner::new().scan(&pages).is_empty());
    }
}
