use crate::types::UNKNOWN_COURSE_PREFIX;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

static UNSAFE_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const MAX_NAME_CHARS: usize = 100;

pub struct NameSanitizer;

impl NameSanitizer {
    /// Filesystem-safe version of a raw title. Idempotent.
    pub fn sanitize(raw: &str) -> String {
        let stripped = UNSAFE_CHARS_RE.replace_all(raw, "");
        let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
        let trimmed = collapsed.trim();

        if trimmed.chars().count() > MAX_NAME_CHARS {
            let truncated: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
            truncated.trim_end().to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// Assigns unique final names to sanitized titles, in document order.
///
/// Empty titles become `Curso_Desconocido_K`. Repeated names get `_1`, `_2`,
/// ... appended; a suffixed name that was already emitted is skipped so the
/// output never repeats.
#[derive(Debug, Default)]
pub struct DuplicateResolver {
    occurrences: HashMap<String, usize>,
    emitted: HashSet<String>,
    unknown_count: usize,
}

impl DuplicateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, sanitized: &str) -> String {
        let base = if sanitized.is_empty() {
            self.unknown_count += 1;
            format!("{}_{}", UNKNOWN_COURSE_PREFIX, self.unknown_count)
        } else {
            sanitized.to_string()
        };

        let name = if !self.occurrences.contains_key(&base) && !self.emitted.contains(&base) {
            self.occurrences.insert(base.clone(), 0);
            base
        } else {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            let mut candidate;
            loop {
                *count += 1;
                candidate = format!("{}_{}", base, count);
                if !self.emitted.contains(&candidate) {
                    break;
                }
            }
            debug!("Duplicate course name '{}' renamed to '{}'", base, candidate);
            candidate
        };

        self.emitted.insert(name.clone());
        name
    }

    pub fn resolve_all<I, S>(&mut self, titles: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        titles
            .into_iter()
            .map(|title| self.resolve(title.as_ref()))
            .collect()
    }

    /// Synthetic names handed out so far.
    pub fn unknown_count(&self) -> usize {
        self.unknown_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_unsafe_chars() {
        assert_eq!(
            NameSanitizer::sanitize(r#"A<B>C:D"E/F\G|H?I*J"#),
            "ABCDEFGHIJ"
        );
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(
            NameSanitizer::sanitize("  CALCULO \t  DIFERENCIAL\n I  "),
            "CALCULO DIFERENCIAL I"
        );
    }

    #[test]
    fn test_sanitize_truncates_to_limit() {
        let long = format!("{} {}", "A".repeat(99), "B".repeat(20));
        let sanitized = NameSanitizer::sanitize(&long);

        // The 100th character is the space, trimmed away after truncation
        assert_eq!(sanitized, "A".repeat(99));
        assert!(sanitized.chars().count() <= MAX_NAME_CHARS);
    }

    #[test]
    fn test_sanitize_counts_characters_not_bytes() {
        let long = "Ñ".repeat(150);
        let sanitized = NameSanitizer::sanitize(&long);
        assert_eq!(sanitized.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "  Gestión:  de \"Proyectos\" / II  ",
            "",
            "***",
            "MATEMÁTICA\tAPLICADA",
        ];
        for input in inputs {
            let once = NameSanitizer::sanitize(input);
            assert_eq!(NameSanitizer::sanitize(&once), once);
            assert!(!once.contains(['<', '>', ':', '"', '/', '\\', '|', '?', '*']));
        }

        let long = format!("{}  x", "palabra ".repeat(20));
        let once = NameSanitizer::sanitize(&long);
        assert_eq!(NameSanitizer::sanitize(&once), once);
    }

    #[test]
    fn test_duplicates_get_running_suffix() {
        let mut resolver = DuplicateResolver::new();
        let names = resolver.resolve_all(["CALCULO", "FISICA", "CALCULO", "CALCULO"]);
        assert_eq!(names, vec!["CALCULO", "FISICA", "CALCULO_1", "CALCULO_2"]);
    }

    #[test]
    fn test_unknown_titles_are_numbered() {
        let mut resolver = DuplicateResolver::new();
        let names = resolver.resolve_all(["", "ALGEBRA", ""]);
        assert_eq!(
            names,
            vec!["Curso_Desconocido_1", "ALGEBRA", "Curso_Desconocido_2"]
        );
        assert_eq!(resolver.unknown_count(), 2);
    }

    #[test]
    fn test_literal_suffix_does_not_collide() {
        let mut resolver = DuplicateResolver::new();
        let names = resolver.resolve_all(["CALCULO", "CALCULO", "CALCULO_1", "CALCULO"]);

        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names[..2], ["CALCULO", "CALCULO_1"]);
        assert_eq!(names[2], "CALCULO_1_1");
        assert_eq!(names[3], "CALCULO_2");
    }

    #[test]
    fn test_title_matching_synthetic_name() {
        let mut resolver = DuplicateResolver::new();
        let names = resolver.resolve_all(["Curso_Desconocido_1", ""]);
        assert_eq!(names, vec!["Curso_Desconocido_1", "Curso_Desconocido_1_1"]);
    }
}
