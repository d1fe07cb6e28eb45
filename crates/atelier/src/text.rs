//! Accent- and case-insensitive search helpers.
//!
//! Three flavours of the same folding, for the three places a search term ends up:
//!
//! - [`normalize`] produces the canonical form of free text (no diacritics, lower case,
//!   single spaces).
//! - [`build_matcher`] turns a term into an in-process substring matcher whose regex can
//!   also be handed to stores with a regex operator.
//! - [`accent_insensitive_contains`] builds a SQL predicate that folds the stored column
//!   the same way, for filtering inside the database.

use regex::{Regex, RegexBuilder};
use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::ColumnTrait;
use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block.
fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Canonical search form of `text`: lower-cased, diacritics stripped, trimmed, inner
/// whitespace runs collapsed to one space.
///
/// Lower-casing happens before decomposition so characters whose lower-case form carries
/// a combining mark (`İ` → `i̇`) come out stable.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize`] for optional inputs such as absent query parameters.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

fn accent_class(c: char) -> Option<&'static str> {
    match c {
        'a' => Some("[aáàâãä]"),
        'e' => Some("[eéèêë]"),
        'i' => Some("[iíìîï]"),
        'o' => Some("[oóòôõö]"),
        'u' => Some("[uúùûü]"),
        'n' => Some("[nñ]"),
        'c' => Some("[cç]"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum Inner {
    All,
    Pattern(Regex),
    /// Used only if the regex exceeds the compiled size limit.
    Folded(String),
}

/// Case- and accent-insensitive substring matcher.
#[derive(Debug, Clone)]
pub struct Matcher {
    inner: Inner,
}

impl Matcher {
    /// The degenerate matcher that accepts everything.
    pub fn match_all() -> Self {
        Self { inner: Inner::All }
    }

    /// True for the degenerate matcher; callers should drop the filter entirely.
    pub fn is_match_all(&self) -> bool {
        matches!(self.inner, Inner::All)
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match &self.inner {
            Inner::All => true,
            Inner::Pattern(re) => re.is_match(haystack),
            Inner::Folded(needle) => normalize(haystack).contains(needle.as_str()),
        }
    }

    /// Regex source (without the case-insensitive flag) for stores with a regex operator.
    pub fn pattern(&self) -> Option<&str> {
        match &self.inner {
            Inner::Pattern(re) => Some(re.as_str()),
            Inner::All | Inner::Folded(_) => None,
        }
    }
}

/// Decomposed accents following a widened letter in the haystack.
const TRAILING_MARKS: &str = r"[\x{0300}-\x{036F}]*";

/// The accent class of `c`'s base letter, widened to contain `c` itself.
///
/// `None` for characters whose base letter has no class; those stay literal.
fn widen(c: char) -> Option<String> {
    let base = std::iter::once(c).nfd().next()?;
    let mut lower = base.to_lowercase();
    let class = match (lower.next(), lower.next()) {
        (Some(b), None) => accent_class(b)?,
        _ => return None,
    };

    if class.contains(c) {
        Some(class.to_string())
    } else {
        Some(format!("{}{c}]", &class[..class.len() - 1]))
    }
}

/// Build a matcher for a raw search term.
///
/// Letters whose base is one of `a e i o u n c` become accent classes. Every other
/// character is regex-escaped and kept as typed, so `Škoda` still finds `Škoda`.
/// Combining marks right after a widened letter are folded into that letter on both
/// sides, and whitespace runs match any whitespace run.
pub fn build_matcher(term: &str) -> Matcher {
    let needle = normalize(term);
    if needle.is_empty() {
        return Matcher::match_all();
    }

    let mut pattern = String::with_capacity(term.len() * 4);
    let mut buf = [0u8; 4];
    for (i, word) in term.split_whitespace().enumerate() {
        if i > 0 {
            pattern.push_str(r"\s+");
        }
        let mut widened = false;
        for c in word.chars() {
            if widened && is_combining_mark(c) {
                continue;
            }
            match widen(c) {
                Some(class) => {
                    pattern.push_str(&class);
                    pattern.push_str(TRAILING_MARKS);
                    widened = true;
                }
                None => {
                    pattern.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                    widened = false;
                }
            }
        }
    }

    let inner = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Inner::Pattern(re),
        Err(e) => {
            tracing::debug!(error = %e, "Search pattern rejected, matching on folded text");
            Inner::Folded(needle)
        }
    };

    Matcher { inner }
}

/// Characters the store-side predicate strips, applied one after another in this order.
/// Upper-case forms are listed because SQLite's `LOWER` only folds ASCII.
const STORE_STRIP: [(&str, &str); 12] = [
    ("á", "a"),
    ("Á", "a"),
    ("é", "e"),
    ("É", "e"),
    ("í", "i"),
    ("Í", "i"),
    ("ó", "o"),
    ("Ó", "o"),
    ("ú", "u"),
    ("Ú", "u"),
    ("ñ", "n"),
    ("Ñ", "n"),
];

/// Escape character for LIKE patterns. Not a backslash, so no SQL dialect re-escapes it.
const LIKE_ESCAPE: char = '!';

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, LIKE_ESCAPE | '%' | '_') {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// `LOWER(REPLACE(...REPLACE(column, 'á', 'a')..., 'Ñ', 'n')) LIKE '%term%'`.
///
/// Only the accents in `STORE_STRIP` are folded on the column while the term is fully
/// normalized, so a stored `Pingüino` is not found by `pingüino` or `pinguino`. Use
/// [`build_matcher`] where every diacritic has to be ignored.
///
/// Returns `None` when the term normalizes to nothing, meaning "no filter".
pub fn accent_insensitive_contains<C: ColumnTrait>(column: C, term: &str) -> Option<SimpleExpr> {
    let needle = normalize(term);
    if needle.is_empty() {
        return None;
    }

    let mut folded: SimpleExpr = Expr::col(column.as_column_ref()).into();
    for (from, to) in STORE_STRIP {
        folded = Func::cust(Alias::new("REPLACE"))
            .arg(folded)
            .arg(from)
            .arg(to)
            .into();
    }

    let pattern = LikeExpr::new(format!("%{}%", escape_like(&needle))).escape(LIKE_ESCAPE);
    Some(Expr::expr(Func::lower(folded)).like(pattern))
}

#[cfg(test)]
mod tests {
    use entity::post;
    use proptest::prelude::*;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    use super::*;

    #[test]
    fn normalize_folds_case_accents_and_spaces() {
        assert_eq!(normalize("  Ça   Va "), "ca va");
        assert_eq!(normalize("Crème\tBrûlée\n"), "creme brulee");
        assert_eq!(normalize("NIÑO"), "nino");
        assert_eq!(normalize("e\u{0301}"), "e");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\u{0301}\u{0308}  "), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some(" Olé ")), "ole");
    }

    #[test]
    fn matcher_ignores_case_and_accents() {
        let m = build_matcher("café");
        assert!(m.is_match("CAFE"));
        assert!(m.is_match("cafe"));
        assert!(m.is_match("Le Café du coin"));
        assert!(m.is_match("CAFÉ"));
        assert!(!m.is_match("caff"));

        assert!(build_matcher("niño").is_match("nino"));
        assert!(build_matcher("nino").is_match("Niño"));
        assert!(build_matcher("garcon").is_match("garçon"));
    }

    #[test]
    fn empty_term_matches_everything() {
        for term in ["", "   ", "\u{0301}"] {
            let m = build_matcher(term);
            assert!(m.is_match_all());
            assert!(m.is_match("anything"));
            assert!(m.is_match(""));
            assert_eq!(m.pattern(), None);
        }
    }

    #[test]
    fn metacharacters_are_literal() {
        let m = build_matcher("a.b");
        assert!(!m.is_match("axb"));
        assert!(m.is_match("A.B"));

        let m = build_matcher("c++ (beta)*");
        assert!(m.is_match("Curso de C++ (beta)* avanzado"));
        assert!(!m.is_match("c (beta)"));
    }

    #[test]
    fn classes_are_not_escaped() {
        let m = build_matcher("ana");
        let expected = format!("[aáàâãä]{TRAILING_MARKS}[nñ]{TRAILING_MARKS}[aáàâãä]{TRAILING_MARKS}");
        assert_eq!(m.pattern(), Some(expected.as_str()));
    }

    #[test]
    fn letters_outside_the_classes_stay_literal() {
        for word in ["Škoda", "Erdős", "Dvořák", "Łódź", "İstanbul", "Øresund"] {
            assert!(build_matcher(word).is_match(word), "{word}");
            assert!(build_matcher(&word.to_uppercase()).is_match(word), "{word}");
        }
        assert!(build_matcher("dvořak").is_match("DVOŘÁK"));
        assert!(!build_matcher("dvorak").is_match("Dvořák"));
        assert!(!build_matcher("škoda").is_match("skoda"));
    }

    #[test]
    fn decomposed_accents_match_composed_ones() {
        assert!(build_matcher("cafe\u{0301}").is_match("café"));
        assert!(build_matcher("café").is_match("cafe\u{0301} con leche"));
        assert!(build_matcher("a\u{0301}b").is_match("xa\u{0301}\u{0301}by"));
    }

    #[test]
    fn whitespace_runs_are_interchangeable() {
        let m = build_matcher("  café   con ");
        assert!(m.is_match("un cafe con leche"));
        assert!(m.is_match("CAFÉ\t\tCON"));
        assert!(!m.is_match("cafécon"));
    }

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");
        assert_eq!(escape_like("a\\b"), "a\\b");
    }

    #[test]
    fn store_predicate_folds_column() {
        assert!(accent_insensitive_contains(post::Column::Title, "  ").is_none());

        let expr = accent_insensitive_contains(post::Column::Title, "Café").unwrap();
        let sql = post::Entity::find()
            .filter(expr)
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains("LOWER(REPLACE("), "{sql}");
        assert_eq!(sql.matches("REPLACE(").count(), 12, "{sql}");
        assert!(sql.contains("'%cafe%'"), "{sql}");
        assert!(sql.contains("ESCAPE"), "{sql}");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn matcher_accepts_its_own_term(s in "\\PC{1,24}") {
            prop_assert!(build_matcher(&s).is_match(&s));
        }
    }
}
