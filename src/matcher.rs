//! Case-insensitive subsequence matching on top of `nucleo-matcher`.
//!
//! A line matches when every query character appears in it, in order.
//! nucleo picks the best alignment and scores it: matched characters,
//! consecutive runs and word boundaries (start of line, after whitespace or a
//! separator) earn points, gaps cost points. Two adjustments are layered on
//! top of that score:
//!
//! - every unmatched character inside the matched span costs
//!   [`PENALTY_SPAN`], so a tighter match of the same query always outranks a
//!   looser one
//! - the distance from the first non-blank character to the match start
//!   costs one point per character, up to [`MAX_LEADING_PENALTY`]

use std::cell::RefCell;

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::traits::{LineMatch, LineMatcher};

pub const PENALTY_SPAN: i64 = 16;
pub const MAX_LEADING_PENALTY: i64 = 32;

/// Per-thread matcher state. nucleo's `Matcher` needs `&mut self` and owns
/// sizeable scratch buffers, so every worker thread keeps its own.
struct Scratch {
    matcher: Matcher,
    needle:  Option<(String, Atom)>,
    chars:   Vec<char>,
    indices: Vec<u32>,
}

thread_local! {
    static SCRATCH: RefCell<Scratch> = RefCell::new(Scratch {
        matcher: Matcher::new(Config::DEFAULT),
        needle:  None,
        chars:   Vec::new(),
        indices: Vec::new(),
    });
}

/// The default [`LineMatcher`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FuzzyMatcher;

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl LineMatcher for FuzzyMatcher {
    fn match_line(&self, query: &str, line: &str) -> Option<LineMatch> {
        if query.is_empty() {
            return None;
        }
        SCRATCH.with(|scratch| {
            let mut scratch = scratch.borrow_mut();
            let Scratch { matcher, needle, chars, indices } = &mut *scratch;

            // Workers call this once per line with the same query; rebuild
            // the atom only when the query changes.
            if needle.as_ref().map_or(true, |(text, _)| text != query) {
                let atom = Atom::new(
                    query,
                    CaseMatching::Ignore,
                    Normalization::Smart,
                    AtomKind::Fuzzy,
                    false,
                );
                *needle = Some((query.to_owned(), atom));
            }
            let (_, atom) = needle.as_ref()?;

            // Columns are character offsets, so build the haystack from chars
            // rather than letting nucleo fold grapheme clusters.
            let haystack = if line.is_ascii() {
                Utf32Str::Ascii(line.as_bytes())
            } else {
                chars.clear();
                chars.extend(line.chars());
                Utf32Str::Unicode(chars.as_slice())
            };

            indices.clear();
            let base = atom.indices(haystack, matcher, indices)?;
            indices.sort_unstable();
            indices.dedup();

            let start = *indices.first()? as usize;
            let end   = *indices.last()? as usize + 1;
            Some(LineMatch {
                column_start: start,
                column_end:   end,
                score:        adjust(i64::from(base), line, start, end, indices.len()),
            })
        })
    }
}

fn adjust(base: i64, line: &str, start: usize, end: usize, matched: usize) -> i64 {
    let stray = i64::try_from(end - start - matched).unwrap_or(i64::MAX);

    let indent  = line.chars().take_while(|c| c.is_whitespace()).count();
    let leading = i64::try_from(start.saturating_sub(indent))
        .unwrap_or(i64::MAX)
        .min(MAX_LEADING_PENALTY);

    base.saturating_sub(stray.saturating_mul(PENALTY_SPAN))
        .saturating_sub(leading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(query: &str, line: &str) -> Option<LineMatch> {
        FuzzyMatcher.match_line(query, line)
    }

    #[test]
    fn subsequence_matches_in_order() {
        let hit = m("brd", "the bird sang").unwrap();
        assert_eq!(hit.column_start, 4);
        assert_eq!(hit.column_end, 8);
    }

    #[test]
    fn missing_characters_do_not_match() {
        assert_eq!(m("xyz", "the bird sang"), None);
        assert_eq!(m("drb", "the bird sang"), None);
        assert_eq!(m("", "anything"), None);
        assert_eq!(m("longer than line", "short"), None);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(m("BRD", "the bird sang"), m("brd", "the bird sang"));
        assert_eq!(m("brd", "THE BIRD SANG"), m("brd", "the bird sang"));
    }

    #[test]
    fn contiguous_beats_scattered() {
        let tight = m("open", "fn open_file()").unwrap();
        let loose = m("open", "fn o_p_e_n()").unwrap();
        assert!(tight.score > loose.score);
    }

    #[test]
    fn earlier_beats_later() {
        let early = m("load", "load config from disk").unwrap();
        let late = m("load", "config from disk, then load").unwrap();
        assert!(early.score > late.score);
    }

    #[test]
    fn word_boundary_is_rewarded() {
        let boundary = m("cfg", "let x = read_cfg()").unwrap();
        let inner = m("cfg", "let x = readcfg()").unwrap();
        assert!(boundary.score > inner.score);
    }

    #[test]
    fn tightest_placement_is_chosen() {
        // The first 'h' can start a match, but the later "hlo" is contiguous.
        let hit = m("hlo", "h... says hlo").unwrap();
        assert_eq!(hit.column_start, 10);
        assert_eq!(hit.column_end, 13);
    }

    #[test]
    fn tighter_span_ranks_higher() {
        let hello = m("hlo", "hello world").unwrap();
        let help = m("hlo", "help low").unwrap();
        assert_eq!((hello.column_start, hello.column_end), (0, 5));
        assert_eq!((help.column_start, help.column_end), (0, 7));
        assert!(hello.score > help.score);
    }

    #[test]
    fn indentation_does_not_count_against_start() {
        let flush = m("ret", "return x").unwrap();
        let indented = m("ret", "        return x").unwrap();
        assert_eq!(flush.score, indented.score);
        assert_eq!(indented.column_start, 8);
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let hit = m("ok", "ünïcode ok").unwrap();
        assert_eq!((hit.column_start, hit.column_end), (8, 10));
    }

    #[test]
    fn very_long_lines_score_without_overflow() {
        let line = format!("a{}z", "-".repeat(70_000));
        let hit = m("az", &line).unwrap();
        assert_eq!((hit.column_start, hit.column_end), (0, 70_002));
        assert!(hit.score < m("az", "az").unwrap().score);
    }

    #[test]
    fn span_penalty_saturates() {
        assert_eq!(adjust(100, "x", 0, usize::MAX, 2), 100 - i64::MAX);
    }
}
