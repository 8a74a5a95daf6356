//! Trigram query construction from a regex syntax tree.
//!
//! The query is a necessary condition: every file the regex can match is in
//! the query result, but not every file in the result matches.

use std::fmt;

use regex_syntax::hir::{Hir, HirKind};

use super::extract::{extract_trigrams, is_ascii_fold_stable, Trigram};

/// A trigram query representing the set of trigrams needed to match a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrigramQuery {
    /// All trigrams must be present (conjunction).
    And(Vec<Trigram>),
    /// At least one sub-query must match (disjunction).
    Or(Vec<TrigramQuery>),
    /// No usable trigrams: every file is a candidate.
    All,
}

impl TrigramQuery {
    /// Translate a parsed regex into a trigram query.
    pub fn from_hir(hir: &Hir) -> Self {
        extract_from_hir(hir, false)
    }

    /// Like [`TrigramQuery::from_hir`] but with literals ASCII-lowercased.
    ///
    /// Used for case-insensitive searches: the builder indexes lowercased
    /// trigrams alongside the original ones. Literal bytes whose case fold
    /// leaves ASCII contribute no trigrams.
    pub fn from_hir_folded(hir: &Hir) -> Self {
        extract_from_hir(hir, true)
    }

    /// Returns true if this query matches all files (no filtering).
    pub fn is_all(&self) -> bool {
        matches!(self, TrigramQuery::All)
    }
}

impl fmt::Display for TrigramQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrigramQuery::All => write!(f, "+"),
            TrigramQuery::And(trigrams) => {
                for (i, t) in trigrams.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:?}", String::from_utf8_lossy(t))?;
                }
                Ok(())
            }
            TrigramQuery::Or(subs) => {
                for (i, sub) in subs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "({sub})")?;
                }
                Ok(())
            }
        }
    }
}

fn literal_query(bytes: &[u8], fold: bool) -> TrigramQuery {
    let mut trigrams = if fold {
        // Only runs that fold within ASCII are guaranteed to appear in the
        // ASCII-lowercased trigrams the builder stores.
        bytes
            .split(|b| !is_ascii_fold_stable(*b))
            .flat_map(|run| extract_trigrams(&run.to_ascii_lowercase()))
            .collect()
    } else {
        extract_trigrams(bytes)
    };
    if trigrams.is_empty() {
        return TrigramQuery::All;
    }
    trigrams.sort_unstable();
    trigrams.dedup();
    TrigramQuery::And(trigrams)
}

/// Recursively extract trigram queries from an HIR node.
fn extract_from_hir(hir: &Hir, fold: bool) -> TrigramQuery {
    match hir.kind() {
        HirKind::Literal(lit) => literal_query(&lit.0, fold),
        HirKind::Concat(subs) => {
            let mut all_trigrams = Vec::new();
            let mut run_bytes: Vec<u8> = Vec::new();

            // Contiguous literal runs contribute their own trigrams; other
            // children contribute whatever conjunction they imply.
            for sub in subs {
                if let HirKind::Literal(lit) = sub.kind() {
                    run_bytes.extend_from_slice(&lit.0);
                    continue;
                }
                if let TrigramQuery::And(trigrams) = literal_query(&run_bytes, fold) {
                    all_trigrams.extend(trigrams);
                }
                run_bytes.clear();
                if let TrigramQuery::And(trigrams) = extract_from_hir(sub, fold) {
                    all_trigrams.extend(trigrams);
                }
            }
            if let TrigramQuery::And(trigrams) = literal_query(&run_bytes, fold) {
                all_trigrams.extend(trigrams);
            }

            if all_trigrams.is_empty() {
                TrigramQuery::All
            } else {
                all_trigrams.sort_unstable();
                all_trigrams.dedup();
                TrigramQuery::And(all_trigrams)
            }
        }
        HirKind::Alternation(alts) => {
            let sub_queries: Vec<TrigramQuery> =
                alts.iter().map(|alt| extract_from_hir(alt, fold)).collect();
            // One unfilterable branch makes the whole disjunction unfilterable.
            if sub_queries.iter().any(TrigramQuery::is_all) {
                TrigramQuery::All
            } else {
                TrigramQuery::Or(sub_queries)
            }
        }
        HirKind::Repetition(rep) if rep.min >= 1 => extract_from_hir(&rep.sub, fold),
        HirKind::Capture(cap) => extract_from_hir(&cap.sub, fold),
        // Class, Look, Empty, optional repetition: no useful trigrams.
        _ => TrigramQuery::All,
    }
}
