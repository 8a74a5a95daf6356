//! Query compiler adapter: one pattern in, everything a shard search needs out.

use csearch_core::search::{build_search_mode, SearchMode};
use csearch_core::trigram::TrigramQuery;
use regex::Regex;
use regex_syntax::ParserBuilder;

use crate::error::{CsearchError, Result};

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub ignore_case: bool,
    /// Only report files whose whole indexed name matches this regex.
    pub file_filter: Option<String>,
    /// Skip the index and treat every file as a candidate.
    pub brute: bool,
}

/// Immutable search state shared by every shard task.
#[derive(Debug)]
pub struct SearchPlan {
    query: TrigramQuery,
    matcher: SearchMode,
    file_filter: Option<Regex>,
}

impl SearchPlan {
    pub fn compile(pattern: &str, opts: &PlanOptions) -> Result<Self> {
        let matcher = build_search_mode(pattern, opts.ignore_case).map_err(|source| {
            CsearchError::Pattern {
                kind: "search",
                source,
            }
        })?;

        let query = if opts.brute {
            TrigramQuery::All
        } else {
            let hir = ParserBuilder::new()
                .multi_line(true)
                .utf8(false)
                .build()
                .parse(pattern)?;
            if opts.ignore_case {
                TrigramQuery::from_hir_folded(&hir)
            } else {
                TrigramQuery::from_hir(&hir)
            }
        };

        let file_filter = opts
            .file_filter
            .as_deref()
            .map(|filter| {
                Regex::new(&format!(r"\A(?:{filter})\z")).map_err(|source| CsearchError::Pattern {
                    kind: "file name",
                    source,
                })
            })
            .transpose()?;

        Ok(SearchPlan {
            query,
            matcher,
            file_filter,
        })
    }

    pub fn query(&self) -> &TrigramQuery {
        &self.query
    }

    pub fn matcher(&self) -> &SearchMode {
        &self.matcher
    }

    /// Whether `name` passes the file name filter. Always true without one.
    pub fn accepts_name(&self, name: &str) -> bool {
        self.file_filter.as_ref().map_or(true, |re| re.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(pattern: &str, opts: PlanOptions) -> SearchPlan {
        SearchPlan::compile(pattern, &opts).unwrap()
    }

    #[test]
    fn test_query_from_pattern() {
        let p = plan("hello", PlanOptions::default());
        assert_eq!(p.query().to_string(), "\"ell\" \"hel\" \"llo\"");
        assert!(plan(".", PlanOptions::default()).query().is_all());
    }

    #[test]
    fn test_brute_forces_all() {
        let p = plan("hello", PlanOptions { brute: true, ..Default::default() });
        assert!(p.query().is_all());
    }

    #[test]
    fn test_ignore_case_folds_query() {
        let p = plan("HeLLo", PlanOptions { ignore_case: true, ..Default::default() });
        assert_eq!(p.query(), plan("hello", PlanOptions::default()).query());
        assert!(p.matcher().find(b"say HELLO").is_some());
    }

    #[test]
    fn test_file_filter_is_anchored() {
        let p = plan(
            "x",
            PlanOptions { file_filter: Some(r"src/.*\.rs".into()), ..Default::default() },
        );
        assert!(p.accepts_name("src/main.rs"));
        assert!(!p.accepts_name("/home/src/main.rs"));
        assert!(!p.accepts_name("src/main.rs.bak"));

        let p = plan("x", PlanOptions { file_filter: Some("a|b".into()), ..Default::default() });
        assert!(p.accepts_name("a"));
        assert!(!p.accepts_name("ab"));
    }

    #[test]
    fn test_no_filter_accepts_everything() {
        assert!(plan("x", PlanOptions::default()).accepts_name("anything"));
    }

    #[test]
    fn test_bad_patterns_are_errors() {
        assert!(matches!(
            SearchPlan::compile("(", &PlanOptions::default()),
            Err(CsearchError::Pattern { kind: "search", .. })
        ));
        let opts = PlanOptions { file_filter: Some("[".into()), ..Default::default() };
        assert!(matches!(
            SearchPlan::compile("ok", &opts),
            Err(CsearchError::Pattern { kind: "file name", .. })
        ));
    }
}
