//! Compact nodeset syntax: `cn[001-004,010],login[1-2]`.
//!
//! Items are separated by top-level commas. An item is literal text with zero or more bracket
//! groups; a group is a comma-separated list of `n` or `start-end` ranges. Several groups in one
//! item expand as a cartesian product. Zero padding follows the width of a range's `start` bound
//! when that bound has a leading zero.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashSet;

/// Upper bound on the names one expression may produce.
pub const MAX_EXPANDED_NAMES: usize = 1 << 20;

fn range_token_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?:-(\d+))?$").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Group(Vec<String>),
}

/// Expands a nodeset expression into explicit names, first occurrence order, without duplicates.
///
/// An empty or blank expression expands to no names.
pub fn expand(expr: &str) -> Result<Vec<String>> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    for item in split_items(expr, trimmed)? {
        let segments = parse_item(expr, item)?;
        let mut names = vec![String::new()];
        for segment in &segments {
            names = match segment {
                Segment::Literal(text) => names
                    .into_iter()
                    .map(|mut n| {
                        n.push_str(text);
                        n
                    })
                    .collect(),
                Segment::Group(values) => {
                    if names.len().saturating_mul(values.len()) > MAX_EXPANDED_NAMES {
                        return Err(Error::nodeset(expr, "expression expands to too many names"));
                    }
                    let mut next = Vec::with_capacity(names.len() * values.len());
                    for prefix in &names {
                        for v in values {
                            next.push(format!("{prefix}{v}"));
                        }
                    }
                    next
                }
            };
        }
        for name in names {
            if seen.insert(name.clone()) {
                out.push(name);
            }
        }
        if out.len() > MAX_EXPANDED_NAMES {
            return Err(Error::nodeset(expr, "expression expands to too many names"));
        }
    }
    Ok(out)
}

/// Expands every expression of a list and concatenates the results (deduplicated).
pub fn expand_all<'a>(exprs: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    for expr in exprs {
        for name in expand(expr)? {
            if seen.insert(name.clone()) {
                out.push(name);
            }
        }
    }
    Ok(out)
}

fn split_items<'a>(expr: &str, text: &'a str) -> Result<Vec<&'a str>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '[' => {
                if depth > 0 {
                    return Err(Error::nodeset(expr, format!("nested `[` at offset {i}")));
                }
                depth += 1;
            }
            ']' => {
                if depth == 0 {
                    return Err(Error::nodeset(expr, format!("unmatched `]` at offset {i}")));
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                items.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::nodeset(expr, "unclosed `[`"));
    }
    items.push(&text[start..]);

    for item in &items {
        if item.trim().is_empty() {
            return Err(Error::nodeset(expr, "empty item"));
        }
    }
    Ok(items.into_iter().map(str::trim).collect())
}

fn parse_item(expr: &str, item: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = item;
    while let Some(open) = rest.find('[') {
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }
        // `split_items` guarantees brackets are balanced and not nested.
        let Some(close) = rest[open..].find(']').map(|c| c + open) else {
            return Err(Error::nodeset(expr, "unclosed `[`"));
        };
        segments.push(Segment::Group(parse_group(expr, &rest[open + 1..close])?));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    if segments.iter().any(|s| matches!(s, Segment::Literal(t) if t.chars().any(char::is_whitespace))) {
        return Err(Error::nodeset(expr, format!("whitespace inside `{item}`")));
    }
    Ok(segments)
}

fn parse_group(expr: &str, body: &str) -> Result<Vec<String>> {
    if body.trim().is_empty() {
        return Err(Error::nodeset(expr, "empty `[]` group"));
    }
    let mut values = Vec::new();
    for token in body.split(',') {
        let token = token.trim();
        let Some(caps) = range_token_regex().captures(token) else {
            return Err(Error::nodeset(expr, format!("invalid range `{token}`")));
        };
        let start_raw = &caps[1];
        let end_raw = caps.get(2).map(|m| m.as_str()).unwrap_or(start_raw);
        let start = parse_bound(expr, start_raw)?;
        let end = parse_bound(expr, end_raw)?;
        if start > end {
            return Err(Error::nodeset(
                expr,
                format!("range `{token}` has start greater than end"),
            ));
        }
        let count = usize::try_from(end - start)
            .unwrap_or(usize::MAX)
            .saturating_add(1);
        if values.len().saturating_add(count) > MAX_EXPANDED_NAMES {
            return Err(Error::nodeset(expr, format!("group `[{body}]` is too large")));
        }
        let width = if start_raw.len() > 1 && start_raw.starts_with('0') {
            start_raw.len()
        } else {
            0
        };
        for n in start..=end {
            values.push(format!("{n:0width$}"));
        }
    }
    Ok(values)
}

fn parse_bound(expr: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| Error::nodeset(expr, format!("bound `{raw}` is out of range")))
}

enum FoldEntry {
    Numbered((String, usize)),
    Literal(String),
}

/// Folds explicit names back into a compact expression (inverse of [`expand`] for names with a
/// single trailing number).
pub fn fold<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    // (prefix, pad width) -> numbers; width 0 means "not zero padded".
    let mut groups: IndexMap<(String, usize), Vec<u64>> = IndexMap::new();
    let mut literals: IndexMap<String, ()> = IndexMap::new();
    let mut order: Vec<FoldEntry> = Vec::new();

    for name in names {
        let digits_at = name
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i);
        let parsed = digits_at.and_then(|i| {
            let digits = &name[i..];
            digits.parse::<u64>().ok().map(|n| {
                let width = if digits.len() > 1 && digits.starts_with('0') {
                    digits.len()
                } else {
                    0
                };
                ((name[..i].to_string(), width), n)
            })
        });
        match parsed {
            Some((key, n)) => {
                if !groups.contains_key(&key) {
                    order.push(FoldEntry::Numbered(key.clone()));
                }
                groups.entry(key).or_default().push(n);
            }
            None => {
                if literals.insert(name.to_string(), ()).is_none() {
                    order.push(FoldEntry::Literal(name.to_string()));
                }
            }
        }
    }

    let mut parts = Vec::new();
    for entry in order {
        let key = match entry {
            FoldEntry::Numbered(key) => key,
            FoldEntry::Literal(literal) => {
                parts.push(literal);
                continue;
            }
        };
        let Some(numbers) = groups.get_mut(&key) else {
            continue;
        };
        numbers.sort_unstable();
        numbers.dedup();
        let (prefix, width) = key;
        if numbers.len() == 1 {
            parts.push(format!("{prefix}{:0width$}", numbers[0]));
            continue;
        }
        let mut ranges = Vec::new();
        let mut i = 0;
        while i < numbers.len() {
            let mut j = i;
            while j + 1 < numbers.len() && numbers[j + 1] == numbers[j] + 1 {
                j += 1;
            }
            if i == j {
                ranges.push(format!("{:0width$}", numbers[i]));
            } else {
                ranges.push(format!("{:0width$}-{:0width$}", numbers[i], numbers[j]));
            }
            i = j + 1;
        }
        parts.push(format!("{prefix}[{}]", ranges.join(",")));
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_padded_ranges() {
        assert_eq!(
            expand("cn[008-011]").unwrap(),
            vec!["cn008", "cn009", "cn010", "cn011"]
        );
    }

    #[test]
    fn unpadded_ranges_grow_naturally() {
        assert_eq!(expand("n[9-11]").unwrap(), vec!["n9", "n10", "n11"]);
    }

    #[test]
    fn expands_lists_and_literals() {
        assert_eq!(
            expand("cn[1-2,5],login").unwrap(),
            vec!["cn1", "cn2", "cn5", "login"]
        );
    }

    #[test]
    fn expands_cartesian_groups() {
        assert_eq!(
            expand("r[1-2]n[1-2]").unwrap(),
            vec!["r1n1", "r1n2", "r2n1", "r2n2"]
        );
    }

    #[test]
    fn duplicates_are_dropped() {
        assert_eq!(expand("a[1-2],a2,a[2-3]").unwrap(), vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn oversized_groups_are_rejected_across_tokens() {
        let err = expand("n[0-600000,0-600000]").unwrap_err();
        assert!(matches!(err, Error::NodesetSyntax { .. }));
        assert!(err.to_string().contains("too large"));
        assert!(expand("n[0-18446744073709551615]").is_err());
    }

    #[test]
    fn blank_expression_is_empty() {
        assert!(expand("  ").unwrap().is_empty());
    }

    #[test]
    fn malformed_expressions_fail_loudly() {
        for bad in [
            "cn[1-3",
            "cn1-3]",
            "cn[[1-3]]",
            "cn[a-b]",
            "cn[5-1]",
            "cn[]",
            "cn[1-2],,login",
            "cn[1-]",
            "cn [1-2]",
        ] {
            let err = expand(bad).unwrap_err();
            assert!(
                matches!(err, Error::NodesetSyntax { ref input, .. } if input == bad),
                "expected syntax error for {bad}, got {err:?}"
            );
        }
    }

    #[test]
    fn fold_compacts_runs() {
        let names = ["cn001", "cn002", "cn003", "cn007", "login"];
        assert_eq!(fold(names), "cn[001-003,007],login");
        assert_eq!(fold(["n9", "n10", "n11"]), "n[9-11]");
        assert_eq!(fold(["solo4"]), "solo4");
    }

    #[test]
    fn fold_then_expand_returns_the_same_names() {
        let names = expand("cn[01-04,08],gpu[1-3],admin").unwrap();
        let folded = fold(names.iter().map(String::as_str));
        assert_eq!(expand(&folded).unwrap(), names);
    }
}
