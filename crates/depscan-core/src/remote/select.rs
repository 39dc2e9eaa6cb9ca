//! Picking a concrete version out of a version list for a constraint.
//!
//! The constraint dialect is Composer's, which is close enough to npm's that
//! the `semver` crate does most of the work once a few forms are rewritten:
//!
//! - `|` and `||` separate alternatives
//! - spaces and commas inside an alternative mean AND
//! - `~1.2` allows the last given part to grow (`>=1.2.0, <2.0.0`)
//! - a bare version is an exact pin, not a caret range
//! - `1.2.*` and `1.x` wildcards, `1.0 - 2.0` hyphen ranges
//! - `!=` exclusions, `@stability` flags (ignored), `v` prefixes

use semver::{Version, VersionReq};

/// One OR-branch of a constraint.
#[derive(Debug, Clone)]
struct Alternative {
    req: VersionReq,
    excluded: Vec<Version>,
}

impl Alternative {
    fn matches(&self, version: &Version) -> bool {
        self.req.matches(version) && !self.excluded.contains(version)
    }
}

/// A parsed version constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    alternatives: Vec<Alternative>,
}

impl Constraint {
    /// Parse a constraint. Empty and `*` accept any stable version.
    ///
    /// # Errors
    /// Returns a description of the first alternative that cannot be parsed,
    /// when no alternative can be parsed.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = strip_stability_flag(raw.trim());
        if raw.is_empty() || raw == "*" {
            return Ok(Self {
                alternatives: vec![Alternative {
                    req: VersionReq::STAR,
                    excluded: Vec::new(),
                }],
            });
        }

        let mut alternatives = Vec::new();
        let mut first_error = None;
        for alt in raw.split('|').map(str::trim).filter(|s| !s.is_empty()) {
            match parse_alternative(alt) {
                Ok(parsed) => alternatives.push(parsed),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if alternatives.is_empty() {
            return Err(first_error.unwrap_or_else(|| format!("Invalid constraint '{raw}'")));
        }
        Ok(Self { alternatives })
    }

    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(version))
    }
}

/// Select the highest candidate satisfying `constraint`.
///
/// Candidates that do not parse as versions (`dev-master`, branch aliases)
/// are ignored. Returns the candidate string as given.
///
/// # Errors
/// Returns an error if the constraint itself cannot be parsed.
pub fn select_highest<'a, I>(constraint: &str, candidates: I) -> Result<Option<&'a str>, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let constraint = Constraint::parse(constraint)?;

    let mut parsed: Vec<(Version, &'a str)> = candidates
        .into_iter()
        .filter_map(|raw| parse_version_lenient(raw).map(|v| (v, raw)))
        .collect();

    // Highest first
    parsed.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(parsed
        .into_iter()
        .find(|(version, _)| constraint.matches(version))
        .map(|(_, raw)| raw))
}

/// Parse a version that may have a `v` prefix, fewer than three parts, or a
/// fourth numeric part.
#[must_use]
pub fn parse_version_lenient(raw: &str) -> Option<Version> {
    Version::parse(&normalize_version(raw)?).ok()
}

/// Rewrite a version into three-part semver form.
fn normalize_version(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);

    let (release, pre) = match raw.split_once(['-', '+']) {
        Some((release, rest)) => (release, Some(rest)),
        None => (raw, None),
    };

    let parts: Vec<&str> = release.split('.').collect();
    if parts.is_empty() || parts.len() > 4 {
        return None;
    }
    let mut numbers = Vec::with_capacity(3);
    for part in &parts {
        numbers.push(part.parse::<u64>().ok()?);
    }
    numbers.resize(3, 0);

    let mut out = format!("{}.{}.{}", numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = pre.filter(|p| !p.is_empty()) {
        // semver identifiers are dot separated alphanumerics
        let pre: String = pre
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '.' })
            .collect();
        let pre = pre.trim_matches('.');
        if !pre.is_empty() {
            out.push('-');
            out.push_str(pre);
        }
    }
    Some(out)
}

/// Drop a trailing `@dev` / `@stable` style flag.
fn strip_stability_flag(raw: &str) -> &str {
    match raw.rsplit_once('@') {
        Some((head, flag)) if flag.chars().all(|c| c.is_ascii_alphabetic()) => head.trim(),
        _ => raw,
    }
}

fn parse_alternative(alt: &str) -> Result<Alternative, String> {
    if let Some((start, end)) = parse_hyphen_range(alt) {
        let start = normalize_version(start).ok_or_else(|| invalid(alt))?;
        let end = normalize_version(end).ok_or_else(|| invalid(alt))?;
        let req = VersionReq::parse(&format!(">={start}, <={end}")).map_err(|e| invalid_with(alt, &e))?;
        return Ok(Alternative {
            req,
            excluded: Vec::new(),
        });
    }

    let mut comparators = Vec::new();
    let mut excluded = Vec::new();
    for token in split_comparators(alt).ok_or_else(|| invalid(alt))? {
        if let Some(rest) = token.strip_prefix("!=") {
            excluded.push(parse_version_lenient(rest).ok_or_else(|| invalid(alt))?);
            continue;
        }
        comparators.push(convert_token(&token).ok_or_else(|| invalid(alt))?);
    }

    let req = if comparators.is_empty() {
        VersionReq::STAR
    } else {
        VersionReq::parse(&comparators.join(", ")).map_err(|e| invalid_with(alt, &e))?
    };
    Ok(Alternative { req, excluded })
}

fn invalid(alt: &str) -> String {
    format!("Invalid constraint '{alt}'")
}

fn invalid_with(alt: &str, e: &semver::Error) -> String {
    format!("Invalid constraint '{alt}': {e}")
}

/// Parse a hyphen range like "1.0 - 2.0".
fn parse_hyphen_range(range: &str) -> Option<(&str, &str)> {
    let (start, end) = range.split_once(" - ")?;
    let (start, end) = (start.trim(), end.trim());
    (!start.is_empty() && !end.is_empty()).then_some((start, end))
}

/// Split an AND group into comparators, keeping detached operators with
/// their version (">= 1.0" is one comparator). `None` if a token never
/// reaches a version.
fn split_comparators(alt: &str) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    for token in alt
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if token.chars().any(|c| c.is_ascii_digit() || c == '*') {
            out.push(format!("{pending_op}{token}"));
            pending_op.clear();
        } else {
            pending_op.push_str(token);
        }
    }
    pending_op.is_empty().then_some(out)
}

/// Rewrite one Composer comparator into `semver` syntax.
fn convert_token(token: &str) -> Option<String> {
    let op_len = token
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '^' | '~'))
        .unwrap_or(token.len());
    let (op, version) = token.split_at(op_len);

    if version.contains(['*', 'x', 'X']) {
        return convert_wildcard(op, version);
    }

    let normalized = normalize_version(version)?;
    match op {
        "" | "=" | "==" => Some(format!("={normalized}")),
        "~" => convert_tilde(version, &normalized),
        "^" | ">" | ">=" | "<" | "<=" => Some(format!("{op}{normalized}")),
        _ => None,
    }
}

/// Composer tilde: the last given part may grow. `~1.2` is `>=1.2.0 <2.0.0`,
/// `~1.2.3` is `>=1.2.3 <1.3.0`, `~1` is `>=1.0.0 <2.0.0`.
///
/// `None` when the upper bound does not fit in a `u64`.
fn convert_tilde(given: &str, normalized: &str) -> Option<String> {
    let given = given.trim_start_matches(['v', 'V']);
    let release = given.split(['-', '+']).next().unwrap_or(given);
    let parts: Vec<u64> = release
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    match parts.as_slice() {
        [major] | [major, _] => Some(format!(">={normalized}, <{}.0.0", major.checked_add(1)?)),
        [major, minor, ..] => Some(format!(
            ">={normalized}, <{major}.{}.0",
            minor.checked_add(1)?
        )),
        [] => Some(format!(">={normalized}")),
    }
}

/// Convert `1.*`, `1.2.x` style ranges.
fn convert_wildcard(op: &str, version: &str) -> Option<String> {
    if !op.is_empty() && op != "=" {
        return None;
    }
    let parts: Vec<&str> = version.trim_start_matches(['v', 'V']).split('.').collect();
    let is_wild = |p: &str| matches!(p, "*" | "x" | "X");

    match parts.as_slice() {
        [w] if is_wild(w) => Some(">=0.0.0".to_string()),
        [major, w] if is_wild(w) => {
            let m: u64 = major.parse().ok()?;
            Some(format!(">={m}.0.0, <{}.0.0", m.checked_add(1)?))
        }
        [major, minor, w] | [major, minor, w, _] if is_wild(w) => {
            let m: u64 = major.parse().ok()?;
            let n: u64 = minor.parse().ok()?;
            Some(format!(">={m}.{n}.0, <{m}.{}.0", n.checked_add(1)?))
        }
        [major, minor, patch, w] if is_wild(w) => {
            let m: u64 = major.parse().ok()?;
            let n: u64 = minor.parse().ok()?;
            let p: u64 = patch.parse().ok()?;
            Some(format!("={m}.{n}.{p}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSIONS: &[&str] = &["1.0.0", "1.0.5", "1.1.0", "1.5.0", "2.0.0", "2.5.0"];

    fn pick(constraint: &str, versions: &[&'static str]) -> Option<&'static str> {
        select_highest(constraint, versions.iter().copied()).unwrap()
    }

    #[test]
    fn test_empty_picks_highest() {
        assert_eq!(pick("", VERSIONS), Some("2.5.0"));
        assert_eq!(pick("*", VERSIONS), Some("2.5.0"));
    }

    #[test]
    fn test_bare_version_is_exact() {
        assert_eq!(pick("1.0.0", VERSIONS), Some("1.0.0"));
        assert_eq!(pick("1.1", VERSIONS), Some("1.1.0"));
        assert_eq!(pick("3.0.0", VERSIONS), None);
    }

    #[test]
    fn test_caret_range() {
        assert_eq!(pick("^1.0", VERSIONS), Some("1.5.0"));
    }

    #[test]
    fn test_tilde_two_parts_allows_minor() {
        assert_eq!(pick("~1.0", VERSIONS), Some("1.5.0"));
    }

    #[test]
    fn test_tilde_three_parts_allows_patch() {
        assert_eq!(pick("~1.0.0", VERSIONS), Some("1.0.5"));
    }

    #[test]
    fn test_or_range_picks_highest() {
        assert_eq!(pick("^1.0 || ^2.0", VERSIONS), Some("2.5.0"));
        assert_eq!(pick("^1.0|^2.0", VERSIONS), Some("2.5.0"));
    }

    #[test]
    fn test_or_range_no_match() {
        assert_eq!(pick("^3.0 || ^4.0", VERSIONS), None);
    }

    #[test]
    fn test_wildcard() {
        assert_eq!(pick("1.0.*", VERSIONS), Some("1.0.5"));
        assert_eq!(pick("1.x", VERSIONS), Some("1.5.0"));
    }

    #[test]
    fn test_hyphen_range() {
        assert_eq!(pick("1.0 - 2.0", VERSIONS), Some("2.0.0"));
    }

    #[test]
    fn test_space_and_comma_separated_comparators() {
        assert_eq!(pick(">= 1.1 < 2.0", VERSIONS), Some("1.5.0"));
        assert_eq!(pick(">=1.1,<2.0", VERSIONS), Some("1.5.0"));
    }

    #[test]
    fn test_exclusion() {
        assert_eq!(pick("^2.0 !=2.5.0", VERSIONS), Some("2.0.0"));
    }

    #[test]
    fn test_stability_flag_ignored() {
        assert_eq!(pick("^1.0@dev", VERSIONS), Some("1.5.0"));
    }

    #[test]
    fn test_prerelease_excluded_by_default() {
        let versions = &["2.0.0-beta1", "1.9.0"];
        assert_eq!(pick("*", versions), Some("1.9.0"));
        assert_eq!(pick("^1.0", versions), Some("1.9.0"));
    }

    #[test]
    fn test_v_prefixed_candidates_returned_as_given() {
        let versions = &["v1.0.0", "v1.2.0", "dev-master"];
        assert_eq!(pick("^1.0", versions), Some("v1.2.0"));
    }

    #[test]
    fn test_invalid_constraint() {
        assert!(select_highest("dev-master", VERSIONS.iter().copied()).is_err());
        assert!(select_highest("not-a-range!!!", VERSIONS.iter().copied()).is_err());
    }

    #[test]
    fn test_upper_bound_overflow_is_invalid() {
        let max = u64::MAX;
        for constraint in [
            format!("~{max}"),
            format!("~1.{max}.0"),
            format!("{max}.*"),
            format!("1.{max}.x"),
        ] {
            assert!(
                select_highest(&constraint, VERSIONS.iter().copied()).is_err(),
                "{constraint} should be rejected"
            );
        }
    }

    #[test]
    fn test_lenient_parse() {
        assert_eq!(parse_version_lenient("v1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_version_lenient("1.2.3.4"), Some(Version::new(1, 2, 3)));
        assert_eq!(
            parse_version_lenient("1.0.0-RC1").map(|v| v.pre.to_string()),
            Some("RC1".to_string())
        );
        assert!(parse_version_lenient("dev-main").is_none());
    }
}
