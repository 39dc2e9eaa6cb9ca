//! Maven version ordering and version ranges.

use std::cmp::Ordering;

/// One token of a Maven version.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(u64),
    Qualifier(String),
}

/// Known qualifiers, oldest first. Everything between `snapshot` and `sp`
/// is a plain release.
fn qualifier_rank(q: &str) -> (u8, &str) {
    match q {
        "alpha" | "a" => (0, ""),
        "beta" | "b" => (1, ""),
        "milestone" | "m" => (2, ""),
        "rc" | "cr" => (3, ""),
        "snapshot" => (4, ""),
        "" | "ga" | "final" | "release" => (5, ""),
        "sp" => (6, ""),
        other => (7, other),
    }
}

/// A parsed Maven version, comparable the way Maven orders versions.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    raw: String,
    items: Vec<Item>,
}

impl MavenVersion {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            items: tokenize(raw),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.raw.ends_with("-SNAPSHOT")
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for i in 0..len {
            let ord = compare_items(self.items.get(i), other.items.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(a), None) => compare_to_padding(a),
        (None, Some(b)) => compare_to_padding(b).reverse(),
        (Some(Item::Number(a)), Some(Item::Number(b))) => a.cmp(b),
        (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
        (Some(Item::Qualifier(a)), Some(Item::Qualifier(b))) => {
            qualifier_rank(a).cmp(&qualifier_rank(b))
        }
    }
}

/// Compare an item against the implicit padding of a shorter version.
fn compare_to_padding(item: &Item) -> Ordering {
    match item {
        Item::Number(n) => n.cmp(&0),
        Item::Qualifier(q) => qualifier_rank(q).cmp(&qualifier_rank("")),
    }
}

/// Split on `.`/`-` and on digit/letter transitions, lowercasing qualifiers
/// and dropping trailing zero or release-equivalent tokens.
fn tokenize(raw: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    let flush = |current: &mut String, is_digit: bool, items: &mut Vec<Item>| {
        if current.is_empty() {
            return;
        }
        let item = if is_digit {
            Item::Number(current.parse().unwrap_or(u64::MAX))
        } else {
            Item::Qualifier(current.to_ascii_lowercase())
        };
        items.push(item);
        current.clear();
    };

    for c in raw.trim().chars() {
        if c == '.' || c == '-' || c == '_' {
            flush(&mut current, current_is_digit, &mut items);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut current, current_is_digit, &mut items);
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    flush(&mut current, current_is_digit, &mut items);

    while items
        .last()
        .is_some_and(|last| compare_to_padding(last) == Ordering::Equal)
    {
        items.pop();
    }
    items
}

/// One bound of a restriction.
#[derive(Debug, Clone)]
struct Bound {
    version: MavenVersion,
    inclusive: bool,
}

/// One interval of a range, e.g. `[1.0,2.0)`.
#[derive(Debug, Clone)]
struct Restriction {
    lower: Option<Bound>,
    upper: Option<Bound>,
}

impl Restriction {
    fn contains(&self, version: &MavenVersion) -> bool {
        if let Some(lower) = &self.lower {
            match version.cmp(&lower.version) {
                Ordering::Less => return false,
                Ordering::Equal if !lower.inclusive => return false,
                _ => {}
            }
        }
        if let Some(upper) = &self.upper {
            match version.cmp(&upper.version) {
                Ordering::Greater => return false,
                Ordering::Equal if !upper.inclusive => return false,
                _ => {}
            }
        }
        true
    }
}

/// A Maven version range: one or more comma-joined intervals.
#[derive(Debug, Clone)]
pub struct VersionRange {
    restrictions: Vec<Restriction>,
}

impl VersionRange {
    /// Parse a range spec such as `[1.0,2.0)`, `[1.5]`, `(,1.0],[1.2,)`.
    ///
    /// # Errors
    /// Returns a message describing the malformed part.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut restrictions = Vec::new();
        let mut rest = spec.trim();

        while !rest.is_empty() {
            let open = rest.chars().next().unwrap_or_default();
            if open != '[' && open != '(' {
                return Err(format!("Invalid version range '{spec}'"));
            }
            let close_at = rest
                .find([']', ')'])
                .ok_or_else(|| format!("Unterminated version range '{spec}'"))?;
            let close = rest[close_at..].chars().next().unwrap_or_default();
            let body = &rest[1..close_at];
            restrictions.push(parse_restriction(spec, body, open == '[', close == ']')?);

            rest = rest[close_at + 1..].trim_start();
            rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
        }

        if restrictions.is_empty() {
            return Err(format!("Empty version range '{spec}'"));
        }
        Ok(Self { restrictions })
    }

    #[must_use]
    pub fn contains(&self, version: &MavenVersion) -> bool {
        self.restrictions.iter().any(|r| r.contains(version))
    }
}

fn parse_restriction(
    spec: &str,
    body: &str,
    lower_inclusive: bool,
    upper_inclusive: bool,
) -> Result<Restriction, String> {
    let bound = |raw: &str, inclusive: bool| {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| Bound {
            version: MavenVersion::parse(raw),
            inclusive,
        })
    };

    match body.split_once(',') {
        None => {
            // [1.0] pins exactly
            if !lower_inclusive || !upper_inclusive || body.trim().is_empty() {
                return Err(format!("Invalid single-version range '{spec}'"));
            }
            Ok(Restriction {
                lower: bound(body, true),
                upper: bound(body, true),
            })
        }
        Some((lower, upper)) => Ok(Restriction {
            lower: bound(lower, lower_inclusive),
            upper: bound(upper, upper_inclusive),
        }),
    }
}

/// True if `spec` is a range rather than a single version.
#[must_use]
pub fn is_range(spec: &str) -> bool {
    spec.trim_start().starts_with(['[', '('])
}

/// Pick the version to use for `spec` out of the published `versions`.
///
/// An empty spec takes `release` when given, otherwise the highest non
/// snapshot. A range takes the highest contained version. A plain version is
/// a soft requirement and is used as is.
///
/// # Errors
/// Returns an error for an unparsable range.
pub fn select_version(
    spec: &str,
    versions: &[String],
    release: Option<&str>,
) -> Result<Option<String>, String> {
    let spec = spec.trim();

    if spec.is_empty() {
        if let Some(release) = release.filter(|r| !r.is_empty()) {
            return Ok(Some(release.to_string()));
        }
        return Ok(highest(versions, |v| !v.is_snapshot()));
    }

    if !is_range(spec) {
        return Ok(Some(spec.to_string()));
    }

    let range = VersionRange::parse(spec)?;
    Ok(highest(versions, |v| range.contains(v)))
}

fn highest(versions: &[String], accept: impl Fn(&MavenVersion) -> bool) -> Option<String> {
    versions
        .iter()
        .map(|v| MavenVersion::parse(v))
        .filter(|v| accept(v))
        .max()
        .map(|v| v.raw)
}
