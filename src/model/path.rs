use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One step of a [`Path`]: the child's declared name plus the instance key.
///
/// Singleton children carry an empty key. Children of a named-object
/// container carry the key they were looked up with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
}

impl Segment {
    /// A non-indexed segment.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: String::new(),
        }
    }

    /// An indexed segment for a named-object instance.
    pub fn keyed(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    pub fn is_keyed(&self) -> bool {
        !self.key.is_empty()
    }

    /// Whether `key` survives the text form: non-empty, no `/`, `[` or `]`.
    pub fn is_valid_key(key: &str) -> bool {
        !key.is_empty() && !key.contains(['/', '[', ']'])
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.key)
        }
    }
}

/// Structured identity of a remote node.
///
/// The root path is empty. A child's path is always its parent's path with
/// exactly one [`Segment`] appended, so two nodes address the same remote
/// entity iff their paths compare equal.
///
/// Text form is `/Case/App/BC/BC[inlet-1]/Velocity`; the empty path is `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// The path with `segment` appended.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment);
        Self(segments)
    }

    /// Shorthand for appending a non-indexed segment.
    pub fn join(&self, name: impl Into<String>) -> Self {
        self.child(Segment::named(name))
    }

    /// The path without its last segment, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        match self.0.split_last() {
            Some((_, rest)) => Some(Self(rest.to_vec())),
            None => None,
        }
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Segments of `self` after `prefix`, if `prefix` is a prefix.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<&[Segment]> {
        if self.starts_with(prefix) {
            Some(&self.0[prefix.0.len()..])
        } else {
            None
        }
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Reasons a textual path fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("path must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("empty segment name in path: {0}")]
    EmptyName(String),

    #[error("malformed key in segment '{0}'")]
    MalformedKey(String),
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| PathParseError::MissingLeadingSlash(s.to_string()))?;
        if rest.is_empty() {
            return Ok(Self::root());
        }
        rest.split('/').map(parse_segment).collect::<Result<Vec<_>, _>>().map(Self)
    }
}

fn parse_segment(raw: &str) -> Result<Segment, PathParseError> {
    let (name, key) = match raw.find('[') {
        Some(open) => {
            let key = raw[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| PathParseError::MalformedKey(raw.to_string()))?;
            if !Segment::is_valid_key(key) {
                return Err(PathParseError::MalformedKey(raw.to_string()));
            }
            (&raw[..open], key)
        }
        None if raw.contains(']') => return Err(PathParseError::MalformedKey(raw.to_string())),
        None => (raw, ""),
    };
    if name.is_empty() {
        return Err(PathParseError::EmptyName(raw.to_string()));
    }
    Ok(Segment::keyed(name, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_as_slash() {
        assert_eq!(Path::root().to_string(), "/");
        assert_eq!("/".parse::<Path>().unwrap(), Path::root());
    }

    #[test]
    fn child_appends_exactly_one_segment() {
        let app = Path::root().join("Case").join("App");
        let bc = app.child(Segment::keyed("BC", "inlet-1"));
        assert_eq!(bc.len(), app.len() + 1);
        assert_eq!(bc.parent().unwrap(), app);
        assert_eq!(bc.last().unwrap(), &Segment::keyed("BC", "inlet-1"));
    }

    #[test]
    fn parses_keyed_segments() {
        let path: Path = "/Case/App/BC/BC[inlet-1]/Velocity".parse().unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.segments()[3], Segment::keyed("BC", "inlet-1"));
        assert!(!path.segments()[2].is_keyed());
        assert_eq!(path.to_string(), "/Case/App/BC/BC[inlet-1]/Velocity");
    }

    #[test]
    fn keys_keep_spaces_and_case() {
        let path: Path = "/BC[ Inlet 1 ]".parse().unwrap();
        assert_eq!(path.segments()[0].key, " Inlet 1 ");
    }

    #[test]
    fn valid_keys_round_trip_through_text() {
        for key in ["inlet-1", " Inlet 1 ", "wall.top"] {
            assert!(Segment::is_valid_key(key));
            let path = Path::root().child(Segment::keyed("BC", key));
            assert_eq!(path.to_string().parse::<Path>().unwrap(), path);
        }
        for key in ["", "a]b", "a/b", "a[b"] {
            assert!(!Segment::is_valid_key(key));
        }
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(matches!(
            "Case/App".parse::<Path>(),
            Err(PathParseError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            "/Case//App".parse::<Path>(),
            Err(PathParseError::EmptyName(_))
        ));
        assert!(matches!(
            "/BC[inlet".parse::<Path>(),
            Err(PathParseError::MalformedKey(_))
        ));
        assert!(matches!(
            "/BC[]".parse::<Path>(),
            Err(PathParseError::MalformedKey(_))
        ));
        assert!(matches!(
            "/BC]".parse::<Path>(),
            Err(PathParseError::MalformedKey(_))
        ));
    }

    #[test]
    fn strip_prefix_returns_remaining_segments() {
        let base: Path = "/Case/App".parse().unwrap();
        let full: Path = "/Case/App/GlobalSettings/PlotInterval".parse().unwrap();
        let rest = full.strip_prefix(&base).unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].name, "GlobalSettings");
        assert!(base.strip_prefix(&full).is_none());
    }

    #[test]
    fn serializes_as_segment_list() {
        let path: Path = "/Case/BC[wall]".parse().unwrap();
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "name": "Case" }, { "name": "BC", "key": "wall" }])
        );
        let back: Path = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);
    }
}
