//! Path resolution for the value accessor.

/// A resolved path into a configuration document.
///
/// A single segment is treated as a dotted path and split on `.`; several
/// segments are taken as already split. No segments address the root.
///
/// # Example
///
/// ```
/// use stratum_core::KeyPath;
///
/// assert_eq!(KeyPath::from("a.b.c").segments(), ["a", "b", "c"]);
/// assert_eq!(KeyPath::from(["a.b", "c"]).segments(), ["a.b", "c"]);
/// assert!(KeyPath::root().is_root());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The path addressing the whole document.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Resolves raw segments into a path.
    pub fn resolve<S: AsRef<str>>(segments: &[S]) -> Self {
        match segments {
            [] => Self::root(),
            [single] => Self(single.as_ref().split('.').map(str::to_string).collect()),
            many => Self(many.iter().map(|s| s.as_ref().to_string()).collect()),
        }
    }

    /// Returns the segments of the path.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if the path addresses the whole document.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits the path into its parent segments and its last segment.
    pub fn split_last(&self) -> Option<(&String, &[String])> {
        self.0.split_last()
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self::resolve(&[path])
    }
}

impl From<String> for KeyPath {
    fn from(path: String) -> Self {
        Self::resolve(&[path])
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        Self::resolve(segments)
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        Self::resolve(&segments)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self::resolve(&segments)
    }
}

impl From<&KeyPath> for KeyPath {
    fn from(path: &KeyPath) -> Self {
        path.clone()
    }
}
