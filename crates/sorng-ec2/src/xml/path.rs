use std::fmt;

/// Stack of currently-open element names, outermost first.
///
/// The engine pushes on every open and pops on every close, so the path is
/// always exactly the chain of ancestors of the current event (the element
/// itself included).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathContext {
    segments: Vec<String>,
}

impl PathContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: &str) {
        self.segments.push(name.to_string());
    }

    pub(crate) fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the innermost open element.
    pub fn current(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Name of the element enclosing the current one.
    pub fn parent(&self) -> Option<&str> {
        let len = self.segments.len();
        if len < 2 {
            None
        } else {
            Some(&self.segments[len - 2])
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// True when the innermost elements are exactly `suffix`, in order.
    ///
    /// Decoders anchor rules on a suffix rather than the full path so the
    /// root element name (which varies per action) does not matter.
    pub fn ends_with(&self, suffix: &[&str]) -> bool {
        if suffix.len() > self.segments.len() {
            return false;
        }
        self.segments[self.segments.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(have, want)| have == want)
    }
}

impl fmt::Display for PathContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
