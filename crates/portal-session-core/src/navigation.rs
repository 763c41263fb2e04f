//! Navigation side effects.
//!
//! Guards and logout do not return errors, they move the user somewhere
//! else. `Navigator` is where that move lands: a browser binding assigns
//! `location.href`, the CLI prints, tests record.

/// Receives redirects
pub trait Navigator {
    fn navigate(&mut self, location: &str);
}

/// Records every location it is sent to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryNavigator {
    visited: Vec<String>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start on a page without it counting as a redirect
    pub fn starting_at(location: impl Into<String>) -> Self {
        Self {
            visited: vec![location.into()],
        }
    }

    /// Where the user is now
    pub fn current(&self) -> Option<&str> {
        self.visited.last().map(String::as_str)
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&mut self, location: &str) {
        self.visited.push(location.to_string());
    }
}

impl<N: Navigator + ?Sized> Navigator for &mut N {
    fn navigate(&mut self, location: &str) {
        (**self).navigate(location)
    }
}
