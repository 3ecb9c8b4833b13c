//! Unique names for live selection sessions.

use std::collections::HashSet;

/// Names of sessions currently on screen.
#[derive(Debug, Default, Clone)]
pub struct SessionNames {
    live: HashSet<String>,
}

impl SessionNames {
    /// `identifier` itself when free, else the first free `identifier<N>` from 2 upward.
    pub fn unique_name(&self, identifier: &str) -> String {
        if !self.is_live(identifier) {
            return identifier.to_string();
        }
        (2..)
            .map(|suffix| format!("{identifier}<{suffix}>"))
            .find(|candidate| !self.is_live(candidate))
            .unwrap_or_else(|| identifier.to_string())
    }

    pub fn register(&mut self, name: &str) {
        self.live.insert(name.to_string());
    }

    pub fn release(&mut self, name: &str) {
        self.live.remove(name);
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.live.contains(name)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_increment_until_free() {
        let mut names = SessionNames::default();
        assert_eq!(names.unique_name("run"), "run");
        names.register("run");
        assert_eq!(names.unique_name("run"), "run<2>");
        names.register("run<2>");
        assert_eq!(names.unique_name("run"), "run<3>");

        names.release("run");
        assert_eq!(names.unique_name("run"), "run");
    }
}
