//! Attribute system for structural events
//!
//! Attributes are kept as an ordered `Vec<(String, String)>`. Order matters:
//! two opening tags are only equal when their attribute lists are equal
//! bytewise, exactly as the parser produced them.

/// Element attributes as simple key-value pairs
pub type Attrs = Vec<(String, String)>;

/// Extension trait for attribute operations on Attrs
pub trait AttrsExt {
    /// Get an attribute value by name
    fn get_attr(&self, name: &str) -> Option<&str>;

    /// Check if an attribute exists
    fn has_attr(&self, name: &str) -> bool;

    /// Set an attribute value (insert or update)
    fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>);

    /// Remove an attribute by name, returning the old value if present
    fn remove_attr(&mut self, name: &str) -> Option<String>;

    /// Compare two attribute lists while ignoring the named attributes
    ///
    /// Relative order of the remaining attributes must match.
    fn same_except(&self, other: &Self, ignored: &[&str]) -> bool;
}

impl AttrsExt for Attrs {
    fn get_attr(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_attr(&self, name: &str) -> bool {
        self.iter().any(|(k, _)| k == name)
    }

    fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(attr) = self.iter_mut().find(|(k, _)| k == &name) {
            attr.1 = value;
        } else {
            self.push((name, value));
        }
    }

    fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.iter()
            .position(|(k, _)| k == name)
            .map(|pos| self.remove(pos).1)
    }

    fn same_except(&self, other: &Self, ignored: &[&str]) -> bool {
        let keep = |(k, _): &&(String, String)| !ignored.contains(&k.as_str());
        self.iter().filter(keep).eq(other.iter().filter(keep))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attrs_operations() {
        let mut attrs: Attrs = Vec::new();

        attrs.set_attr("id", "main");
        attrs.set_attr("class", "container");
        assert_eq!(attrs.len(), 2);

        assert_eq!(attrs.get_attr("id"), Some("main"));
        assert_eq!(attrs.get_attr("href"), None);
        assert!(attrs.has_attr("class"));

        attrs.set_attr("class", "wrapper");
        assert_eq!(attrs.get_attr("class"), Some("wrapper"));
        assert_eq!(attrs.len(), 2);

        let removed = attrs.remove_attr("id");
        assert_eq!(removed.as_deref(), Some("main"));
        assert!(!attrs.has_attr("id"));
    }

    #[test]
    fn test_same_except() {
        let old: Attrs = vec![
            ("id".into(), "x".into()),
            ("style".into(), "color: red".into()),
        ];
        let new: Attrs = vec![
            ("id".into(), "x".into()),
            ("style".into(), "color: blue".into()),
        ];
        assert!(old.same_except(&new, &["style"]));
        assert!(!old.same_except(&new, &["class"]));

        let renamed: Attrs = vec![("id".into(), "y".into())];
        assert!(!old.same_except(&renamed, &["style"]));
    }
}
