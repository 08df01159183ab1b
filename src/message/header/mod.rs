//! Header fields of a message, and the codec used for their values
// https://tools.ietf.org/html/rfc5322#section-2.2

use std::slice::Iter;

mod content;
mod encoded_word;
mod format;

pub use self::{
    content::Encoding,
    encoded_word::{needs_encoding, WordEncoder},
    format::{format_address, format_date, has_specials},
};

/// Ordered multi-valued header fields.
///
/// Field names are case-sensitive and kept exactly as given. Setting a field
/// that already exists replaces its values where it stands, so the emission
/// order is the order in which field names were first set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, Vec<String>)>,
}

impl Headers {
    #[inline]
    pub const fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.find_header_index(name)
            .map(|i| self.headers[i].1.as_slice())
    }

    /// The first value of a field
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.find_header_index(name).is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.find_header_index(&name) {
            Some(i) => self.headers[i].1 = values,
            None => self.headers.push((name, values)),
        }
    }

    /// Sets a field only if it is not already present.
    pub fn set_default(&mut self, name: &str, value: String) {
        if !self.contains(name) {
            self.headers.push((name.to_owned(), vec![value]));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.find_header_index(name)
            .map(|i| self.headers.remove(i).1)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.headers.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        HeaderIter(self.headers.iter())
    }

    fn find_header_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|(name_, _)| name_ == name)
    }
}

struct HeaderIter<'a>(Iter<'a, (String, Vec<String>)>);

impl<'a> Iterator for HeaderIter<'a> {
    type Item = (&'a str, &'a [String]);

    fn next(&mut self) -> Option<Self::Item> {
        self.0
            .next()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, Vec<String>)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, values) in iter {
            headers.set(name, values);
        }
        headers
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn set_replaces_in_place() {
        let mut headers = Headers::new();
        headers.set("Subject", values(&["first"]));
        headers.set("To", values(&["a@example.com"]));
        headers.set("Subject", values(&["second"]));

        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Subject", "To"]);
        assert_eq!(headers.get_first("Subject"), Some("second"));
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut headers = Headers::new();
        headers.set("X-Tag", values(&["a"]));
        headers.set("x-tag", values(&["b"]));

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_first("X-Tag"), Some("a"));
        assert_eq!(headers.get("X-TAG"), None);
    }

    #[test]
    fn set_default_keeps_existing() {
        let mut headers = Headers::new();
        headers.set("Content-Type", values(&["text/html"]));
        headers.set_default("Content-Type", "text/plain".into());
        headers.set_default("Content-Transfer-Encoding", "base64".into());

        assert_eq!(headers.get_first("Content-Type"), Some("text/html"));
        assert_eq!(
            headers.get_first("Content-Transfer-Encoding"),
            Some("base64")
        );
    }

    #[test]
    fn remove_and_clear() {
        let mut headers: Headers = [("A", values(&["1"])), ("B", values(&["2", "3"]))]
            .into_iter()
            .collect();

        assert_eq!(headers.remove("B"), Some(values(&["2", "3"])));
        assert!(!headers.contains("B"));
        headers.clear();
        assert!(headers.is_empty());
    }
}
