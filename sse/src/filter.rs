use crate::error::Result;
use regex::Regex;

/// One entry of a subscriber's event filter.
#[derive(Debug, Clone)]
pub enum EventMatcher {
    /// Accepts an event whose name equals this string exactly.
    Literal(String),
    /// Accepts an event whose name matches this regular expression.
    Pattern(Regex),
}

impl EventMatcher {
    pub fn literal(name: impl Into<String>) -> Self {
        EventMatcher::Literal(name.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(EventMatcher::Pattern(Regex::new(pattern)?))
    }

    fn matches(&self, event: &str) -> bool {
        match self {
            EventMatcher::Literal(name) => name == event,
            EventMatcher::Pattern(regex) => regex.is_match(event),
        }
    }
}

/// The set of event names a subscriber wants to receive.
///
/// A subscriber without a filter receives everything. A subscriber with a
/// filter receives only named events accepted by at least one entry; unnamed
/// data events never reach it.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    matchers: Vec<EventMatcher>,
}

impl EventFilter {
    pub fn new(matchers: Vec<EventMatcher>) -> Self {
        Self { matchers }
    }

    /// Build a filter from a comma separated list such as `a,b,/^chat-.*$/`.
    ///
    /// Entries wrapped in slashes compile as regular expressions; everything
    /// else is a literal name. Blank entries are skipped.
    pub fn parse(list: &str) -> Result<Self> {
        let matchers = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.strip_prefix('/').and_then(|e| e.strip_suffix('/')) {
                Some(pattern) => EventMatcher::pattern(pattern),
                None => Ok(EventMatcher::literal(entry)),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { matchers })
    }

    pub fn accepts(&self, event: Option<&str>) -> bool {
        match event {
            Some(event) => self.matchers.iter().any(|m| m.matches(event)),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for EventFilter {
    fn from_iter<I: IntoIterator<Item = S>>(names: I) -> Self {
        Self::new(names.into_iter().map(EventMatcher::literal).collect())
    }
}

/// Decide whether a subscriber's (optional) filter accepts an event name.
pub fn accepts(filter: Option<&EventFilter>, event: Option<&str>) -> bool {
    filter.map_or(true, |filter| filter.accepts(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_no_filter_accepts_everything() {
        assert!(accepts(None, Some("anything")));
        assert!(accepts(None, None));
    }

    #[test]
    fn test_literal_filter() {
        let filter: EventFilter = ["event-1"].into_iter().collect();
        assert!(accepts(Some(&filter), Some("event-1")));
        assert!(!accepts(Some(&filter), Some("event-2")));
        assert!(!accepts(Some(&filter), Some("event-10")));
    }

    #[test]
    fn test_unnamed_events_are_invisible_to_filtered_subscribers() {
        let filter: EventFilter = ["event-1"].into_iter().collect();
        assert!(!accepts(Some(&filter), None));

        let catch_all = EventFilter::new(vec![EventMatcher::pattern(".*").unwrap()]);
        assert!(!accepts(Some(&catch_all), None));
    }

    #[test]
    fn test_pattern_filter() {
        let filter = EventFilter::new(vec![
            EventMatcher::literal("exact"),
            EventMatcher::pattern("^chat-[0-9]+$").unwrap(),
        ]);
        assert!(filter.accepts(Some("exact")));
        assert!(filter.accepts(Some("chat-12")));
        assert!(!filter.accepts(Some("chat-x")));
    }

    #[test]
    fn test_parse_mixes_literals_and_patterns() {
        let filter = EventFilter::parse(" a, /^b[0-9]$/ ,, c").unwrap();
        assert_eq!(filter.len(), 3);
        assert!(filter.accepts(Some("a")));
        assert!(filter.accepts(Some("b7")));
        assert!(filter.accepts(Some("c")));
        assert!(!filter.accepts(Some("b")));
    }

    #[test]
    fn test_parse_rejects_invalid_pattern() {
        let err = EventFilter::parse("/([/").unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::InvalidPattern);
    }

    #[test]
    fn test_empty_filter_rejects_everything() {
        let filter = EventFilter::parse("").unwrap();
        assert!(filter.is_empty());
        assert!(!filter.accepts(Some("a")));
    }
}
