//! Query string access for encoders.

/// Decoded query parameters of one request.
///
/// Encoders read format-specific options from here, such as the JSONP
/// `callback` name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse a raw (still percent-encoded) query string.
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self(pairs)
    }

    /// The first value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The first non-empty value of `name`.
    #[must_use]
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_and_decode_query() {
        let params = QueryParams::parse(Some("callback=my%20cb&x=1&callback=second"));
        assert_eq!(params.get("callback"), Some("my cb"));
        assert_eq!(params.get("x"), Some("1"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_should_treat_empty_value_as_absent_for_non_empty() {
        let params = QueryParams::parse(Some("callback="));
        assert_eq!(params.get("callback"), Some(""));
        assert_eq!(params.non_empty("callback"), None);
    }

    #[test]
    fn test_should_handle_missing_query() {
        assert_eq!(QueryParams::parse(None), QueryParams::default());
    }
}
