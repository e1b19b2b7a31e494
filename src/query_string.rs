use std::collections::HashMap;

#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString {
            items,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        let qs = QueryString::from("q=lake%20boats&page=2");
        assert_eq!(qs.get("q"), Some("lake boats"));
        assert_eq!(qs.get("page"), Some("2"));
        assert_eq!(qs.get("missing"), None);
    }

    #[test]
    fn test_parse_invalid_query_str() {
        let buf = "";
        let expected = QueryString {
            items: Default::default(),
        };
        assert_eq!(QueryString::from(buf), expected);
    }

    #[test]
    fn test_parse_key_only_query_str() {
        let qs = QueryString::from("key-only");
        assert_eq!(qs.get("key-only"), Some(""));
    }
}
