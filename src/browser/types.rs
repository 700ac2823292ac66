//! Browser session value types.

use serde::{Deserialize, Serialize};

/// Cookie captured from the live browser session, for reuse on plain HTTP
/// requests (PDF fetches).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

impl SessionCookie {
    /// Render as a `Set-Cookie`-style string for a reqwest cookie jar.
    pub fn as_cookie_str(&self) -> String {
        format!("{}={}; Domain={}; Path={}", self.name, self.value, self.domain, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_string_carries_domain_and_path() {
        let cookie = SessionCookie {
            name: "CFID".to_string(),
            value: "12345".to_string(),
            domain: ".fda.gov".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: false,
        };
        assert_eq!(cookie.as_cookie_str(), "CFID=12345; Domain=.fda.gov; Path=/");
    }
}
