use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Build the `Authorization` header value for Atlassian Basic auth.
pub fn basic_auth_header(email: &str, api_token: &str) -> String {
    let encoded = STANDARD.encode(format!("{email}:{api_token}"));
    format!("Basic {encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_email_and_token() {
        assert_eq!(
            basic_auth_header("user@example.com", "secret"),
            "Basic dXNlckBleGFtcGxlLmNvbTpzZWNyZXQ="
        );
    }
}
