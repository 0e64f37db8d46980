use std::convert::Infallible;
use std::fmt::{Display, Formatter};

use data_encoding::HEXLOWER;
use rand::{rngs::OsRng, RngCore};
use rocket::http::uri::fmt::{Formatter as UriFormatter, Path, UriDisplay};
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};

/// Number of random bytes in a response token.
pub const TOKEN_BYTES: usize = 32;

/// An opaque, unguessable token granting read access to one respondent's answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseToken(String);

impl ResponseToken {
    /// Mint a fresh token from the operating system's entropy source.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(HEXLOWER.encode(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResponseToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Any path segment is accepted: a malformed token simply matches nothing,
/// so it is indistinguishable from an unknown one.
impl<'a> FromParam<'a> for ResponseToken {
    type Error = Infallible;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        Ok(Self(param.to_string()))
    }
}

impl UriDisplay<Path> for ResponseToken {
    fn fmt(&self, f: &mut UriFormatter<'_, Path>) -> std::fmt::Result {
        UriDisplay::fmt(self.as_str(), f)
    }
}

rocket::http::impl_from_uri_param_identity!([Path] ResponseToken);

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tokens_are_hex_encoded() {
        let token = ResponseToken::generate();
        assert_eq!(token.as_str().len(), TOKEN_BYTES * 2);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        const N: usize = 10_000;
        let tokens = (0..N)
            .map(|_| ResponseToken::generate())
            .collect::<HashSet<_>>();
        assert_eq!(tokens.len(), N);
    }

    #[test]
    fn malformed_params_are_accepted_verbatim() {
        let token = ResponseToken::from_param("not-a-real-token").unwrap();
        assert_eq!(token.as_str(), "not-a-real-token");
    }
}
