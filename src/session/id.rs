//! Session identifiers.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use uuid::Uuid;

/// A 16-byte random session identifier.
///
/// Its string form is lowercase hex grouped 4-2-2-2-6 bytes
/// (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`). Identifiers are bearer tokens,
/// so every byte comes from the OS-seeded CSPRNG.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct SessionId([u8; 16]);

impl SessionId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Uuid::from_bytes(self.0).hyphenated(), f)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({self})")
    }
}

/// The token was not a hyphenated 32-digit hex identifier.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("malformed session id")]
pub struct ParseSessionIdError;

impl FromStr for SessionId {
    type Err = ParseSessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the hyphenated form is a valid cookie value.
        if s.len() != 36 {
            return Err(ParseSessionIdError);
        }
        Uuid::try_parse(s)
            .map(|uuid| Self(uuid.into_bytes()))
            .map_err(|_| ParseSessionIdError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form() {
        let id = SessionId::from_bytes([
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
        ]);
        assert_eq!(id.to_string(), "01234567-89ab-cdef-0011-223344556677");
        assert_eq!("01234567-89ab-cdef-0011-223344556677".parse::<SessionId>(), Ok(id));
    }

    #[test]
    fn rejects_other_shapes() {
        for token in [
            "",
            "not-a-session",
            "0123456789abcdef0011223344556677",
            "{01234567-89ab-cdef-0011-223344556677}",
            "01234567-89ab-cdef-0011-22334455667g",
        ] {
            assert_eq!(token.parse::<SessionId>(), Err(ParseSessionIdError), "{token}");
        }
    }

    #[test]
    fn generated_ids_differ_and_reparse() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<SessionId>(), Ok(a));
    }
}
