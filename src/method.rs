//! HTTP methods and method masks.
//!
//! A route accepts a set of methods, stored as a [`Methods`] bitset. The
//! inbound method string is parsed into a [`Method`]; a method sprig does not
//! know is `None`, never an empty mask, so "could not parse" and "parsed but
//! not accepted here" stay distinguishable.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// A known HTTP method (RFC 9110).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Connect,
    Trace,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Head,
        Self::Options,
        Self::Patch,
        Self::Connect,
        Self::Trace,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get     => "GET",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Delete  => "DELETE",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Connect => "CONNECT",
            Self::Trace   => "TRACE",
        }
    }

    /// Parses a request line method, `None` when it is not one sprig routes on.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    const fn bit(self) -> u16 {
        match self {
            Self::Get     => 0x0001,
            Self::Post    => 0x0002,
            Self::Put     => 0x0004,
            Self::Delete  => 0x0008,
            Self::Head    => 0x0010,
            Self::Options => 0x0020,
            Self::Patch   => 0x0040,
            Self::Connect => 0x0080,
            Self::Trace   => 0x0100,
        }
    }
}

/// Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET"     => Ok(Self::Get),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "DELETE"  => Ok(Self::Delete),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "CONNECT" => Ok(Self::Connect),
            "TRACE"   => Ok(Self::Trace),
            _         => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of methods a route accepts.
///
/// ```rust
/// use sprig::{Method, Methods};
///
/// let mask = Methods::GET | Methods::POST;
/// assert!(mask.contains(Method::Post));
/// assert!(!mask.contains(Method::Delete));
/// ```
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Methods(u16);

impl Methods {
    /// Accepts nothing. A route registered with this mask never matches.
    pub const NONE: Self = Self(0);
    pub const GET: Self = Self(Method::Get.bit());
    pub const POST: Self = Self(Method::Post.bit());
    pub const PUT: Self = Self(Method::Put.bit());
    pub const DELETE: Self = Self(Method::Delete.bit());
    pub const HEAD: Self = Self(Method::Head.bit());
    pub const OPTIONS: Self = Self(Method::Options.bit());
    pub const PATCH: Self = Self(Method::Patch.bit());
    pub const CONNECT: Self = Self(Method::Connect.bit());
    pub const TRACE: Self = Self(Method::Trace.bit());
    pub const ALL: Self = Self(0x01ff);

    pub fn contains(self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The accepted methods in bit order.
    pub fn iter(self) -> impl Iterator<Item = Method> {
        Method::ALL
            .into_iter()
            .filter(move |m| self.contains(*m))
    }
}

impl From<Method> for Methods {
    fn from(method: Method) -> Self {
        Self(method.bit())
    }
}

impl BitOr for Methods {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<Method> for Methods {
    type Output = Self;

    fn bitor(self, rhs: Method) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOrAssign for Methods {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
