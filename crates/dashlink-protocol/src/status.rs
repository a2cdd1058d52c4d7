//! Server status codes carried by generic RESPONSE frames

use std::fmt;

/// Status codes returned by the server in generic RESPONSE frames.
///
/// [`Status::Ok`] marks success; every other code is a rejection. Codes not
/// in this table are passed through to callers as raw `u16` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    /// Command rejected as malformed
    IllegalCommand = 2,
    /// Unknown user credentials
    UserNotRegistered = 3,
    /// Operation not permitted for this session
    NotAllowed = 6,
    /// No dashboard has been activated
    NoActiveDashboard = 8,
    /// Token did not match any dashboard
    InvalidToken = 9,
    /// Command body failed server-side validation
    IllegalCommandBody = 11,
    /// Target device is no longer connected
    DeviceWentOffline = 18,
    /// Success
    Ok = 200,
}

impl Status {
    /// Convert to the wire value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Convert from the wire value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            2 => Some(Self::IllegalCommand),
            3 => Some(Self::UserNotRegistered),
            6 => Some(Self::NotAllowed),
            8 => Some(Self::NoActiveDashboard),
            9 => Some(Self::InvalidToken),
            11 => Some(Self::IllegalCommandBody),
            18 => Some(Self::DeviceWentOffline),
            200 => Some(Self::Ok),
            _ => None,
        }
    }

    /// Whether this status marks success
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Upper-case wire-protocol name for this status
    pub fn name(&self) -> &'static str {
        match self {
            Self::IllegalCommand => "ILLEGAL_COMMAND",
            Self::UserNotRegistered => "USER_NOT_REGISTERED",
            Self::NotAllowed => "NOT_ALLOWED",
            Self::NoActiveDashboard => "NO_ACTIVE_DASHBOARD",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::IllegalCommandBody => "ILLEGAL_COMMAND_BODY",
            Self::DeviceWentOffline => "DEVICE_WENT_OFFLINE",
            Self::Ok => "OK",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u16())
    }
}
