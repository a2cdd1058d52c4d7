//! Command types and structured command values
//!
//! This module defines the wire code table and the structured commands the
//! client sends. Commands are built directly from typed parameters and
//! serialized exactly once into body bytes; there is no intermediate
//! command-string form.
//!
//! # Body encodings
//!
//! - LOGIN: username ++ NUL ++ base64 password hash
//! - CREATE_DASH / CREATE_WIDGET: space-joined textual parameters, the
//!   first being a JSON object literal
//! - every other multi-parameter command: NUL-joined positional fields

use bytes::Bytes;

use crate::auth;

/// Command/response type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    /// Generic status response
    Response = 0,
    /// Authenticate the session
    Login = 2,
    /// Fetch a dashboard's device token
    GetToken = 5,
    /// Keepalive ping
    Ping = 6,
    /// Activate a dashboard
    ActivateDashboard = 7,
    /// Post a tweet notification
    Tweet = 12,
    /// Send an email notification
    Email = 13,
    /// Push a mobile notification
    Notify = 14,
    /// Bridge two devices
    Bridge = 15,
    /// Hardware state sync push
    HwSync = 16,
    /// Hardware info push
    HwInfo = 17,
    /// Read or write a pin
    Hardware = 20,
    /// Create a dashboard
    CreateDash = 21,
    /// Delete a dashboard
    DeleteDash = 23,
    /// Fetch the gzipped profile snapshot
    LoadProfileGzipped = 24,
    /// Profile sync notification
    Sync = 25,
    /// Create a widget on a dashboard
    CreateWidget = 33,
}

impl CommandType {
    /// Convert to the wire code
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from the wire code
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Response),
            2 => Some(Self::Login),
            5 => Some(Self::GetToken),
            6 => Some(Self::Ping),
            7 => Some(Self::ActivateDashboard),
            12 => Some(Self::Tweet),
            13 => Some(Self::Email),
            14 => Some(Self::Notify),
            15 => Some(Self::Bridge),
            16 => Some(Self::HwSync),
            17 => Some(Self::HwInfo),
            20 => Some(Self::Hardware),
            21 => Some(Self::CreateDash),
            23 => Some(Self::DeleteDash),
            24 => Some(Self::LoadProfileGzipped),
            25 => Some(Self::Sync),
            33 => Some(Self::CreateWidget),
            _ => None,
        }
    }
}

/// How the eventual response body must be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// 16-bit status code in a generic RESPONSE frame
    Status,
    /// NUL-joined field list (hardware read)
    Fields,
    /// Raw UTF-8 text (token fetch)
    Text,
    /// Gzipped byte stream inflating to UTF-8 text (profile fetch)
    Snapshot,
}

/// Declared completion policy for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The call settles when a correlated response arrives (or times out)
    AwaitsResponse,
    /// The call settles successfully as soon as the frame is sent
    Immediate,
}

/// Addressable pin channel class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    /// Digital GPIO pin
    Digital,
    /// Virtual (software) pin
    Virtual,
    /// Analog pin
    Analog,
}

impl PinKind {
    /// Wire prefix for the hardware command field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "d",
            Self::Virtual => "v",
            Self::Analog => "a",
        }
    }
}

/// Pin operation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOp {
    /// Read the pin state; the device answers with a field list
    Read,
    /// Write the pin state; the server sends no confirming reply
    Write,
}

impl PinOp {
    /// Wire suffix for the hardware command field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::Write => "w",
        }
    }
}

/// Widget definition sent as the CREATE_WIDGET JSON literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    /// Widget id, unique within the dashboard
    pub id: u32,
    /// Horizontal grid position
    pub x: u32,
    /// Vertical grid position
    pub y: u32,
    /// Display label
    pub label: String,
    /// Widget type name, e.g. "BUTTON" or "DIGIT4_DISPLAY"
    pub kind: String,
    /// Bound pin class name, e.g. "DIGITAL"
    pub pin_kind: String,
    /// Bound pin id
    pub pin: String,
}

impl Widget {
    /// Render the widget as its wire JSON object literal
    fn to_json(&self) -> String {
        serde_json::json!({
            "id": self.id,
            "x": self.x,
            "y": self.y,
            "label": self.label,
            "type": self.kind,
            "pinType": self.pin_kind,
            "pin": self.pin,
        })
        .to_string()
    }
}

/// A structured command ready to be framed and sent
#[derive(Debug, Clone)]
pub enum Command {
    /// Authenticate with a username and derived password hash
    Login {
        /// Username, sent verbatim
        username: String,
        /// Base64 hash derived by [`crate::auth::password_hash`]
        password_hash: String,
    },

    /// Keepalive ping
    Ping,

    /// Activate a dashboard
    Activate {
        /// Dashboard to activate
        dashboard_id: u32,
    },

    /// Create a dashboard
    CreateDashboard {
        /// New dashboard id
        id: u32,
        /// Display name
        name: String,
        /// Dashboard type name
        kind: String,
    },

    /// Delete a dashboard
    DeleteDashboard {
        /// Dashboard to delete
        id: u32,
    },

    /// Create a widget on a dashboard
    CreateWidget {
        /// Owning dashboard
        dashboard_id: u32,
        /// Widget definition
        widget: Widget,
    },

    /// Fetch a dashboard's device token
    GetToken {
        /// Dashboard whose token to fetch
        dashboard_id: u32,
    },

    /// Read or write a pin on a dashboard's device
    Hardware {
        /// Owning dashboard
        dashboard_id: u32,
        /// Pin channel class
        pin_kind: PinKind,
        /// Read or write
        op: PinOp,
        /// Pin id
        pin: u32,
        /// Value for writes; absent for reads
        value: Option<String>,
    },

    /// Fetch the gzipped profile snapshot
    LoadProfile {
        /// Restrict to one dashboard, or fetch the whole profile
        dashboard_id: Option<u32>,
    },
}

impl Command {
    /// Build a login command, deriving the password hash
    pub fn login(username: &str, password: &str) -> Self {
        Self::Login {
            username: username.to_string(),
            password_hash: auth::password_hash(username, password),
        }
    }

    /// Get the wire command type for this command
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Login { .. } => CommandType::Login,
            Command::Ping => CommandType::Ping,
            Command::Activate { .. } => CommandType::ActivateDashboard,
            Command::CreateDashboard { .. } => CommandType::CreateDash,
            Command::DeleteDashboard { .. } => CommandType::DeleteDash,
            Command::CreateWidget { .. } => CommandType::CreateWidget,
            Command::GetToken { .. } => CommandType::GetToken,
            Command::Hardware { .. } => CommandType::Hardware,
            Command::LoadProfile { .. } => CommandType::LoadProfileGzipped,
        }
    }

    /// Declared completion policy.
    ///
    /// Pin writes are the one fire-and-forget case: the server sends no
    /// confirming reply for them, so the call settles on send.
    pub fn completion(&self) -> Completion {
        match self {
            Command::Hardware {
                op: PinOp::Write, ..
            } => Completion::Immediate,
            _ => Completion::AwaitsResponse,
        }
    }

    /// How the correlated response body must be decoded
    pub fn response_kind(&self) -> ResponseKind {
        match self {
            Command::GetToken { .. } => ResponseKind::Text,
            Command::Hardware { .. } => ResponseKind::Fields,
            Command::LoadProfile { .. } => ResponseKind::Snapshot,
            _ => ResponseKind::Status,
        }
    }

    /// Serialize the command parameters into wire body bytes
    pub fn encode_body(&self) -> Bytes {
        match self {
            Command::Login {
                username,
                password_hash,
            } => Bytes::from(format!("{username}\0{password_hash}")),

            Command::Ping => Bytes::new(),

            Command::Activate { dashboard_id } => Bytes::from(dashboard_id.to_string()),

            Command::CreateDashboard { id, name, kind } => {
                let json = serde_json::json!({
                    "id": id,
                    "name": name,
                    "type": kind,
                });
                Bytes::from(json.to_string())
            }

            Command::DeleteDashboard { id } => Bytes::from(id.to_string()),

            Command::CreateWidget {
                dashboard_id,
                widget,
            } => Bytes::from(format!("{} {}", widget.to_json(), dashboard_id)),

            Command::GetToken { dashboard_id } => Bytes::from(dashboard_id.to_string()),

            Command::Hardware {
                dashboard_id,
                pin_kind,
                op,
                pin,
                value,
            } => {
                let mut fields = vec![
                    dashboard_id.to_string(),
                    format!("{}{}", pin_kind.as_str(), op.as_str()),
                    pin.to_string(),
                ];
                if let Some(value) = value {
                    fields.push(value.clone());
                }
                Bytes::from(fields.join("\0"))
            }

            Command::LoadProfile { dashboard_id } => match dashboard_id {
                Some(id) => Bytes::from(id.to_string()),
                None => Bytes::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_type_roundtrip() {
        for command_type in [
            CommandType::Response,
            CommandType::Login,
            CommandType::GetToken,
            CommandType::Ping,
            CommandType::ActivateDashboard,
            CommandType::Tweet,
            CommandType::Email,
            CommandType::Notify,
            CommandType::Bridge,
            CommandType::HwSync,
            CommandType::HwInfo,
            CommandType::Hardware,
            CommandType::CreateDash,
            CommandType::DeleteDash,
            CommandType::LoadProfileGzipped,
            CommandType::Sync,
            CommandType::CreateWidget,
        ] {
            let byte = command_type.as_u8();
            let recovered = CommandType::from_u8(byte).unwrap();
            assert_eq!(recovered, command_type);
        }
    }

    #[test]
    fn test_unknown_command_code() {
        assert!(CommandType::from_u8(0xFE).is_none());
    }

    #[test]
    fn test_login_body() {
        let command = Command::login("alice", "secret");
        assert_eq!(
            &command.encode_body()[..],
            b"alice\0TNj3GCS7i0OQxAHtaxnKpY+hLZooQ8ZSQr3ECcIzSS4=".as_slice()
        );
    }

    #[test]
    fn test_hardware_read_body() {
        let command = Command::Hardware {
            dashboard_id: 101,
            pin_kind: PinKind::Digital,
            op: PinOp::Read,
            pin: 4,
            value: None,
        };
        assert_eq!(&command.encode_body()[..], b"101\0dr\x004".as_slice());
        assert_eq!(command.completion(), Completion::AwaitsResponse);
    }

    #[test]
    fn test_hardware_write_body_is_fire_and_forget() {
        let command = Command::Hardware {
            dashboard_id: 101,
            pin_kind: PinKind::Digital,
            op: PinOp::Write,
            pin: 5,
            value: Some("0".to_string()),
        };
        assert_eq!(&command.encode_body()[..], b"101\0dw\x005\x000".as_slice());
        assert_eq!(command.completion(), Completion::Immediate);
    }

    #[test]
    fn test_create_dashboard_body_is_json() {
        let command = Command::CreateDashboard {
            id: 101,
            name: "DashTest".to_string(),
            kind: "GRID".to_string(),
        };
        assert_eq!(
            &command.encode_body()[..],
            br#"{"id":101,"name":"DashTest","type":"GRID"}"#.as_slice()
        );
    }

    #[test]
    fn test_create_widget_body_json_first() {
        let command = Command::CreateWidget {
            dashboard_id: 101,
            widget: Widget {
                id: 1,
                x: 0,
                y: 0,
                label: "Button".to_string(),
                kind: "BUTTON".to_string(),
                pin_kind: "DIGITAL".to_string(),
                pin: "5".to_string(),
            },
        };
        let body = command.encode_body();
        let text = std::str::from_utf8(&body).unwrap();
        // JSON literal first, then the dashboard id, space-joined
        assert!(text.starts_with('{'));
        assert!(text.ends_with(" 101"));
        assert!(text.contains(r#""label":"Button""#));
        assert!(text.contains(r#""type":"BUTTON""#));
        assert!(text.contains(r#""pinType":"DIGITAL""#));
        assert!(text.contains(r#""pin":"5""#));
    }

    #[test]
    fn test_ping_has_empty_body() {
        assert!(Command::Ping.encode_body().is_empty());
    }

    #[test]
    fn test_load_profile_body() {
        let scoped = Command::LoadProfile {
            dashboard_id: Some(101),
        };
        assert_eq!(&scoped.encode_body()[..], b"101".as_slice());

        let whole = Command::LoadProfile { dashboard_id: None };
        assert!(whole.encode_body().is_empty());
    }

    #[test]
    fn test_response_kinds() {
        assert_eq!(
            Command::GetToken { dashboard_id: 1 }.response_kind(),
            ResponseKind::Text
        );
        assert_eq!(
            Command::LoadProfile { dashboard_id: None }.response_kind(),
            ResponseKind::Snapshot
        );
        assert_eq!(
            Command::Activate { dashboard_id: 1 }.response_kind(),
            ResponseKind::Status
        );
    }
}
