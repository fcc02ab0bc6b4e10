/// Declares an enum stored as a TEXT column guarded by a CHECK constraint.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident ($label:literal) { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Invalid {}: {other}", $label)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod account_request;
pub mod admin;
pub mod ai_config;
pub mod announcement;
pub mod client;
pub mod stored_token;
pub mod system_log;
pub mod ticket;
pub mod user;
pub mod user_role;
pub mod whatsapp;

pub use account_request::{AccountRequest, RequestStatus};
pub use admin::AdminRecord;
pub use ai_config::{AiConfig, Tone};
pub use announcement::{Announcement, AnnouncementPriority, UserAnnouncement};
pub use client::{Client, ClientStatus};
pub use stored_token::StoredToken;
pub use system_log::SystemLog;
pub use ticket::{Ticket, TicketMessage, TicketPriority, TicketStatus};
pub use user::User;
pub use user_role::{Role, UserRole};
pub use whatsapp::{InstanceStatus, WhatsappContact, WhatsappInstance, WhatsappMessage};
