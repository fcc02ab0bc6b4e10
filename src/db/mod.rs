pub mod account_requests;
pub mod admins;
pub mod ai_configs;
pub mod announcements;
pub mod clients;
pub mod reports;
pub mod system_logs;
pub mod tickets;
pub mod tokens;
pub mod user_roles;
pub mod users;
pub mod whatsapp_contacts;
pub mod whatsapp_instances;
pub mod whatsapp_messages;
