//! ARES service-request bot core: message classification, reply templates,
//! ticket numbering, chat transports, and the webhook gateway used by the CLI.

pub mod channels;
pub mod classifier;
pub mod compose;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod init;
pub mod text;
pub mod tickets;
