//! Server state: settings.

pub mod settings;
