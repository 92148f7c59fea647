//! ce-contacts: CardDAV address book export
//!
//! This crate lists a CardDAV address book and writes every vCard in it
//! into one combined file.
//!
//! ## Flow
//!
//! 1. `PROPFIND` the collection with `Depth: 1` and keep the members whose
//!    propstat reports success
//! 2. `GET` each member in listing order, clean up line endings, and append
//!    it to the output file followed by a blank line
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ce_contacts::{export_contacts, ContactsClient, ContactsConfig};
//!
//! let config = ContactsConfig::new(
//!     "https://www.google.com/carddav/v1/principals/me@gmail.com/lists/default/",
//!     "https://www.google.com",
//!     "me@gmail.com",
//!     "app-password",
//! );
//! let client = ContactsClient::new(config)?;
//!
//! let summary = export_contacts(&client, "contacts_combined.vcf").await?;
//! println!("{} of {} contacts saved", summary.saved, summary.listed);
//! ```

pub mod client;
pub mod error;
pub mod export;
pub mod listing;
pub mod models;
pub mod vcard;

pub use client::ContactsClient;
pub use error::{ContactsError, Result};
pub use export::{export_contacts, save_contact};
pub use listing::parse_listing;
pub use models::{ContactsConfig, ExportSummary};
