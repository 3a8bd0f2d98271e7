//! ShopFlow client session core.
//!
//! One [`Storefront`] controller owns an explicit [`Session`] and drives every
//! user flow against a [`StorefrontBackend`]: anonymous identity, catalog,
//! cart with best-effort tracking, consent, the simulated abandoned-cart
//! message, admin channel switches and the polling dashboard.
//!
//! Front ends (terminal, browser) only render [`Session`] snapshots and the
//! [`Notice`] each operation returns.

pub mod admin;
pub mod cart;
pub mod config;
pub mod consent;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod in_flight;
pub mod messaging;
pub mod notice;
pub mod storefront;
pub mod timer;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use cart::Cart;
pub use config::SessionConfig;
pub use dashboard::{DashboardState, PollHandle, PollToken};
pub use error::SessionError;
pub use identity::{FileIdentityStore, IdentityStore, MemoryIdentityStore, generate_identity};
pub use in_flight::Action;
pub use messaging::{MessagePreview, PreviewState, PreviewStyle, PreviewTemplate, SmsBody, WhatsAppCard};
pub use notice::{Notice, NoticeLevel};
pub use sf_backend_client::StorefrontBackend;
pub use storefront::{Session, Storefront};
pub use timer::Timer;
pub use tracker::FlushReport;
