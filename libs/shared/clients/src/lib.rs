// libs/shared/clients/src/lib.rs
//
// Outbound collaborator interfaces. Email and image storage are
// best-effort side channels of the booking flow; both are expressed as
// traits with an HTTP backend and an in-memory capture backend for tests.

pub mod images;
pub mod mailer;

pub use images::{ImageStore, ImageStoreError, MemoryImageStore, RestImageStore};
pub use mailer::{DeliveryReceipt, MailError, Mailer, MemoryMailer, RestMailer};
