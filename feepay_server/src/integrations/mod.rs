pub mod digiflazz;
pub mod mail;
pub mod midtrans;
pub mod notifications;
pub mod telegram;

pub use digiflazz::DigiflazzSupplier;
pub use midtrans::MidtransCheckout;
pub use notifications::{create_notification_handlers, NotificationError, Notifiers};
