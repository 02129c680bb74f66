mod decimal;
mod rupiah;
mod usdt;

pub mod helpers;
pub mod op;
mod secret;

pub use rupiah::{Rupiah, RupiahConversionError, IDR_CURRENCY_CODE};
pub use secret::Secret;
pub use usdt::{UsdtAmount, UsdtConversionError};
