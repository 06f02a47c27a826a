mod content;
mod intent;
mod signal;

pub use content::*;
pub use intent::*;
pub use signal::*;

pub(crate) use signal::TARGET_ID_KEYS;
