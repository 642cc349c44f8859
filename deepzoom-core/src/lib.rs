pub mod bigreal;
pub mod complex;
pub mod pixel_rect;
pub mod precision;
pub mod progress;
pub mod session;

pub use bigreal::{BigComplex, BigReal};
pub use complex::Complex64;
pub use pixel_rect::PixelRect;
pub use precision::{decimal_log2, precision_bits_for};
pub use progress::{CollectingSink, NullSink, ProgressEvent, ProgressSink};
pub use session::SessionConfig;
