//! Caller-facing rental views.
//!
//! A rental record only carries identifiers into the other two
//! services; the assembler resolves them and folds the three records
//! into one response shape, with bounded concurrent fan-out for pages.

pub mod assembler;
pub mod view;

pub use assembler::{FAN_OUT_LIMIT, ResponseAssembler};
pub use view::{CarSummary, PaymentView, RentalView};
