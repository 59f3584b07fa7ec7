//! Pure helpers shared by the order protocol

pub mod order_number;
pub mod salutation;
