//! Offer book: standing sell intents with an amount range and unit price.

pub mod book;
pub mod handlers;
pub mod models;

pub use book::{DeleteOutcome, OfferBook};
pub use models::{Offer, OfferCreate, OfferData, OfferFilter, OfferUpdate};
