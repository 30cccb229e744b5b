//! Data sources: the hosted Supabase tables and the synthetic generator.

pub mod simulate;
pub mod supabase;

pub use simulate::{SimStep, Simulator};
pub use supabase::{OnConflict, SupabaseClient};
