//! Persistence of the record collection

mod record_store;

pub use record_store::RecordStore;
