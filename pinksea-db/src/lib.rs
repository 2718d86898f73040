pub mod client;
mod query;
mod record;
