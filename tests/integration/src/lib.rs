//! End-to-end tests for dynomap.
//!
//! Every test drives a [`Table`] over a [`MemoryGateway`], so the whole
//! request path (expression compilation, wire encoding, pagination, and
//! batching) runs without a server.
//!
//! Set `RUST_LOG=dynomap_core=debug` to see each request as it is sent.

pub mod memory;

use std::sync::{Arc, Once};

use dynomap_core::schema::TableSchema;
use dynomap_core::{Gateway, Table};
use dynomap_model::types::ScalarAttributeType;

pub use memory::MemoryGateway;

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A `users` table keyed on `email`, with an `age` number, a `status` that
/// defaults to `active`, and a required `name`.
#[must_use]
pub fn users_table() -> (Table, Arc<MemoryGateway>) {
    init_tracing();
    let memory = Arc::new(MemoryGateway::new("users", "email"));
    let schema = TableSchema::builder("email", ScalarAttributeType::S)
        .attribute("age", ScalarAttributeType::N)
        .default_value("status", "active")
        .required("name")
        .build();
    let gateway: Arc<dyn Gateway> = memory.clone();
    (Table::new(gateway, Arc::new(schema)), memory)
}

/// An `events` table keyed on `user` and the numeric `ts`, with a
/// `by_kind` index keyed on `kind` and `ts`.
#[must_use]
pub fn events_table() -> (Table, Arc<MemoryGateway>) {
    init_tracing();
    let memory = Arc::new(
        MemoryGateway::new("events", "user")
            .with_range_key("ts")
            .with_index("by_kind", "kind", Some("ts")),
    );
    let schema = TableSchema::builder("user", ScalarAttributeType::S)
        .range_key("ts", ScalarAttributeType::N)
        .index("by_kind", "kind", Some("ts"))
        .attribute("kind", ScalarAttributeType::S)
        .build();
    let gateway: Arc<dyn Gateway> = memory.clone();
    (Table::new(gateway, Arc::new(schema)), memory)
}

mod test_scan;
