//! End-to-end workflow tests running the circulation service against the
//! durable SQLite store, the way the CLI wires them together.
