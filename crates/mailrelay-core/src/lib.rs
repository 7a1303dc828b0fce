//! Gmail ingestion-and-delivery pipeline.
//!
//! The pipeline is driven by a single long-lived poll loop
//! ([`poller::Poller`]): on each tick it lists unread messages
//! ([`gmail::GmailClient`]), decodes each into a [`NormalizedRecord`]
//! ([`decode`]), POSTs the batch downstream with bounded concurrency
//! ([`deliver::Dispatcher`]), and advances the in-memory cursor.
//!
//! Data flows strictly downward: poller -> gmail client -> decoder ->
//! dispatcher -> cursor update. Ticks never overlap; per-record delivery
//! is the only point of true parallelism.
//!
//! [`NormalizedRecord`]: mailrelay_types::NormalizedRecord

pub mod decode;
pub mod deliver;
pub mod gmail;
pub mod poller;
pub mod retry;
