//! Contract tests for the models component
//!
//! These tests pin down the guarantees collaborators rely on: construction,
//! assignment, disposal and the timing and shape of notifications.

mod observer_contract_tests;
