//! Behaviour-driven tests for the volume lifecycle.

mod bdd_steps;
mod scenarios;
mod test_helpers;
