//! Cross-crate integration tests for dantelink

#[cfg(test)]
mod support;

#[cfg(test)]
mod browsing_integration;
#[cfg(test)]
mod lifecycle_integration;
#[cfg(test)]
mod routing_integration;
