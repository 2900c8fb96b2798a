pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

#[cfg(test)]
mod test_support;
