//! Component tests, one module per source component

mod support;
mod test_config;
mod test_lifecycle;
