//! Built-in stream definitions embedded in the binary

/// SaaSOptics API definitions used when no streams file is given
pub static SAASOPTICS_STREAMS: &str = include_str!("../../definitions/saasoptics.yaml");
