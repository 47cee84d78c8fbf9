//! `protoc` plugin generating poem-kit endpoint servers.
//!
//! ```text
//! protoc --poem-kit_out=. --poem-kit_opt=client=true,telemetry=true helloworld.proto
//! ```

use std::io::{Read, Write};

use poem_kit_build::unit;
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut input = Vec::new();
    std::io::stdin().read_to_end(&mut input)?;
    let request = CodeGeneratorRequest::decode(input.as_slice())?;
    let response = unit::generate_response(&request);

    let mut output = Vec::new();
    response.encode(&mut output)?;
    std::io::stdout().write_all(&output)?;
    Ok(())
}
