//! imagegen entry point.
//!
//! Parses the command line, wires the client components and runs the command.

use imagegen_client::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
