use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    vfetch::cli::run().await
}
