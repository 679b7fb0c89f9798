use anyhow::Result;
use clap::Parser;
use sei_tags::{App, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化并运行应用
    let app = App::initialize(cli)?;
    app.run().await
}
