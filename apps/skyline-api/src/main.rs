use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = skyline_api::Args::parse();

	skyline_api::run(args).await
}
