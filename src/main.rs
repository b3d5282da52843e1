use tontransfer_rs::cli::Cli;
use tontransfer_rs::utils::init_logger;

fn main() -> anyhow::Result<()> {
    init_logger().unwrap();
    let cli = Cli::parse_args();
    cli.execute()?;
    Ok(())
}
