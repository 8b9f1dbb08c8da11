use anyhow::Result;

fn main() -> Result<()> {
    snipbox::cli::run()
}
