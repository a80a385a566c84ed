mod command;
mod summary;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
