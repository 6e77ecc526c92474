use anyhow::Result;

fn main() -> Result<()> {
    ktest_cli::main_entry()
}
