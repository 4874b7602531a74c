fn main() -> anyhow::Result<()> {
    phenoparse_lib::run()
}
