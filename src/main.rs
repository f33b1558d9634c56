fn main() -> anyhow::Result<()> {
    lettertui::cli::run()
}
