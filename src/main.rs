fn main() {
    #[cfg(feature = "cli")]
    bsdelta::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("bsdelta: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
