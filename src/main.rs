fn main() {
    if let Err(err) = campaign_cleaner::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
