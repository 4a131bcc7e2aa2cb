fn main() {
    if let Err(err) = csv_sync::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
