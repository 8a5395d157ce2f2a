fn main() {
    if let Err(error) = blobdeck_cli::run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
