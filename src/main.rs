fn main() {
    if let Err(err) = conegate::run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
