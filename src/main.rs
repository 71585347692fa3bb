fn main() {
    if let Err(err) = snf_costreport::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
