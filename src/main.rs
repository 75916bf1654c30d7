fn main() {
    if let Err(err) = diagreport::cli::run() {
        diagreport::ui::eprintln_error(&err);
        std::process::exit(diagreport::exit::exit_code(&err));
    }
}
