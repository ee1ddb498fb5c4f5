fn main() {
    if let Err(err) = survey_stats::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
