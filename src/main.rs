fn main() {
    if let Err(err) = emotion_monitor::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
