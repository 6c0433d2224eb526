fn main() {
    if let Err(e) = aqi_monitor_lib::run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
