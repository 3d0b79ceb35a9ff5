fn main() {
    let code = window2linux_smart_run::run_cli();
    if code != 0 {
        std::process::exit(code);
    }
}
