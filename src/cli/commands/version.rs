/// Execute version command
pub fn execute() {
    println!("dart-gateway {}", env!("CARGO_PKG_VERSION"));
    println!("HTTP gateway for the Korean DART disclosure registry");
    println!();
    println!("Upstream: https://opendart.fss.or.kr");
}
