/// Display version information
pub fn execute() {
    println!("ballotbox {}", env!("CARGO_PKG_VERSION"));
    println!("Operator CLI for the ballotbox voting registry");
}
