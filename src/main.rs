use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    financi::cli::main()
}
