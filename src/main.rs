mod cli;
mod commands;
mod env_loader;
mod error;
mod shelf;

fn main() {
    env_loader::load_dotenv();

    match cli::run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("error: {err:#}");
            if let Some(code) = error::fatal_code(&err) {
                eprintln!("code: {}", code.as_str());
            }
            std::process::exit(1);
        }
    }
}
