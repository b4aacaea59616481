use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(shelf_home: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(shelf_home) = shelf_home {
        return Some(shelf_home.join(".env"));
    }
    Some(home_dir?.join("papershelf/.env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("PAPERSHELF_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}
