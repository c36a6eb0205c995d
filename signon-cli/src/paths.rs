use directories::ProjectDirs;
use std::path::PathBuf;

pub fn project_dirs() -> ProjectDirs {
    ProjectDirs::from("", "", "signon-cli")
        .expect("Couldn't find operating-system-specific configuration paths")
}

pub fn config_file() -> PathBuf {
    project_dirs().config_dir().join("config.toml")
}
